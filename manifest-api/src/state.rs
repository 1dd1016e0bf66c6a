use manifest_core::{BaggageRepository, PassengerRepository};
use manifest_report::PdfRenderer;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub passengers: Arc<dyn PassengerRepository>,
    pub baggage: Arc<dyn BaggageRepository>,
    pub pdf: Arc<dyn PdfRenderer>,
}

impl AppState {
    /// Build the state from one store serving both repository traits.
    pub fn new<S>(store: Arc<S>, pdf: Arc<dyn PdfRenderer>) -> Self
    where
        S: PassengerRepository + BaggageRepository + 'static,
    {
        Self {
            passengers: store.clone(),
            baggage: store,
            pdf,
        }
    }
}
