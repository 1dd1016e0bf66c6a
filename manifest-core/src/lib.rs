pub mod memory;
pub mod models;
pub mod repository;
pub mod weight;

pub use memory::InMemoryStore;
pub use models::{
    Baggage, BaggageWithPassenger, NewBaggage, NewPassenger, Passenger, PassengerSummary,
};
pub use repository::{BaggageRepository, PassengerRepository};
pub use weight::{Weight, WeightInput};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl CoreError {
    pub fn passenger_not_found(id: i64) -> Self {
        CoreError::NotFound(format!("Passenger {} not found", id))
    }

    pub fn baggage_not_found(id: i64) -> Self {
        CoreError::NotFound(format!("Baggage {} not found", id))
    }

    pub fn duplicate_number(number: &str) -> Self {
        CoreError::Conflict(format!("Passenger number {} already exists", number))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
