use async_trait::async_trait;

use crate::models::{BaggageWithPassenger, NewBaggage, NewPassenger, Passenger};
use crate::CoreResult;

/// Repository trait for passengers and the bags they own.
///
/// Create and update write the passenger row and its bags as one unit.
/// Number uniqueness must be enforced by the backing store itself.
#[async_trait]
pub trait PassengerRepository: Send + Sync {
    async fn list_passengers(&self) -> CoreResult<Vec<Passenger>>;

    async fn get_passenger(&self, id: i64) -> CoreResult<Passenger>;

    async fn create_passenger(&self, input: &NewPassenger) -> CoreResult<Passenger>;

    /// Overwrites the scalar fields and replaces every bag.
    async fn update_passenger(&self, id: i64, input: &NewPassenger) -> CoreResult<Passenger>;

    /// Deletes the passenger and, by cascade, all of its bags.
    async fn delete_passenger(&self, id: i64) -> CoreResult<()>;
}

/// Repository trait for individual bags.
#[async_trait]
pub trait BaggageRepository: Send + Sync {
    async fn list_baggage(&self) -> CoreResult<Vec<BaggageWithPassenger>>;

    async fn get_baggage(&self, id: i64) -> CoreResult<BaggageWithPassenger>;

    async fn add_baggage(
        &self,
        passenger_id: i64,
        input: &NewBaggage,
    ) -> CoreResult<BaggageWithPassenger>;

    async fn update_baggage(&self, id: i64, input: &NewBaggage) -> CoreResult<BaggageWithPassenger>;

    async fn delete_baggage(&self, id: i64) -> CoreResult<()>;

    async fn list_baggage_for_passenger(
        &self,
        passenger_id: i64,
    ) -> CoreResult<Vec<BaggageWithPassenger>>;
}
