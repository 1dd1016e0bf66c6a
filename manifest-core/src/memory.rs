use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::models::{
    Baggage, BaggageWithPassenger, NewBaggage, NewPassenger, Passenger, PassengerSummary,
};
use crate::repository::{BaggageRepository, PassengerRepository};
use crate::{CoreError, CoreResult};

#[derive(Default)]
struct Tables {
    last_passenger_id: i64,
    last_baggage_id: i64,
    passengers: BTreeMap<i64, PassengerSummary>,
    baggage: BTreeMap<i64, Baggage>,
}

impl Tables {
    fn number_taken(&self, number: &str, except: Option<i64>) -> bool {
        self.passengers
            .values()
            .any(|p| p.number == number && Some(p.id) != except)
    }

    fn insert_bags(&mut self, passenger_id: i64, bags: &[NewBaggage]) {
        for bag in bags {
            self.last_baggage_id += 1;
            let id = self.last_baggage_id;
            self.baggage.insert(
                id,
                Baggage { id, weight: bag.weight, fragile: bag.fragile, passenger_id },
            );
        }
    }

    fn remove_bags_of(&mut self, passenger_id: i64) -> usize {
        let before = self.baggage.len();
        self.baggage.retain(|_, b| b.passenger_id != passenger_id);
        before - self.baggage.len()
    }

    fn passenger(&self, id: i64) -> CoreResult<Passenger> {
        let row = self
            .passengers
            .get(&id)
            .ok_or_else(|| CoreError::passenger_not_found(id))?;

        Ok(Passenger {
            id: row.id,
            name: row.name.clone(),
            number: row.number.clone(),
            flight: row.flight.clone(),
            scheduled_time: row.scheduled_time.clone(),
            bags: self
                .baggage
                .values()
                .filter(|b| b.passenger_id == id)
                .copied()
                .collect(),
        })
    }

    fn bag_with_passenger(&self, bag: &Baggage) -> CoreResult<BaggageWithPassenger> {
        let passenger = self
            .passengers
            .get(&bag.passenger_id)
            .cloned()
            .ok_or_else(|| CoreError::Storage(format!("Baggage {} has no owner", bag.id)))?;
        Ok(BaggageWithPassenger { bag: *bag, passenger })
    }
}

/// Process-local store backed by ordered maps.
///
/// Every operation runs under one mutex, so the uniqueness check and the
/// write it guards cannot interleave with another writer. The lock is never
/// held across an `.await`.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| CoreError::Storage("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl PassengerRepository for InMemoryStore {
    async fn list_passengers(&self) -> CoreResult<Vec<Passenger>> {
        let tables = self.lock()?;
        tables.passengers.keys().map(|id| tables.passenger(*id)).collect()
    }

    async fn get_passenger(&self, id: i64) -> CoreResult<Passenger> {
        self.lock()?.passenger(id)
    }

    async fn create_passenger(&self, input: &NewPassenger) -> CoreResult<Passenger> {
        input.validate()?;
        let mut tables = self.lock()?;

        if tables.number_taken(&input.number, None) {
            return Err(CoreError::duplicate_number(&input.number));
        }

        tables.last_passenger_id += 1;
        let id = tables.last_passenger_id;
        tables.passengers.insert(
            id,
            PassengerSummary {
                id,
                name: input.name.clone(),
                number: input.number.clone(),
                flight: input.flight.clone(),
                scheduled_time: input.scheduled_time.clone(),
            },
        );
        tables.insert_bags(id, &input.bags);

        info!("Passenger {} created with {} bags", id, input.bags.len());
        tables.passenger(id)
    }

    async fn update_passenger(&self, id: i64, input: &NewPassenger) -> CoreResult<Passenger> {
        input.validate()?;
        let mut tables = self.lock()?;

        if !tables.passengers.contains_key(&id) {
            return Err(CoreError::passenger_not_found(id));
        }
        if tables.number_taken(&input.number, Some(id)) {
            return Err(CoreError::duplicate_number(&input.number));
        }

        if let Some(row) = tables.passengers.get_mut(&id) {
            row.name = input.name.clone();
            row.number = input.number.clone();
            row.flight = input.flight.clone();
            row.scheduled_time = input.scheduled_time.clone();
        }
        let removed = tables.remove_bags_of(id);
        tables.insert_bags(id, &input.bags);

        info!(
            "Passenger {} updated: {} bags replaced by {}",
            id,
            removed,
            input.bags.len()
        );
        tables.passenger(id)
    }

    async fn delete_passenger(&self, id: i64) -> CoreResult<()> {
        let mut tables = self.lock()?;
        if tables.passengers.remove(&id).is_none() {
            return Err(CoreError::passenger_not_found(id));
        }
        let removed = tables.remove_bags_of(id);
        info!("Passenger {} deleted along with {} bags", id, removed);
        Ok(())
    }
}

#[async_trait]
impl BaggageRepository for InMemoryStore {
    async fn list_baggage(&self) -> CoreResult<Vec<BaggageWithPassenger>> {
        let tables = self.lock()?;
        tables
            .baggage
            .values()
            .map(|b| tables.bag_with_passenger(b))
            .collect()
    }

    async fn get_baggage(&self, id: i64) -> CoreResult<BaggageWithPassenger> {
        let tables = self.lock()?;
        let bag = tables
            .baggage
            .get(&id)
            .ok_or_else(|| CoreError::baggage_not_found(id))?;
        tables.bag_with_passenger(bag)
    }

    async fn add_baggage(
        &self,
        passenger_id: i64,
        input: &NewBaggage,
    ) -> CoreResult<BaggageWithPassenger> {
        input.validate()?;
        let mut tables = self.lock()?;

        if !tables.passengers.contains_key(&passenger_id) {
            return Err(CoreError::passenger_not_found(passenger_id));
        }
        tables.insert_bags(passenger_id, std::slice::from_ref(input));

        let id = tables.last_baggage_id;
        let bag = tables.baggage[&id];
        info!("Baggage {} added to passenger {}", id, passenger_id);
        tables.bag_with_passenger(&bag)
    }

    async fn update_baggage(&self, id: i64, input: &NewBaggage) -> CoreResult<BaggageWithPassenger> {
        input.validate()?;
        let mut tables = self.lock()?;

        let bag = tables
            .baggage
            .get_mut(&id)
            .ok_or_else(|| CoreError::baggage_not_found(id))?;
        bag.weight = input.weight;
        bag.fragile = input.fragile;
        let bag = *bag;

        tables.bag_with_passenger(&bag)
    }

    async fn delete_baggage(&self, id: i64) -> CoreResult<()> {
        let mut tables = self.lock()?;
        tables
            .baggage
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CoreError::baggage_not_found(id))
    }

    async fn list_baggage_for_passenger(
        &self,
        passenger_id: i64,
    ) -> CoreResult<Vec<BaggageWithPassenger>> {
        let tables = self.lock()?;
        tables
            .baggage
            .values()
            .filter(|b| b.passenger_id == passenger_id)
            .map(|b| tables.bag_with_passenger(b))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weight::Weight;

    fn bag(units: i64, fragile: bool) -> NewBaggage {
        NewBaggage { weight: Weight::from_units(units), fragile }
    }

    fn passenger(number: &str, flight: &str, bags: Vec<NewBaggage>) -> NewPassenger {
        NewPassenger {
            name: format!("Passenger {}", number),
            number: number.to_string(),
            flight: flight.to_string(),
            scheduled_time: "10:30".to_string(),
            bags,
        }
    }

    #[tokio::test]
    async fn test_distinct_numbers_all_succeed() {
        let store = InMemoryStore::new();
        for number in ["001", "002", "003"] {
            store.create_passenger(&passenger(number, "AZ123", vec![])).await.unwrap();
        }

        let all = store.list_passengers().await.unwrap();
        let ids: Vec<i64> = all.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_duplicate_number_conflicts_and_leaves_store_unchanged() {
        let store = InMemoryStore::new();
        store
            .create_passenger(&passenger("001", "AZ123", vec![bag(23, false)]))
            .await
            .unwrap();

        let err = store
            .create_passenger(&passenger("001", "BR789", vec![bag(5, true)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        assert_eq!(store.list_passengers().await.unwrap().len(), 1);
        assert_eq!(store.list_baggage().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_to_taken_number_conflicts() {
        let store = InMemoryStore::new();
        store.create_passenger(&passenger("001", "AZ123", vec![])).await.unwrap();
        let second = store.create_passenger(&passenger("002", "AZ123", vec![])).await.unwrap();

        let err = store
            .update_passenger(second.id, &passenger("001", "AZ123", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        // keeping its own number is fine
        let kept = store
            .update_passenger(second.id, &passenger("002", "BR789", vec![]))
            .await
            .unwrap();
        assert_eq!(kept.flight, "BR789");
    }

    #[tokio::test]
    async fn test_delete_cascades_to_bags() {
        let store = InMemoryStore::new();
        let keep = store
            .create_passenger(&passenger("001", "AZ123", vec![bag(1, false)]))
            .await
            .unwrap();
        let doomed = store
            .create_passenger(&passenger("002", "AZ123", vec![bag(23, false), bag(12, true), bag(18, false)]))
            .await
            .unwrap();
        let bag_ids: Vec<i64> = doomed.bags.iter().map(|b| b.id).collect();
        assert_eq!(bag_ids.len(), 3);

        store.delete_passenger(doomed.id).await.unwrap();

        for id in bag_ids {
            assert!(matches!(store.get_baggage(id).await, Err(CoreError::NotFound(_))));
        }
        let remaining = store.list_baggage().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].bag.passenger_id, keep.id);
        assert!(matches!(
            store.delete_passenger(doomed.id).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_replaces_bag_list() {
        let store = InMemoryStore::new();
        let created = store
            .create_passenger(&passenger("001", "AZ123", vec![bag(20, false)]))
            .await
            .unwrap();
        let original_bag = created.bags[0].id;

        let updated = store
            .update_passenger(created.id, &passenger("001", "AZ123", vec![bag(5, true), bag(7, false)]))
            .await
            .unwrap();

        assert_eq!(updated.bags.len(), 2);
        assert!(updated.bags.iter().all(|b| b.id != original_bag));
        assert!(matches!(store.get_baggage(original_bag).await, Err(CoreError::NotFound(_))));
        assert_eq!(
            store.list_baggage_for_passenger(created.id).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_update_missing_passenger_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .update_passenger(42, &passenger("001", "AZ123", vec![]))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::passenger_not_found(42));
    }

    #[tokio::test]
    async fn test_baggage_crud() {
        let store = InMemoryStore::new();
        let owner = store.create_passenger(&passenger("001", "AZ123", vec![])).await.unwrap();

        let added = store.add_baggage(owner.id, &bag(12, true)).await.unwrap();
        assert_eq!(added.passenger.number, "001");
        assert!(added.bag.fragile);

        let updated = store.update_baggage(added.bag.id, &bag(14, false)).await.unwrap();
        assert_eq!(updated.bag.weight, Weight::from_units(14));
        assert!(!updated.bag.fragile);

        store.delete_baggage(added.bag.id).await.unwrap();
        assert!(matches!(
            store.delete_baggage(added.bag.id).await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            store.add_baggage(99, &bag(1, false)).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_write() {
        let store = InMemoryStore::new();
        let mut input = passenger("001", "AZ123", vec![]);
        input.name = String::new();

        assert!(matches!(
            store.create_passenger(&input).await,
            Err(CoreError::Validation(_))
        ));
        assert!(store.list_passengers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_numbers_single_winner() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        let mut handles = Vec::new();
        for flight in ["AZ123", "BR789", "CX001", "DL900"] {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create_passenger(&passenger("777", flight, vec![])).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
