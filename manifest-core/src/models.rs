use serde::{Deserialize, Serialize};

use crate::weight::Weight;
use crate::{CoreError, CoreResult};

pub const NAME_MAX_LEN: usize = 100;
pub const NUMBER_MAX_LEN: usize = 10;
pub const FLIGHT_MAX_LEN: usize = 10;
pub const SCHEDULED_TIME_MAX_LEN: usize = 10;

/// A traveler and the bags they own, ordered by bag id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    pub id: i64,
    pub name: String,
    pub number: String,
    pub flight: String,
    pub scheduled_time: String,
    pub bags: Vec<Baggage>,
}

impl Passenger {
    pub fn summary(&self) -> PassengerSummary {
        PassengerSummary {
            id: self.id,
            name: self.name.clone(),
            number: self.number.clone(),
            flight: self.flight.clone(),
            scheduled_time: self.scheduled_time.clone(),
        }
    }

    pub fn total_weight(&self) -> Weight {
        self.bags.iter().map(|b| b.weight).sum()
    }

    pub fn fragile_bags(&self) -> usize {
        self.bags.iter().filter(|b| b.fragile).count()
    }
}

/// Passenger columns without the owned bags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerSummary {
    pub id: i64,
    pub name: String,
    pub number: String,
    pub flight: String,
    pub scheduled_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baggage {
    pub id: i64,
    pub weight: Weight,
    pub fragile: bool,
    pub passenger_id: i64,
}

/// A bag joined with its owning passenger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaggageWithPassenger {
    #[serde(flatten)]
    pub bag: Baggage,
    pub passenger: PassengerSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewBaggage {
    pub weight: Weight,
    pub fragile: bool,
}

/// Input for creating a passenger or replacing one wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPassenger {
    pub name: String,
    pub number: String,
    pub flight: String,
    pub scheduled_time: String,
    pub bags: Vec<NewBaggage>,
}

impl NewPassenger {
    pub fn validate(&self) -> CoreResult<()> {
        require("name", &self.name, NAME_MAX_LEN)?;
        require("number", &self.number, NUMBER_MAX_LEN)?;
        require("flight", &self.flight, FLIGHT_MAX_LEN)?;
        require("scheduledTime", &self.scheduled_time, SCHEDULED_TIME_MAX_LEN)?;

        for bag in &self.bags {
            bag.validate()?;
        }
        Ok(())
    }
}

impl NewBaggage {
    pub fn validate(&self) -> CoreResult<()> {
        if self.weight < Weight::ZERO || self.weight > Weight::MAX_BAG {
            return Err(CoreError::Validation(format!(
                "weight {} must be between 0.00 and 999.99",
                self.weight
            )));
        }
        Ok(())
    }
}

fn require(field: &str, value: &str, max_len: usize) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{} is required", field)));
    }
    if value.chars().count() > max_len {
        return Err(CoreError::Validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_passenger() -> NewPassenger {
        NewPassenger {
            name: "Ana Lima".to_string(),
            number: "004".to_string(),
            flight: "BR789".to_string(),
            scheduled_time: "14:00".to_string(),
            bags: vec![NewBaggage { weight: Weight::from_units(20), fragile: true }],
        }
    }

    #[test]
    fn test_validate_accepts_complete_input() {
        assert!(new_passenger().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let mut input = new_passenger();
        input.flight = "  ".to_string();
        assert_eq!(
            input.validate(),
            Err(CoreError::Validation("flight is required".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_long_number() {
        let mut input = new_passenger();
        input.number = "12345678901".to_string();
        assert!(matches!(input.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_oversized_bag() {
        let mut input = new_passenger();
        input.bags.push(NewBaggage { weight: Weight::from_units(1000), fragile: false });
        assert!(matches!(input.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_baggage_with_passenger_json_shape() {
        let item = BaggageWithPassenger {
            bag: Baggage { id: 3, weight: Weight::from_hundredths(1250), fragile: false, passenger_id: 1 },
            passenger: new_passenger_summary(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["weight"], 12.5);
        assert_eq!(json["passengerId"], 1);
        assert_eq!(json["passenger"]["scheduledTime"], "14:00");
    }

    fn new_passenger_summary() -> PassengerSummary {
        PassengerSummary {
            id: 1,
            name: "Ana Lima".to_string(),
            number: "004".to_string(),
            flight: "BR789".to_string(),
            scheduled_time: "14:00".to_string(),
        }
    }
}
