use manifest_core::{Passenger, Weight};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightPassenger {
    pub name: String,
    pub number: String,
    pub bags: usize,
    pub fragile_bags: usize,
    pub weight: Weight,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightStats {
    pub flight: String,
    pub total_passengers: usize,
    pub total_baggage: usize,
    pub fragile_count: usize,
    pub non_fragile_count: usize,
    pub total_weight: Weight,
    pub passengers: Vec<FlightPassenger>,
}

impl FlightStats {
    fn new(flight: &str) -> Self {
        Self {
            flight: flight.to_string(),
            total_passengers: 0,
            total_baggage: 0,
            fragile_count: 0,
            non_fragile_count: 0,
            total_weight: Weight::ZERO,
            passengers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSummary {
    pub total_passengers: usize,
    pub total_baggage: usize,
    pub total_weight: Weight,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightReport {
    pub summary: FlightSummary,
    pub flights: Vec<FlightStats>,
}

impl FlightReport {
    pub fn flight(&self, flight: &str) -> Option<&FlightStats> {
        self.flights.iter().find(|f| f.flight == flight)
    }
}

/// Entry of the flight listing shown next to the manifests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightListing {
    pub flight: String,
    pub scheduled_time: String,
    pub total_passengers: usize,
    pub passengers: Vec<String>,
}

/// Group passengers by flight, keeping the order flights are first seen in.
fn group_by_flight<T, F, G>(passengers: &[Passenger], mut open: F, mut add: G) -> Vec<T>
where
    F: FnMut(&Passenger) -> T,
    G: FnMut(&mut T, &Passenger),
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<T> = Vec::new();

    for passenger in passengers {
        let slot = *index.entry(passenger.flight.as_str()).or_insert_with(|| {
            groups.push(open(passenger));
            groups.len() - 1
        });
        add(&mut groups[slot], passenger);
    }
    groups
}

/// Per-flight and grand totals over every passenger and their bags.
pub fn flight_stats(passengers: &[Passenger]) -> FlightReport {
    let flights = group_by_flight(
        passengers,
        |p| FlightStats::new(&p.flight),
        |stats, p| {
            let bags = p.bags.len();
            let fragile = p.fragile_bags();
            let weight = p.total_weight();

            stats.total_passengers += 1;
            stats.total_baggage += bags;
            stats.fragile_count += fragile;
            stats.non_fragile_count += bags - fragile;
            stats.total_weight += weight;
            stats.passengers.push(FlightPassenger {
                name: p.name.clone(),
                number: p.number.clone(),
                bags,
                fragile_bags: fragile,
                weight,
            });
        },
    );

    let summary = FlightSummary {
        total_passengers: passengers.len(),
        total_baggage: passengers.iter().map(|p| p.bags.len()).sum(),
        total_weight: passengers.iter().map(Passenger::total_weight).sum(),
    };

    FlightReport { summary, flights }
}

/// One entry per flight, with the scheduled time of its first passenger.
pub fn flight_directory(passengers: &[Passenger]) -> Vec<FlightListing> {
    group_by_flight(
        passengers,
        |p| FlightListing {
            flight: p.flight.clone(),
            scheduled_time: p.scheduled_time.clone(),
            total_passengers: 0,
            passengers: Vec::new(),
        },
        |listing, p| {
            listing.total_passengers += 1;
            listing.passengers.push(p.name.clone());
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifest_core::Baggage;

    fn passenger(id: i64, name: &str, flight: &str, time: &str, weights: &[(i64, bool)]) -> Passenger {
        Passenger {
            id,
            name: name.to_string(),
            number: format!("{:03}", id),
            flight: flight.to_string(),
            scheduled_time: time.to_string(),
            bags: weights
                .iter()
                .enumerate()
                .map(|(i, (units, fragile))| Baggage {
                    id: id * 10 + i as i64,
                    weight: Weight::from_units(*units),
                    fragile: *fragile,
                    passenger_id: id,
                })
                .collect(),
        }
    }

    fn sample() -> Vec<Passenger> {
        vec![
            passenger(1, "João Silva", "AZ123", "10:30", &[(23, false), (12, true)]),
            passenger(2, "Maria Souza", "AZ123", "10:30", &[(18, false)]),
            passenger(3, "Carlos Pereira", "BR789", "14:00", &[(25, false), (10, false), (5, true)]),
        ]
    }

    #[test]
    fn test_flight_stats_totals() {
        let report = flight_stats(&sample());

        let az = report.flight("AZ123").unwrap();
        let br = report.flight("BR789").unwrap();
        assert_eq!(az.total_weight, Weight::from_units(53));
        assert_eq!(br.total_weight, Weight::from_units(40));
        assert_eq!(az.total_passengers, 2);
        assert_eq!((az.total_baggage, az.fragile_count, az.non_fragile_count), (3, 1, 2));

        assert_eq!(report.summary.total_weight, Weight::from_units(93));
        assert_eq!(report.summary.total_passengers, 3);
        assert_eq!(report.summary.total_baggage, 6);
    }

    #[test]
    fn test_flight_stats_passenger_breakdown() {
        let report = flight_stats(&sample());
        let az = report.flight("AZ123").unwrap();

        assert_eq!(
            az.passengers[0],
            FlightPassenger {
                name: "João Silva".to_string(),
                number: "001".to_string(),
                bags: 2,
                fragile_bags: 1,
                weight: Weight::from_units(35),
            }
        );
    }

    #[test]
    fn test_flight_stats_empty() {
        let report = flight_stats(&[]);
        assert_eq!(report, FlightReport::default());
    }

    #[test]
    fn test_flight_directory_first_seen_order() {
        let mut passengers = sample();
        passengers.push(passenger(4, "Ana Lima", "AZ123", "11:00", &[]));

        let listing = flight_directory(&passengers);
        let flights: Vec<&str> = listing.iter().map(|l| l.flight.as_str()).collect();
        assert_eq!(flights, vec!["AZ123", "BR789"]);
        assert_eq!(listing[0].scheduled_time, "10:30");
        assert_eq!(listing[0].total_passengers, 3);
        assert_eq!(listing[0].passengers[2], "Ana Lima");
    }
}
