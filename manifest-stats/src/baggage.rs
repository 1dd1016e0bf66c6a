use manifest_core::{Baggage, Passenger, PassengerSummary, Weight};
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts and weight aggregates over a set of bags.
///
/// Every field is zero for an empty set. Weights serialize as JSON numbers,
/// so trailing zeros are dropped there (`2.50` becomes `2.5`); the fixed two
/// decimals only hold for the `Display` form used in reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BagSummary {
    pub total: usize,
    pub fragile_count: usize,
    pub non_fragile_count: usize,
    pub total_weight: Weight,
    pub average_weight: Weight,
    pub max_weight: Weight,
    pub min_weight: Weight,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightBaggageStats {
    pub total: usize,
    pub fragile_count: usize,
    pub total_weight: Weight,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaggageStats {
    #[serde(flatten)]
    pub summary: BagSummary,
    pub by_flight: BTreeMap<String, FlightBaggageStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaggageDetail {
    pub id: i64,
    pub weight: Weight,
    pub fragile: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerBaggageReport {
    pub passenger: PassengerSummary,
    pub baggage: BagSummary,
    pub details: Vec<BaggageDetail>,
}

#[derive(Default)]
struct Accumulator {
    total: usize,
    fragile: usize,
    weight: Weight,
    max: Option<Weight>,
    min: Option<Weight>,
}

impl Accumulator {
    fn push(&mut self, bag: &Baggage) {
        self.total += 1;
        if bag.fragile {
            self.fragile += 1;
        }
        self.weight += bag.weight;
        self.max = Some(self.max.map_or(bag.weight, |m| m.max(bag.weight)));
        self.min = Some(self.min.map_or(bag.weight, |m| m.min(bag.weight)));
    }

    fn finish(self) -> BagSummary {
        BagSummary {
            total: self.total,
            fragile_count: self.fragile,
            non_fragile_count: self.total - self.fragile,
            total_weight: self.weight,
            average_weight: Weight::average(self.weight, self.total),
            max_weight: self.max.unwrap_or_default(),
            min_weight: self.min.unwrap_or_default(),
        }
    }
}

fn accumulate<'a, I>(bags: I, by_flight: &mut BTreeMap<String, FlightBaggageStats>) -> BagSummary
where
    I: IntoIterator<Item = (&'a str, &'a Baggage)>,
{
    let mut acc = Accumulator::default();
    for (flight, bag) in bags {
        acc.push(bag);

        let entry = by_flight.entry(flight.to_string()).or_default();
        entry.total += 1;
        if bag.fragile {
            entry.fragile_count += 1;
        }
        entry.total_weight += bag.weight;
    }
    acc.finish()
}

/// Fleet-wide statistics over bags tagged with their owner's flight.
pub fn baggage_stats<'a, I>(bags: I) -> BaggageStats
where
    I: IntoIterator<Item = (&'a str, &'a Baggage)>,
{
    let mut by_flight = BTreeMap::new();
    let summary = accumulate(bags, &mut by_flight);
    BaggageStats { summary, by_flight }
}

/// Like [`baggage_stats`], but every flight that has a passenger gets a
/// `by_flight` entry, even when none of its passengers carry bags.
pub fn fleet_baggage_stats(passengers: &[Passenger]) -> BaggageStats {
    let mut by_flight: BTreeMap<String, FlightBaggageStats> = passengers
        .iter()
        .map(|p| (p.flight.clone(), FlightBaggageStats::default()))
        .collect();

    let bags = passengers
        .iter()
        .flat_map(|p| p.bags.iter().map(move |b| (p.flight.as_str(), b)));
    let summary = accumulate(bags, &mut by_flight);

    BaggageStats { summary, by_flight }
}

pub fn passenger_baggage_stats(passenger: &Passenger) -> PassengerBaggageReport {
    let mut acc = Accumulator::default();
    for bag in &passenger.bags {
        acc.push(bag);
    }

    PassengerBaggageReport {
        passenger: passenger.summary(),
        baggage: acc.finish(),
        details: passenger
            .bags
            .iter()
            .map(|b| BaggageDetail { id: b.id, weight: b.weight, fragile: b.fragile })
            .collect(),
    }
}
