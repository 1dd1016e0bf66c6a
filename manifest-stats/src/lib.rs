pub mod baggage;
pub mod flights;

pub use baggage::{
    baggage_stats, fleet_baggage_stats, passenger_baggage_stats, BagSummary, BaggageDetail,
    BaggageStats, FlightBaggageStats, PassengerBaggageReport,
};
pub use flights::{
    flight_directory, flight_stats, FlightListing, FlightPassenger, FlightReport, FlightStats,
    FlightSummary,
};
