// Application layer - Use cases and the ports they depend on
pub mod aggregator;
pub mod billing_service;
pub mod clock;
pub mod day_key;
pub mod tank_service;
pub mod telemetry_repository;
