// Domain layer - Plain data and pricing rules
pub mod billing;
pub mod tank;
pub mod telemetry;
