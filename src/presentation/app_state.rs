// Application state for HTTP handlers
use crate::application::billing_service::BillingService;
use crate::application::tank_service::TankService;

#[derive(Clone)]
pub struct AppState {
    pub tank_service: TankService,
    pub billing_service: BillingService,
}
