pub mod fleet_controller;
pub mod lifecycle_controller;
pub mod renewal_controller;
