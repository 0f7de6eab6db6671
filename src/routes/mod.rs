pub mod addin_routes;
pub mod fleet_routes;
