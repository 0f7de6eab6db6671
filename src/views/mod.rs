//! Vistas HTML

pub mod fleet_table;

pub use fleet_table::render_fleet_page;
