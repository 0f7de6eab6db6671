//! Modelos del sistema
//!
//! Este módulo contiene el manifiesto RUC, las entidades del host, el
//! historial de renovaciones y el ciclo de vida del add-in.

pub mod device;
pub mod lifecycle;
pub mod renewal;
pub mod vehicle;

pub use device::*;
pub use lifecycle::*;
pub use renewal::*;
pub use vehicle::*;
