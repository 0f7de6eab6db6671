//! Middleware del sistema
//!
//! Este módulo contiene la configuración de CORS para las peticiones del host.

pub mod cors;

pub use cors::*;
