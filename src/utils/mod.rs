//! Utilidades del sistema
//!
//! Este módulo contiene el manejo de errores y el formato de números
//! compartido por la API JSON y la tabla HTML.

pub mod errors;
pub mod format;

pub use errors::*;
