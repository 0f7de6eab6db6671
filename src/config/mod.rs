//! Configuración del proyecto
//!
//! Este módulo contiene la configuración del entorno, los umbrales RUC
//! y las credenciales del host.

pub mod environment;

pub use environment::*;
