//! Cache
//!
//! Este módulo contiene la persistencia local de la lista de trabajo y del
//! historial de renovaciones.

pub mod local_store;

pub use local_store::LocalStore;
