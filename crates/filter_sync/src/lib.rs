//! Синхронизирует фильтры серверной страницы списка, query-строку URL
//! и результаты, загружаемые через AJAX.

pub mod bindings;
pub mod busy;
pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod host;
pub mod render;
pub mod request;
pub mod state;

#[cfg(test)]
mod testing;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{ButtonGroupSpec, ControllerConfig, ControllerHooks, FieldKind, FilterFieldSpec};
pub use controller::{FilterController, Host};
pub use error::{ConfigError, FetchError};
pub use request::Phase;
pub use state::{FilterState, FilterStateStore};
