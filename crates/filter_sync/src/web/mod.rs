//! Привязки к браузеру (только wasm32).

pub mod browser;
pub mod dom;
pub mod js_api;

pub use js_api::{attach_filters, FilterHandle};
