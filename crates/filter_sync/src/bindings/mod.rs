//! Слои привязки между элементами страницы и хранилищем фильтров.

pub mod buttons;
pub mod debounce;
pub mod inputs;
pub mod pagination;
