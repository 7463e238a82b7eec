//! Настройки контроллера.
//!
//! Данные лежат в [`ControllerConfig`] и десериализуются из JS-объекта опций;
//! функции (рендер, хуки) лежат в [`ControllerHooks`].

use std::collections::HashSet;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ConfigError, FetchError};

/// `(payload) -> markup`
pub type RenderFn = Rc<dyn Fn(&Value) -> String>;
pub type SuccessHook = Rc<dyn Fn(&Value)>;
pub type ErrorHook = Rc<dyn Fn(&FetchError)>;

pub const DEFAULT_DEBOUNCE_MS: u32 = 500;
pub const DEFAULT_BUSY_CLASS: &str = "opacity-50 pointer-events-none";
pub const DEFAULT_ACTIVE_CLASS: &str = "active";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Select,
    Checkbox,
}

impl FieldKind {
    /// DOM-событие, на которое подписывается поле.
    pub fn event_name(self) -> &'static str {
        match self {
            FieldKind::Text => "input",
            FieldKind::Select | FieldKind::Checkbox => "change",
        }
    }
}

/// Одно привязанное поле ввода.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterFieldSpec {
    pub selector: String,
    pub param_name: String,
    #[serde(default)]
    pub kind: FieldKind,
    /// `None`: debounce только для свободного текста.
    #[serde(default)]
    pub debounce: Option<bool>,
    /// Текстовые правки короче этого порога (после trim) игнорируются.
    #[serde(default)]
    pub min_chars: u32,
}

impl FilterFieldSpec {
    pub fn new(selector: &str, param_name: &str, kind: FieldKind) -> Self {
        Self {
            selector: selector.to_string(),
            param_name: param_name.to_string(),
            kind,
            debounce: None,
            min_chars: 0,
        }
    }

    pub fn debounced(mut self, debounce: bool) -> Self {
        self.debounce = Some(debounce);
        self
    }

    pub fn with_min_chars(mut self, min_chars: u32) -> Self {
        self.min_chars = min_chars;
        self
    }

    pub fn is_debounced(&self) -> bool {
        self.debounce.unwrap_or(self.kind == FieldKind::Text)
    }
}

/// Одна группа взаимоисключающих кнопок.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonGroupSpec {
    pub selector: String,
    pub param_name: String,
    #[serde(default = "default_active_class")]
    pub active_class: String,
    #[serde(default)]
    pub inactive_class: String,
}

impl ButtonGroupSpec {
    pub fn new(selector: &str, param_name: &str) -> Self {
        Self {
            selector: selector.to_string(),
            param_name: param_name.to_string(),
            active_class: default_active_class(),
            inactive_class: String::new(),
        }
    }

    pub fn with_classes(mut self, active: &str, inactive: &str) -> Self {
        self.active_class = active.to_string();
        self.inactive_class = inactive.to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConfig {
    /// Endpoint списка. `None`: URL текущей страницы.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filter_inputs: Vec<FilterFieldSpec>,
    #[serde(default)]
    pub button_filters: Vec<ButtonGroupSpec>,
    pub results_container: String,
    #[serde(default)]
    pub loading_container: Option<String>,
    #[serde(default)]
    pub pagination_container: Option<String>,
    #[serde(default = "default_true")]
    pub update_url: bool,
    #[serde(default = "default_debounce_delay")]
    pub debounce_delay: u32,
    #[serde(default = "default_page_param")]
    pub page_param: String,
    #[serde(default = "default_busy_class")]
    pub busy_class: String,
    #[serde(default = "default_true")]
    pub load_on_init: bool,
}

fn default_true() -> bool {
    true
}

fn default_debounce_delay() -> u32 {
    DEFAULT_DEBOUNCE_MS
}

fn default_page_param() -> String {
    contracts::listing::PAGE_PARAM.to_string()
}

fn default_busy_class() -> String {
    DEFAULT_BUSY_CLASS.to_string()
}

fn default_active_class() -> String {
    DEFAULT_ACTIVE_CLASS.to_string()
}

impl ControllerConfig {
    pub fn new(results_container: &str) -> Self {
        Self {
            url: None,
            filter_inputs: Vec::new(),
            button_filters: Vec::new(),
            results_container: results_container.to_string(),
            loading_container: None,
            pagination_container: None,
            update_url: true,
            debounce_delay: DEFAULT_DEBOUNCE_MS,
            page_param: default_page_param(),
            busy_class: default_busy_class(),
            load_on_init: true,
        }
    }

    /// Проверяет всё, что можно проверить без страницы.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.results_container.trim().is_empty() {
            return Err(ConfigError::EmptySelector("resultsContainer".into()));
        }
        if let Some(url) = &self.url {
            if url.trim().is_empty() {
                return Err(ConfigError::MissingUrl);
            }
        }
        for (name, selector) in [
            ("loadingContainer", &self.loading_container),
            ("paginationContainer", &self.pagination_container),
        ] {
            if selector.as_deref().is_some_and(|s| s.trim().is_empty()) {
                return Err(ConfigError::EmptySelector(name.into()));
            }
        }

        let page_param = self.page_param.trim();
        if page_param.is_empty() {
            return Err(ConfigError::EmptyParam("pageParam".into()));
        }

        let bindings = self
            .filter_inputs
            .iter()
            .map(|f| (&f.selector, &f.param_name))
            .chain(
                self.button_filters
                    .iter()
                    .map(|g| (&g.selector, &g.param_name)),
            );

        let mut seen = HashSet::new();
        for (selector, param) in bindings {
            if selector.trim().is_empty() {
                return Err(ConfigError::EmptySelector(format!("parameter '{}'", param)));
            }
            if param.trim().is_empty() {
                return Err(ConfigError::EmptyParam(selector.clone()));
            }
            if param == page_param {
                return Err(ConfigError::ReservedParam(param.clone()));
            }
            if !seen.insert(param.as_str()) {
                return Err(ConfigError::DuplicateParam(param.clone()));
            }
        }
        Ok(())
    }

    /// Объявленные параметры: сначала поля, потом группы кнопок.
    pub fn declared_params(&self) -> Vec<String> {
        self.filter_inputs
            .iter()
            .map(|f| f.param_name.clone())
            .chain(self.button_filters.iter().map(|g| g.param_name.clone()))
            .collect()
    }
}

/// Функции от вызывающего кода. Всё необязательно, но у области результатов
/// рендер есть всегда (см. `render`).
#[derive(Clone, Default)]
pub struct ControllerHooks {
    pub render_results: Option<RenderFn>,
    pub render_pagination: Option<RenderFn>,
    /// Пары `(selector, render)`, рисуются по порядку.
    pub summaries: Vec<(String, RenderFn)>,
    pub on_success: Option<SuccessHook>,
    pub on_error: Option<ErrorHook>,
}

impl ControllerHooks {
    pub fn render_results(mut self, f: impl Fn(&Value) -> String + 'static) -> Self {
        self.render_results = Some(Rc::new(f));
        self
    }

    pub fn render_pagination(mut self, f: impl Fn(&Value) -> String + 'static) -> Self {
        self.render_pagination = Some(Rc::new(f));
        self
    }

    pub fn summary(mut self, selector: &str, f: impl Fn(&Value) -> String + 'static) -> Self {
        self.summaries.push((selector.to_string(), Rc::new(f)));
        self
    }

    pub fn on_success(mut self, f: impl Fn(&Value) + 'static) -> Self {
        self.on_success = Some(Rc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&FetchError) + 'static) -> Self {
        self.on_error = Some(Rc::new(f));
        self
    }
}
