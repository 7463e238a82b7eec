//! Синхронизация URL ⇄ состояние.

use std::rc::Rc;

use serde_json::{Map, Value};

use crate::host::{Handler, Subscription};
use crate::state::FilterState;

/// История браузера с точки зрения контроллера.
pub trait HistoryPort {
    /// Текущая query-строка (с ведущим `?` или без).
    fn query(&self) -> String;
    /// Добавляет запись для `query` с данными `entry`.
    fn push(&self, query: &str, entry: &Value);
    /// Навигация назад/вперёд (`popstate`).
    fn on_navigate(&self, handler: Handler) -> Subscription;
}

/// Публикует ли запуск конвейера состояние в URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Push,
    /// Восстановление из URL: URL уже и есть источник состояния.
    Skip,
}

pub struct HistorySync {
    port: Rc<dyn HistoryPort>,
    enabled: bool,
    page_param: String,
}

impl HistorySync {
    pub fn new(port: Rc<dyn HistoryPort>, enabled: bool, page_param: &str) -> Self {
        Self {
            port,
            enabled,
            page_param: page_param.to_string(),
        }
    }

    /// Исходящий шаг. Возвращает `true`, если запись добавлена.
    pub fn publish(&self, state: &FilterState, mode: HistoryMode) -> bool {
        if !self.enabled || mode == HistoryMode::Skip {
            return false;
        }
        // URL не изменился: новая запись не нужна
        if self.read() == *state {
            return false;
        }
        let query = state.to_query(&self.page_param);
        log::debug!("history: push ?{}", query);
        self.port.push(&query, &self.entry(state));
        true
    }

    /// Данные записи: все фильтры плюс страница под настроенным именем.
    pub fn entry(&self, state: &FilterState) -> Value {
        let mut entry: Map<String, Value> = state
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(v)))
            .collect();
        entry.insert(self.page_param.clone(), Value::from(state.page()));
        Value::Object(entry)
    }

    /// Входящий шаг: состояние, закодированное в текущем URL.
    pub fn read(&self) -> FilterState {
        FilterState::from_query(&self.port.query(), &self.page_param)
    }

    pub fn on_navigate(&self, handler: Handler) -> Subscription {
        self.port.on_navigate(handler)
    }
}
