//! Контракт endpoint'а списка с фильтрами.
//!
//! Сервис отвечает на AJAX `GET` (с заголовком [`AJAX_HEADER`]) JSON-объектом.
//! Для клиента значат только `success` и `message`, остальное уходит
//! в функции рендера как есть.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Имя параметра страницы по умолчанию.
pub const PAGE_PARAM: &str = "page";

/// Заголовок, по которому сервис отдаёт JSON вместо HTML.
pub const AJAX_HEADER: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");

/// Поле payload с готовым фрагментом результатов.
pub const HTML_FIELD: &str = "html";

/// Поле payload с блоком [`PaginationInfo`].
pub const PAGINATION_FIELD: &str = "pagination";

/// Ответ endpoint'а списка.
///
/// `success` и `message` не типизированы: в успешном ответе это такой же
/// payload, какого бы JSON-типа они ни были.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingEnvelope {
    /// Отказ только при `false`, отсутствие поля означает успех.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ListingEnvelope {
    pub fn is_failure(&self) -> bool {
        self.success.as_ref().and_then(Value::as_bool) == Some(false)
    }

    /// Сообщение сервера; пустые и нестроковые значения игнорируются.
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// Блок пагинации, который сервер кладёт в ответ рядом с результатами.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub current_page: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub has_previous: bool,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub previous_page: Option<u32>,
    #[serde(default)]
    pub next_page: Option<u32>,
}

impl PaginationInfo {
    /// Достаёт блок пагинации из payload, если он есть.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        payload
            .get(PAGINATION_FIELD)
            .and_then(|block| serde_json::from_value(block.clone()).ok())
    }
}
