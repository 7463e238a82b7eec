use thiserror::Error;

/// Сообщение для ошибок транспорта, статуса и разбора.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred. Please try again.";

/// Сообщение для `success: false` без текста от сервера.
pub const REJECTED_FALLBACK_MESSAGE: &str = "Operation failed";

/// Ошибки подключения контроллера к странице.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("selector for {0} must not be empty")]
    EmptySelector(String),

    #[error("parameter name for '{0}' must not be empty")]
    EmptyParam(String),

    #[error("parameter '{0}' is bound more than once")]
    DuplicateParam(String),

    #[error("parameter '{0}' is reserved for pagination")]
    ReservedParam(String),

    #[error("listing url must not be empty")]
    MissingUrl,

    #[error("no element matches selector '{0}'")]
    ElementNotFound(String),

    #[error("button group '{0}' has no buttons")]
    EmptyButtonGroup(String),

    #[error("button group '{0}' mixes an empty-valued button with a non-empty default")]
    AmbiguousDefault(String),
}

/// Ошибки одного запроса списка.
///
/// Все они локальны: контроллер сообщает о них и продолжает работать.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP error: {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request rejected: {}", .0.as_deref().unwrap_or(REJECTED_FALLBACK_MESSAGE))]
    Rejected(Option<String>),
}

impl FetchError {
    /// Текст для уведомления.
    pub fn user_message(&self) -> &str {
        match self {
            FetchError::Rejected(Some(message)) => message,
            FetchError::Rejected(None) => REJECTED_FALLBACK_MESSAGE,
            _ => GENERIC_ERROR_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        assert_eq!(
            FetchError::Status(500).user_message(),
            GENERIC_ERROR_MESSAGE
        );
        assert_eq!(
            FetchError::Network("offline".into()).user_message(),
            GENERIC_ERROR_MESSAGE
        );
        assert_eq!(
            FetchError::Rejected(Some("Invalid date range".into())).user_message(),
            "Invalid date range"
        );
        assert_eq!(
            FetchError::Rejected(None).user_message(),
            REJECTED_FALLBACK_MESSAGE
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(FetchError::Status(404).to_string(), "HTTP error: 404");
        assert_eq!(
            ConfigError::ElementNotFound("#q".into()).to_string(),
            "no element matches selector '#q'"
        );
    }
}
