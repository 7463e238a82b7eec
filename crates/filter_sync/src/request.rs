//! Координация запросов: поколения, построение URL и разбор ответов.

use std::cell::Cell;

use contracts::listing::ListingEnvelope;
use futures::future::LocalBoxFuture;
use serde_json::Value;

use crate::error::FetchError;
use crate::state::query::merge_url;
use crate::state::FilterState;

/// Сырой HTTP-ответ, как его получил транспорт.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Выполняет `GET` списка. Ошибки здесь только сетевые; статус разбирает
/// координатор.
pub trait Transport {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<HttpReply, FetchError>>;
}

/// Один запущенный запрос.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub generation: u64,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    /// Простой после ошибки последнего запроса; новые триггеры принимаются.
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// За это время ушёл более новый запрос; ответ отбрасывается.
    Stale,
    Loaded(Value),
    Failed(FetchError),
}

pub struct RequestCoordinator {
    endpoint: String,
    page_param: String,
    generation: Cell<u64>,
    in_flight: Cell<usize>,
    last_failed: Cell<bool>,
}

impl RequestCoordinator {
    pub fn new(endpoint: &str, page_param: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            page_param: page_param.to_string(),
            generation: Cell::new(0),
            in_flight: Cell::new(0),
            last_failed: Cell::new(false),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub fn phase(&self) -> Phase {
        if self.in_flight.get() > 0 {
            Phase::Fetching
        } else if self.last_failed.get() {
            Phase::Failed
        } else {
            Phase::Idle
        }
    }

    /// Endpoint со всеми непустыми фильтрами и `page`, если > 1.
    pub fn request_url(&self, state: &FilterState) -> String {
        merge_url(
            &self.endpoint,
            &state.to_pairs(&self.page_param),
            &[self.page_param.as_str()],
        )
    }

    /// Переход в Fetching: новое поколение для `state`.
    pub fn begin(&self, state: &FilterState) -> Ticket {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        self.in_flight.set(self.in_flight.get() + 1);
        Ticket {
            generation,
            url: self.request_url(state),
        }
    }

    /// Завершение `ticket`. Всё, кроме последнего поколения, устарело,
    /// каким бы ни был ответ.
    pub fn settle(&self, ticket: &Ticket, reply: Result<HttpReply, FetchError>) -> Settlement {
        self.in_flight.set(self.in_flight.get().saturating_sub(1));

        if ticket.generation != self.generation.get() {
            log::debug!(
                "request #{} superseded by #{}, dropping response",
                ticket.generation,
                self.generation.get()
            );
            return Settlement::Stale;
        }

        match interpret(reply) {
            Ok(payload) => {
                self.last_failed.set(false);
                Settlement::Loaded(payload)
            }
            Err(err) => {
                self.last_failed.set(true);
                Settlement::Failed(err)
            }
        }
    }
}

/// Результат транспорта → payload, с классификацией всех видов ошибок.
pub fn interpret(reply: Result<HttpReply, FetchError>) -> Result<Value, FetchError> {
    let reply = reply?;
    if !reply.is_success() {
        return Err(FetchError::Status(reply.status));
    }

    let payload: Value =
        serde_json::from_str(&reply.body).map_err(|e| FetchError::Malformed(e.to_string()))?;
    if !payload.is_object() {
        return Err(FetchError::Malformed("expected a JSON object".into()));
    }

    let envelope: ListingEnvelope = serde_json::from_value(payload.clone())
        .map_err(|e| FetchError::Malformed(e.to_string()))?;
    if envelope.is_failure() {
        return Err(FetchError::Rejected(envelope.message().map(str::to_string)));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(query: &str) -> FilterState {
        FilterState::from_query(query, "page")
    }

    #[test]
    fn test_request_url() {
        let coordinator = RequestCoordinator::new("/orders/", "page");
        assert_eq!(
            coordinator.request_url(&state("search=widget&days=30")),
            "/orders/?search=widget&days=30"
        );
        assert_eq!(
            coordinator.request_url(&state("search=widget&page=3")),
            "/orders/?search=widget&page=3"
        );
        assert_eq!(coordinator.request_url(&state("page=1")), "/orders/");
    }

    #[test]
    fn test_generations_increase_once_per_begin() {
        let coordinator = RequestCoordinator::new("/orders/", "page");
        assert_eq!(coordinator.phase(), Phase::Idle);

        let first = coordinator.begin(&state(""));
        let second = coordinator.begin(&state("status=PAID"));
        assert_eq!((first.generation, second.generation), (1, 2));
        assert_eq!(coordinator.generation(), 2);
        assert_eq!(coordinator.phase(), Phase::Fetching);
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let coordinator = RequestCoordinator::new("/orders/", "page");
        let a = coordinator.begin(&state("search=a"));
        let b = coordinator.begin(&state("search=ab"));

        assert_eq!(
            coordinator.settle(&b, Ok(HttpReply::ok(r#"{"html":"B"}"#))),
            Settlement::Loaded(json!({ "html": "B" }))
        );
        assert_eq!(coordinator.phase(), Phase::Fetching);

        // Даже ошибка устаревшего запроса не сообщается
        assert_eq!(
            coordinator.settle(&a, Err(FetchError::Network("reset".into()))),
            Settlement::Stale
        );
        assert_eq!(coordinator.phase(), Phase::Idle);
    }

    #[test]
    fn test_failure_then_recovery() {
        let coordinator = RequestCoordinator::new("/orders/", "page");
        let ticket = coordinator.begin(&state(""));
        assert_eq!(
            coordinator.settle(&ticket, Ok(HttpReply { status: 502, body: String::new() })),
            Settlement::Failed(FetchError::Status(502))
        );
        assert_eq!(coordinator.phase(), Phase::Failed);

        let ticket = coordinator.begin(&state(""));
        assert_eq!(coordinator.phase(), Phase::Fetching);
        assert!(matches!(
            coordinator.settle(&ticket, Ok(HttpReply::ok("{}"))),
            Settlement::Loaded(_)
        ));
        assert_eq!(coordinator.phase(), Phase::Idle);
    }

    #[test]
    fn test_interpret_classification() {
        assert_eq!(
            interpret(Err(FetchError::Network("offline".into()))),
            Err(FetchError::Network("offline".into()))
        );
        assert_eq!(
            interpret(Ok(HttpReply { status: 404, body: "{}".into() })),
            Err(FetchError::Status(404))
        );
        assert!(matches!(
            interpret(Ok(HttpReply::ok("<html>"))),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(
            interpret(Ok(HttpReply::ok("[1, 2]"))),
            Err(FetchError::Malformed(_))
        ));
        assert_eq!(
            interpret(Ok(HttpReply::ok(r#"{"success": false, "message": "Bad range"}"#))),
            Err(FetchError::Rejected(Some("Bad range".into())))
        );
        assert_eq!(
            interpret(Ok(HttpReply::ok(r#"{"success": false}"#))),
            Err(FetchError::Rejected(None))
        );
        assert_eq!(
            interpret(Ok(HttpReply::ok(r#"{"success": true, "orders": []}"#))),
            Ok(json!({ "success": true, "orders": [] }))
        );
    }

    #[test]
    fn test_interpret_keeps_odd_fields_as_payload() {
        assert_eq!(
            interpret(Ok(HttpReply::ok(r#"{"success": true, "html": "rows", "message": 3}"#))),
            Ok(json!({ "success": true, "html": "rows", "message": 3 }))
        );
        assert_eq!(
            interpret(Ok(HttpReply::ok(r#"{"success": 1, "html": "rows"}"#))),
            Ok(json!({ "success": 1, "html": "rows" }))
        );
        assert_eq!(
            interpret(Ok(HttpReply::ok(r#"{"success": false, "message": ["bad"]}"#))),
            Err(FetchError::Rejected(None))
        );
    }
}
