//! Сервисы браузера: история, таймеры, очередь задач, HTTP и JS-хелперы
//! страницы.

use contracts::listing::AJAX_HEADER;
use futures::future::LocalBoxFuture;
use gloo_net::http::Request;
use gloo_timers::callback::Timeout;
use js_sys::{Function, Reflect};
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

use crate::busy::BusyIndicator;
use crate::error::FetchError;
use crate::history::HistoryPort;
use crate::host::{Handler, Notifier, Scheduler, Spawner, Subscription};
use crate::request::{HttpReply, Transport};
use crate::web::dom::EventListener;

pub struct BrowserHistory {
    window: Window,
}

impl BrowserHistory {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl HistoryPort for BrowserHistory {
    fn query(&self) -> String {
        self.window.location().search().unwrap_or_default()
    }

    fn push(&self, query: &str, entry: &serde_json::Value) {
        let path = self.window.location().pathname().unwrap_or_default();
        let url = if query.is_empty() {
            path
        } else {
            format!("{}?{}", path, query)
        };

        let data = entry
            .serialize(&Serializer::json_compatible())
            .unwrap_or(JsValue::NULL);

        let pushed = self
            .window
            .history()
            .and_then(|history| history.push_state_with_url(&data, "", Some(&url)));
        if let Err(err) = pushed {
            log::warn!("history.pushState failed: {:?}", err);
        }
    }

    fn on_navigate(&self, handler: Handler) -> Subscription {
        EventListener::new(&self.window, "popstate", move |_| handler()).into_subscription()
    }
}

/// `setTimeout` через gloo; drop у `Timeout` его отменяет.
pub struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Subscription {
        Subscription::new(Timeout::new(delay_ms, task))
    }
}

pub struct LocalSpawner;

impl Spawner for LocalSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

pub struct HttpTransport;

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<HttpReply, FetchError>> {
        let url = url.to_string();
        Box::pin(async move {
            let response = Request::get(&url)
                .header(AJAX_HEADER.0, AJAX_HEADER.1)
                .header("Accept", "application/json")
                .send()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;
            Ok(HttpReply { status, body })
        })
    }
}

/// Вызывает `target[name](...args)`; отсутствующий метод игнорируется.
fn call_method(target: &JsValue, name: &str, args: &[&JsValue]) -> Result<(), JsValue> {
    let method = Reflect::get(target, &JsValue::from_str(name))?;
    let Some(method) = method.dyn_ref::<Function>() else {
        return Ok(());
    };
    match args {
        [] => method.call0(target)?,
        [a] => method.call1(target, a)?,
        [a, b, ..] => method.call2(target, a, b)?,
    };
    Ok(())
}

/// Объект из опций, иначе глобальный объект страницы с той же ролью.
pub fn js_service(options: &JsValue, option: &str, global: &str) -> Option<JsValue> {
    let value = Reflect::get(options, &JsValue::from_str(option))
        .ok()
        .filter(|v| v.is_object())
        .or_else(|| {
            Reflect::get(&js_sys::global(), &JsValue::from_str(global))
                .ok()
                .filter(|v| v.is_object())
        });
    if value.is_none() {
        log::debug!("no '{}' service on the page", global);
    }
    value
}

/// Объект в духе `Toast` с методом `error(message)`.
pub struct JsNotifier(pub JsValue);

impl Notifier for JsNotifier {
    fn error(&self, message: &str) {
        if let Err(err) = call_method(&self.0, "error", &[&JsValue::from_str(message)]) {
            log::warn!("notifier failed: {:?}", err);
        }
    }
}

/// Объект в духе `Loading` с `show()` / `hide()`.
pub struct JsBusyIndicator(pub JsValue);

impl BusyIndicator for JsBusyIndicator {
    fn show(&self) {
        if let Err(err) = call_method(&self.0, "show", &[]) {
            log::warn!("loading.show failed: {:?}", err);
        }
    }

    fn hide(&self) {
        if let Err(err) = call_method(&self.0, "hide", &[]) {
            log::warn!("loading.hide failed: {:?}", err);
        }
    }
}
