//! Точка входа для JavaScript.
//!
//! ```js
//! const filters = attachFilters({
//!     url: '/orders/',
//!     filterInputs: [{ selector: '#search', paramName: 'search', minChars: 2 }],
//!     buttonFilters: [{ selector: '.range-btn', paramName: 'days' }],
//!     resultsContainer: '#orders-body',
//!     paginationContainer: '#pagination',
//!     summaryContainers: { '#orders-total': (data) => `${data.pagination.total_count} orders` },
//! });
//! ```

use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use serde::Serialize;
use serde_json::Value;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::busy::BusyIndicator;
use crate::config::{ControllerConfig, ControllerHooks, RenderFn};
use crate::controller::{FilterController, Host};
use crate::host::Notifier;
use crate::web::browser::{
    js_service, BrowserHistory, HttpTransport, JsBusyIndicator, JsNotifier, LocalSpawner,
    TimeoutScheduler,
};
use crate::web::dom::DomPage;

fn to_js(payload: &Value) -> JsValue {
    payload
        .serialize(&Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

fn js_function(options: &JsValue, name: &str) -> Result<Option<Function>, JsValue> {
    let value = Reflect::get(options, &JsValue::from_str(name))?;
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    value
        .dyn_into::<Function>()
        .map(Some)
        .map_err(|_| JsValue::from_str(&format!("{} must be a function", name)))
}

// Исключение из JS-рендера не пробрасывается через wasm: логируем
fn render_fn(name: String, f: Function) -> RenderFn {
    Rc::new(move |payload: &Value| match f.call1(&JsValue::NULL, &to_js(payload)) {
        Ok(markup) => markup.as_string().unwrap_or_default(),
        Err(err) => {
            log::error!("{} threw: {:?}", name, err);
            String::new()
        }
    })
}

fn read_hooks(options: &JsValue) -> Result<ControllerHooks, JsValue> {
    let mut hooks = ControllerHooks::default();

    if let Some(f) = js_function(options, "renderResults")? {
        hooks.render_results = Some(render_fn("renderResults".into(), f));
    }
    if let Some(f) = js_function(options, "renderPagination")? {
        hooks.render_pagination = Some(render_fn("renderPagination".into(), f));
    }

    let summaries = Reflect::get(options, &JsValue::from_str("summaryContainers"))?;
    if let Some(summaries) = summaries.dyn_ref::<Object>() {
        for entry in Object::entries(summaries).iter() {
            let entry: Array = entry.unchecked_into();
            let selector = entry.get(0).as_string().unwrap_or_default();
            let f = entry
                .get(1)
                .dyn_into::<Function>()
                .map_err(|_| JsValue::from_str(&format!("summaryContainers['{}'] must be a function", selector)))?;
            let render = render_fn(format!("summaryContainers['{}']", selector), f);
            hooks.summaries.push((selector, render));
        }
    }

    if let Some(f) = js_function(options, "onSuccess")? {
        hooks = hooks.on_success(move |payload| {
            if let Err(err) = f.call1(&JsValue::NULL, &to_js(payload)) {
                log::error!("onSuccess threw: {:?}", err);
            }
        });
    }
    if let Some(f) = js_function(options, "onError")? {
        hooks = hooks.on_error(move |error| {
            if let Err(err) = f.call1(&JsValue::NULL, &JsValue::from_str(&error.to_string())) {
                log::error!("onError threw: {:?}", err);
            }
        });
    }
    Ok(hooks)
}

/// Хэндл для JavaScript. `free()` освобождает контроллер.
#[wasm_bindgen]
pub struct FilterHandle {
    controller: FilterController,
    page_param: String,
}

#[wasm_bindgen]
impl FilterHandle {
    pub fn refresh(&self) {
        self.controller.refresh();
    }

    #[wasm_bindgen(js_name = goToPage)]
    pub fn go_to_page(&self, page: u32) {
        self.controller.go_to_page(page);
    }

    #[wasm_bindgen(js_name = restoreFromUrl)]
    pub fn restore_from_url(&self) {
        self.controller.restore_from_url();
    }

    pub fn dispose(&self) {
        self.controller.dispose();
    }

    /// Каноническая query-строка текущих фильтров.
    #[wasm_bindgen(getter)]
    pub fn query(&self) -> String {
        self.controller.state().to_query(&self.page_param)
    }

    #[wasm_bindgen(getter)]
    pub fn generation(&self) -> f64 {
        self.controller.generation() as f64
    }

    #[wasm_bindgen(getter)]
    pub fn busy(&self) -> bool {
        self.controller.is_busy()
    }
}

#[wasm_bindgen(js_name = attachFilters)]
pub fn attach_filters(options: JsValue) -> Result<FilterHandle, JsValue> {
    // initializes logging using the `log` crate
    _ = console_log::init_with_level(log::Level::Debug);
    console_error_panic_hook::set_once();

    let config: ControllerConfig = serde_wasm_bindgen::from_value(options.clone())?;
    let hooks = read_hooks(&options)?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window not available"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("document not available"))?;
    let default_url = window.location().pathname()?;

    let host = Host {
        page: Rc::new(DomPage::new(document)),
        history: Rc::new(BrowserHistory::new(window)),
        transport: Rc::new(HttpTransport),
        scheduler: Rc::new(TimeoutScheduler),
        spawner: Rc::new(LocalSpawner),
        notifier: js_service(&options, "notify", "Toast")
            .map(|toast| Rc::new(JsNotifier(toast)) as Rc<dyn Notifier>),
        busy: js_service(&options, "loading", "Loading")
            .map(|loading| Rc::new(JsBusyIndicator(loading)) as Rc<dyn BusyIndicator>),
        default_url,
    };

    let page_param = config.page_param.clone();
    let controller = FilterController::attach(config, hooks, host)
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    Ok(FilterHandle {
        controller,
        page_param,
    })
}
