//! Контроллер: один раз привязывается к странице, затем на каждое изменение
//! гоняет конвейер триггер → URL → запрос → отрисовка.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::bindings::buttons::ButtonGroupBindingLayer;
use crate::bindings::debounce::Debouncer;
use crate::bindings::inputs::InputBindingLayer;
use crate::bindings::pagination::PaginationBinding;
use crate::busy::{BusyIndicator, BusyIndicatorBridge, RegionIndicator};
use crate::config::{ControllerConfig, ControllerHooks, ErrorHook, SuccessHook};
use crate::error::{ConfigError, FetchError};
use crate::history::{HistoryMode, HistoryPort, HistorySync};
use crate::host::{Notifier, Page, Region, Scheduler, Spawner, Subscription};
use crate::render::{Markup, ResultRenderer};
use crate::request::{HttpReply, Phase, RequestCoordinator, Settlement, Ticket, Transport};
use crate::state::{FilterState, FilterStateStore};

/// Всё, что контроллеру нужно от окружения.
#[derive(Clone)]
pub struct Host {
    pub page: Rc<dyn Page>,
    pub history: Rc<dyn HistoryPort>,
    pub transport: Rc<dyn Transport>,
    pub scheduler: Rc<dyn Scheduler>,
    pub spawner: Rc<dyn Spawner>,
    pub notifier: Option<Rc<dyn Notifier>>,
    /// Только если `loading_container` не задан.
    pub busy: Option<Rc<dyn BusyIndicator>>,
    /// Endpoint, если `url` не задан: путь текущей страницы.
    pub default_url: String,
}

struct Inner {
    store: RefCell<FilterStateStore>,
    inputs: InputBindingLayer,
    buttons: ButtonGroupBindingLayer,
    history: HistorySync,
    coordinator: RequestCoordinator,
    renderer: ResultRenderer,
    busy: Rc<BusyIndicatorBridge>,
    transport: Rc<dyn Transport>,
    spawner: Rc<dyn Spawner>,
    notifier: Option<Rc<dyn Notifier>>,
    on_success: Option<SuccessHook>,
    on_error: Option<ErrorHook>,
    subscriptions: RefCell<Vec<Subscription>>,
    disposed: Cell<bool>,
}

/// Держит один список в согласии с фильтрами, URL и сервером.
/// Drop контроллера освобождает его.
pub struct FilterController {
    inner: Rc<Inner>,
}

fn resolve_region(page: &dyn Page, selector: &str) -> Result<Rc<dyn Region>, ConfigError> {
    page.region(selector)
        .ok_or_else(|| ConfigError::ElementNotFound(selector.to_string()))
}

impl FilterController {
    pub fn attach(
        config: ControllerConfig,
        hooks: ControllerHooks,
        host: Host,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let endpoint = config.url.clone().unwrap_or(host.default_url);
        if endpoint.trim().is_empty() {
            return Err(ConfigError::MissingUrl);
        }

        // Все селекторы разрешаются один раз, здесь
        let page = host.page.as_ref();
        let results = resolve_region(page, &config.results_container)?;
        let loading = config
            .loading_container
            .as_deref()
            .map(|s| resolve_region(page, s))
            .transpose()?;
        let pagination = config
            .pagination_container
            .as_deref()
            .map(|s| resolve_region(page, s))
            .transpose()?;

        let mut renderer =
            ResultRenderer::new(results.clone(), Markup::results(hooks.render_results));
        for (selector, render) in hooks.summaries {
            if selector.trim().is_empty() {
                return Err(ConfigError::EmptySelector("summaryContainers".into()));
            }
            renderer = renderer.with_summary(resolve_region(page, &selector)?, render);
        }
        if let Some(region) = &pagination {
            renderer =
                renderer.with_pagination(region.clone(), Markup::pagination(hooks.render_pagination));
        }

        let debouncer = Debouncer::new(config.debounce_delay, host.scheduler.clone());
        let inputs = InputBindingLayer::bind(&config.filter_inputs, page, debouncer)?;
        let buttons = ButtonGroupBindingLayer::bind(&config.button_filters, page)?;
        let store = buttons.register(FilterStateStore::new(config.declared_params()));

        let indicator: Option<Rc<dyn BusyIndicator>> = match loading {
            Some(region) => Some(Rc::new(RegionIndicator(region))),
            None => host.busy,
        };

        let inner = Rc::new(Inner {
            store: RefCell::new(store),
            inputs,
            buttons,
            history: HistorySync::new(host.history, config.update_url, &config.page_param),
            coordinator: RequestCoordinator::new(&endpoint, &config.page_param),
            renderer,
            busy: Rc::new(BusyIndicatorBridge::new(indicator, results, &config.busy_class)),
            transport: host.transport,
            spawner: host.spawner,
            notifier: host.notifier,
            on_success: hooks.on_success,
            on_error: hooks.on_error,
            subscriptions: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
        });

        log::info!(
            "filters attached: {} inputs, {} button groups, endpoint {}",
            config.filter_inputs.len(),
            config.button_filters.len(),
            endpoint
        );

        inner.apply_url_state();
        Inner::wire(&inner, pagination.map(PaginationBinding::new));
        if config.load_on_init {
            // Начальная загрузка не создаёт запись в истории
            inner.run(HistoryMode::Skip);
        }
        Ok(Self { inner })
    }

    pub fn state(&self) -> FilterState {
        self.inner.store.borrow().snapshot()
    }

    pub fn generation(&self) -> u64 {
        self.inner.coordinator.generation()
    }

    pub fn phase(&self) -> Phase {
        self.inner.coordinator.phase()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.is_busy()
    }

    /// Перезапускает конвейер для текущего состояния.
    pub fn refresh(&self) {
        self.inner.run(HistoryMode::Push);
    }

    pub fn go_to_page(&self, page: u32) {
        self.inner.on_page(page);
    }

    /// То же, что навигация назад/вперёд.
    pub fn restore_from_url(&self) {
        self.inner.on_navigate();
    }

    /// Снимает все обработчики и отменяет таймеры. Ответы, которые ещё
    /// в пути, по приходу игнорируются.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        self.inner.inputs.cancel_pending();
        let subscriptions = self.inner.subscriptions.take();
        log::debug!("filters disposed, {} listeners detached", subscriptions.len());
        drop(subscriptions);
    }
}

impl Drop for FilterController {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Inner {
    fn live(weak: &Weak<Inner>) -> Option<Rc<Inner>> {
        weak.upgrade().filter(|inner| !inner.disposed.get())
    }

    fn wire(this: &Rc<Self>, pagination: Option<PaginationBinding>) {
        let mut subscriptions = Vec::new();

        let weak = Rc::downgrade(this);
        subscriptions.extend(this.inputs.attach(Rc::new(move |index: usize| {
            if let Some(inner) = Inner::live(&weak) {
                inner.on_input(index);
            }
        })));

        let weak = Rc::downgrade(this);
        subscriptions.extend(this.buttons.attach(Rc::new(move |group: usize, button: usize| {
            if let Some(inner) = Inner::live(&weak) {
                inner.on_button(group, button);
            }
        })));

        if let Some(pagination) = pagination {
            let weak = Rc::downgrade(this);
            subscriptions.push(pagination.attach(Rc::new(move |page: u32| {
                if let Some(inner) = Inner::live(&weak) {
                    inner.on_page(page);
                }
            })));
        }

        let weak = Rc::downgrade(this);
        subscriptions.push(this.history.on_navigate(Rc::new(move || {
            if let Some(inner) = Inner::live(&weak) {
                inner.on_navigate();
            }
        })));

        this.subscriptions.borrow_mut().extend(subscriptions);
    }

    /// Восстановление: URL → store → поля и классы кнопок.
    fn apply_url_state(&self) {
        let incoming = self.history.read();
        self.store.borrow_mut().restore(incoming);
        let store = self.store.borrow();
        self.inputs.restore(store.get());
        self.buttons.apply(&store);
    }

    fn on_input(self: &Rc<Self>, index: usize) {
        let weak = Rc::downgrade(self);
        self.inputs.on_event(index, move |param, value| {
            if let Some(inner) = Inner::live(&weak) {
                inner.commit(&param, &value);
            }
        });
    }

    fn commit(self: &Rc<Self>, param: &str, value: &str) {
        self.store.borrow_mut().set(param, value);
        self.run(HistoryMode::Push);
    }

    fn on_button(self: &Rc<Self>, group: usize, button: usize) {
        let Some((param, value)) = self.buttons.clicked(group, button) else {
            return;
        };
        self.store.borrow_mut().select(&param, &value);
        self.buttons.apply(&self.store.borrow());
        self.run(HistoryMode::Push);
    }

    fn on_page(self: &Rc<Self>, page: u32) {
        if page < 1 {
            log::debug!("ignoring page {}", page);
            return;
        }
        self.store.borrow_mut().set_page(page);
        self.run(HistoryMode::Push);
    }

    fn on_navigate(self: &Rc<Self>) {
        // Отложенные правки относятся к старому состоянию
        self.inputs.cancel_pending();
        self.apply_url_state();
        self.run(HistoryMode::Skip);
    }

    fn run(self: &Rc<Self>, mode: HistoryMode) {
        if self.disposed.get() {
            return;
        }
        let state = self.store.borrow().snapshot();
        self.history.publish(&state, mode);

        let ticket = self.coordinator.begin(&state);
        log::debug!("request #{}: GET {}", ticket.generation, ticket.url);
        let guard = self.busy.enter();
        let reply = self.transport.get(&ticket.url);

        let weak = Rc::downgrade(self);
        self.spawner.spawn(Box::pin(async move {
            let reply = reply.await;
            if let Some(inner) = weak.upgrade() {
                inner.complete(&ticket, reply);
            }
            drop(guard);
        }));
    }

    fn complete(&self, ticket: &Ticket, reply: Result<HttpReply, FetchError>) {
        if self.disposed.get() {
            return;
        }
        match self.coordinator.settle(ticket, reply) {
            Settlement::Stale => {}
            Settlement::Loaded(payload) => {
                self.renderer.render(&payload);
                if let Some(on_success) = &self.on_success {
                    on_success(&payload);
                }
            }
            Settlement::Failed(err) => {
                log::error!("request #{} ({}) failed: {}", ticket.generation, ticket.url, err);
                if let Some(notifier) = &self.notifier {
                    notifier.error(err.user_message());
                }
                if let Some(on_error) = &self.on_error {
                    on_error(&err);
                }
            }
        }
    }
}
