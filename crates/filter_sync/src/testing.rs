//! Хосты в памяти для unit-тестов.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::rc::{Rc, Weak};

use futures::channel::oneshot;
use futures::executor::LocalSpawner;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;

use crate::busy::BusyIndicator;
use crate::config::FieldKind;
use crate::error::FetchError;
use crate::history::HistoryPort;
use crate::host::{
    Classes, Control, Handler, Notifier, Page, PageHandler, Region, Scheduler, Spawner,
    Subscription, ToggleButton,
};
use crate::request::{HttpReply, Transport};

type Slots<H> = Rc<RefCell<Vec<(u64, H)>>>;

/// Реестр обработчиков; drop подписки удаляет её.
pub struct Listeners<H: Clone + 'static> {
    next_id: Cell<u64>,
    slots: Slots<H>,
}

struct Unregister<H: 'static> {
    slots: Weak<RefCell<Vec<(u64, H)>>>,
    id: u64,
}

impl<H: 'static> Drop for Unregister<H> {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.upgrade() {
            slots.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

impl<H: Clone + 'static> Default for Listeners<H> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(0),
            slots: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<H: Clone + 'static> Listeners<H> {
    pub fn add(&self, handler: H) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.slots.borrow_mut().push((id, handler));
        Subscription::new(Unregister::<H> {
            slots: Rc::downgrade(&self.slots),
            id,
        })
    }

    /// Копия списка: обработчик может подписываться и отписываться во время вызова.
    pub fn handlers(&self) -> Vec<H> {
        self.slots.borrow().iter().map(|(_, h)| h.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }
}

#[derive(Default)]
struct ClassList(RefCell<BTreeSet<String>>);

impl ClassList {
    fn toggle(&self, classes: &str, on: bool) {
        let mut set = self.0.borrow_mut();
        for class in classes.split_whitespace() {
            if on {
                set.insert(class.to_string());
            } else {
                set.remove(class);
            }
        }
    }

    fn has(&self, class: &str) -> bool {
        self.0.borrow().contains(class)
    }
}

pub struct FakeControl {
    kind: FieldKind,
    value: RefCell<String>,
    checked: Cell<bool>,
    listeners: Listeners<Handler>,
}

impl FakeControl {
    fn new(kind: FieldKind) -> Self {
        let value = if kind == FieldKind::Checkbox { "on" } else { "" };
        Self {
            kind,
            value: RefCell::new(value.to_string()),
            checked: Cell::new(false),
            listeners: Listeners::default(),
        }
    }

    pub fn value(&self) -> String {
        self.value.borrow().clone()
    }

    pub fn set_value(&self, value: &str) {
        *self.value.borrow_mut() = value.to_string();
    }

    pub fn is_checked(&self) -> bool {
        self.checked.get()
    }

    pub fn set_checked(&self, checked: bool) {
        self.checked.set(checked);
    }

    /// Ставит значение и генерирует событие, как пользователь.
    pub fn type_text(&self, value: &str) {
        self.set_value(value);
        self.fire();
    }

    pub fn fire(&self) {
        for handler in self.listeners.handlers() {
            handler();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Control for FakeControl {
    fn read(&self) -> String {
        match self.kind {
            FieldKind::Checkbox if !self.checked.get() => String::new(),
            _ => self.value(),
        }
    }

    fn write(&self, value: &str) {
        match self.kind {
            FieldKind::Checkbox => self.checked.set(!value.is_empty()),
            _ => self.set_value(value),
        }
    }

    fn listen(&self, handler: Handler) -> Subscription {
        self.listeners.add(handler)
    }
}

pub struct FakeButton {
    value: String,
    default: bool,
    classes: ClassList,
    listeners: Listeners<Handler>,
}

impl FakeButton {
    pub fn value_attr(&self) -> String {
        self.value.clone()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.has(class)
    }

    pub fn click(&self) {
        for handler in self.listeners.handlers() {
            handler();
        }
    }
}

impl Classes for FakeButton {
    fn toggle_classes(&self, classes: &str, on: bool) {
        self.classes.toggle(classes, on);
    }
}

impl ToggleButton for FakeButton {
    fn value(&self) -> String {
        self.value.clone()
    }

    fn is_default(&self) -> bool {
        self.default
    }

    fn on_click(&self, handler: Handler) -> Subscription {
        self.listeners.add(handler)
    }
}

#[derive(Default)]
pub struct FakeRegion {
    html: RefCell<String>,
    classes: ClassList,
    page_listeners: Listeners<PageHandler>,
}

impl FakeRegion {
    pub fn html(&self) -> String {
        self.html.borrow().clone()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.has(class)
    }

    pub fn click_page(&self, page: u32) {
        for handler in self.page_listeners.handlers() {
            handler(page);
        }
    }
}

impl Classes for FakeRegion {
    fn toggle_classes(&self, classes: &str, on: bool) {
        self.classes.toggle(classes, on);
    }
}

impl Region for FakeRegion {
    fn set_html(&self, html: &str) {
        *self.html.borrow_mut() = html.to_string();
    }

    fn on_page_click(&self, handler: PageHandler) -> Subscription {
        self.page_listeners.add(handler)
    }
}

#[derive(Default)]
pub struct FakePage {
    controls: RefCell<HashMap<String, Rc<FakeControl>>>,
    buttons: RefCell<HashMap<String, Vec<Rc<FakeButton>>>>,
    regions: RefCell<HashMap<String, Rc<FakeRegion>>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_control(&self, selector: &str, kind: FieldKind) -> Rc<FakeControl> {
        let control = Rc::new(FakeControl::new(kind));
        self.controls
            .borrow_mut()
            .insert(selector.to_string(), control.clone());
        control
    }

    /// `(value, is_default)` для каждой кнопки.
    pub fn add_buttons(&self, selector: &str, buttons: &[(&str, bool)]) -> Vec<Rc<FakeButton>> {
        let buttons: Vec<Rc<FakeButton>> = buttons
            .iter()
            .map(|(value, default)| {
                Rc::new(FakeButton {
                    value: value.to_string(),
                    default: *default,
                    classes: ClassList::default(),
                    listeners: Listeners::default(),
                })
            })
            .collect();
        self.buttons
            .borrow_mut()
            .insert(selector.to_string(), buttons.clone());
        buttons
    }

    pub fn add_region(&self, selector: &str) -> Rc<FakeRegion> {
        let region = Rc::new(FakeRegion::default());
        self.regions
            .borrow_mut()
            .insert(selector.to_string(), region.clone());
        region
    }
}

impl Page for FakePage {
    fn control(&self, selector: &str, _kind: FieldKind) -> Option<Rc<dyn Control>> {
        let control = self.controls.borrow().get(selector).cloned()?;
        Some(control)
    }

    fn buttons(&self, selector: &str) -> Vec<Rc<dyn ToggleButton>> {
        self.buttons
            .borrow()
            .get(selector)
            .map(|buttons| {
                buttons
                    .iter()
                    .map(|b| b.clone() as Rc<dyn ToggleButton>)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn region(&self, selector: &str) -> Option<Rc<dyn Region>> {
        let region = self.regions.borrow().get(selector).cloned()?;
        Some(region)
    }
}

struct Timer {
    id: u64,
    due: u64,
    cancelled: Rc<Cell<bool>>,
    task: Box<dyn FnOnce()>,
}

struct CancelOnDrop(Rc<Cell<bool>>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

/// Ручной планировщик: ничего не срабатывает до [`ManualClock::advance`].
#[derive(Default)]
pub struct ManualClock {
    now: Cell<u64>,
    next_id: Cell<u64>,
    timers: RefCell<Vec<Timer>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// Запускает наступившие таймеры по порядку; задачи могут ставить новые.
    pub fn advance(&self, ms: u64) {
        let target = self.now.get() + ms;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                timers.retain(|t| !t.cancelled.get());
                let index = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(i, _)| i);
                index.map(|i| timers.remove(i))
            };
            match next {
                Some(timer) => {
                    self.now.set(timer.due);
                    (timer.task)();
                }
                None => break,
            }
        }
        self.now.set(target);
    }
}

impl Scheduler for ManualClock {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let cancelled = Rc::new(Cell::new(false));
        self.timers.borrow_mut().push(Timer {
            id,
            due: self.now.get() + u64::from(delay_ms),
            cancelled: cancelled.clone(),
            task,
        });
        Subscription::new(CancelOnDrop(cancelled))
    }
}

pub struct PoolSpawner(pub LocalSpawner);

impl Spawner for PoolSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.0
            .spawn_local(task)
            .expect("local pool accepts tasks");
    }
}

type Reply = Result<HttpReply, FetchError>;

/// Запоминает URL запросов; ответ отдаёт сам тест.
#[derive(Default)]
pub struct FakeTransport {
    requests: RefCell<Vec<(String, Option<oneshot::Sender<Reply>>)>>,
}

impl FakeTransport {
    pub fn urls(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last_url(&self) -> Option<String> {
        self.requests.borrow().last().map(|(url, _)| url.clone())
    }

    pub fn respond(&self, index: usize, reply: Reply) {
        let sender = self.requests.borrow_mut()[index]
            .1
            .take()
            .expect("request already answered");
        let _ = sender.send(reply);
    }

    pub fn respond_json(&self, index: usize, body: serde_json::Value) {
        self.respond(index, Ok(HttpReply::ok(body.to_string())));
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Reply> {
        let (tx, rx) = oneshot::channel();
        self.requests.borrow_mut().push((url.to_string(), Some(tx)));
        Box::pin(async move {
            rx.await
                .unwrap_or_else(|_| Err(FetchError::Network("request dropped".into())))
        })
    }
}

pub struct FakeHistory {
    query: RefCell<String>,
    pushes: RefCell<Vec<String>>,
    entries: RefCell<Vec<serde_json::Value>>,
    listeners: Listeners<Handler>,
}

impl FakeHistory {
    pub fn new(query: &str) -> Self {
        Self {
            query: RefCell::new(query.to_string()),
            pushes: RefCell::new(Vec::new()),
            entries: RefCell::new(Vec::new()),
            listeners: Listeners::default(),
        }
    }

    pub fn current(&self) -> String {
        self.query.borrow().clone()
    }

    pub fn pushes(&self) -> Vec<String> {
        self.pushes.borrow().clone()
    }

    pub fn entries(&self) -> Vec<serde_json::Value> {
        self.entries.borrow().clone()
    }

    /// Назад/вперёд к записи с `query`.
    pub fn navigate(&self, query: &str) {
        *self.query.borrow_mut() = query.to_string();
        for handler in self.listeners.handlers() {
            handler();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl HistoryPort for FakeHistory {
    fn query(&self) -> String {
        self.current()
    }

    fn push(&self, query: &str, entry: &serde_json::Value) {
        self.pushes.borrow_mut().push(query.to_string());
        self.entries.borrow_mut().push(entry.clone());
        *self.query.borrow_mut() = if query.is_empty() {
            String::new()
        } else {
            format!("?{}", query)
        };
    }

    fn on_navigate(&self, handler: Handler) -> Subscription {
        self.listeners.add(handler)
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    errors: RefCell<Vec<String>>,
}

impl FakeNotifier {
    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }
}

impl Notifier for FakeNotifier {
    fn error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }
}

#[derive(Default)]
pub struct FakeBusy {
    visible: Cell<bool>,
    shows: Cell<u32>,
    hides: Cell<u32>,
}

impl FakeBusy {
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn shows(&self) -> u32 {
        self.shows.get()
    }

    pub fn hides(&self) -> u32 {
        self.hides.get()
    }
}

impl BusyIndicator for FakeBusy {
    fn show(&self) {
        self.visible.set(true);
        self.shows.set(self.shows.get() + 1);
    }

    fn hide(&self) {
        self.visible.set(false);
        self.hides.set(self.hides.get() + 1);
    }
}
