//! Всё, что контроллеру нужно от страницы и браузера.
//!
//! Модуль `web` реализует это поверх `web-sys`/`gloo`, тесты держат всё в памяти.

use std::any::Any;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::config::FieldKind;

pub type Handler = Rc<dyn Fn()>;
pub type PageHandler = Rc<dyn Fn(u32)>;

/// Держит обработчик или таймер; drop отписывает или отменяет.
#[must_use = "dropping a Subscription detaches it immediately"]
pub struct Subscription(#[allow(dead_code)] Box<dyn Any>);

impl Subscription {
    pub fn new(inner: impl Any) -> Self {
        Self(Box::new(inner))
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Subscription")
    }
}

/// Добавляет или убирает список классов через пробел.
pub trait Classes {
    fn toggle_classes(&self, classes: &str, on: bool);
}

/// Привязанный input/select/checkbox.
pub trait Control {
    /// Checkbox: атрибут `value`, если отмечен, иначе пусто.
    fn read(&self) -> String;
    fn write(&self, value: &str);
    /// Слушает DOM-событие своего вида поля.
    fn listen(&self, handler: Handler) -> Subscription;
}

pub trait ToggleButton: Classes {
    /// `data-value`, иначе атрибут `value`.
    fn value(&self) -> String;
    /// Есть маркер `data-default`.
    fn is_default(&self) -> bool;
    fn on_click(&self, handler: Handler) -> Subscription;
}

/// Область отображения: результаты, сводки, пагинация или индикатор.
pub trait Region: Classes {
    fn set_html(&self, html: &str);
    /// Делегированные клики по активным потомкам `[data-page]`.
    fn on_page_click(&self, handler: PageHandler) -> Subscription;
}

/// Разрешает селекторы один раз, при подключении.
pub trait Page {
    fn control(&self, selector: &str, kind: FieldKind) -> Option<Rc<dyn Control>>;
    fn buttons(&self, selector: &str) -> Vec<Rc<dyn ToggleButton>>;
    fn region(&self, selector: &str) -> Option<Rc<dyn Region>>;
}

pub trait Scheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Subscription;
}

/// Единственная очередь UI-задач страницы.
pub trait Spawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// Внешний сервис уведомлений. Список сообщает только об ошибках.
pub trait Notifier {
    fn error(&self, message: &str);
}
