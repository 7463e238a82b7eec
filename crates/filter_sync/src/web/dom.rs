//! Реализации интерфейсов страницы поверх `web-sys`.

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlButtonElement, HtmlInputElement,
    HtmlSelectElement,
};

use crate::config::FieldKind;
use crate::host::{Classes, Control, Handler, Page, PageHandler, Region, Subscription, ToggleButton};

/// Обработчик события, снимаемый при drop.
pub struct EventListener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl EventListener {
    pub fn new(target: &EventTarget, event: &'static str, f: impl FnMut(Event) + 'static) -> Self {
        let callback = Closure::wrap(Box::new(f) as Box<dyn FnMut(Event)>);
        if let Err(err) =
            target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
        {
            log::warn!("failed to listen for '{}': {:?}", event, err);
        }
        Self {
            target: target.clone(),
            event,
            callback,
        }
    }

    pub fn into_subscription(self) -> Subscription {
        Subscription::new(self)
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

fn toggle_class_list(element: &Element, classes: &str, on: bool) {
    let list = element.class_list();
    for class in classes.split_whitespace() {
        let _ = list.toggle_with_force(class, on);
    }
}

pub struct DomControl {
    element: Element,
    kind: FieldKind,
}

impl Control for DomControl {
    fn read(&self) -> String {
        if let Some(input) = self.element.dyn_ref::<HtmlInputElement>() {
            return match self.kind {
                FieldKind::Checkbox if !input.checked() => String::new(),
                _ => input.value(),
            };
        }
        if let Some(select) = self.element.dyn_ref::<HtmlSelectElement>() {
            return select.value();
        }
        self.element.get_attribute("value").unwrap_or_default()
    }

    fn write(&self, value: &str) {
        if let Some(input) = self.element.dyn_ref::<HtmlInputElement>() {
            match self.kind {
                FieldKind::Checkbox => input.set_checked(!value.is_empty()),
                _ => input.set_value(value),
            }
        } else if let Some(select) = self.element.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        }
    }

    fn listen(&self, handler: Handler) -> Subscription {
        EventListener::new(&self.element, self.kind.event_name(), move |_| handler())
            .into_subscription()
    }
}

pub struct DomButton {
    element: Element,
}

impl Classes for DomButton {
    fn toggle_classes(&self, classes: &str, on: bool) {
        toggle_class_list(&self.element, classes, on);
    }
}

impl ToggleButton for DomButton {
    fn value(&self) -> String {
        self.element
            .get_attribute("data-value")
            .or_else(|| self.element.get_attribute("value"))
            .unwrap_or_default()
    }

    fn is_default(&self) -> bool {
        self.element.has_attribute("data-default")
    }

    fn on_click(&self, handler: Handler) -> Subscription {
        EventListener::new(&self.element, "click", move |_| handler()).into_subscription()
    }
}

pub struct DomRegion {
    element: Element,
}

/// Номер страницы из активного элемента `[data-page]`, откуда пришло событие.
fn clicked_page(event: &Event) -> Option<u32> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    let button = target.closest("[data-page]").ok()??;
    let disabled = match button.dyn_ref::<HtmlButtonElement>() {
        Some(button) => button.disabled(),
        None => button.has_attribute("disabled"),
    };
    if disabled {
        return None;
    }
    button.get_attribute("data-page")?.trim().parse().ok()
}

impl Classes for DomRegion {
    fn toggle_classes(&self, classes: &str, on: bool) {
        toggle_class_list(&self.element, classes, on);
    }
}

impl Region for DomRegion {
    fn set_html(&self, html: &str) {
        self.element.set_inner_html(html);
    }

    // Один делегированный обработчик: содержимое контейнера перерисовывается
    fn on_page_click(&self, handler: PageHandler) -> Subscription {
        EventListener::new(&self.element, "click", move |event| {
            if let Some(page) = clicked_page(&event) {
                event.prevent_default();
                handler(page);
            }
        })
        .into_subscription()
    }
}

pub struct DomPage {
    document: Document,
}

impl DomPage {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn find(&self, selector: &str) -> Option<Element> {
        match self.document.query_selector(selector) {
            Ok(element) => element,
            Err(err) => {
                log::warn!("invalid selector '{}': {:?}", selector, err);
                None
            }
        }
    }
}

impl Page for DomPage {
    fn control(&self, selector: &str, kind: FieldKind) -> Option<Rc<dyn Control>> {
        let element = self.find(selector)?;
        Some(Rc::new(DomControl { element, kind }))
    }

    fn buttons(&self, selector: &str) -> Vec<Rc<dyn ToggleButton>> {
        let Ok(nodes) = self.document.query_selector_all(selector) else {
            log::warn!("invalid selector '{}'", selector);
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|i| nodes.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|element| Rc::new(DomButton { element }) as Rc<dyn ToggleButton>)
            .collect()
    }

    fn region(&self, selector: &str) -> Option<Rc<dyn Region>> {
        let element = self.find(selector)?;
        Some(Rc::new(DomRegion { element }))
    }
}
