use std::cell::Cell;
use std::rc::Rc;

use crate::host::{Classes, Region};

/// Внешний сервис загрузки (`loading.show()` / `loading.hide()`).
pub trait BusyIndicator {
    fn show(&self);
    fn hide(&self);
}

/// Элемент загрузки, переключаемый классом `hidden`.
pub struct RegionIndicator(pub Rc<dyn Region>);

impl BusyIndicator for RegionIndicator {
    fn show(&self) {
        self.0.toggle_classes("hidden", false);
    }

    fn hide(&self) {
        self.0.toggle_classes("hidden", true);
    }
}

/// Состояние занятости: пока хотя бы один запрос в полёте, индикатор виден,
/// а область результатов притушена.
pub struct BusyIndicatorBridge {
    indicator: Option<Rc<dyn BusyIndicator>>,
    results: Rc<dyn Region>,
    busy_class: String,
    outstanding: Cell<usize>,
}

impl BusyIndicatorBridge {
    pub fn new(
        indicator: Option<Rc<dyn BusyIndicator>>,
        results: Rc<dyn Region>,
        busy_class: &str,
    ) -> Self {
        Self {
            indicator,
            results,
            busy_class: busy_class.to_string(),
            outstanding: Cell::new(0),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.outstanding.get() > 0
    }

    /// Возвращённый guard снимает занятость при drop, каким бы ни был исход
    /// запроса.
    pub fn enter(self: &Rc<Self>) -> BusyGuard {
        let outstanding = self.outstanding.get();
        self.outstanding.set(outstanding + 1);
        if outstanding == 0 {
            if let Some(indicator) = &self.indicator {
                indicator.show();
            }
            self.results.toggle_classes(&self.busy_class, true);
        }
        BusyGuard {
            bridge: Rc::clone(self),
        }
    }

    fn leave(&self) {
        let outstanding = self.outstanding.get().saturating_sub(1);
        self.outstanding.set(outstanding);
        if outstanding == 0 {
            if let Some(indicator) = &self.indicator {
                indicator.hide();
            }
            self.results.toggle_classes(&self.busy_class, false);
        }
    }
}

#[must_use = "the busy state ends when the guard is dropped"]
pub struct BusyGuard {
    bridge: Rc<BusyIndicatorBridge>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.bridge.leave();
    }
}
