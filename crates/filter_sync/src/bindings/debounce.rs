use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::host::{Scheduler, Subscription};

/// Debounce по ключу: новая задача отменяет отложенную под тем же ключом.
/// Разные ключи не мешают друг другу.
pub struct Debouncer {
    delay_ms: u32,
    scheduler: Rc<dyn Scheduler>,
    pending: RefCell<HashMap<String, Subscription>>,
}

impl Debouncer {
    pub fn new(delay_ms: u32, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            delay_ms,
            scheduler,
            pending: RefCell::new(HashMap::new()),
        }
    }

    pub fn schedule(&self, key: &str, task: Box<dyn FnOnce()>) {
        let timer = self.scheduler.schedule(self.delay_ms, task);
        // Старый таймер отменяется drop'ом уже после borrow
        let previous = self.pending.borrow_mut().insert(key.to_string(), timer);
        drop(previous);
    }

    pub fn cancel(&self, key: &str) {
        let previous = self.pending.borrow_mut().remove(key);
        drop(previous);
    }

    pub fn cancel_all(&self) {
        let drained: Vec<Subscription> = self.pending.borrow_mut().drain().map(|(_, t)| t).collect();
        drop(drained);
    }
}
