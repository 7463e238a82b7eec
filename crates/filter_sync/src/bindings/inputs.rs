use std::rc::Rc;

use crate::bindings::debounce::Debouncer;
use crate::config::{FieldKind, FilterFieldSpec};
use crate::error::ConfigError;
use crate::host::{Control, Page, Subscription};
use crate::state::FilterState;

struct BoundField {
    spec: FilterFieldSpec,
    control: Rc<dyn Control>,
}

impl BoundField {
    fn current_value(&self) -> String {
        let raw = self.control.read();
        match self.spec.kind {
            FieldKind::Text => raw.trim().to_string(),
            FieldKind::Select | FieldKind::Checkbox => raw,
        }
    }

    /// Непустой текст короче `min_chars` ещё не фильтр.
    fn is_too_short(&self, value: &str) -> bool {
        self.spec.kind == FieldKind::Text
            && !value.is_empty()
            && (value.chars().count() as u32) < self.spec.min_chars
    }
}

/// Текстовые поля, select и checkbox, привязанные к параметрам фильтра.
pub struct InputBindingLayer {
    fields: Vec<BoundField>,
    debouncer: Debouncer,
}

impl InputBindingLayer {
    pub fn bind(
        specs: &[FilterFieldSpec],
        page: &dyn Page,
        debouncer: Debouncer,
    ) -> Result<Self, ConfigError> {
        let fields = specs
            .iter()
            .map(|spec| {
                page.control(&spec.selector, spec.kind)
                    .map(|control| BoundField {
                        spec: spec.clone(),
                        control,
                    })
                    .ok_or_else(|| ConfigError::ElementNotFound(spec.selector.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { fields, debouncer })
    }

    /// Подписывает `on_event(index)` на событие каждого поля.
    pub fn attach(&self, on_event: Rc<dyn Fn(usize)>) -> Vec<Subscription> {
        self.fields
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let on_event = on_event.clone();
                field.control.listen(Rc::new(move || on_event(index)))
            })
            .collect()
    }

    /// Читает изменённое поле и отдаёт `(param, value)` в `commit` сразу или
    /// после debounce (ранние правки того же поля схлопываются).
    pub fn on_event<F>(&self, index: usize, commit: F)
    where
        F: FnOnce(String, String) + 'static,
    {
        let Some(field) = self.fields.get(index) else {
            return;
        };
        let key = field.spec.selector.as_str();
        let value = field.current_value();

        if field.is_too_short(&value) {
            log::debug!(
                "{}: '{}' is shorter than {} chars, waiting for more input",
                key,
                value,
                field.spec.min_chars
            );
            self.debouncer.cancel(key);
            return;
        }

        let param = field.spec.param_name.clone();
        if field.spec.is_debounced() {
            self.debouncer
                .schedule(key, Box::new(move || commit(param, value)));
        } else {
            commit(param, value);
        }
    }

    /// Записывает поля из `state`; отсутствующий параметр очищает поле.
    pub fn restore(&self, state: &FilterState) {
        for field in &self.fields {
            let value = state.get(&field.spec.param_name).unwrap_or_default();
            field.control.write(value);
        }
    }

    pub fn cancel_pending(&self) {
        self.debouncer.cancel_all();
    }
}
