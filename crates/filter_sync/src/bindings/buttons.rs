use std::rc::Rc;

use crate::config::ButtonGroupSpec;
use crate::error::ConfigError;
use crate::host::{Classes, Page, Subscription, ToggleButton};
use crate::state::{FilterStateStore, GroupSelection};

struct BoundButton {
    value: String,
    handle: Rc<dyn ToggleButton>,
}

struct BoundGroup {
    spec: ButtonGroupSpec,
    buttons: Vec<BoundButton>,
    default: Option<String>,
}

/// Группы взаимоисключающих кнопок (периоды, статусы и т.п.).
///
/// Сам выбор хранится в [`FilterStateStore`]; слой держит кнопки и выводит
/// их классы из хранилища.
pub struct ButtonGroupBindingLayer {
    groups: Vec<BoundGroup>,
}

impl ButtonGroupBindingLayer {
    pub fn bind(specs: &[ButtonGroupSpec], page: &dyn Page) -> Result<Self, ConfigError> {
        let mut groups = Vec::with_capacity(specs.len());
        for spec in specs {
            let handles = page.buttons(&spec.selector);
            if handles.is_empty() {
                return Err(ConfigError::EmptyButtonGroup(spec.selector.clone()));
            }

            let buttons: Vec<BoundButton> = handles
                .into_iter()
                .map(|handle| BoundButton {
                    value: handle.value(),
                    handle,
                })
                .collect();

            let mut defaults = buttons.iter().filter(|b| b.handle.is_default());
            let default = defaults.next().map(|b| b.value.clone());
            if defaults.next().is_some() {
                log::warn!(
                    "{}: several buttons are marked as default, using '{}'",
                    spec.selector,
                    default.as_deref().unwrap_or_default()
                );
            }
            // Пустое значение и непустой default не различимы по URL
            let has_empty = buttons.iter().any(|b| b.value.is_empty());
            if has_empty && default.as_deref().is_some_and(|d| !d.is_empty()) {
                return Err(ConfigError::AmbiguousDefault(spec.selector.clone()));
            }

            groups.push(BoundGroup {
                spec: spec.clone(),
                buttons,
                default,
            });
        }
        Ok(Self { groups })
    }

    /// Регистрирует в хранилище модель выбора для каждой группы.
    pub fn register(&self, mut store: FilterStateStore) -> FilterStateStore {
        for group in &self.groups {
            let candidates = group.buttons.iter().map(|b| b.value.clone()).collect();
            store = store.with_group(
                &group.spec.param_name,
                GroupSelection::new(candidates, group.default.clone()),
            );
        }
        store
    }

    pub fn attach(&self, on_click: Rc<dyn Fn(usize, usize)>) -> Vec<Subscription> {
        let mut subscriptions = Vec::new();
        for (group_index, group) in self.groups.iter().enumerate() {
            for (button_index, button) in group.buttons.iter().enumerate() {
                let on_click = on_click.clone();
                subscriptions.push(
                    button
                        .handle
                        .on_click(Rc::new(move || on_click(group_index, button_index))),
                );
            }
        }
        subscriptions
    }

    /// `(param, value)` нажатой кнопки.
    pub fn clicked(&self, group_index: usize, button_index: usize) -> Option<(String, String)> {
        let group = self.groups.get(group_index)?;
        let button = group.buttons.get(button_index)?;
        Some((group.spec.param_name.clone(), button.value.clone()))
    }

    /// Пересчитывает классы из хранилища: первая кнопка с выбранным значением
    /// активна, остальные нет.
    pub fn apply(&self, store: &FilterStateStore) {
        for group in &self.groups {
            let selected = store.selected(&group.spec.param_name);
            let active_index =
                selected.and_then(|value| group.buttons.iter().position(|b| b.value == value));

            for (index, button) in group.buttons.iter().enumerate() {
                button.handle.toggle_classes(&group.spec.active_class, false);
                button.handle.toggle_classes(&group.spec.inactive_class, false);
                if Some(index) == active_index {
                    button.handle.toggle_classes(&group.spec.active_class, true);
                } else {
                    button.handle.toggle_classes(&group.spec.inactive_class, true);
                }
            }
        }
    }
}
