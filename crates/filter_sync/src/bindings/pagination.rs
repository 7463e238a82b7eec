//! Контейнер пагинации: делегированные клики по `[data-page]` и стандартная
//! разметка с такими элементами.

use std::rc::Rc;

use contracts::listing::PaginationInfo;

use crate::host::{Region, Subscription};

pub struct PaginationBinding {
    region: Rc<dyn Region>,
}

impl PaginationBinding {
    pub fn new(region: Rc<dyn Region>) -> Self {
        Self { region }
    }

    /// Один обработчик на весь контейнер: переживает перерисовку содержимого.
    pub fn attach(&self, on_page: Rc<dyn Fn(u32)>) -> Subscription {
        self.region.on_page_click(Rc::new(move |page: u32| {
            if page >= 1 {
                on_page(page);
            }
        }))
    }
}

fn page_button(label: &str, title: &str, target: Option<u32>) -> String {
    match target {
        Some(page) => format!(
            r#"<button type="button" class="pagination-btn" data-page="{page}" title="{title}">{label}</button>"#
        ),
        None => format!(
            r#"<button type="button" class="pagination-btn" data-page="" title="{title}" disabled>{label}</button>"#
        ),
    }
}

/// Стандартные кнопки: первая / назад / "страница / всего (кол-во)" / вперёд / последняя.
pub fn pagination_markup(info: &PaginationInfo) -> String {
    let total = info.total_pages.max(1);
    let current = info.current_page.clamp(1, total);

    let previous = info
        .has_previous
        .then(|| info.previous_page.unwrap_or(current.saturating_sub(1)))
        .filter(|p| *p >= 1);
    let next = info
        .has_next
        .then(|| info.next_page.unwrap_or(current.saturating_add(1)));
    let first = (current > 1).then_some(1);
    let last = (current < total).then_some(total);

    [
        r#"<div class="pagination-controls">"#.to_string(),
        page_button("&laquo;", "First page", first),
        page_button("&lsaquo;", "Previous page", previous),
        format!(
            r#"<span class="pagination-info">{} / {} ({})</span>"#,
            current, total, info.total_count
        ),
        page_button("&rsaquo;", "Next page", next),
        page_button("&raquo;", "Last page", last),
        "</div>".to_string(),
    ]
    .concat()
}
