//! Раздаёт один ответ списка по областям отображения.

use std::rc::Rc;

use contracts::listing::{PaginationInfo, HTML_FIELD};
use serde_json::Value;

use crate::bindings::pagination::pagination_markup;
use crate::config::RenderFn;
use crate::host::Region;

/// Откуда берётся разметка области.
#[derive(Clone)]
pub enum Markup {
    Custom(RenderFn),
    /// Готовая строка из поля payload.
    Field(String),
    /// Стандартные кнопки из блока пагинации payload.
    Pagination,
}

impl Markup {
    /// `None` оставляет область как есть.
    pub fn produce(&self, payload: &Value) -> Option<String> {
        match self {
            Markup::Custom(render) => Some(render(payload)),
            Markup::Field(name) => payload.get(name).and_then(Value::as_str).map(str::to_string),
            Markup::Pagination => PaginationInfo::from_payload(payload).map(|p| pagination_markup(&p)),
        }
    }

    pub fn results(custom: Option<RenderFn>) -> Self {
        custom.map_or_else(|| Markup::Field(HTML_FIELD.to_string()), Markup::Custom)
    }

    pub fn pagination(custom: Option<RenderFn>) -> Self {
        custom.map_or(Markup::Pagination, Markup::Custom)
    }
}

struct Target {
    region: Rc<dyn Region>,
    markup: Markup,
}

impl Target {
    fn render(&self, payload: &Value) {
        if let Some(html) = self.markup.produce(payload) {
            self.region.set_html(&html);
        }
    }
}

pub struct ResultRenderer {
    results: Target,
    summaries: Vec<Target>,
    pagination: Option<Target>,
}

impl ResultRenderer {
    pub fn new(results: Rc<dyn Region>, markup: Markup) -> Self {
        Self {
            results: Target { region: results, markup },
            summaries: Vec::new(),
            pagination: None,
        }
    }

    pub fn with_summary(mut self, region: Rc<dyn Region>, render: RenderFn) -> Self {
        self.summaries.push(Target {
            region,
            markup: Markup::Custom(render),
        });
        self
    }

    pub fn with_pagination(mut self, region: Rc<dyn Region>, markup: Markup) -> Self {
        self.pagination = Some(Target { region, markup });
        self
    }

    /// Сначала результаты, затем сводки по порядку, затем пагинация.
    /// Паника в функции рендера пробрасывается.
    pub fn render(&self, payload: &Value) {
        self.results.render(payload);
        for summary in &self.summaries {
            summary.render(payload);
        }
        if let Some(pagination) = &self.pagination {
            pagination.render(payload);
        }
    }
}
