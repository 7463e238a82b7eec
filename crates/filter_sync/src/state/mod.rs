//! Каноническое состояние фильтров и хранилище, которое им владеет.

pub mod query;

use indexmap::IndexMap;

/// Текущие значения фильтров и номер страницы.
///
/// Пустые значения не хранятся. Сравнение не зависит от порядка параметров.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    params: IndexMap<String, String>,
    page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            params: IndexMap::new(),
            page: 1,
        }
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, param: &str) -> Option<&str> {
        self.params.get(param).map(String::as_str)
    }

    /// Сохраняет `value`; пустое значение удаляет параметр.
    pub fn insert(&mut self, param: &str, value: &str) {
        if value.is_empty() {
            self.params.shift_remove(param);
        } else {
            self.params.insert(param.to_string(), value.to_string());
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Страницы начинаются с 1; меньшее значение поднимается до 1.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Канонические пары: все параметры, затем `page_param`, если страница > 1.
    pub fn to_pairs(&self, page_param: &str) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if self.page > 1 {
            pairs.push((page_param.to_string(), self.page.to_string()));
        }
        pairs
    }

    /// Каноническая query-строка без ведущего `?`.
    pub fn to_query(&self, page_param: &str) -> String {
        let pairs = self.to_pairs(page_param);
        query::encode_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Разбирает query-строку. Пустые значения отбрасываются, битая или
    /// отсутствующая страница становится 1, при повторе ключа берётся последнее.
    pub fn from_query(raw: &str, page_param: &str) -> Self {
        let mut state = Self::new();
        for (key, value) in query::parse_pairs(raw) {
            if key == page_param {
                state.set_page(value.trim().parse().unwrap_or(1));
            } else {
                state.insert(&key, &value);
            }
        }
        state
    }

    /// Сначала объявленные параметры в порядке объявления, остальные как пришли.
    fn sort_declared(&mut self, declared: &[String]) {
        let rank = |key: &String| {
            declared
                .iter()
                .position(|d| d == key)
                .unwrap_or(usize::MAX)
        };
        self.params.sort_by(|k1, _, k2, _| rank(k1).cmp(&rank(k2)));
    }
}

/// Модель выбора одной группы кнопок.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSelection {
    candidates: Vec<String>,
    default: Option<String>,
    selected: Option<String>,
}

impl GroupSelection {
    pub fn new(candidates: Vec<String>, default: Option<String>) -> Self {
        Self {
            candidates,
            default,
            selected: None,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}

/// Владеет [`FilterState`] и выбором в группах кнопок.
///
/// Меняется только слоями привязки и восстановлением из URL; остальные
/// читают снимки.
#[derive(Debug, Clone)]
pub struct FilterStateStore {
    state: FilterState,
    declared: Vec<String>,
    groups: IndexMap<String, GroupSelection>,
    revision: u64,
}

impl FilterStateStore {
    pub fn new(declared: Vec<String>) -> Self {
        Self {
            state: FilterState::new(),
            declared,
            groups: IndexMap::new(),
            revision: 0,
        }
    }

    pub fn with_group(mut self, param: &str, group: GroupSelection) -> Self {
        self.groups.insert(param.to_string(), group);
        self
    }

    pub fn get(&self) -> &FilterState {
        &self.state
    }

    pub fn snapshot(&self) -> FilterState {
        self.state.clone()
    }

    /// Маркер изменений: растёт при каждой мутации.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn selected(&self, group_param: &str) -> Option<&str> {
        self.groups.get(group_param).and_then(GroupSelection::selected)
    }

    /// Правка фильтра пользователем: сохраняет значение и сбрасывает страницу.
    pub fn set(&mut self, param: &str, value: &str) {
        self.state.insert(param, value);
        self.state.sort_declared(&self.declared);
        self.state.set_page(1);
        self.revision += 1;
    }

    /// Клик по кнопке: запоминает выбор, дальше как [`Self::set`].
    pub fn select(&mut self, group_param: &str, value: &str) {
        if let Some(group) = self.groups.get_mut(group_param) {
            group.selected = Some(value.to_string());
        }
        self.set(group_param, value);
    }

    /// Пагинация: страница не сбрасывается.
    pub fn set_page(&mut self, page: u32) {
        self.state.set_page(page);
        self.revision += 1;
    }

    /// Заменяет всё входящим состоянием (URL при загрузке или popstate).
    ///
    /// Выбор в группах пересчитывается: значение выбирает совпавшую кнопку
    /// (если совпадений нет, не выбрана ни одна, а значение остаётся);
    /// без значения берётся default группы.
    pub fn restore(&mut self, incoming: FilterState) {
        let mut next = incoming;
        for (param, group) in self.groups.iter_mut() {
            match next.get(param) {
                Some(value) => {
                    group.selected = group
                        .candidates
                        .iter()
                        .find(|c| c.as_str() == value)
                        .cloned();
                }
                None => {
                    group.selected = group.default.clone();
                    if let Some(default) = &group.default {
                        next.insert(param, default);
                    }
                }
            }
        }
        next.sort_declared(&self.declared);
        self.state = next;
        self.revision += 1;
    }
}
