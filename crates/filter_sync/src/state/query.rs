//! Кодек query-строки.
//!
//! Ключи и значения кодируются через `urlencoding` (пробел → `%20`); при
//! разборе `+` тоже считается пробелом, так его шлют формы браузера.

pub fn encode_pairs<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Разбирает `?a=1&b=2` (`?` необязателен). Сегмент без `=` получает пустое
/// значение, пустые сегменты пропускаются.
pub fn parse_pairs(query: &str) -> Vec<(String, String)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            (decode(key), decode(value))
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let decoded = urlencoding::decode(&spaced).map(|d| d.into_owned());
    // Невалидный UTF-8 после декодирования: оставляем как есть
    decoded.unwrap_or(spaced)
}

/// Накладывает `pairs` на `base`. Свои параметры `base` остаются, если их не
/// перекрывают `pairs` или `drop`. Фрагмент отбрасывается.
pub fn merge_url(base: &str, pairs: &[(String, String)], drop: &[&str]) -> String {
    let without_fragment = base.split('#').next().unwrap_or_default();
    let (path, existing) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));

    let kept = parse_pairs(existing).into_iter().filter(|(key, _)| {
        !drop.contains(&key.as_str()) && !pairs.iter().any(|(k, _)| k == key)
    });
    let merged: Vec<(String, String)> = kept.chain(pairs.iter().cloned()).collect();

    if merged.is_empty() {
        path.to_string()
    } else {
        let query = encode_pairs(merged.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        format!("{}?{}", path, query)
    }
}
