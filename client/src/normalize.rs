//! Rewrites the API's `PascalCase`/`camelCase` keys to `snake_case`.

use serde_json::{
    Map,
    Value,
};

/// Recursively normalizes every object key in `value`. Scalars are returned untouched.
///
/// Should two keys collapse to the same normalized key, the later one wins.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (normalize_key(&key), normalize(value)))
                .collect::<Map<_, _>>(),
        ),
        scalar => scalar,
    }
}

/// `FooBar-Id` -> `foo_bar_id`, `FOOBar` -> `foo_bar`, `2way` -> `_2way`.
pub fn normalize_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().map(|c| if c == '-' { '_' } else { c }).collect();
    let mut out = String::with_capacity(chars.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower);
            if boundary {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }

    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
