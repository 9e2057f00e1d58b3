//! Normalized response envelope.
//!
//! Endpoints wrap their payload in `{ data: ... }`, and paginated lists put
//! their pagination metadata either next to `data` or inside it. Everything
//! is reduced here to [`Page`] and plain `T` so callers see one shape.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::error::ClientError;
use crate::list::ListQuery;

/// Fields matched by client-side search on unpaginated lists
const LOCAL_SEARCH_FIELDS: &[&str] = &["name", "description"];

/// One page of a list endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    /// Always at least 1
    pub pages: u32,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            pages: 1,
        }
    }

    /// A single page holding every item (unpaginated endpoints)
    pub fn single(items: Vec<T>) -> Self {
        Self {
            total: items.len() as u64,
            items,
            pages: 1,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    pages: Option<u32>,
}

/// Extract the payload of a `{ data: T }` body, accepting an unwrapped `T`.
pub fn unwrap_data<T: DeserializeOwned>(body: Value) -> Result<T, ClientError> {
    let payload = match body {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or_default(),
        other => other,
    };
    serde_json::from_value(payload).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Extract a page from a list body.
///
/// Accepted shapes:
/// - `{ data: [..], pagination: {..} }`
/// - `{ data: { data: [..], pagination: {..} } }`
/// - `{ data: [..] }` or a bare `[..]` (single page)
pub fn unwrap_page<T: DeserializeOwned>(body: Value) -> Result<Page<T>, ClientError> {
    let (items, pagination) = match body {
        Value::Array(items) => (Value::Array(items), None),
        Value::Object(mut outer) => {
            let outer_pagination = outer.remove("pagination");
            match outer.remove("data") {
                Some(Value::Object(mut inner)) => {
                    let items = inner.remove("data").ok_or_else(|| {
                        ClientError::Decode("list payload has no data array".to_string())
                    })?;
                    (items, inner.remove("pagination").or(outer_pagination))
                }
                Some(items) => (items, outer_pagination),
                None => {
                    return Err(ClientError::Decode(
                        "list payload has no data field".to_string(),
                    ))
                }
            }
        }
        other => {
            return Err(ClientError::Decode(format!(
                "expected a list payload, got {}",
                type_name(&other)
            )))
        }
    };

    let items: Vec<T> =
        serde_json::from_value(items).map_err(|e| ClientError::Decode(e.to_string()))?;
    let pagination: Pagination = match pagination {
        Some(p) => serde_json::from_value(p).map_err(|e| ClientError::Decode(e.to_string()))?,
        None => Pagination::default(),
    };

    Ok(Page {
        total: pagination.total.unwrap_or(items.len() as u64),
        pages: pagination.pages.unwrap_or(1).max(1),
        items,
    })
}

/// Search and paginate an unpaginated list body on the client.
///
/// An item matches when one of [`LOCAL_SEARCH_FIELDS`] contains the search
/// term, ignoring case. A page past the end comes back empty.
pub fn paginate_locally<T: DeserializeOwned>(
    body: Value,
    query: &ListQuery,
) -> Result<Page<T>, ClientError> {
    let all: Page<Value> = unwrap_page(body)?;
    let term = query.search.trim().to_lowercase();
    let matching: Vec<Value> = all
        .items
        .into_iter()
        .filter(|item| term.is_empty() || matches_term(item, &term))
        .collect();

    let limit = query.limit.max(1) as usize;
    let total = matching.len();
    let pages = total.div_ceil(limit).max(1);
    let skip = (query.page.max(1) as usize - 1) * limit;
    let window: Vec<Value> = matching.into_iter().skip(skip).take(limit).collect();

    let items: Vec<T> = serde_json::from_value(Value::Array(window))
        .map_err(|e| ClientError::Decode(e.to_string()))?;
    Ok(Page {
        items,
        total: total as u64,
        pages: pages as u32,
    })
}

fn matches_term(item: &Value, term: &str) -> bool {
    LOCAL_SEARCH_FIELDS.iter().any(|field| {
        item.get(*field)
            .and_then(Value::as_str)
            .is_some_and(|text| text.to_lowercase().contains(term))
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
