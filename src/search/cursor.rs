//! Pagination cursor for the search API
//!
//! The API pages with `search_after=<ts13>,<external id>`, taken from the sort
//! key of the last usable item on the previous page.

use crate::search::types::SearchItem;
use serde_json::Value;

/// Resume position `(ts13, external id)` for one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCursor {
    ts13: String,
    external_id: String,
}

impl SearchCursor {
    /// Builds a cursor, returning `None` unless both halves have the expected shape
    ///
    /// # Examples
    ///
    /// ```
    /// use proxy_harvest::SearchCursor;
    ///
    /// let cursor = SearchCursor::new("1714521600000", "0f8fad5b-d9cb-469f-a165-70867728950e");
    /// assert!(cursor.is_some());
    /// let id = "0f8fad5b-d9cb-469f-a165-70867728950e";
    /// assert!(SearchCursor::new("171452160000", id).is_none());
    /// assert!(SearchCursor::new("1714521600000", "abc").is_none());
    /// ```
    pub fn new(ts13: &str, external_id: &str) -> Option<Self> {
        if !looks_like_ms13(ts13) || !looks_like_external_id(external_id) {
            return None;
        }
        Some(Self {
            ts13: ts13.to_string(),
            external_id: external_id.to_string(),
        })
    }

    /// Builds a cursor from a raw sort-key element and an item id
    pub fn from_sort_key(ts: &Value, external_id: &str) -> Option<Self> {
        Self::new(&normalize_ms13(ts)?, external_id)
    }

    /// Derives the next cursor from a page of results
    ///
    /// Items are scanned from last to first; the first one with a 13-digit
    /// timestamp and a well-formed id wins. `None` means pagination cannot go on.
    pub fn from_results(items: &[SearchItem]) -> Option<Self> {
        items.iter().rev().find_map(|item| {
            let ts = item.sort.first()?;
            Self::from_sort_key(ts, item.cursor_id()?)
        })
    }

    pub fn ts13(&self) -> &str {
        &self.ts13
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    /// Value of the `search_after` request parameter
    pub fn to_param(&self) -> String {
        format!("{},{}", self.ts13, self.external_id)
    }

    /// Serializes as the JSON array `[ts13, external_id]`
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&[&self.ts13, &self.external_id])
    }

    /// Parses a stored JSON array; anything malformed yields `None`
    pub fn from_json(raw: &str) -> Option<Self> {
        let values: Vec<Value> = serde_json::from_str(raw).ok()?;
        match values.as_slice() {
            [ts, id] => Self::from_sort_key(ts, id.as_str()?),
            _ => None,
        }
    }
}

fn looks_like_ms13(s: &str) -> bool {
    s.len() == 13 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Returns true for 36-character ids containing exactly four hyphens
pub fn looks_like_external_id(s: &str) -> bool {
    s.chars().count() == 36 && s.matches('-').count() == 4
}

/// Normalizes a sort-key timestamp to a 13-digit millisecond string
///
/// Integers, floats, digit strings and decimal strings are accepted; the
/// integer part is kept when it is exactly 13 digits.
pub fn normalize_ms13(value: &Value) -> Option<String> {
    let digits = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_u64() {
                i.to_string()
            } else if let Some(i) = n.as_i64() {
                i.to_string()
            } else {
                let f = n.as_f64()?;
                if !f.is_finite() || f < 0.0 {
                    return None;
                }
                format!("{:.0}", f.trunc())
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if s.bytes().all(|b| b.is_ascii_digit()) {
                s.to_string()
            } else {
                let f: f64 = s.parse().ok()?;
                if !f.is_finite() || f < 0.0 {
                    return None;
                }
                format!("{:.0}", f.trunc())
            }
        }
        _ => return None,
    };

    looks_like_ms13(&digits).then_some(digits)
}
