//! Search API wire types
//!
//! Only the fields the harvester stores are modelled; everything else in the
//! response is ignored.

use crate::storage::HarvestedRecord;
use crate::url::{classify_proxy_host, host_of};
use chrono::Local;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Label stored in the `source` column for every harvested record
pub const SOURCE_LABEL: &str = "urlscan";

/// One page of search results
///
/// Malformed hits are dropped individually; a page only fails to parse when
/// its body is not a JSON object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "lenient_items")]
    pub results: Vec<SearchItem>,

    #[serde(default, deserialize_with = "lenient_u64")]
    pub total: Option<u64>,
}

/// A single search hit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchItem {
    #[serde(rename = "_id", default, deserialize_with = "lenient")]
    pub id: Option<String>,

    /// Sort key; the first element is a millisecond timestamp
    #[serde(default, deserialize_with = "lenient")]
    pub sort: Vec<Value>,

    #[serde(default, deserialize_with = "lenient")]
    pub task: TaskInfo,

    #[serde(default, deserialize_with = "lenient")]
    pub page: PageInfo,

    #[serde(default, deserialize_with = "lenient")]
    pub verdicts: Verdicts,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub ip: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub requests: Option<i64>,
    #[serde(rename = "uniqIPs", default, deserialize_with = "lenient_i64")]
    pub uniq_ips: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Verdicts {
    #[serde(default, deserialize_with = "lenient")]
    pub overall: OverallVerdict,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverallVerdict {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub malicious: Option<bool>,
}

/// Reads any value, falling back to the default on `null` or a type mismatch
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn number_of(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_i64().or_else(|| number_of(&value).map(|n| n as i64)))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .or_else(|| number_of(&value).filter(|n| *n >= 0.0).map(|n| n as u64)))
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_of(&value))
}

fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<SearchItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!("Dropping malformed search hit: {}", e);
                None
            }
        })
        .collect())
}

impl SearchItem {
    /// Id used as the pagination tiebreaker
    pub fn cursor_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Stable identity used for deduplication
    pub fn external_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .or(self.task.uuid.as_deref())
            .filter(|id| !id.trim().is_empty())
    }

    /// Normalizes the hit into a storable record
    ///
    /// `proxy_hint` overrides host-based proxy classification. Returns `None`
    /// for hits without an identity.
    pub fn to_record(&self, proxy_hint: Option<&str>) -> Option<HarvestedRecord> {
        let external_id = self.external_id()?.to_string();

        let proxy_type = match proxy_hint {
            Some(hint) => hint.to_string(),
            None => {
                let host = self
                    .page
                    .url
                    .as_deref()
                    .or(self.task.url.as_deref())
                    .and_then(host_of)
                    .unwrap_or_default();
                classify_proxy_host(&host).to_string()
            }
        };

        Some(HarvestedRecord {
            external_id,
            source: SOURCE_LABEL.to_string(),
            proxy_type,
            task_url: self.task.url.clone(),
            page_url: self.page.url.clone(),
            score: self.verdicts.overall.score,
            malicious: self.verdicts.overall.malicious,
            country: self.page.country.clone(),
            ip: self.page.ip.clone(),
            http_requests: self.page.requests,
            unique_ips: self.page.uniq_ips,
            scan_timestamp: self.task.time.clone(),
            collected_at: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        })
    }
}
