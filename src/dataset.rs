//! Rows and column descriptors derived from a Datasette JSON response.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::collections::{BTreeMap, HashMap};

/// Built-in column labels. Unmapped ids display as themselves.
pub const DEFAULT_COLUMN_LABELS: &[(&str, &str)] = &[
    ("id", "ID"),
    ("data", "Data"),
    ("model", "Model"),
    ("gpu", "GPU"),
    ("vllm_extra_args", "Extra vLLM args"),
    ("duration", "Duration"),
    ("completed_request_count", "Completed requests (per replica)"),
    ("completed_request_rate", "QPS (per replica)"),
    ("ttlt_mean", "Time to last token (seconds, mean)"),
    ("ttlt_p50", "Time to last token (seconds, P50)"),
    ("ttlt_p90", "Time to last token (seconds, P90)"),
    ("ttlt_p95", "Time to last token (seconds, P95)"),
    ("ttlt_p99", "Time to last token (seconds, P99)"),
    ("ttft_mean", "Time to first token (seconds, mean)"),
    ("ttft_p50", "Time to first token (seconds, P50)"),
    ("ttft_p90", "Time to first token (seconds, P90)"),
    ("ttft_p95", "Time to first token (seconds, P95)"),
    ("ttft_p99", "Time to first token (seconds, P99)"),
    ("itl_mean", "Inter-token latency (seconds, mean)"),
    ("itl_p50", "Inter-token latency (seconds, P50)"),
    ("itl_p90", "Inter-token latency (seconds, P90)"),
    ("itl_p95", "Inter-token latency (seconds, P95)"),
    ("itl_p99", "Inter-token latency (seconds, P99)"),
    ("kv_cache_usage_mean", "Mean KV cache utilization (%)"),
    ("tpot_median", "Server time per output token (seconds, P50)"),
    ("prompt_tokens", "Number of tokens in prompt"),
    ("generated_tokens", "Number of generated tokens"),
];

/// Columns never picked as default axes.
const ID_COLUMNS: [&str; 2] = ["rowid", "id"];

/// Static id -> label mapping used purely for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    labels: BTreeMap<String, String>,
}

impl LabelTable {
    /// Built-in labels with `overrides` taking precedence.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut labels: BTreeMap<String, String> = DEFAULT_COLUMN_LABELS
            .iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();
        labels.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { labels }
    }

    pub fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.labels.get(id).map(String::as_str).unwrap_or(id)
    }
}

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
    Date(DateTime<Utc>),
}

impl Value {
    pub fn from_json(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// Position on a continuous axis. Dates map to epoch milliseconds.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Date(d) => Some(d.timestamp_millis() as f64),
            _ => None,
        }
    }

    /// Display form used for categories, legends and tooltips.
    pub fn display(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Self::Text(s) => s.clone(),
            Self::Date(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Convert to a date, following what a browser `Date` constructor accepts
    /// for the common Datasette encodings. Unparseable values become `Null`.
    fn coerce_date(&self) -> Self {
        match self {
            Self::Date(_) | Self::Null => self.clone(),
            Self::Number(ms) => DateTime::from_timestamp_millis(*ms as i64)
                .map(Self::Date)
                .unwrap_or(Self::Null),
            Self::Text(s) => parse_date(s).map(Self::Date).unwrap_or(Self::Null),
        }
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Mapping from column id to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: HashMap<String, Value>,
}

impl Row {
    pub fn get(&self, id: &str) -> &Value {
        self.cells.get(id).unwrap_or(&Value::Null)
    }

    pub fn set(&mut self, id: impl Into<String>, value: Value) {
        self.cells.insert(id.into(), value);
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub id: String,
    pub name: String,
    pub numeric: bool,
}

/// Rows plus the columns derived from them. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Build from JSON object rows. Columns come from the first row's keys in
    /// declaration order; the numeric flag is computed before date coercion.
    pub fn from_json_rows(
        rows: &[serde_json::Map<String, serde_json::Value>],
        labels: &LabelTable,
    ) -> Result<Self> {
        let first = rows
            .first()
            .ok_or_else(|| eyre!("The query returned no rows; nothing to plot."))?;

        let mut parsed: Vec<Row> = rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect()
            })
            .collect();

        let columns: Vec<Column> = first
            .keys()
            .map(|id| Column {
                id: id.clone(),
                name: labels.label(id).to_string(),
                numeric: parsed.iter().all(|row| row.get(id).is_number()),
            })
            .collect();

        for column in &columns {
            if column.id.eq_ignore_ascii_case("date") {
                for row in parsed.iter_mut() {
                    let coerced = row.get(&column.id).coerce_date();
                    row.set(column.id.clone(), coerced);
                }
            }
        }

        Ok(Self {
            columns,
            rows: parsed,
        })
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Default X/Y for a fresh mark. See [`infer_axes`].
    pub fn infer_axes(&self) -> (Option<String>, Option<String>) {
        infer_axes(&self.columns, self.rows.first())
    }
}

/// First two columns, in declaration order and skipping id columns, whose value
/// in `sample` is a number. With fewer than two such columns the missing axes
/// stay unset; no fallback to the leading columns is applied.
pub fn infer_axes(columns: &[Column], sample: Option<&Row>) -> (Option<String>, Option<String>) {
    let mut x = None;
    let mut y = None;
    let Some(sample) = sample else {
        return (x, y);
    };
    for column in columns {
        if ID_COLUMNS.contains(&column.id.as_str()) {
            continue;
        }
        if sample.get(&column.id).is_number() {
            if x.is_none() {
                x = Some(column.id.clone());
            } else {
                y = Some(column.id.clone());
                break;
            }
        }
    }
    (x, y)
}
