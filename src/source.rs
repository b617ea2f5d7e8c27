//! Where rows come from: the page's JSON endpoint over HTTP, or a saved
//! response on disk.

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

/// Datasette JSON response, `_shape=objects` style.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatasetteResponse {
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub ok: Option<bool>,
    pub next: Option<String>,
    pub truncated: bool,
}

impl DatasetteResponse {
    pub fn from_json(text: &str) -> Result<Self> {
        let response: Self = serde_json::from_str(text).wrap_err("response is not Datasette JSON")?;
        if response.ok == Some(false) {
            return Err(eyre!("Datasette reported an error for this query"));
        }
        Ok(response)
    }

    /// More rows exist than were returned.
    pub fn is_partial(&self) -> bool {
        self.next.is_some() || self.truncated
    }
}

/// JSON endpoint for a page: `origin + path + ".json" + query`, with
/// `_size=<page_size>` added when the query has no `_size`.
pub fn data_url(location: &Url, page_size: &str) -> Result<Url> {
    let path = location.path().trim_end_matches('/');
    if path.is_empty() {
        return Err(eyre!("{} does not name a Datasette page", location));
    }
    let mut url = location.clone();
    url.set_fragment(None);
    url.set_path(&format!("{}.json", path));
    if !location.query_pairs().any(|(k, _)| k == "_size") {
        url.query_pairs_mut().append_pair("_size", page_size);
    }
    Ok(url)
}

/// One fetch of the page's rows.
pub trait RowSource {
    fn fetch(&self, location: &Url) -> Result<DatasetteResponse>;
}

/// Fetches `<path>.json` from the Datasette server.
#[cfg(feature = "http")]
pub struct HttpSource {
    pub timeout: std::time::Duration,
    pub page_size: String,
}

#[cfg(feature = "http")]
impl RowSource for HttpSource {
    fn fetch(&self, location: &Url) -> Result<DatasetteResponse> {
        let url = data_url(location, &self.page_size)?;
        info!(%url, "fetching rows");
        let response = ureq::get(url.as_str())
            .timeout(self.timeout)
            .call()
            .wrap_err_with(|| format!("Could not fetch {}", url))?;
        let status = response.status();
        if status >= 400 {
            return Err(eyre!(
                "Server returned {} {}. Check the URL.",
                status,
                response.status_text()
            ));
        }
        let body = response
            .into_string()
            .wrap_err("Download failed while reading the response.")?;
        let parsed = DatasetteResponse::from_json(&body)?;
        info!(rows = parsed.rows.len(), partial = parsed.is_partial(), "rows fetched");
        Ok(parsed)
    }
}

/// Reads a saved JSON response instead of contacting the server.
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RowSource for FileSource {
    fn fetch(&self, _location: &Url) -> Result<DatasetteResponse> {
        info!(path = %self.path.display(), "reading rows from file");
        let text = std::fs::read_to_string(&self.path)?;
        DatasetteResponse::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn data_url_appends_json_and_size() {
        let u = data_url(&url("http://localhost:8001/db/benchmarks?gpu=H100#frag"), "max").unwrap();
        assert_eq!(u.as_str(), "http://localhost:8001/db/benchmarks.json?gpu=H100&_size=max");
    }

    #[test]
    fn data_url_keeps_existing_size() {
        let u = data_url(&url("http://h/db/-/query?sql=select+1&_size=10"), "max").unwrap();
        assert_eq!(u.as_str(), "http://h/db/-/query.json?sql=select+1&_size=10");
    }

    #[test]
    fn data_url_without_query() {
        let u = data_url(&url("http://h/db/t/"), "max").unwrap();
        assert_eq!(u.as_str(), "http://h/db/t.json?_size=max");
        assert!(data_url(&url("http://h/"), "max").is_err());
    }

    #[test]
    fn response_defaults_missing_fields() {
        let r = DatasetteResponse::from_json(r#"{"rows": [{"a": 1}]}"#).unwrap();
        assert_eq!(r.rows.len(), 1);
        assert!(!r.is_partial());
        let r = DatasetteResponse::from_json(r#"{"rows": [], "next": "abc"}"#).unwrap();
        assert!(r.is_partial());
        let r = DatasetteResponse::from_json(r#"{"rows": [], "next": null, "truncated": true}"#).unwrap();
        assert!(r.is_partial());
    }

    #[test]
    fn ok_false_is_an_error() {
        assert!(DatasetteResponse::from_json(r#"{"ok": false, "rows": []}"#).is_err());
        assert!(DatasetteResponse::from_json("<html>").is_err());
    }

    #[test]
    fn file_source_reads_response() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(&path, r#"{"ok": true, "rows": [{"a": 1}, {"a": 2}]}"#).unwrap();
        let r = FileSource::new(&path).fetch(&url("http://h/db/t")).unwrap();
        assert_eq!(r.rows.len(), 2);
    }
}
