//! Startup for one page location: find the mount point, restore marks from
//! the URL, fetch rows and build the dataset.

use crate::dataset::{Dataset, LabelTable};
use crate::mark::{BarYOptions, DotOptions, LineYOptions, Mark, MarkKind};
use crate::share::marks_from_location;
use crate::source::RowSource;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

/// Host form the plot is mounted after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountPoint {
    /// Custom SQL query page.
    SqlForm,
    /// Table page with the filter form.
    FiltersForm,
}

impl MountPoint {
    /// Query pages win over table pages; anything else has no form to mount after.
    pub fn locate(location: &Url) -> Option<Self> {
        let segments: Vec<&str> = location
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let is_query = location.query_pairs().any(|(k, _)| k == "sql")
            || segments.windows(2).any(|w| w == ["-", "query"]);
        if is_query {
            Some(Self::SqlForm)
        } else if segments.len() >= 2 {
            Some(Self::FiltersForm)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SqlForm => "SQL query",
            Self::FiltersForm => "Table filters",
        }
    }
}

/// A canned location offered on matching hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    /// Absolute, or relative to the current location.
    pub url: String,
    /// Offered only when the location's host equals this.
    pub host: String,
    /// ...and its raw query string contains this.
    #[serde(default)]
    pub contains: String,
}

impl Preset {
    pub fn matches(&self, location: &Url) -> bool {
        location.host_str() == Some(self.host.as_str())
            && location.query().unwrap_or_default().contains(&self.contains)
    }

    pub fn resolve(&self, location: &Url) -> Result<Url> {
        location
            .join(&self.url)
            .map_err(|e| eyre!("Preset '{}' has an invalid URL: {}", self.name, e))
    }
}

/// Presets offered for `location`, in configured order.
pub fn sample_presets<'a>(location: &Url, presets: &'a [Preset]) -> Vec<&'a Preset> {
    presets.iter().filter(|p| p.matches(location)).collect()
}

#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    pub group_key: String,
    pub default_mark: MarkKind,
    pub default_x: String,
    pub default_y: String,
    pub labels: LabelTable,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            group_key: crate::mark::DEFAULT_GROUP_KEY.to_string(),
            default_mark: MarkKind::LineY,
            default_x: "completed_request_rate".to_string(),
            default_y: "ttlt_p50".to_string(),
            labels: LabelTable::with_overrides(&Default::default()),
        }
    }
}

impl BootstrapOptions {
    /// Mark shown when the location carries none.
    pub fn default_mark(&self) -> Mark {
        let x = Some(self.default_x.clone());
        let y = Some(self.default_y.clone());
        match self.default_mark {
            MarkKind::Dot => Mark::Dot(DotOptions {
                x,
                y,
                ..Default::default()
            }),
            MarkKind::BarY => Mark::BarY(BarYOptions {
                x,
                y,
                ..Default::default()
            }),
            MarkKind::LineY => Mark::LineY(LineYOptions {
                x,
                y,
                stroke: Some(self.group_key.clone()),
                ..Default::default()
            }),
        }
    }
}

/// Everything needed to mount the plot for one location.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub location: Url,
    pub mount: MountPoint,
    pub dataset: Dataset,
    pub marks: Vec<Mark>,
    /// Shown when the server returned only part of the result.
    pub banner: Option<String>,
}

pub fn bootstrap(
    location: &Url,
    source: &dyn RowSource,
    options: &BootstrapOptions,
) -> Result<Bootstrap> {
    let mount = MountPoint::locate(location).ok_or_else(|| {
        eyre!(
            "{} is not a Datasette table or query page; nowhere to mount the plot",
            location
        )
    })?;
    let marks = match marks_from_location(location)? {
        Some(marks) => {
            info!(count = marks.len(), "restored marks from URL");
            marks
        }
        None => vec![options.default_mark()],
    };

    let response = source.fetch(location)?;
    let dataset = Dataset::from_json_rows(&response.rows, &options.labels)?;
    let banner = response.is_partial().then(|| {
        warn!(rows = dataset.rows.len(), "partial result");
        format!(
            "Warning: not all table rows returned, only {} rows",
            dataset.rows.len()
        )
    });
    info!(
        rows = dataset.rows.len(),
        columns = dataset.columns.len(),
        mount = mount.as_str(),
        "bootstrapped"
    );

    Ok(Bootstrap {
        location: location.clone(),
        mount,
        dataset,
        marks,
        banner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DatasetteResponse;

    struct Fixed(&'static str);

    impl RowSource for Fixed {
        fn fetch(&self, _location: &Url) -> Result<DatasetteResponse> {
            DatasetteResponse::from_json(self.0)
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn mount_point_detection() {
        assert_eq!(
            MountPoint::locate(&url("http://h/db/-/query?sql=select+1")),
            Some(MountPoint::SqlForm)
        );
        assert_eq!(
            MountPoint::locate(&url("http://h/db?sql=select+1")),
            Some(MountPoint::SqlForm)
        );
        assert_eq!(
            MountPoint::locate(&url("http://h/db/benchmarks")),
            Some(MountPoint::FiltersForm)
        );
        assert_eq!(MountPoint::locate(&url("http://h/db")), None);
        assert_eq!(MountPoint::locate(&url("http://h/")), None);
    }

    #[test]
    fn default_mark_is_line() {
        let b = bootstrap(
            &url("http://h/db/t"),
            &Fixed(r#"{"rows": [{"completed_request_rate": 1, "ttlt_p50": 2}]}"#),
            &BootstrapOptions::default(),
        )
        .unwrap();
        assert_eq!(
            b.marks[0].to_json(),
            r#"{"mark":"line-y","options":{"x":"completed_request_rate","y":"ttlt_p50","stroke":"group_id"}}"#
        );
        assert!(b.banner.is_none());
        assert_eq!(b.dataset.columns[1].name, "Time to last token (seconds, P50)");
    }

    #[test]
    fn partial_result_sets_banner() {
        let b = bootstrap(
            &url("http://h/db/t"),
            &Fixed(r#"{"rows": [{"a": 1}, {"a": 2}], "next": "2"}"#),
            &BootstrapOptions::default(),
        )
        .unwrap();
        assert_eq!(
            b.banner.as_deref(),
            Some("Warning: not all table rows returned, only 2 rows")
        );
    }

    #[test]
    fn failures() {
        let opts = BootstrapOptions::default();
        let rows = Fixed(r#"{"rows": [{"a": 1}]}"#);
        assert!(bootstrap(&url("http://h/db"), &rows, &opts).is_err());
        assert!(bootstrap(&url("http://h/db/t?_plot-mark=oops"), &rows, &opts).is_err());
        assert!(bootstrap(&url("http://h/db/t"), &Fixed(r#"{"rows": []}"#), &opts).is_err());
    }

    #[test]
    fn presets_match_host_and_query() {
        let presets = vec![Preset {
            name: "All".into(),
            url: "/stopwatch/-/query?sql=select+*+from+benchmarks".into(),
            host: "example.test".into(),
            contains: "from+benchmarks".into(),
        }];
        let here = url("https://example.test/stopwatch/-/query?sql=select+*+from+benchmarks+where+x");
        let matched = sample_presets(&here, &presets);
        assert_eq!(matched.len(), 1);
        assert_eq!(
            matched[0].resolve(&here).unwrap().as_str(),
            "https://example.test/stopwatch/-/query?sql=select+*+from+benchmarks"
        );
        assert!(sample_presets(&url("https://other.test/x/y?sql=from+benchmarks"), &presets).is_empty());
        assert!(sample_presets(&url("https://example.test/db/t"), &presets).is_empty());
    }
}
