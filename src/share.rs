//! `_plot-mark` query parameters: the share-URL encoding of the mark list.

use crate::mark::Mark;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use tracing::debug;
use url::Url;

/// Repeatable query parameter holding one JSON-encoded mark.
pub const PLOT_MARK_PARAM: &str = "_plot-mark";

/// Page location the widget is mounted in.
pub trait Host {
    fn location(&self) -> &Url;

    /// Point the host at `url`. Used for share-link updates.
    fn navigate(&mut self, url: Url);
}

/// Host that only remembers where it has been told to go.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    location: Url,
    navigations: usize,
}

impl MemoryHost {
    pub fn new(location: Url) -> Self {
        Self {
            location,
            navigations: 0,
        }
    }

    pub fn navigations(&self) -> usize {
        self.navigations
    }
}

impl Host for MemoryHost {
    fn location(&self) -> &Url {
        &self.location
    }

    fn navigate(&mut self, url: Url) {
        if url != self.location {
            debug!(%url, "host location updated");
            self.location = url;
            self.navigations += 1;
        }
    }
}

/// `location` with every `_plot-mark` removed and one appended per mark, in
/// list order. Other parameters keep their relative order.
pub fn share_url(location: &Url, marks: &[Mark]) -> Url {
    let kept: Vec<(String, String)> = location
        .query_pairs()
        .filter(|(k, _)| k != PLOT_MARK_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = location.clone();
    url.set_query(None);
    if !kept.is_empty() || !marks.is_empty() {
        let mut query = url.query_pairs_mut();
        query.extend_pairs(kept);
        for mark in marks {
            query.append_pair(PLOT_MARK_PARAM, &mark.to_json());
        }
    }
    url
}

/// Marks encoded in `location`, or `None` when it carries no `_plot-mark`.
pub fn marks_from_location(location: &Url) -> Result<Option<Vec<Mark>>> {
    let encoded: Vec<String> = location
        .query_pairs()
        .filter(|(k, _)| k == PLOT_MARK_PARAM)
        .map(|(_, v)| v.into_owned())
        .collect();
    if encoded.is_empty() {
        return Ok(None);
    }
    encoded
        .iter()
        .enumerate()
        .map(|(i, json)| {
            Mark::from_json(json)
                .wrap_err_with(|| format!("invalid {} parameter #{}: {}", PLOT_MARK_PARAM, i + 1, json))
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// Push the share URL for `marks` into `host`.
pub fn sync_host<H: Host + ?Sized>(host: &mut H, marks: &[Mark]) -> Url {
    let url = share_url(host.location(), marks);
    host.navigate(url.clone());
    url
}
