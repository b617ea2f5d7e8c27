#![allow(dead_code)]

use datasette_plot::dataset::{Dataset, LabelTable};
use datasette_plot::source::{DatasetteResponse, FileSource};
use datasette_plot::RowSource;
use std::path::PathBuf;
use url::Url;

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

pub fn source(name: &str) -> FileSource {
    FileSource::new(fixture(name))
}

pub fn response(name: &str) -> DatasetteResponse {
    source(name)
        .fetch(&url("http://localhost:8001/stopwatch/benchmarks"))
        .expect("fixture response")
}

pub fn benchmarks() -> Dataset {
    Dataset::from_json_rows(
        &response("benchmarks.json").rows,
        &LabelTable::with_overrides(&Default::default()),
    )
    .expect("fixture dataset")
}

pub fn url(s: &str) -> Url {
    Url::parse(s).expect("valid url")
}
