mod common;

use common::url;
use datasette_plot::mark::{LineYOptions, Mark};
use datasette_plot::share::{marks_from_location, share_url, sync_host, PLOT_MARK_PARAM};
use datasette_plot::{Host, MemoryHost};

fn line() -> Mark {
    Mark::LineY(LineYOptions {
        x: Some("completed_request_rate".into()),
        y: Some("ttlt_p50".into()),
        stroke: Some("group_id".into()),
        tip: Some(false),
        hide_points: Some(true),
    })
}

#[test]
fn other_parameters_keep_their_order() {
    let here = url("https://example.test/stopwatch/-/query?sql=select+*+from+benchmarks&_plot-mark=old&_size=max");
    let link = share_url(&here, &[line()]);
    let keys: Vec<String> = link.query_pairs().map(|(k, _)| k.into_owned()).collect();
    assert_eq!(keys, vec!["sql", "_size", PLOT_MARK_PARAM]);
    assert_eq!(
        link.query_pairs().find(|(k, _)| k == "sql").unwrap().1,
        "select * from benchmarks"
    );
}

#[test]
fn one_parameter_per_mark_in_list_order() {
    let here = url("http://localhost:8001/stopwatch/benchmarks");
    let marks = vec![Mark::dot(Some("a".into()), Some("b".into())), line()];
    let link = share_url(&here, &marks);
    let encoded: Vec<String> = link
        .query_pairs()
        .filter(|(k, _)| k == PLOT_MARK_PARAM)
        .map(|(_, v)| v.into_owned())
        .collect();
    assert_eq!(encoded.len(), 2);
    assert!(encoded[0].starts_with(r#"{"mark":"dot""#));
    assert!(encoded[1].contains(r#""hidePoints":true"#));
    assert_eq!(marks_from_location(&link).unwrap().unwrap(), marks);
}

#[test]
fn empty_mark_list_drops_the_query() {
    let link = share_url(&url("http://h/db/t?_plot-mark=x"), &[]);
    assert_eq!(link.as_str(), "http://h/db/t");
    assert_eq!(marks_from_location(&link).unwrap(), None);
}

#[test]
fn malformed_mark_names_the_parameter() {
    let err = marks_from_location(&url(
        "http://h/db/t?_plot-mark=%7B%22mark%22%3A%22dot%22%2C%22options%22%3A%7B%7D%7D&_plot-mark=%7Bbroken",
    ))
    .unwrap_err();
    assert!(err.to_string().contains("#2"), "got: {}", err);
}

#[test]
fn host_navigates_only_on_change() {
    let mut host = MemoryHost::new(url("http://h/db/t"));
    let first = sync_host(&mut host, &[line()]);
    assert_eq!(host.location(), &first);
    assert_eq!(host.navigations(), 1);
    sync_host(&mut host, &[line()]);
    assert_eq!(host.navigations(), 1);
}
