mod common;

use common::{benchmarks, url};
use datasette_plot::channel::{Channel, ChannelValue};
use datasette_plot::mark::{BarYOptions, DotOptions, Mark, MarkKind, DEFAULT_GROUP_KEY};
use datasette_plot::plot_editor::{Field, Focus};
use datasette_plot::share::{marks_from_location, share_url};
use datasette_plot::PlotEditor;

fn columns_of(editor: &PlotEditor, index: usize) -> (Option<String>, Option<String>) {
    let mark = &editor.marks()[index];
    (mark.x().map(str::to_string), mark.y().map(str::to_string))
}

#[test]
fn restored_marks_are_normalized_by_their_editors() {
    let ds = benchmarks();
    let editor = PlotEditor::new(
        vec![Mark::Dot(DotOptions {
            x: Some("completed_request_rate".into()),
            y: Some("ttlt_p50".into()),
            fill: Some("gpu".into()),
            tip: Some(false),
        })],
        &ds,
        DEFAULT_GROUP_KEY,
    );
    assert_eq!(editor.revision(), 0);
    assert_eq!(
        editor.marks()[0].to_json(),
        r#"{"mark":"dot","options":{"x":"completed_request_rate","y":"ttlt_p50","fill":"gpu","tip":false}}"#
    );
}

#[test]
fn stale_columns_fall_back_to_first_choice() {
    let ds = benchmarks();
    let editor = PlotEditor::new(
        vec![Mark::dot(Some("dropped_column".into()), Some("ttft_p50".into()))],
        &ds,
        DEFAULT_GROUP_KEY,
    );
    // First numeric column in declaration order
    assert_eq!(
        columns_of(&editor, 0),
        (Some("id".into()), Some("ttft_p50".into()))
    );
}

#[test]
fn added_mark_copies_axes_of_last_mark() {
    let ds = benchmarks();
    let mut editor = PlotEditor::new(
        vec![Mark::dot(Some("ttft_p50".into()), Some("ttlt_p50".into()))],
        &ds,
        DEFAULT_GROUP_KEY,
    );
    let index = editor.add_mark();
    assert_eq!(index, 1);
    assert_eq!(editor.revision(), 1);
    assert_eq!(columns_of(&editor, 1), columns_of(&editor, 0));
    assert_eq!(editor.marks()[1].color(), Some(DEFAULT_GROUP_KEY));
}

#[test]
fn first_mark_uses_inferred_axes() {
    let ds = benchmarks();
    let mut editor = PlotEditor::new(Vec::new(), &ds, DEFAULT_GROUP_KEY);
    assert_eq!(editor.focus(), Focus::AddMark);
    assert!(editor.activate_focused());
    assert_eq!(
        columns_of(&editor, 0),
        (Some("completed_request_rate".into()), Some("ttlt_p50".into()))
    );
    assert_eq!(
        editor.focus(),
        Focus::Mark {
            index: 0,
            field: Field::Kind
        }
    );
}

#[test]
fn switching_to_bar_rebinds_x_to_a_category() {
    let ds = benchmarks();
    let mut editor = PlotEditor::new(
        vec![Mark::dot(Some("completed_request_rate".into()), Some("ttlt_p50".into()))],
        &ds,
        DEFAULT_GROUP_KEY,
    );
    assert!(editor.set_kind(0, MarkKind::BarY));
    assert_eq!(
        editor.marks()[0],
        Mark::BarY(BarYOptions {
            x: Some("model".into()),
            y: Some("ttlt_p50".into()),
            fill: None,
            tip: Some(true),
        })
    );
    assert!(!editor.set_kind(0, MarkKind::BarY));
    assert_eq!(editor.revision(), 1);
}

#[test]
fn fill_toggle_and_cycle() {
    let ds = benchmarks();
    let mut editor = PlotEditor::new(
        vec![Mark::dot(Some("completed_request_rate".into()), Some("ttlt_p50".into()))],
        &ds,
        DEFAULT_GROUP_KEY,
    );
    let fill = editor.editors()[0]
        .selectors()
        .iter()
        .position(|s| s.channel == Channel::Fill)
        .unwrap();
    assert!(!editor.editors()[0].selectors()[fill].is_shown());

    assert!(editor.toggle_channel(0, fill));
    assert_eq!(editor.marks()[0].color(), Some("model"));
    assert!(editor.cycle_channel(0, fill, 2));
    assert_eq!(editor.marks()[0].color(), Some("gpu"));

    assert!(editor.toggle_channel(0, fill));
    assert_eq!(editor.marks()[0].color(), Some(DEFAULT_GROUP_KEY));
    assert_eq!(
        editor.editors()[0].selectors()[fill].value(),
        None::<&ChannelValue>
    );
}

#[test]
fn deleting_keeps_focus_in_range() {
    let ds = benchmarks();
    let mut editor = PlotEditor::new(
        vec![
            Mark::dot(Some("ttft_p50".into()), Some("ttlt_p50".into())),
            Mark::dot(Some("ttft_p50".into()), Some("ttlt_p50".into())),
        ],
        &ds,
        DEFAULT_GROUP_KEY,
    );
    editor.move_mark_focus(-1);
    assert!(matches!(editor.focus(), Focus::Mark { index: 1, .. }));
    assert!(editor.delete_mark(1));
    assert!(matches!(editor.focus(), Focus::Mark { index: 0, .. }));
    assert!(editor.delete_mark(0));
    assert_eq!(editor.focus(), Focus::AddMark);
    assert!(!editor.delete_mark(0));
}

#[test]
fn edited_marks_survive_a_share_link() {
    let ds = benchmarks();
    let mut editor = PlotEditor::new(
        vec![Mark::dot(Some("completed_request_rate".into()), Some("ttlt_p50".into()))],
        &ds,
        DEFAULT_GROUP_KEY,
    );
    editor.add_mark();
    editor.set_kind(1, MarkKind::LineY);

    let link = share_url(&url("http://localhost:8001/stopwatch/benchmarks?gpu=H100"), editor.marks());
    let restored = marks_from_location(&link).unwrap().unwrap();
    let reopened = PlotEditor::new(restored, &ds, DEFAULT_GROUP_KEY);
    assert_eq!(reopened.marks(), editor.marks());
}
