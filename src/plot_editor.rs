//! Ordered mark list plus one editor per mark.
//!
//! Every change goes through here: editors hand back the mark they now
//! publish, the list entry is replaced and the revision bumps so the preview
//! knows to refresh.

use crate::dataset::{Column, Dataset};
use crate::mark::{Mark, MarkKind};
use crate::mark_editor::MarkEditor;
use tracing::debug;

/// Focusable field inside one mark's form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Kind,
    Channel(usize),
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Mark { index: usize, field: Field },
    AddMark,
}

pub struct PlotEditor {
    marks: Vec<Mark>,
    editors: Vec<MarkEditor>,
    columns: Vec<Column>,
    /// Default axes for a mark added to an empty list.
    inferred: (Option<String>, Option<String>),
    group_key: String,
    revision: u64,
    focus: Focus,
}

impl PlotEditor {
    /// Each initial mark is replaced by what its editor publishes, so the
    /// list always reflects the forms.
    pub fn new(initial: Vec<Mark>, dataset: &Dataset, group_key: &str) -> Self {
        let columns = dataset.columns.clone();
        let editors: Vec<MarkEditor> = initial
            .iter()
            .map(|m| MarkEditor::new(m, &columns, group_key))
            .collect();
        let marks = editors.iter().map(MarkEditor::publish).collect();
        let focus = if editors.is_empty() {
            Focus::AddMark
        } else {
            Focus::Mark {
                index: 0,
                field: Field::Kind,
            }
        };
        Self {
            marks,
            editors,
            columns,
            inferred: dataset.infer_axes(),
            group_key: group_key.to_string(),
            revision: 0,
            focus,
        }
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn editors(&self) -> &[MarkEditor] {
        &self.editors
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Bumped on every change to the mark list.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    fn bump(&mut self) {
        self.revision += 1;
        debug!(revision = self.revision, marks = self.marks.len(), "mark list changed");
    }

    fn apply(&mut self, index: usize, update: Option<Mark>) -> bool {
        match update {
            Some(mark) => {
                self.marks[index] = mark;
                self.bump();
                true
            }
            None => false,
        }
    }

    /// Append a dot mark. X/Y come from the last mark, or from column
    /// inference when the list is empty. Returns the new index.
    pub fn add_mark(&mut self) -> usize {
        let (x, y) = match self.marks.last() {
            Some(last) => (last.x().map(str::to_string), last.y().map(str::to_string)),
            None => self.inferred.clone(),
        };
        let editor = MarkEditor::new(&Mark::dot(x, y), &self.columns, &self.group_key);
        self.marks.push(editor.publish());
        self.editors.push(editor);
        self.bump();
        self.marks.len() - 1
    }

    pub fn delete_mark(&mut self, index: usize) -> bool {
        if index >= self.marks.len() {
            return false;
        }
        self.marks.remove(index);
        self.editors.remove(index);
        self.bump();
        self.clamp_focus();
        true
    }

    /// Replace the mark at `index` and sync its editor to it.
    pub fn update_mark(&mut self, index: usize, mark: Mark) -> bool {
        let Some(editor) = self.editors.get_mut(index) else {
            return false;
        };
        editor.sync(&mark, &self.columns);
        self.marks[index] = mark;
        self.bump();
        true
    }

    pub fn set_kind(&mut self, index: usize, kind: MarkKind) -> bool {
        let Some(editor) = self.editors.get_mut(index) else {
            return false;
        };
        let update = editor.set_kind(kind, &self.columns);
        if update.is_some() {
            self.clamp_focus();
        }
        self.apply(index, update)
    }

    pub fn toggle_channel(&mut self, index: usize, selector: usize) -> bool {
        let update = match self.editors.get_mut(index) {
            Some(editor) => editor.toggle(selector),
            None => return false,
        };
        self.apply(index, update)
    }

    pub fn cycle_channel(&mut self, index: usize, selector: usize, step: isize) -> bool {
        let update = match self.editors.get_mut(index) {
            Some(editor) => editor.cycle(selector, step),
            None => return false,
        };
        self.apply(index, update)
    }

    /// Flattened focus order: each mark's kind, channels and delete button,
    /// then the add button.
    fn focus_order(&self) -> Vec<Focus> {
        let mut order = Vec::new();
        for (index, editor) in self.editors.iter().enumerate() {
            order.push(Focus::Mark {
                index,
                field: Field::Kind,
            });
            for i in 0..editor.selectors().len() {
                order.push(Focus::Mark {
                    index,
                    field: Field::Channel(i),
                });
            }
            order.push(Focus::Mark {
                index,
                field: Field::Delete,
            });
        }
        order.push(Focus::AddMark);
        order
    }

    /// Move focus `step` positions, wrapping.
    pub fn move_focus(&mut self, step: isize) {
        let order = self.focus_order();
        let len = order.len() as isize;
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0) as isize;
        self.focus = order[(pos + step).rem_euclid(len) as usize];
    }

    /// Jump to the kind field of the next/previous mark.
    pub fn move_mark_focus(&mut self, step: isize) {
        let len = self.marks.len() as isize;
        if len == 0 {
            self.focus = Focus::AddMark;
            return;
        }
        let current = match self.focus {
            Focus::Mark { index, .. } => index as isize,
            Focus::AddMark => len,
        };
        self.focus = Focus::Mark {
            index: (current + step).rem_euclid(len) as usize,
            field: Field::Kind,
        };
    }

    fn clamp_focus(&mut self) {
        if !self.focus_order().contains(&self.focus) {
            self.focus = match self.focus {
                Focus::Mark { index, .. } if index < self.marks.len() => Focus::Mark {
                    index,
                    field: Field::Kind,
                },
                Focus::Mark { .. } if !self.marks.is_empty() => Focus::Mark {
                    index: self.marks.len() - 1,
                    field: Field::Kind,
                },
                _ => Focus::AddMark,
            };
        }
    }

    /// Step the focused field: kind and channel fields cycle through their
    /// choices. Returns whether the mark list changed.
    pub fn cycle_focused(&mut self, step: isize) -> bool {
        match self.focus {
            Focus::Mark {
                index,
                field: Field::Kind,
            } => {
                let kind = self.editors[index].kind().cycled(step);
                self.set_kind(index, kind)
            }
            Focus::Mark {
                index,
                field: Field::Channel(i),
            } => self.cycle_channel(index, i, step),
            _ => false,
        }
    }

    /// Activate the focused field: toggle a channel, press delete or add.
    pub fn activate_focused(&mut self) -> bool {
        match self.focus {
            Focus::Mark {
                index,
                field: Field::Channel(i),
            } => self.toggle_channel(index, i),
            Focus::Mark {
                index,
                field: Field::Delete,
            } => self.delete_mark(index),
            Focus::Mark {
                field: Field::Kind, ..
            } => self.cycle_focused(1),
            Focus::AddMark => {
                let index = self.add_mark();
                self.focus = Focus::Mark {
                    index,
                    field: Field::Kind,
                };
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::LabelTable;
    use crate::mark::{LineYOptions, DEFAULT_GROUP_KEY};
    use serde_json::json;

    fn dataset() -> Dataset {
        let rows: Vec<_> = json!([
            {"id": 1, "gpu": "H100", "rate": 1.0, "ttlt": 2.0},
            {"id": 2, "gpu": "A100", "rate": 2.0, "ttlt": 3.5}
        ])
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_object().unwrap().clone())
        .collect();
        Dataset::from_json_rows(&rows, &LabelTable::default()).unwrap()
    }

    fn editor(marks: Vec<Mark>) -> PlotEditor {
        PlotEditor::new(marks, &dataset(), DEFAULT_GROUP_KEY)
    }

    #[test]
    fn initial_marks_are_published_by_their_editors() {
        let pe = editor(vec![Mark::LineY(LineYOptions {
            x: Some("rate".into()),
            y: Some("ttlt".into()),
            ..Default::default()
        })]);
        let Mark::LineY(o) = &pe.marks()[0] else {
            panic!("expected line");
        };
        assert_eq!(o.stroke.as_deref(), Some(DEFAULT_GROUP_KEY));
        assert_eq!(o.hide_points, Some(false));
    }

    #[test]
    fn add_copies_axes_from_last_mark() {
        let mut pe = editor(vec![Mark::dot(Some("ttlt".into()), Some("rate".into()))]);
        let i = pe.add_mark();
        assert_eq!(pe.marks()[i].x(), Some("ttlt"));
        assert_eq!(pe.marks()[i].y(), Some("rate"));
        assert_eq!(pe.marks()[i].kind(), MarkKind::Dot);
    }

    #[test]
    fn add_to_empty_list_infers_axes() {
        let mut pe = editor(vec![]);
        assert_eq!(pe.focus(), Focus::AddMark);
        pe.add_mark();
        assert_eq!(pe.marks()[0].x(), Some("rate"));
        assert_eq!(pe.marks()[0].y(), Some("ttlt"));
    }

    #[test]
    fn editors_track_marks_through_add_and_delete() {
        let mut pe = editor(vec![Mark::dot(None, None)]);
        for _ in 0..3 {
            pe.add_mark();
            assert_eq!(pe.marks().len(), pe.editors().len());
        }
        while !pe.marks().is_empty() {
            assert!(pe.delete_mark(0));
            assert_eq!(pe.marks().len(), pe.editors().len());
        }
        assert!(!pe.delete_mark(0));
        assert_eq!(pe.focus(), Focus::AddMark);
    }

    #[test]
    fn changes_bump_revision() {
        let mut pe = editor(vec![Mark::dot(None, None)]);
        let r0 = pe.revision();
        assert!(pe.toggle_channel(0, 2));
        assert!(pe.revision() > r0);
        let r1 = pe.revision();
        assert!(!pe.set_kind(0, MarkKind::Dot));
        assert_eq!(pe.revision(), r1);
    }

    #[test]
    fn update_replaces_mark_and_editor() {
        let mut pe = editor(vec![Mark::dot(None, None)]);
        let bar = Mark::from_json(r#"{"mark":"bar-y","options":{"x":"gpu","y":"ttlt","tip":true}}"#)
            .unwrap();
        assert!(pe.update_mark(0, bar.clone()));
        assert_eq!(pe.marks()[0], bar);
        assert_eq!(pe.editors()[0].kind(), MarkKind::BarY);
        assert!(!pe.update_mark(5, bar));
    }

    #[test]
    fn update_of_same_kind_syncs_form() {
        let mut pe = editor(vec![Mark::dot(Some("rate".into()), Some("ttlt".into()))]);
        let filled = Mark::from_json(
            r#"{"mark":"dot","options":{"x":"ttlt","y":"rate","fill":"gpu","tip":true}}"#,
        )
        .unwrap();
        assert!(pe.update_mark(0, filled.clone()));
        let form = &pe.editors()[0];
        assert_eq!(form.selectors()[0].column(), Some("ttlt"));
        assert!(form.selectors()[2].is_shown());
        assert_eq!(form.publish(), filled);

        let grouped = Mark::from_json(
            r#"{"mark":"dot","options":{"x":"ttlt","y":"rate","fill":"group_id"}}"#,
        )
        .unwrap();
        assert!(pe.update_mark(0, grouped.clone()));
        assert_eq!(pe.editors()[0].selectors()[2].column(), None);
        assert_eq!(pe.editors()[0].publish(), grouped);
    }

    #[test]
    fn focus_walks_fields_and_add_button() {
        let mut pe = editor(vec![Mark::dot(None, None)]);
        // kind, x, y, fill, delete, add
        pe.move_focus(-1);
        assert_eq!(pe.focus(), Focus::AddMark);
        assert!(pe.activate_focused());
        assert_eq!(pe.marks().len(), 2);
        assert_eq!(
            pe.focus(),
            Focus::Mark {
                index: 1,
                field: Field::Kind
            }
        );
        pe.move_focus(4);
        assert_eq!(
            pe.focus(),
            Focus::Mark {
                index: 1,
                field: Field::Delete
            }
        );
        assert!(pe.activate_focused());
        assert_eq!(pe.marks().len(), 1);
        assert_eq!(
            pe.focus(),
            Focus::Mark {
                index: 0,
                field: Field::Kind
            }
        );
    }

    #[test]
    fn cycling_kind_field_switches_kind() {
        let mut pe = editor(vec![Mark::dot(Some("rate".into()), Some("ttlt".into()))]);
        assert!(pe.cycle_focused(-1));
        assert_eq!(pe.marks()[0].kind(), MarkKind::LineY);
        assert_eq!(pe.marks()[0].x(), Some("rate"));
    }
}
