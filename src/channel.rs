//! Channel selector: binds one visual channel to a column or a flag.
//!
//! Required selectors are always shown and bound. Optional selectors toggle
//! between hidden (value absent) and shown (value bound).

use crate::dataset::Column;

/// Visual channel a selector edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    X,
    Y,
    Fill,
    HidePoints,
}

impl Channel {
    pub fn title(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Fill => "Fill",
            Self::HidePoints => "Hide points",
        }
    }
}

/// Value bound to a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelValue {
    Column(String),
    Flag(bool),
}

impl ChannelValue {
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Column(id) => Some(id),
            Self::Flag(_) => None,
        }
    }

    pub fn flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            Self::Column(_) => None,
        }
    }

    /// Empty column ids and `false` count as "no value" for hidden selectors.
    fn is_truthy(&self) -> bool {
        match self {
            Self::Column(id) => !id.is_empty(),
            Self::Flag(b) => *b,
        }
    }
}

/// Closed set of values a selector offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choices {
    Columns(Vec<Column>),
    Flag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSelector {
    pub channel: Channel,
    pub required: bool,
    choices: Choices,
    value: Option<ChannelValue>,
    shown: bool,
}

impl ChannelSelector {
    /// A column value outside `choices` is dropped before the selector is shown.
    pub fn new(
        channel: Channel,
        required: bool,
        choices: Choices,
        value: Option<ChannelValue>,
    ) -> Self {
        let value = value.filter(|v| Self::accepts(&choices, v));
        let shown = required || value.is_some();
        let mut selector = Self {
            channel,
            required,
            choices,
            value,
            shown,
        };
        selector.reconcile();
        selector
    }

    pub fn title(&self) -> &'static str {
        self.channel.title()
    }

    pub fn value(&self) -> Option<&ChannelValue> {
        self.value.as_ref()
    }

    pub fn column(&self) -> Option<&str> {
        self.value.as_ref().and_then(ChannelValue::column)
    }

    pub fn flag(&self) -> Option<bool> {
        self.value.as_ref().and_then(ChannelValue::flag)
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// Label of the bound value, as shown in the form.
    pub fn value_label(&self) -> Option<String> {
        match (&self.value, &self.choices) {
            (Some(ChannelValue::Column(id)), Choices::Columns(cols)) => Some(
                cols.iter()
                    .find(|c| &c.id == id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| id.clone()),
            ),
            (Some(ChannelValue::Flag(b)), _) => Some(if *b { "☑" } else { "☐" }.to_string()),
            _ => None,
        }
    }

    fn accepts(choices: &Choices, value: &ChannelValue) -> bool {
        match (choices, value) {
            (Choices::Columns(cols), ChannelValue::Column(id)) => cols.iter().any(|c| &c.id == id),
            (Choices::Flag, ChannelValue::Flag(_)) => true,
            _ => false,
        }
    }

    fn default_value(&self) -> Option<ChannelValue> {
        match &self.choices {
            Choices::Columns(cols) => cols.first().map(|c| ChannelValue::Column(c.id.clone())),
            Choices::Flag => Some(ChannelValue::Flag(false)),
        }
    }

    /// Flip visibility. Hiding clears the value; showing binds the first choice.
    /// Returns whether anything changed (required selectors never hide).
    pub fn toggle(&mut self) -> bool {
        if self.required {
            return false;
        }
        if self.shown {
            self.shown = false;
            self.value = None;
        } else {
            self.shown = true;
            self.value = self.default_value();
        }
        self.reconcile();
        true
    }

    /// Bind `value` if the selector is shown and the value is one of its choices.
    pub fn select(&mut self, value: ChannelValue) -> bool {
        if !self.shown || !Self::accepts(&self.choices, &value) || self.value.as_ref() == Some(&value) {
            return false;
        }
        self.value = Some(value);
        true
    }

    /// Move the selection `step` entries through the choice set, wrapping.
    /// Flags flip regardless of the step.
    pub fn cycle(&mut self, step: isize) -> bool {
        if !self.shown {
            return false;
        }
        let next = match &self.choices {
            Choices::Flag => ChannelValue::Flag(!self.flag().unwrap_or(false)),
            Choices::Columns(cols) => {
                if cols.is_empty() {
                    return false;
                }
                let len = cols.len() as isize;
                let current = self
                    .column()
                    .and_then(|id| cols.iter().position(|c| c.id == id));
                let idx = match current {
                    Some(i) => (i as isize + step).rem_euclid(len) as usize,
                    None => 0,
                };
                ChannelValue::Column(cols[idx].id.clone())
            }
        };
        self.select(next)
    }

    /// Push a value from upstream state, then re-run the consistency pass.
    pub fn sync(&mut self, value: Option<ChannelValue>) {
        self.value = value.filter(|v| Self::accepts(&self.choices, v));
        if self.value.as_ref().is_some_and(ChannelValue::is_truthy) {
            self.shown = true;
        }
        self.reconcile();
    }

    /// Consistency pass: a hidden selector without a (truthy) value asserts
    /// "no value"; a shown required selector without a value takes the first
    /// choice.
    pub fn reconcile(&mut self) {
        if !self.shown && !self.value.as_ref().is_some_and(ChannelValue::is_truthy) {
            self.value = None;
        }
        if self.shown && self.required && self.value.is_none() {
            self.value = self.default_value();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(ids: &[&str]) -> Choices {
        Choices::Columns(
            ids.iter()
                .map(|id| Column {
                    id: id.to_string(),
                    name: id.to_uppercase(),
                    numeric: false,
                })
                .collect(),
        )
    }

    #[test]
    fn required_is_shown_and_bound() {
        let sel = ChannelSelector::new(Channel::X, true, cols(&["a", "b"]), None);
        assert!(sel.is_shown());
        assert_eq!(sel.column(), Some("a"));
    }

    #[test]
    fn required_cannot_hide() {
        let mut sel = ChannelSelector::new(
            Channel::Y,
            true,
            cols(&["a", "b"]),
            Some(ChannelValue::Column("b".into())),
        );
        assert!(!sel.toggle());
        assert!(sel.is_shown());
        assert_eq!(sel.column(), Some("b"));
    }

    #[test]
    fn optional_starts_hidden_without_value() {
        let sel = ChannelSelector::new(Channel::Fill, false, cols(&["g"]), None);
        assert!(!sel.is_shown());
        assert!(sel.value().is_none());
    }

    #[test]
    fn optional_starts_shown_with_value() {
        let sel = ChannelSelector::new(
            Channel::Fill,
            false,
            cols(&["g", "h"]),
            Some(ChannelValue::Column("h".into())),
        );
        assert!(sel.is_shown());
        assert_eq!(sel.value_label().as_deref(), Some("H"));
    }

    #[test]
    fn show_binds_first_choice_and_hide_clears() {
        let mut sel = ChannelSelector::new(Channel::Fill, false, cols(&["g", "h"]), None);
        assert!(sel.toggle());
        assert_eq!(sel.column(), Some("g"));
        assert!(sel.cycle(1));
        assert_eq!(sel.column(), Some("h"));
        assert!(sel.toggle());
        assert!(!sel.is_shown());
        assert!(sel.value().is_none());
    }

    #[test]
    fn show_hide_round_trip_leaves_value_absent() {
        let mut sel = ChannelSelector::new(Channel::Fill, false, cols(&["g"]), None);
        for _ in 0..3 {
            sel.toggle();
            sel.toggle();
            assert!(sel.value().is_none());
            assert!(!sel.is_shown());
        }
    }

    #[test]
    fn select_rejects_values_outside_choices() {
        let mut sel = ChannelSelector::new(Channel::X, true, cols(&["a", "b"]), None);
        assert!(!sel.select(ChannelValue::Column("zzz".into())));
        assert!(!sel.select(ChannelValue::Flag(true)));
        assert_eq!(sel.column(), Some("a"));
    }

    #[test]
    fn hidden_selector_ignores_select() {
        let mut sel = ChannelSelector::new(Channel::Fill, false, cols(&["g"]), None);
        assert!(!sel.select(ChannelValue::Column("g".into())));
        assert!(sel.value().is_none());
    }

    #[test]
    fn unknown_initial_column_is_dropped() {
        let sel = ChannelSelector::new(
            Channel::X,
            true,
            cols(&["a"]),
            Some(ChannelValue::Column("gone".into())),
        );
        assert_eq!(sel.column(), Some("a"));
        let sel = ChannelSelector::new(
            Channel::Fill,
            false,
            cols(&["a"]),
            Some(ChannelValue::Column("gone".into())),
        );
        assert!(!sel.is_shown());
        assert!(sel.value().is_none());
    }

    #[test]
    fn flag_cycles_and_defaults_false() {
        let mut sel = ChannelSelector::new(Channel::HidePoints, true, Choices::Flag, None);
        assert_eq!(sel.flag(), Some(false));
        sel.cycle(1);
        assert_eq!(sel.flag(), Some(true));
        sel.cycle(-1);
        assert_eq!(sel.flag(), Some(false));
    }

    #[test]
    fn sync_of_falsy_value_into_hidden_selector_clears_it() {
        let mut sel = ChannelSelector::new(Channel::Fill, false, cols(&["g"]), None);
        sel.sync(Some(ChannelValue::Column(String::new())));
        assert!(sel.value().is_none());
        sel.sync(Some(ChannelValue::Column("g".into())));
        assert!(sel.is_shown());
        assert_eq!(sel.column(), Some("g"));
    }

    #[test]
    fn required_without_choices_stays_unbound() {
        let sel = ChannelSelector::new(Channel::X, true, cols(&[]), None);
        assert!(sel.is_shown());
        assert!(sel.value().is_none());
    }
}
