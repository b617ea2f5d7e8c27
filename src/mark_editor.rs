//! Per-mark editing form: a kind switcher plus channel selectors whose
//! choices are filtered by column numeric-ness.

use crate::channel::{Channel, ChannelSelector, ChannelValue, Choices};
use crate::dataset::Column;
use crate::mark::{BarYOptions, DotOptions, LineYOptions, Mark, MarkKind};

/// Which columns a channel may bind under a mark kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter {
    Numeric,
    Categorical,
}

fn filter_for(kind: MarkKind, channel: Channel) -> Option<Filter> {
    match (kind, channel) {
        (MarkKind::BarY, Channel::X) => Some(Filter::Categorical),
        (_, Channel::X) | (_, Channel::Y) => Some(Filter::Numeric),
        (MarkKind::Dot | MarkKind::BarY, Channel::Fill) => Some(Filter::Categorical),
        _ => None,
    }
}

fn eligible(columns: &[Column], filter: Filter) -> Vec<Column> {
    columns
        .iter()
        .filter(|c| c.numeric == (filter == Filter::Numeric))
        .cloned()
        .collect()
}

/// Channels a kind's form shows, in display order.
pub fn channels_for(kind: MarkKind) -> &'static [Channel] {
    match kind {
        MarkKind::Dot | MarkKind::BarY => &[Channel::X, Channel::Y, Channel::Fill],
        MarkKind::LineY => &[Channel::X, Channel::Y, Channel::HidePoints],
    }
}

type FormValues = (
    Option<ChannelValue>,
    Option<ChannelValue>,
    Option<ChannelValue>,
    Option<bool>,
);

#[derive(Debug, Clone)]
pub struct MarkEditor {
    kind: MarkKind,
    selectors: Vec<ChannelSelector>,
    /// Dot `tip` is carried through untouched.
    tip: Option<bool>,
    group_key: String,
}

impl MarkEditor {
    /// Seed an editor from a mark. Columns outside a channel's choices are
    /// dropped; required channels then fall back to their first choice.
    pub fn new(mark: &Mark, columns: &[Column], group_key: &str) -> Self {
        let (x, y, extra, tip) = Self::values(mark, group_key);
        let kind = mark.kind();
        Self {
            kind,
            selectors: Self::build_selectors(kind, columns, x, y, extra),
            tip,
            group_key: group_key.to_string(),
        }
    }

    /// X, Y, the kind's extra channel and `tip`, as form values. A dot fill
    /// equal to the grouping key counts as unset.
    fn values(mark: &Mark, group_key: &str) -> FormValues {
        let col = |s: Option<&str>| s.map(|v| ChannelValue::Column(v.to_string()));
        match mark {
            Mark::Dot(o) => {
                let fill = o.fill.as_deref().filter(|f| *f != group_key);
                (col(o.x.as_deref()), col(o.y.as_deref()), col(fill), o.tip)
            }
            Mark::BarY(o) => (
                col(o.x.as_deref()),
                col(o.y.as_deref()),
                col(o.fill.as_deref()),
                o.tip,
            ),
            Mark::LineY(o) => (
                col(o.x.as_deref()),
                col(o.y.as_deref()),
                Some(ChannelValue::Flag(o.hide_points.unwrap_or(false))),
                o.tip,
            ),
        }
    }

    fn build_selectors(
        kind: MarkKind,
        columns: &[Column],
        x: Option<ChannelValue>,
        y: Option<ChannelValue>,
        extra: Option<ChannelValue>,
    ) -> Vec<ChannelSelector> {
        channels_for(kind)
            .iter()
            .map(|&channel| {
                let choices = match filter_for(kind, channel) {
                    Some(f) => Choices::Columns(eligible(columns, f)),
                    None => Choices::Flag,
                };
                let (required, value) = match channel {
                    Channel::X => (true, x.clone()),
                    Channel::Y => (true, y.clone()),
                    Channel::Fill => (false, extra.clone()),
                    Channel::HidePoints => (true, extra.clone()),
                };
                ChannelSelector::new(channel, required, choices, value)
            })
            .collect()
    }

    pub fn kind(&self) -> MarkKind {
        self.kind
    }

    pub fn selectors(&self) -> &[ChannelSelector] {
        &self.selectors
    }

    fn column_of(&self, channel: Channel) -> Option<String> {
        self.selectors
            .iter()
            .find(|s| s.channel == channel)
            .and_then(|s| s.column())
            .map(str::to_string)
    }

    fn flag_of(&self, channel: Channel) -> Option<bool> {
        self.selectors
            .iter()
            .find(|s| s.channel == channel)
            .and_then(|s| s.flag())
    }

    /// Full options for the current form state.
    pub fn publish(&self) -> Mark {
        let x = self.column_of(Channel::X);
        let y = self.column_of(Channel::Y);
        match self.kind {
            MarkKind::Dot => Mark::Dot(DotOptions {
                x,
                y,
                fill: self
                    .column_of(Channel::Fill)
                    .or_else(|| Some(self.group_key.clone())),
                tip: self.tip,
            }),
            MarkKind::BarY => Mark::BarY(BarYOptions {
                x,
                y,
                fill: self.column_of(Channel::Fill),
                tip: Some(true),
            }),
            MarkKind::LineY => Mark::LineY(LineYOptions {
                x,
                y,
                stroke: Some(self.group_key.clone()),
                tip: Some(false),
                hide_points: Some(self.flag_of(Channel::HidePoints).unwrap_or(false)),
            }),
        }
    }

    /// Switch kind. X/Y survive when still eligible under the new kind;
    /// kind-specific fields reset. Returns the new mark, or `None` when the
    /// kind is unchanged.
    pub fn set_kind(&mut self, kind: MarkKind, columns: &[Column]) -> Option<Mark> {
        if kind == self.kind {
            return None;
        }
        let col = |c: Option<String>| c.map(ChannelValue::Column);
        let x = col(self.column_of(Channel::X));
        let y = col(self.column_of(Channel::Y));
        self.kind = kind;
        self.tip = None;
        self.selectors = Self::build_selectors(kind, columns, x, y, None);
        Some(self.publish())
    }

    /// Show or hide the selector at `index`.
    pub fn toggle(&mut self, index: usize) -> Option<Mark> {
        let sel = self.selectors.get_mut(index)?;
        sel.toggle().then(|| self.publish())
    }

    /// Step the selector at `index` through its choices.
    pub fn cycle(&mut self, index: usize, step: isize) -> Option<Mark> {
        let sel = self.selectors.get_mut(index)?;
        sel.cycle(step).then(|| self.publish())
    }

    /// Bring the form in line with `mark`. A mark of another kind rebuilds
    /// the form; otherwise each selector takes the mark's value for its
    /// channel.
    pub fn sync(&mut self, mark: &Mark, columns: &[Column]) {
        if mark.kind() != self.kind {
            *self = Self::new(mark, columns, &self.group_key);
            return;
        }
        let (x, y, extra, tip) = Self::values(mark, &self.group_key);
        for sel in &mut self.selectors {
            let value = match sel.channel {
                Channel::X => x.clone(),
                Channel::Y => y.clone(),
                Channel::Fill | Channel::HidePoints => extra.clone(),
            };
            sel.sync(value);
        }
        self.tip = tip;
    }
}
