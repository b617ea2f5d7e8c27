//! Mark kinds and their options, as encoded in `_plot-mark` parameters.
//!
//! A mark serializes as `{"mark": "dot" | "bar-y" | "line-y", "options": {...}}`.
//! Unset options are omitted from the JSON.

use serde::{Deserialize, Serialize};

/// Constant channel value used to colour series when no column is bound.
pub const DEFAULT_GROUP_KEY: &str = "group_id";

/// Chart primitive a mark renders as.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkKind {
    #[default]
    #[serde(rename = "dot")]
    Dot,
    #[serde(rename = "bar-y")]
    BarY,
    #[serde(rename = "line-y")]
    LineY,
}

impl MarkKind {
    pub const ALL: [Self; 3] = [Self::Dot, Self::BarY, Self::LineY];

    /// Label shown in the kind switcher.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dot => "Dot",
            Self::BarY => "Bar (y)",
            Self::LineY => "Line (y)",
        }
    }

    /// Identifier used in URLs and config files.
    pub fn id(self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::BarY => "bar-y",
            Self::LineY => "line-y",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }

    /// Kind `step` positions away in the switcher, wrapping around.
    pub fn cycled(self, step: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let idx = Self::ALL.iter().position(|&k| k == self).unwrap_or(0) as isize;
        Self::ALL[(idx + step).rem_euclid(len) as usize]
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DotOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<bool>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarYOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<bool>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineYOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_points: Option<bool>,
}

/// One entry of the mark list: a kind and its kind-specific options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mark", content = "options")]
pub enum Mark {
    #[serde(rename = "dot")]
    Dot(DotOptions),
    #[serde(rename = "bar-y")]
    BarY(BarYOptions),
    #[serde(rename = "line-y")]
    LineY(LineYOptions),
}

impl Mark {
    /// Dot mark with only X and Y set.
    pub fn dot(x: Option<String>, y: Option<String>) -> Self {
        Self::Dot(DotOptions {
            x,
            y,
            ..Default::default()
        })
    }

    pub fn kind(&self) -> MarkKind {
        match self {
            Self::Dot(_) => MarkKind::Dot,
            Self::BarY(_) => MarkKind::BarY,
            Self::LineY(_) => MarkKind::LineY,
        }
    }

    pub fn x(&self) -> Option<&str> {
        match self {
            Self::Dot(o) => o.x.as_deref(),
            Self::BarY(o) => o.x.as_deref(),
            Self::LineY(o) => o.x.as_deref(),
        }
    }

    pub fn y(&self) -> Option<&str> {
        match self {
            Self::Dot(o) => o.y.as_deref(),
            Self::BarY(o) => o.y.as_deref(),
            Self::LineY(o) => o.y.as_deref(),
        }
    }

    /// Colour channel: fill for dots and bars, stroke for lines.
    pub fn color(&self) -> Option<&str> {
        match self {
            Self::Dot(o) => o.fill.as_deref(),
            Self::BarY(o) => o.fill.as_deref(),
            Self::LineY(o) => o.stroke.as_deref(),
        }
    }

    /// JSON form used as a `_plot-mark` parameter value.
    pub fn to_json(&self) -> String {
        // Only strings and bools inside; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_json_shape() {
        let mark = Mark::Dot(DotOptions {
            x: Some("completed_request_rate".into()),
            y: Some("ttlt_p50".into()),
            fill: Some("gpu".into()),
            tip: Some(false),
        });
        assert_eq!(
            mark.to_json(),
            r#"{"mark":"dot","options":{"x":"completed_request_rate","y":"ttlt_p50","fill":"gpu","tip":false}}"#
        );
    }

    #[test]
    fn line_uses_camel_case_hide_points() {
        let json = r#"{"mark":"line-y","options":{"x":"a","y":"b","stroke":"id","tip":false,"hidePoints":true}}"#;
        let mark = Mark::from_json(json).unwrap();
        match &mark {
            Mark::LineY(o) => {
                assert_eq!(o.hide_points, Some(true));
                assert_eq!(o.stroke.as_deref(), Some("id"));
            }
            other => panic!("expected line-y, got {:?}", other),
        }
        assert_eq!(mark.to_json(), json);
    }

    #[test]
    fn unset_options_are_omitted() {
        let mark = Mark::dot(Some("a".into()), None);
        assert_eq!(mark.to_json(), r#"{"mark":"dot","options":{"x":"a"}}"#);
        let back = Mark::from_json(r#"{"mark":"bar-y","options":{}}"#).unwrap();
        assert_eq!(back, Mark::BarY(BarYOptions::default()));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(Mark::from_json(r#"{"mark":"area","options":{}}"#).is_err());
        assert!(Mark::from_json("not json").is_err());
    }

    #[test]
    fn kind_cycles_both_ways() {
        assert_eq!(MarkKind::Dot.cycled(1), MarkKind::BarY);
        assert_eq!(MarkKind::LineY.cycled(1), MarkKind::Dot);
        assert_eq!(MarkKind::Dot.cycled(-1), MarkKind::LineY);
        assert_eq!(MarkKind::from_id("bar-y"), Some(MarkKind::BarY));
        assert_eq!(MarkKind::from_id("bar"), None);
    }
}
