//! Report request parameters.
//!
//! The stored parameter blob is parsed here, at the boundary, into typed
//! filters before anything touches the database. A malformed or empty
//! filter entry is skipped (it contributes no predicate); an unknown
//! column name is an error, since columns come from a fixed registry the
//! client is shown.

use serde_json::Value;

use crate::ApiError;
use mlib_common::config::columns::{report_column, ReportColumn};

/// Membership or non-membership in a supplied id list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetLogic {
    In,
    NotIn,
}

/// Substring match or non-match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchLogic {
    Like,
    NotLike,
}

/// Scalar equality or inequality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarLogic {
    Is,
    IsNot,
}

/// Date threshold direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLogic {
    OnOrAfter,
    OnOrBefore,
}

/// Count threshold direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountLogic {
    AtLeast,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Xlsx,
}

/// One active filter predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Substring match against either title column.
    Title { logic: MatchLogic, text: String },
    /// Substring match against the composer, lyricist, or arranger
    /// search key; a hit on any of the three roles matches the item.
    Creator { logic: MatchLogic, text: String },
    /// Substring match against the parent collection's title.
    Collection { logic: MatchLogic, text: String },
    /// Equality against the account name that added the item.
    Cataloger { logic: ScalarLogic, name: String },
    /// Foreign-key column on the item in/not-in an id list.
    Membership { column: &'static str, logic: SetLogic, ids: Vec<i64> },
    /// Item appears in a link table whose FK is in/not-in an id list.
    Linked {
        table: &'static str,
        link_column: &'static str,
        logic: SetLogic,
        ids: Vec<i64>,
    },
    /// DateAdded threshold.
    Added { logic: DateLogic, date: String },
    /// Threshold on the latest performance date.
    Performance { logic: DateLogic, date: String },
    /// Threshold on copies in stock per the latest inventory record.
    Copies { logic: CountLogic, count: i64 },
    /// Item has (or has not) an unreturned loan.
    OnLoan { logic: SetLogic },
}

/// Filter kinds backed by a foreign-key column on LibraryItem.
const MEMBERSHIP_FILTERS: &[(&str, &str)] = &[
    ("composer", "ComposerID"),
    ("lyricist", "LyricistID"),
    ("arranger", "ArrangerID"),
    ("arrangement", "ArrangementID"),
    ("key", "KeyID"),
    ("skill", "SkillID"),
    ("accompaniment", "AccompanimentID"),
    ("handbell-ensemble", "HandbellEnsembleID"),
    ("season", "SeasonID"),
    ("owner", "OwnerID"),
    ("publisher", "PublisherID"),
];

/// Filter kinds backed by a many-to-many link table.
const LINKED_FILTERS: &[(&str, &str, &str)] = &[
    ("keyword", "LibraryItemKeyword", "LibraryKeyword"),
    ("tag", "LibraryItemTag", "LibraryTag"),
];

const DEFAULT_TITLE: &str = "Music Library Report";

/// A parsed, validated report request.
#[derive(Debug, Clone)]
pub struct ReportParams {
    pub title: String,
    pub output: OutputFormat,
    pub reversed: bool,
    pub columns: Vec<&'static ReportColumn>,
    pub filters: Vec<Filter>,
}

impl ReportParams {
    pub fn parse(blob: &Value) -> Result<Self, ApiError> {
        let root = blob
            .as_object()
            .ok_or_else(|| ApiError::BadRequest("report parameters must be a JSON object".to_string()))?;

        let title = root
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();

        let output = match root.get("output").and_then(Value::as_str) {
            Some("xlsx") => OutputFormat::Xlsx,
            _ => OutputFormat::Json,
        };

        let reversed = root.get("reversed").and_then(Value::as_bool).unwrap_or(false);

        let names = root
            .get("columns")
            .and_then(Value::as_array)
            .ok_or_else(|| ApiError::BadRequest("report needs a list of column names".to_string()))?;
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_str().unwrap_or("");
            let column = report_column(name)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown report column: {:?}", name)))?;
            columns.push(column);
        }
        if columns.is_empty() {
            return Err(ApiError::BadRequest("report needs at least one column".to_string()));
        }

        let mut filters = Vec::new();
        if let Some(entries) = root.get("filters").and_then(Value::as_array) {
            for entry in entries {
                if let Some(filter) = parse_filter(entry) {
                    filters.push(filter);
                }
            }
        }

        Ok(Self { title, output, reversed, columns, filters })
    }
}

/// Parse one filter entry; inactive or malformed entries yield None.
fn parse_filter(entry: &Value) -> Option<Filter> {
    let obj = entry.as_object()?;
    let kind = obj.get("kind").and_then(Value::as_str)?;
    let logic = obj.get("logic").and_then(Value::as_str).unwrap_or("");

    if let Some((_, column)) = MEMBERSHIP_FILTERS.iter().find(|(name, _)| *name == kind) {
        let ids = id_list(obj.get("ids"))?;
        return Some(Filter::Membership { column, logic: set_logic(logic), ids });
    }
    if let Some((_, table, link_column)) = LINKED_FILTERS.iter().find(|(name, _, _)| *name == kind)
    {
        let ids = id_list(obj.get("ids"))?;
        return Some(Filter::Linked { table, link_column, logic: set_logic(logic), ids });
    }

    match kind {
        "title" => Some(Filter::Title { logic: match_logic(logic), text: text_value(obj.get("text"))? }),
        "creator" => {
            Some(Filter::Creator { logic: match_logic(logic), text: text_value(obj.get("text"))? })
        }
        "collection" => {
            Some(Filter::Collection { logic: match_logic(logic), text: text_value(obj.get("text"))? })
        }
        "cataloger" => {
            Some(Filter::Cataloger { logic: scalar_logic(logic), name: text_value(obj.get("name"))? })
        }
        "added" => Some(Filter::Added { logic: date_logic(logic), date: text_value(obj.get("date"))? }),
        "performance" => {
            Some(Filter::Performance { logic: date_logic(logic), date: text_value(obj.get("date"))? })
        }
        "copies" => {
            let count = match obj.get("count") {
                Some(Value::Number(n)) => n.as_i64()?,
                Some(Value::String(s)) => s.trim().parse().ok()?,
                _ => return None,
            };
            Some(Filter::Copies { logic: count_logic(logic), count })
        }
        "on-loan" => Some(Filter::OnLoan { logic: set_logic(logic) }),
        _ => {
            tracing::debug!("skipping unknown filter kind {:?}", kind);
            None
        }
    }
}

fn set_logic(code: &str) -> SetLogic {
    match code {
        "ni" | "not-in" => SetLogic::NotIn,
        _ => SetLogic::In,
    }
}

fn match_logic(code: &str) -> MatchLogic {
    match code {
        "nl" | "not-like" => MatchLogic::NotLike,
        _ => MatchLogic::Like,
    }
}

fn scalar_logic(code: &str) -> ScalarLogic {
    match code {
        "ne" | "is-not" => ScalarLogic::IsNot,
        _ => ScalarLogic::Is,
    }
}

fn date_logic(code: &str) -> DateLogic {
    match code {
        "le" | "on-or-before" => DateLogic::OnOrBefore,
        _ => DateLogic::OnOrAfter,
    }
}

fn count_logic(code: &str) -> CountLogic {
    match code {
        "lt" | "below" => CountLogic::Below,
        _ => CountLogic::AtLeast,
    }
}

/// Non-empty trimmed text, or None to deactivate the filter.
fn text_value(value: Option<&Value>) -> Option<String> {
    let text = value?.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Ids accepted as JSON numbers or numeric strings; empty list (or a
/// list with nothing parseable) deactivates the filter.
fn id_list(value: Option<&Value>) -> Option<Vec<i64>> {
    let raw = value?.as_array()?;
    let ids: Vec<i64> = raw
        .iter()
        .filter_map(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect();
    if ids.is_empty() {
        None
    } else {
        Some(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_request_parses_with_defaults() {
        let blob = json!({ "columns": ["Item ID", "Title"] });
        let params = ReportParams::parse(&blob).unwrap();
        assert_eq!(params.title, DEFAULT_TITLE);
        assert_eq!(params.output, OutputFormat::Json);
        assert!(!params.reversed);
        assert_eq!(params.columns.len(), 2);
        assert!(params.filters.is_empty());
    }

    #[test]
    fn unknown_column_is_rejected() {
        let blob = json!({ "columns": ["Shoe Size"] });
        assert!(ReportParams::parse(&blob).is_err());
    }

    #[test]
    fn empty_column_list_is_rejected() {
        let blob = json!({ "columns": [] });
        assert!(ReportParams::parse(&blob).is_err());
    }

    #[test]
    fn membership_filter_accepts_numeric_strings() {
        let blob = json!({
            "columns": ["Title"],
            "filters": [{ "kind": "season", "logic": "ni", "ids": ["3", 7] }],
        });
        let params = ReportParams::parse(&blob).unwrap();
        assert_eq!(
            params.filters,
            vec![Filter::Membership {
                column: "SeasonID",
                logic: SetLogic::NotIn,
                ids: vec![3, 7],
            }]
        );
    }

    #[test]
    fn empty_or_unknown_filters_are_skipped() {
        let blob = json!({
            "columns": ["Title"],
            "filters": [
                { "kind": "title", "text": "   " },
                { "kind": "season", "ids": [] },
                { "kind": "astrology-sign", "ids": [1] },
                { "kind": "copies", "logic": "lt" },
            ],
        });
        let params = ReportParams::parse(&blob).unwrap();
        assert!(params.filters.is_empty());
    }

    #[test]
    fn logic_codes_default_to_non_inverted() {
        let blob = json!({
            "columns": ["Title"],
            "filters": [
                { "kind": "title", "text": "Symphony" },
                { "kind": "added", "date": "2020-01-01" },
                { "kind": "copies", "count": 2 },
            ],
        });
        let params = ReportParams::parse(&blob).unwrap();
        assert_eq!(
            params.filters,
            vec![
                Filter::Title { logic: MatchLogic::Like, text: "Symphony".to_string() },
                Filter::Added { logic: DateLogic::OnOrAfter, date: "2020-01-01".to_string() },
                Filter::Copies { logic: CountLogic::AtLeast, count: 2 },
            ]
        );
    }

    #[test]
    fn xlsx_output_and_reversed_flag() {
        let blob = json!({
            "columns": ["Title"],
            "output": "xlsx",
            "reversed": true,
            "title": "  Spring Inventory  ",
        });
        let params = ReportParams::parse(&blob).unwrap();
        assert_eq!(params.output, OutputFormat::Xlsx);
        assert!(params.reversed);
        assert_eq!(params.title, "Spring Inventory");
    }
}
