//! Classification of sandbox results into a closed set of render variants.
//!
//! The execution service reports untyped payloads: a result is whatever
//! combination of optional fields the interpreter produced. This module is the
//! one place that sniffs those shapes; everything downstream consumes
//! [`ResultKind`].

use serde_json::Value;

use crate::sandbox::RawResult;

/// Row/column structure extracted from a tabular result.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl TableData {
    /// Accepts the service's row/column object, or a single named column.
    fn from_value(v: &Value) -> Option<Self> {
        let obj = v.as_object()?;
        if let (Some(cols), Some(rows)) = (obj.get("columns"), obj.get("rows")) {
            let columns = cols
                .as_array()?
                .iter()
                .map(|c| c.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()?;
            let rows = rows
                .as_array()?
                .iter()
                .map(|r| r.as_array().cloned())
                .collect::<Option<Vec<_>>>()?;
            return Some(Self { columns, rows });
        }
        if let (Some(name), Some(values)) = (obj.get("name"), obj.get("values")) {
            let name = name.as_str()?.to_string();
            let rows = values
                .as_array()?
                .iter()
                .map(|v| vec![v.clone()])
                .collect();
            return Some(Self { columns: vec![name], rows });
        }
        None
    }

    /// Pipe-delimited text form, used when a table is fed back to the model.
    pub fn to_text(&self) -> String {
        let mut out = self.columns.join(" | ");
        for row in &self.rows {
            out.push('\n');
            out.push_str(
                &row.iter().map(cell_text).collect::<Vec<_>>().join(" | "),
            );
        }
        out
    }
}

/// Plain text for one table cell: strings verbatim, everything else as JSON.
pub fn cell_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The closed set of shapes one execution result can take.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultKind {
    Image { png_base64: String },
    Figure { spec: Value },
    InteractiveChart { spec: Value },
    Table(TableData),
    FieldList(Vec<String>),
    Text(String),
}

/// Map one untyped result payload to its render variant.
///
/// First matching rule wins; the order is load-bearing (an image payload beats
/// a tabular one, and so on down the chain).
pub fn classify(raw: &RawResult) -> ResultKind {
    if let Some(png) = &raw.png {
        return ResultKind::Image { png_base64: png.clone() };
    }
    if let Some(spec) = &raw.figure {
        return ResultKind::Figure { spec: spec.clone() };
    }
    if let Some(spec) = &raw.chart {
        return ResultKind::InteractiveChart { spec: spec.clone() };
    }
    if let Some(data) = &raw.data {
        if let Some(table) = TableData::from_value(data) {
            return ResultKind::Table(table);
        }
        if let Some(fields) = string_sequence(data) {
            return ResultKind::FieldList(fields);
        }
    }

    // Plain value: prefer the reported text form, then the raw data payload.
    let text = match (&raw.text, &raw.data) {
        (Some(t), _) => t.clone(),
        (None, Some(d)) => d.as_str().map(str::to_string).unwrap_or_else(|| d.to_string()),
        (None, None) => String::new(),
    };
    if text.starts_with('[') && text.ends_with(']') {
        if let Some(fields) = parse_list_literal(&text) {
            return ResultKind::FieldList(fields);
        }
    }
    ResultKind::Text(text)
}

fn string_sequence(v: &Value) -> Option<Vec<String>> {
    v.as_array()?
        .iter()
        .map(|e| e.as_str().map(str::to_string))
        .collect()
}

/// Best-effort parse of a Python-style list literal of quoted strings, e.g.
/// `['age', 'cost']`. `None` for anything else (unquoted tokens, numbers,
/// nesting); callers fall back to raw text, never an error.
pub fn parse_list_literal(text: &str) -> Option<Vec<String>> {
    let inner = text.strip_prefix('[')?.strip_suffix(']')?;
    let mut fields = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        let quote = match chars.next() {
            None => break,
            Some(c @ ('\'' | '"')) => c,
            Some(_) => return None,
        };
        let mut field = String::new();
        loop {
            match chars.next()? {
                '\\' => field.push(chars.next()?),
                c if c == quote => break,
                c => field.push(c),
            }
        }
        fields.push(field);
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(_) => return None,
        }
    }
    Some(fields)
}

impl ResultKind {
    /// Text form used as the explanation prompt's execution-result payload.
    pub fn text_form(&self) -> String {
        match self {
            ResultKind::Image { .. } => "[image visualisation]".to_string(),
            ResultKind::Figure { .. } => "[plotting figure]".to_string(),
            ResultKind::InteractiveChart { .. } => "[interactive chart]".to_string(),
            ResultKind::Table(table) => table.to_text(),
            ResultKind::FieldList(fields) => {
                format!("dataset fields: {}", fields.join(", "))
            }
            ResultKind::Text(text) => text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: Value) -> RawResult {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn image_rule_beats_table_rule() {
        let r = raw(json!({
            "png": "aGVsbG8=",
            "data": {"columns": ["a"], "rows": [[1]]}
        }));
        assert!(matches!(classify(&r), ResultKind::Image { .. }));
    }

    #[test]
    fn figure_beats_chart_and_table() {
        let r = raw(json!({
            "figure": {"axes": 1},
            "chart": {"type": "bar"},
            "data": {"columns": ["a"], "rows": [[1]]}
        }));
        assert!(matches!(classify(&r), ResultKind::Figure { .. }));
    }

    #[test]
    fn chart_payload_is_interactive_chart() {
        let r = raw(json!({"chart": {"type": "bar"}}));
        assert!(matches!(classify(&r), ResultKind::InteractiveChart { .. }));
    }

    #[test]
    fn rows_and_columns_classify_as_table() {
        let r = raw(json!({
            "data": {
                "columns": ["category", "cost"],
                "rows": [["food", 12.5], ["travel", 40]]
            }
        }));
        match classify(&r) {
            ResultKind::Table(t) => {
                assert_eq!(t.columns, vec!["category", "cost"]);
                assert_eq!(t.rows.len(), 2);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn named_column_classifies_as_single_column_table() {
        let r = raw(json!({"data": {"name": "cost", "values": [1, 2, 3]}}));
        match classify(&r) {
            ResultKind::Table(t) => {
                assert_eq!(t.columns, vec!["cost"]);
                assert_eq!(t.rows, vec![vec![json!(1)], vec![json!(2)], vec![json!(3)]]);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn string_sequence_classifies_as_field_list() {
        let r = raw(json!({"data": ["age", "cost", "category"]}));
        match classify(&r) {
            ResultKind::FieldList(fields) => {
                assert_eq!(fields.join(", "), "age, cost, category");
            }
            other => panic!("expected field list, got {other:?}"),
        }
    }

    #[test]
    fn mixed_sequence_is_not_a_field_list() {
        let r = raw(json!({"data": ["age", 3]}));
        assert!(matches!(classify(&r), ResultKind::Text(_)));
    }

    #[test]
    fn serialized_list_parses_to_same_field_list() {
        let from_list = classify(&raw(json!({"data": ["age", "cost"]})));
        let from_text = classify(&raw(json!({"text": "['age', 'cost']"})));
        assert_eq!(from_list, from_text);
    }

    #[test]
    fn unparseable_bracket_text_falls_back_to_raw() {
        let r = raw(json!({"text": "[not valid]"}));
        assert_eq!(classify(&r), ResultKind::Text("[not valid]".to_string()));
    }

    #[test]
    fn numeric_list_literal_falls_back_to_raw() {
        let r = raw(json!({"text": "[1, 2]"}));
        assert_eq!(classify(&r), ResultKind::Text("[1, 2]".to_string()));
    }

    #[test]
    fn plain_scalar_renders_as_text() {
        assert_eq!(
            classify(&raw(json!({"text": "3.14"}))),
            ResultKind::Text("3.14".to_string())
        );
        assert_eq!(
            classify(&raw(json!({"data": 42}))),
            ResultKind::Text("42".to_string())
        );
        assert_eq!(classify(&RawResult::default()), ResultKind::Text(String::new()));
    }

    #[test]
    fn list_literal_accepts_both_quote_styles_and_escapes() {
        assert_eq!(
            parse_list_literal(r#"['age', "cost"]"#),
            Some(vec!["age".to_string(), "cost".to_string()])
        );
        assert_eq!(
            parse_list_literal(r"['it\'s']"),
            Some(vec!["it's".to_string()])
        );
        assert_eq!(parse_list_literal("[]"), Some(vec![]));
    }

    #[test]
    fn list_literal_rejects_unquoted_and_nested_forms() {
        assert_eq!(parse_list_literal("[not valid]"), None);
        assert_eq!(parse_list_literal("[1, 2]"), None);
        assert_eq!(parse_list_literal("[['a']]"), None);
        assert_eq!(parse_list_literal("['a' 'b']"), None);
        assert_eq!(parse_list_literal("['unterminated]"), None);
    }

    #[test]
    fn table_text_form_is_pipe_delimited() {
        let t = TableData {
            columns: vec!["person".into(), "cost".into()],
            rows: vec![
                vec![json!("ana"), json!(10)],
                vec![json!("ben"), json!(20.5)],
            ],
        };
        assert_eq!(t.to_text(), "person | cost\nana | 10\nben | 20.5");
    }
}
