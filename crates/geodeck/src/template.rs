//! Text templates for labels and tooltips.
//!
//! A template is plain text with `{field}` placeholders filled from a
//! [`Record`]. A placeholder may carry a format:
//!
//! - `{field}` - the value as-is (numbers in their shortest form)
//! - `{field:.2}` - a number with a fixed count of decimals
//! - `{field:,}` - a number with thousands separators
//!
//! Missing fields render as empty text. A `{` without a closing `}` is kept
//! literally.
//!
//! # Example
//!
//! ```
//! # use geodeck::template::Template;
//! let template = Template::new("{name} · ~{mw:,} MW");
//! let record = serde_json::json!({"name": "Phoenix", "mw": 1900});
//! assert_eq!(template.render(record.as_object().unwrap()), "Phoenix · ~1,900 MW");
//! ```

use std::fmt;

use serde::Deserialize;

use crate::record::{self, Record};

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field { name: String, format: FieldFormat },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldFormat {
    Plain,
    Fixed(usize),
    Grouped,
}

/// A parsed text template.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "String")]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses a template string.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let segments = parse(&source);
        Self { source, segments }
    }

    /// Returns the template text as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Renders the template against a record.
    pub fn render(&self, record: &Record) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { name, format } => out.push_str(&render_field(record, name, *format)),
            }
        }
        out
    }
}

impl From<String> for Template {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl From<&str> for Template {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = source;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        literal.push_str(&rest[..open]);
        let inner = &rest[open + 1..open + close];
        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(parse_field(inner));
        rest = &rest[open + close + 1..];
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

fn parse_field(inner: &str) -> Segment {
    let (name, format) = match inner.split_once(':') {
        Some((name, spec)) => {
            let format = match spec.trim() {
                "," => FieldFormat::Grouped,
                spec => spec
                    .strip_prefix('.')
                    .and_then(|digits| digits.parse::<usize>().ok())
                    .map_or(FieldFormat::Plain, FieldFormat::Fixed),
            };
            (name, format)
        }
        None => (inner, FieldFormat::Plain),
    };
    Segment::Field {
        name: name.trim().to_string(),
        format,
    }
}

fn render_field(record: &Record, name: &str, format: FieldFormat) -> String {
    match format {
        FieldFormat::Plain => record::text(record, name).unwrap_or_default(),
        FieldFormat::Fixed(decimals) => match record::number(record, name) {
            Some(v) => format!("{v:.decimals$}"),
            None => record::text(record, name).unwrap_or_default(),
        },
        FieldFormat::Grouped => match record::number(record, name) {
            Some(v) => record::format_grouped(v),
            None => record::text(record, name).unwrap_or_default(),
        },
    }
}
