//! Quote-aware template splitting
//!
//! A template is split into code spans and single-quoted literal spans. Rewrite
//! stages only ever see code spans; literal spans are copied through byte for byte.
//! `''` escapes inside a literal come out as two adjacent literal spans, which is
//! harmless because neither is rewritten.

use crate::error::{DbalError, DbalResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// SQL text outside any string literal
    Code(String),
    /// A complete `'...'` literal, quotes included
    Literal(String),
}

impl Segment {
    pub fn as_str(&self) -> &str {
        match self {
            Segment::Code(s) | Segment::Literal(s) => s,
        }
    }
}

/// Split a template into code and literal segments.
///
/// An opening quote without a closing one is a malformed template.
pub fn split(template: &str) -> DbalResult<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('\'') {
        if open > 0 {
            segments.push(Segment::Code(rest[..open].to_string()));
        }
        let after = &rest[open + 1..];
        let close = after.find('\'').ok_or_else(|| {
            DbalError::malformed(
                format!("unterminated quoted literal at byte {}", template.len() - rest.len() + open),
                template,
            )
        })?;
        let end = open + 1 + close + 1;
        segments.push(Segment::Literal(rest[open..end].to_string()));
        rest = &rest[end..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Code(rest.to_string()));
    }

    Ok(segments)
}

/// Concatenate segments back into a query string.
pub fn join(segments: &[Segment]) -> String {
    let len = segments.iter().map(|s| s.as_str().len()).sum();
    let mut out = String::with_capacity(len);
    for segment in segments {
        out.push_str(segment.as_str());
    }
    out
}

/// Rewrite every code segment in place, leaving literals untouched.
///
/// The callback is `FnMut` so stages can carry state (parameter cursors) across
/// segments in template order.
pub fn rewrite_code<F>(segments: &mut [Segment], mut f: F) -> DbalResult<()>
where
    F: FnMut(&str) -> DbalResult<String>,
{
    for segment in segments.iter_mut() {
        if let Segment::Code(code) = segment {
            *code = f(code)?;
        }
    }
    Ok(())
}
