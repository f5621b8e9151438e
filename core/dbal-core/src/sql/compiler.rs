//! Query Compiler - template + parameters → backend SQL
//!
//! # Pipeline
//!
//! ```text
//! template ─ split ─▶ [Code | 'Literal' ...]
//!    1. identifier re-quoting   `name` → dialect quotes
//!    2. backend syntax rewrite  Dialect::change_query_syntax
//!    3. table tokens            {name} → quoted table reference
//!    4. named → positional      ?name → ?   (values reordered)
//!    5. array expansion         ? + [a,b] → (?,?)   IN ? + [a] → = ?
//!    6. null normalization      Null → ''   (unless NullPolicy::Native)
//!    ─ join ─▶ CompiledQuery::query / params
//!    7. literal rendering       ? → 42 | 1 | NULL | 'quoted'
//!    ─ join ─▶ CompiledQuery::rendered
//! ```
//!
//! Every stage runs on code segments only, so nothing inside a single-quoted literal
//! is ever rewritten. Nothing is cached: compiling is text-only and cheap.

use crate::api::{Param, Params, ScalarValue};
use crate::error::{DbalError, DbalResult};
use crate::logging::COMPILE_TARGET;
use crate::sql::dialect::Dialect;
use crate::sql::scanner::{self, Segment};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static TABLE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_$.]+)\}").expect("static regex"));
static NAMED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?[A-Za-z0-9_]").expect("static regex"));
static TRAILING_IN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(NOT\s+)?IN(\s*)$").expect("static regex"));

/// How null parameters reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullPolicy {
    /// Nulls are sent as empty strings. Historical default; existing callers rely on it.
    #[default]
    EmptyString,
    /// Nulls are kept and rendered as the bare `NULL` keyword.
    Native,
}

/// Compiler options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    pub null_policy: NullPolicy,
}

/// `{name}` → table reference mapping.
///
/// Targets may be qualified (`database.table`); each part is quoted separately.
#[derive(Debug, Clone, Default)]
pub struct TableMap {
    tables: HashMap<String, String>,
}

impl TableMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, target: impl Into<String>) {
        self.tables.insert(name.into(), target.into());
    }

    pub fn with(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.insert(name, target);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.tables.get(name).map(String::as_str)
    }

    /// Render a `{name}` token.
    pub fn resolve<D: Dialect + ?Sized>(&self, name: &str, dialect: &D) -> String {
        match self.get(name) {
            Some(target) => dialect.quote_table(target),
            None if name.contains('.') => name.to_string(),
            None => dialect.quote_identifier(name),
        }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Output of [`QueryCompiler::compile`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// Rewritten template with bare `?` markers, for drivers that bind natively
    pub query: String,
    /// Positional parameters matching the markers in `query`
    pub params: Vec<ScalarValue>,
    /// Final SQL with every marker replaced by a literal
    pub rendered: String,
}

/// Stateless template compiler. Holds only configuration.
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    tables: TableMap,
    options: CompileOptions,
}

impl QueryCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(mut self, tables: TableMap) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_null_policy(mut self, policy: NullPolicy) -> Self {
        self.options.null_policy = policy;
        self
    }

    pub fn tables(&self) -> &TableMap {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut TableMap {
        &mut self.tables
    }

    pub fn null_policy(&self) -> NullPolicy {
        self.options.null_policy
    }

    pub fn set_null_policy(&mut self, policy: NullPolicy) {
        self.options.null_policy = policy;
    }

    /// Compile `template` with `params` for `dialect`.
    ///
    /// # Errors
    ///
    /// - [`DbalError::MalformedTemplate`] - unterminated literal, or mixed marker styles
    /// - [`DbalError::MissingParameter`] - `?name` absent from the mapping
    /// - [`DbalError::ParameterCountMismatch`] - markers and parameters differ in number
    pub fn compile<D: Dialect + ?Sized>(
        &self,
        template: &str,
        params: &Params,
        dialect: &D,
    ) -> DbalResult<CompiledQuery> {
        let mut segments = scanner::split(template)?;

        requote_identifiers(&mut segments, dialect)?;
        scanner::rewrite_code(&mut segments, |code| Ok(dialect.change_query_syntax(code)))?;
        self.expand_tables(&mut segments, dialect)?;

        let positional = resolve_named(&mut segments, params, template)?;
        let mut values = expand_arrays(&mut segments, positional)?;

        if self.options.null_policy == NullPolicy::EmptyString {
            for value in values.iter_mut().filter(|v| v.is_null()) {
                *value = ScalarValue::Utf8(String::new());
            }
        }

        let query = scanner::join(&segments);
        let rendered = render_literals(&mut segments, &values, dialect)?;

        tracing::trace!(target: COMPILE_TARGET, %query, params = values.len(), "compiled template");

        Ok(CompiledQuery {
            query,
            params: values,
            rendered,
        })
    }

    fn expand_tables<D: Dialect + ?Sized>(
        &self,
        segments: &mut [Segment],
        dialect: &D,
    ) -> DbalResult<()> {
        scanner::rewrite_code(segments, |code| {
            Ok(TABLE_TOKEN
                .replace_all(code, |caps: &regex::Captures<'_>| {
                    self.tables.resolve(&caps[1], dialect)
                })
                .into_owned())
        })
    }
}

/// Compile with default options and no table mapping.
pub fn compile<D: Dialect + ?Sized>(
    template: &str,
    params: &Params,
    dialect: &D,
) -> DbalResult<CompiledQuery> {
    QueryCompiler::new().compile(template, params, dialect)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Stage 1: `` `name` `` → dialect identifier quotes. Unpaired backticks are left alone.
fn requote_identifiers<D: Dialect + ?Sized>(
    segments: &mut [Segment],
    dialect: &D,
) -> DbalResult<()> {
    let (open, close) = dialect.quote_chars();
    if open == '`' && close == '`' {
        return Ok(());
    }

    scanner::rewrite_code(segments, |code| {
        let mut out = String::with_capacity(code.len());
        let mut rest = code;
        while let Some(start) = rest.find('`') {
            let after = &rest[start + 1..];
            let Some(end) = after.find('`') else {
                break;
            };
            out.push_str(&rest[..start]);
            out.push(open);
            out.push_str(&after[..end]);
            out.push(close);
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    })
}

/// Stage 4: reorder named parameters into marker order.
fn resolve_named(
    segments: &mut [Segment],
    params: &Params,
    template: &str,
) -> DbalResult<Vec<Param>> {
    let named_mode = segments
        .iter()
        .any(|s| matches!(s, Segment::Code(code) if NAMED_MARKER.is_match(code)));

    if !named_mode {
        return match params {
            Params::Positional(values) => Ok(values.clone()),
            Params::Named(map) if map.is_empty() => Ok(Vec::new()),
            Params::Named(_) => Err(DbalError::malformed(
                "named parameters supplied but the template has no named markers",
                template,
            )),
        };
    }

    let map = match params {
        Params::Named(map) => Some(map),
        Params::Positional(values) if values.is_empty() => None,
        Params::Positional(_) => {
            return Err(DbalError::malformed(
                "positional parameters supplied for a template with named markers",
                template,
            ));
        }
    };

    let mut ordered = Vec::new();
    scanner::rewrite_code(segments, |code| {
        let mut out = String::with_capacity(code.len());
        let mut rest = code;
        while let Some(pos) = rest.find('?') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let name_len = after
                .find(|c: char| !is_ident_char(c))
                .unwrap_or(after.len());
            if name_len == 0 {
                return Err(DbalError::malformed(
                    "bare ? marker in a template using named markers",
                    template,
                ));
            }
            let name = &after[..name_len];
            let value = map
                .and_then(|m| m.get(name))
                .ok_or_else(|| DbalError::MissingParameter(name.to_string()))?;
            ordered.push(value.clone());
            out.push('?');
            rest = &after[name_len..];
        }
        out.push_str(rest);
        Ok(out)
    })?;

    Ok(ordered)
}

fn count_markers(segments: &[Segment]) -> usize {
    segments
        .iter()
        .filter_map(|s| match s {
            Segment::Code(code) => Some(code.matches('?').count()),
            Segment::Literal(_) => None,
        })
        .sum()
}

/// Rewrite a trailing `IN` / `NOT IN` in `out` to `=` / `<>`.
fn collapse_trailing_in(out: &mut String) {
    let Some(caps) = TRAILING_IN.captures(out) else {
        return;
    };
    let Some(whole) = caps.get(0) else {
        return;
    };
    let operator = if caps.get(1).is_some() { "<>" } else { "=" };
    let spacing = caps.get(2).map_or("", |m| m.as_str()).to_string();
    let start = whole.start();
    out.truncate(start);
    out.push_str(operator);
    out.push_str(&spacing);
}

/// Stage 5: expand list parameters.
fn expand_arrays(segments: &mut [Segment], params: Vec<Param>) -> DbalResult<Vec<ScalarValue>> {
    let markers = count_markers(segments);
    if markers != params.len() {
        return Err(DbalError::ParameterCountMismatch {
            markers,
            params: params.len(),
        });
    }

    let mut pending = params.into_iter();
    let mut values = Vec::with_capacity(markers);

    scanner::rewrite_code(segments, |code| {
        let mut out = String::with_capacity(code.len());
        let mut rest = code;
        while let Some(pos) = rest.find('?') {
            out.push_str(&rest[..pos]);
            rest = &rest[pos + 1..];

            match pending.next() {
                Some(Param::Scalar(value)) => {
                    out.push('?');
                    values.push(value);
                }
                Some(Param::List(list)) if list.len() < 2 => {
                    collapse_trailing_in(&mut out);
                    out.push('?');
                    values.push(list.into_iter().next().unwrap_or(ScalarValue::Null));
                }
                Some(Param::List(list)) => {
                    out.push('(');
                    out.push_str(&vec!["?"; list.len()].join(","));
                    out.push(')');
                    values.extend(list);
                }
                None => {
                    return Err(DbalError::ParameterCountMismatch { markers, params: values.len() });
                }
            }
        }
        out.push_str(rest);
        Ok(out)
    })?;

    Ok(values)
}

fn render_scalar<D: Dialect + ?Sized>(value: &ScalarValue, dialect: &D) -> DbalResult<String> {
    Ok(match value {
        ScalarValue::Int64(v) => v.to_string(),
        // NaN / inf 는 SQL 리터럴이 없음
        ScalarValue::Float64(v) if !v.is_finite() => {
            return Err(DbalError::InvalidOperation {
                message: format!("cannot render non-finite float {v} as SQL"),
                context: "query parameter".to_string(),
            });
        }
        ScalarValue::Float64(v) => v.to_string(),
        ScalarValue::Boolean(v) => if *v { "1" } else { "0" }.to_string(),
        ScalarValue::Null => "NULL".to_string(),
        ScalarValue::Utf8(s) => dialect.quote_value(s),
    })
}

/// Stage 7: substitute literals for the remaining markers.
fn render_literals<D: Dialect + ?Sized>(
    segments: &mut [Segment],
    values: &[ScalarValue],
    dialect: &D,
) -> DbalResult<String> {
    let mut pending = values.iter();

    scanner::rewrite_code(segments, |code| {
        let mut out = String::with_capacity(code.len());
        let mut rest = code;
        while let Some(pos) = rest.find('?') {
            out.push_str(&rest[..pos]);
            rest = &rest[pos + 1..];
            let value = pending.next().ok_or(DbalError::ParameterCountMismatch {
                markers: values.len() + 1,
                params: values.len(),
            })?;
            out.push_str(&render_scalar(value, dialect)?);
        }
        out.push_str(rest);
        Ok(out)
    })?;

    Ok(scanner::join(segments))
}
