//! WHERE clause builder
//!
//! Produces template text (backtick identifiers, `?` markers) plus the matching
//! positional parameters, so the output goes through the regular compiler.

use crate::api::{IntoScalar, Param, ScalarValue};

/// Comparison applied to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    EqualTo(ScalarValue),
    NotEqualTo(ScalarValue),
    Like(ScalarValue),
    NotLike(ScalarValue),
    In(Vec<ScalarValue>),
    NotIn(Vec<ScalarValue>),
    Between(ScalarValue, ScalarValue),
    GreaterThan(ScalarValue),
    LessThan(ScalarValue),
    NotGreaterThan(ScalarValue),
    NotLessThan(ScalarValue),
}

impl Condition {
    pub fn equal_to(value: impl IntoScalar) -> Self {
        Condition::EqualTo(value.into_scalar())
    }

    pub fn not_equal_to(value: impl IntoScalar) -> Self {
        Condition::NotEqualTo(value.into_scalar())
    }

    pub fn like(value: impl IntoScalar) -> Self {
        Condition::Like(value.into_scalar())
    }

    pub fn not_like(value: impl IntoScalar) -> Self {
        Condition::NotLike(value.into_scalar())
    }

    pub fn is_in<T: IntoScalar>(values: impl IntoIterator<Item = T>) -> Self {
        Condition::In(values.into_iter().map(IntoScalar::into_scalar).collect())
    }

    pub fn not_in<T: IntoScalar>(values: impl IntoIterator<Item = T>) -> Self {
        Condition::NotIn(values.into_iter().map(IntoScalar::into_scalar).collect())
    }

    pub fn between(from: impl IntoScalar, to: impl IntoScalar) -> Self {
        Condition::Between(from.into_scalar(), to.into_scalar())
    }

    pub fn greater_than(value: impl IntoScalar) -> Self {
        Condition::GreaterThan(value.into_scalar())
    }

    pub fn less_than(value: impl IntoScalar) -> Self {
        Condition::LessThan(value.into_scalar())
    }

    pub fn not_greater_than(value: impl IntoScalar) -> Self {
        Condition::NotGreaterThan(value.into_scalar())
    }

    pub fn not_less_than(value: impl IntoScalar) -> Self {
        Condition::NotLessThan(value.into_scalar())
    }

    /// Operator and markers, e.g. `IN (?, ?)`.
    pub fn clause(&self) -> String {
        match self {
            Condition::EqualTo(_) => "= ?".to_string(),
            Condition::NotEqualTo(_) => "<> ?".to_string(),
            Condition::Like(_) => "LIKE ?".to_string(),
            Condition::NotLike(_) => "NOT LIKE ?".to_string(),
            Condition::In(values) if values.len() < 2 => "= ?".to_string(),
            Condition::In(values) => format!("IN ({})", markers(values.len())),
            Condition::NotIn(values) if values.len() < 2 => "<> ?".to_string(),
            Condition::NotIn(values) => format!("NOT IN ({})", markers(values.len())),
            Condition::Between(..) => "BETWEEN ? AND ?".to_string(),
            Condition::GreaterThan(_) => "> ?".to_string(),
            Condition::LessThan(_) => "< ?".to_string(),
            Condition::NotGreaterThan(_) => "<= ?".to_string(),
            Condition::NotLessThan(_) => ">= ?".to_string(),
        }
    }

    /// One value per marker in [`Condition::clause`].
    pub fn values(&self) -> Vec<ScalarValue> {
        match self {
            Condition::In(values) | Condition::NotIn(values) if values.is_empty() => {
                vec![ScalarValue::Null]
            }
            Condition::In(values) | Condition::NotIn(values) => values.clone(),
            Condition::Between(from, to) => vec![from.clone(), to.clone()],
            Condition::EqualTo(v)
            | Condition::NotEqualTo(v)
            | Condition::Like(v)
            | Condition::NotLike(v)
            | Condition::GreaterThan(v)
            | Condition::LessThan(v)
            | Condition::NotGreaterThan(v)
            | Condition::NotLessThan(v) => vec![v.clone()],
        }
    }
}

fn markers(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Values accepted by [`Where::and`] / [`Where::or`]: a condition, a scalar
/// (equality) or a list (`IN`).
pub trait IntoCondition {
    fn into_condition(self) -> Condition;
}

impl IntoCondition for Condition {
    fn into_condition(self) -> Condition {
        self
    }
}

impl<T: IntoScalar> IntoCondition for Vec<T> {
    fn into_condition(self) -> Condition {
        Condition::is_in(self)
    }
}

macro_rules! equality_conditions {
    ($($ty:ty),*) => {
        $(
            impl IntoCondition for $ty {
                fn into_condition(self) -> Condition {
                    Condition::EqualTo(self.into_scalar())
                }
            }
        )*
    };
}

equality_conditions!(i32, i64, u32, f64, bool, &str, String, &String, ScalarValue);

impl<T: IntoScalar> IntoCondition for Option<T> {
    fn into_condition(self) -> Condition {
        Condition::EqualTo(self.into_scalar())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conjunction {
    And,
    Or,
}

/// Ordered list of field conditions joined by AND / OR.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Where {
    fields: Vec<(Conjunction, String, Condition)>,
}

/// Backtick-quote a field, each `.`-separated part on its own.
pub(crate) fn quote_field(field: &str) -> String {
    field
        .split('.')
        .map(|part| format!("`{part}`"))
        .collect::<Vec<_>>()
        .join(".")
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, field: impl Into<String>, value: impl IntoCondition) -> Self {
        self.fields
            .push((Conjunction::And, field.into(), value.into_condition()));
        self
    }

    pub fn or(mut self, field: impl Into<String>, value: impl IntoCondition) -> Self {
        self.fields
            .push((Conjunction::Or, field.into(), value.into_condition()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Append the clause text (without `WHERE`) and push its parameters.
    pub fn render(&self, params: &mut Vec<Param>) -> String {
        let mut parts = Vec::with_capacity(self.fields.len());
        for (idx, (conjunction, field, condition)) in self.fields.iter().enumerate() {
            let mut part = String::new();
            if idx > 0 {
                part.push_str(match conjunction {
                    Conjunction::And => "AND ",
                    Conjunction::Or => "OR ",
                });
            }
            part.push_str(&quote_field(field));
            part.push(' ');
            part.push_str(&condition.clause());
            parts.push(part);
            params.extend(condition.values().into_iter().map(Param::Scalar));
        }
        parts.join(" ")
    }

    /// `field = value` pairs of the AND-joined equality conditions.
    pub fn equalities(&self) -> Vec<(String, ScalarValue)> {
        self.fields
            .iter()
            .filter(|(conjunction, _, _)| *conjunction == Conjunction::And)
            .filter_map(|(_, field, condition)| match condition {
                Condition::EqualTo(value) => Some((field.clone(), value.clone())),
                Condition::In(values) if values.len() == 1 => {
                    Some((field.clone(), values[0].clone()))
                }
                _ => None,
            })
            .collect()
    }
}

impl<K: Into<String>, V: IntoCondition> FromIterator<(K, V)> for Where {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Where::new(), |w, (field, value)| w.and(field, value))
    }
}
