//! Query parameter values
//!
//! A parameter is either a scalar or a list of scalars (expanded to `IN (...)` by the
//! compiler). A parameter list is either positional or keyed by marker name.

use crate::error::{DbalError, DbalResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Scalar value - used both as a query parameter and as a row field.
///
/// Serialized untagged so cached rows are plain JSON objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Utf8(String),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Utf8(v) => Some(v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarValue::Null => "Null",
            ScalarValue::Boolean(_) => "Boolean",
            ScalarValue::Int64(_) => "Int64",
            ScalarValue::Float64(_) => "Float64",
            ScalarValue::Utf8(_) => "Utf8",
        }
    }

    /// Total ordering used when sorting cached rows.
    ///
    /// Null < booleans < numbers < strings. Integers and floats compare numerically.
    pub fn sort_cmp(&self, other: &ScalarValue) -> Ordering {
        use ScalarValue::*;

        fn rank(v: &ScalarValue) -> u8 {
            match v {
                Null => 0,
                Boolean(_) => 1,
                Int64(_) | Float64(_) => 2,
                Utf8(_) => 3,
            }
        }

        match (self, other) {
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (Int64(a), Int64(b)) => a.cmp(b),
            (Int64(a), Float64(b)) => (*a as f64).total_cmp(b),
            (Float64(a), Int64(b)) => a.total_cmp(&(*b as f64)),
            (Float64(a), Float64(b)) => a.total_cmp(b),
            (Utf8(a), Utf8(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => Ok(()),
            ScalarValue::Boolean(v) => write!(f, "{}", u8::from(*v)),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Float64(v) => write!(f, "{v}"),
            ScalarValue::Utf8(v) => f.write_str(v),
        }
    }
}

/// A single query parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
    Scalar(ScalarValue),
    /// Expanded to `IN (?,?,...)`, or `= ?` for zero or one element
    List(Vec<ScalarValue>),
}

/// Parameters supplied with one query call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Params {
    Positional(Vec<Param>),
    Named(BTreeMap<String, Param>),
}

impl Default for Params {
    fn default() -> Self {
        Params::Positional(Vec::new())
    }
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named() -> Self {
        Params::Named(BTreeMap::new())
    }

    /// Append a positional parameter.
    ///
    /// Switching an empty named list to positional is allowed; mixing is not.
    pub fn push<V: IntoParam>(&mut self, value: V) -> DbalResult<()> {
        match self {
            Params::Positional(values) => values.push(value.into_param()),
            Params::Named(map) if map.is_empty() => {
                *self = Params::Positional(vec![value.into_param()]);
            }
            Params::Named(_) => return Err(mixed_params("Params::push")),
        }
        Ok(())
    }

    /// Bind a named parameter (`?name` markers).
    pub fn insert<V: IntoParam>(&mut self, name: &str, value: V) -> DbalResult<()> {
        match self {
            Params::Named(map) => {
                map.insert(name.to_string(), value.into_param());
            }
            Params::Positional(values) if values.is_empty() => {
                let mut map = BTreeMap::new();
                map.insert(name.to_string(), value.into_param());
                *self = Params::Named(map);
            }
            Params::Positional(_) => return Err(mixed_params("Params::insert")),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stable serialization used for cache keys.
    pub fn to_key_string(&self) -> DbalResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<Vec<Param>> for Params {
    fn from(values: Vec<Param>) -> Self {
        Params::Positional(values)
    }
}

impl From<BTreeMap<String, Param>> for Params {
    fn from(map: BTreeMap<String, Param>) -> Self {
        Params::Named(map)
    }
}

fn mixed_params(context: &str) -> DbalError {
    DbalError::InvalidOperation {
        message: "positional and named parameters cannot be mixed".to_string(),
        context: context.to_string(),
    }
}

/// Build positional [`Params`].
///
/// ```rust
/// use dbal_core::params;
/// let p = params![1, "x", vec![1, 2]];
/// assert_eq!(p.len(), 3);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::api::Params::Positional(::std::vec::Vec::new())
    };
    ($($value:expr),+ $(,)?) => {
        $crate::api::Params::Positional(::std::vec![
            $($crate::api::IntoParam::into_param($value)),+
        ])
    };
}

/// Build named [`Params`].
///
/// ```rust
/// use dbal_core::named_params;
/// let p = named_params! { "a" => 1, "b" => "two" };
/// assert_eq!(p.len(), 2);
/// ```
#[macro_export]
macro_rules! named_params {
    ($($name:expr => $value:expr),* $(,)?) => {{
        let mut map = ::std::collections::BTreeMap::new();
        $(map.insert(::std::string::String::from($name), $crate::api::IntoParam::into_param($value));)*
        $crate::api::Params::Named(map)
    }};
}

/// Conversion into a scalar value.
pub trait IntoScalar {
    fn into_scalar(self) -> ScalarValue;
}

/// Conversion into a query parameter.
pub trait IntoParam {
    fn into_param(self) -> Param;
}

macro_rules! scalar_impls {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl IntoScalar for $ty {
                fn into_scalar(self) -> ScalarValue {
                    let $v = self;
                    $body
                }
            }

            impl IntoParam for $ty {
                fn into_param(self) -> Param {
                    Param::Scalar(self.into_scalar())
                }
            }
        )*
    };
}

scalar_impls! {
    i32 => |v| ScalarValue::Int64(i64::from(v)),
    i64 => |v| ScalarValue::Int64(v),
    u32 => |v| ScalarValue::Int64(i64::from(v)),
    f32 => |v| ScalarValue::Float64(f64::from(v)),
    f64 => |v| ScalarValue::Float64(v),
    bool => |v| ScalarValue::Boolean(v),
    &str => |v| ScalarValue::Utf8(v.to_string()),
    String => |v| ScalarValue::Utf8(v),
    &String => |v| ScalarValue::Utf8(v.clone()),
    ScalarValue => |v| v,
}

impl<T: IntoScalar> IntoScalar for Option<T> {
    fn into_scalar(self) -> ScalarValue {
        match self {
            Some(v) => v.into_scalar(),
            None => ScalarValue::Null,
        }
    }
}

impl<T: IntoScalar> IntoParam for Option<T> {
    fn into_param(self) -> Param {
        Param::Scalar(self.into_scalar())
    }
}

impl<T: IntoScalar> IntoParam for Vec<T> {
    fn into_param(self) -> Param {
        Param::List(self.into_iter().map(IntoScalar::into_scalar).collect())
    }
}

impl<T: IntoScalar + Clone> IntoParam for &[T] {
    fn into_param(self) -> Param {
        Param::List(self.iter().cloned().map(IntoScalar::into_scalar).collect())
    }
}

impl<T: IntoScalar, const N: usize> IntoParam for [T; N] {
    fn into_param(self) -> Param {
        Param::List(self.into_iter().map(IntoScalar::into_scalar).collect())
    }
}

impl IntoParam for Param {
    fn into_param(self) -> Param {
        self
    }
}

/// Extraction of a Rust value from a scalar.
pub trait FromScalar: Sized {
    fn from_scalar(value: &ScalarValue) -> DbalResult<Self>;
}

fn mismatch(expected: &str, value: &ScalarValue) -> DbalError {
    DbalError::TypeMismatch {
        expected: expected.to_string(),
        actual: format!("{:?}", value),
    }
}

impl FromScalar for i64 {
    fn from_scalar(value: &ScalarValue) -> DbalResult<Self> {
        match value {
            ScalarValue::Int64(v) => Ok(*v),
            ScalarValue::Boolean(v) => Ok(i64::from(*v)),
            // Some drivers hand every column back as text
            ScalarValue::Utf8(s) => s.trim().parse().map_err(|_| mismatch("Int64", value)),
            _ => Err(mismatch("Int64", value)),
        }
    }
}

impl FromScalar for i32 {
    fn from_scalar(value: &ScalarValue) -> DbalResult<Self> {
        let v = i64::from_scalar(value)?;
        i32::try_from(v).map_err(|_| mismatch("Int32", value))
    }
}

impl FromScalar for f64 {
    fn from_scalar(value: &ScalarValue) -> DbalResult<Self> {
        match value {
            ScalarValue::Float64(v) => Ok(*v),
            ScalarValue::Int64(v) => Ok(*v as f64),
            ScalarValue::Utf8(s) => s.trim().parse().map_err(|_| mismatch("Float64", value)),
            _ => Err(mismatch("Float64", value)),
        }
    }
}

impl FromScalar for bool {
    fn from_scalar(value: &ScalarValue) -> DbalResult<Self> {
        match value {
            ScalarValue::Boolean(v) => Ok(*v),
            ScalarValue::Int64(v) => Ok(*v != 0),
            _ => Err(mismatch("Boolean", value)),
        }
    }
}

impl FromScalar for String {
    fn from_scalar(value: &ScalarValue) -> DbalResult<Self> {
        match value {
            ScalarValue::Null => Err(mismatch("Utf8", value)),
            other => Ok(other.to_string()),
        }
    }
}

impl FromScalar for ScalarValue {
    fn from_scalar(value: &ScalarValue) -> DbalResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromScalar> FromScalar for Option<T> {
    fn from_scalar(value: &ScalarValue) -> DbalResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            Ok(Some(T::from_scalar(value)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_param_trait() {
        assert_eq!(42i32.into_param(), Param::Scalar(ScalarValue::Int64(42)));
        assert_eq!(true.into_param(), Param::Scalar(ScalarValue::Boolean(true)));
        assert_eq!(
            Option::<i32>::None.into_param(),
            Param::Scalar(ScalarValue::Null)
        );
        assert_eq!(
            vec![1, 2].into_param(),
            Param::List(vec![ScalarValue::Int64(1), ScalarValue::Int64(2)])
        );
        assert_eq!(
            ["a"].into_param(),
            Param::List(vec![ScalarValue::Utf8("a".into())])
        );
    }

    #[test]
    fn test_params_macros() {
        let p = crate::params![1, "x", vec![1, 2]];
        assert_eq!(p.len(), 3);

        let n = crate::named_params! { "b" => 2, "a" => 1 };
        match n {
            Params::Named(map) => {
                assert_eq!(map["a"], Param::Scalar(ScalarValue::Int64(1)));
                assert_eq!(map["b"], Param::Scalar(ScalarValue::Int64(2)));
            }
            _ => panic!("expected named params"),
        }
    }

    #[test]
    fn test_params_mixing_rejected() {
        let mut p = Params::new();
        p.push(1).unwrap();
        assert!(p.insert("a", 2).is_err());

        let mut n = Params::named();
        n.insert("a", 1).unwrap();
        assert!(n.push(2).is_err());
    }

    #[test]
    fn test_scalar_json_untagged() {
        let values = vec![
            ScalarValue::Null,
            ScalarValue::Boolean(false),
            ScalarValue::Int64(7),
            ScalarValue::Float64(1.5),
            ScalarValue::Utf8("x".into()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,false,7,1.5,"x"]"#);
        let back: Vec<ScalarValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_sort_cmp_mixed() {
        use ScalarValue::*;
        assert_eq!(Null.sort_cmp(&Int64(0)), Ordering::Less);
        assert_eq!(Int64(2).sort_cmp(&Float64(1.5)), Ordering::Greater);
        assert_eq!(Utf8("a".into()).sort_cmp(&Int64(100)), Ordering::Greater);
        assert_eq!(Utf8("a".into()).sort_cmp(&Utf8("b".into())), Ordering::Less);
    }

    #[test]
    fn test_from_scalar() {
        assert_eq!(i64::from_scalar(&ScalarValue::Utf8("12".into())).unwrap(), 12);
        assert_eq!(String::from_scalar(&ScalarValue::Int64(3)).unwrap(), "3");
        assert_eq!(Option::<i64>::from_scalar(&ScalarValue::Null).unwrap(), None);
        assert!(bool::from_scalar(&ScalarValue::Utf8("x".into())).is_err());
    }
}
