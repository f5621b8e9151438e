//! Row - ordered column → value mapping
//!
//! Column order is the order the driver reported. Cached rows are stored as JSON
//! objects in that same order.

use crate::api::value::ScalarValue;
use crate::error::{DbalError, DbalResult};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<ScalarValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Append a field. A repeated column name overwrites the earlier value in place.
    pub fn push(&mut self, column: impl Into<String>, value: ScalarValue) {
        let column = column.into();
        match self.columns.iter().position(|c| *c == column) {
            Some(idx) => self.values[idx] = value,
            None => {
                self.columns.push(column);
                self.values.push(value);
            }
        }
    }

    /// Builder-style [`Row::push`].
    pub fn with(mut self, column: impl Into<String>, value: ScalarValue) -> Self {
        self.push(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&ScalarValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Like [`Row::get`] but a missing column is an error.
    pub fn value(&self, column: &str) -> DbalResult<&ScalarValue> {
        self.get(column)
            .ok_or_else(|| DbalError::ColumnNotFound(column.to_string()))
    }

    pub fn get_index(&self, idx: usize) -> Option<&ScalarValue> {
        self.values.get(idx)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[ScalarValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }

    /// Strip trailing whitespace from every string field.
    ///
    /// Fixed-width CHAR columns come back space padded on several engines.
    pub fn trim_strings(&mut self) {
        for value in &mut self.values {
            if let ScalarValue::Utf8(s) = value {
                let trimmed = s.trim_end().len();
                s.truncate(trimmed);
            }
        }
    }
}

impl IntoIterator for Row {
    type Item = (String, ScalarValue);
    type IntoIter = std::iter::Zip<std::vec::IntoIter<String>, std::vec::IntoIter<ScalarValue>>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter().zip(self.values)
    }
}

impl<K: Into<String>> FromIterator<(K, ScalarValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, ScalarValue)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of column names to scalar values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
        let mut row = Row::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((column, value)) = access.next_entry::<String, ScalarValue>()? {
            row.push(column, value);
        }
        Ok(row)
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Row, D::Error> {
        deserializer.deserialize_map(RowVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_preserves_column_order() {
        let row = Row::new()
            .with("zeta", ScalarValue::Int64(1))
            .with("alpha", ScalarValue::Utf8("a".into()));
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":"a"}"#);

        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back.columns(), &["zeta".to_string(), "alpha".to_string()]);
        assert_eq!(back, row);
    }

    #[test]
    fn test_row_trim_strings() {
        let mut row = Row::new()
            .with("name", ScalarValue::Utf8(" yep  \t".into()))
            .with("id", ScalarValue::Int64(3));
        row.trim_strings();
        assert_eq!(row.get("name"), Some(&ScalarValue::Utf8(" yep".into())));
        assert_eq!(row.get("id"), Some(&ScalarValue::Int64(3)));
    }

    #[test]
    fn test_row_missing_column() {
        let row = Row::new().with("id", ScalarValue::Int64(1));
        assert!(matches!(row.value("nope"), Err(DbalError::ColumnNotFound(_))));
    }

    #[test]
    fn test_row_push_overwrites() {
        let mut row = Row::new();
        row.push("a", ScalarValue::Int64(1));
        row.push("a", ScalarValue::Int64(2));
        assert_eq!(row.len(), 1);
        assert_eq!(row.get_index(0), Some(&ScalarValue::Int64(2)));
    }
}
