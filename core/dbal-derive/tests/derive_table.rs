//! derive(Table) 매크로 테스트

use dbal_core::api::{FromRow, Row, ScalarValue};
use dbal_core::DbalError;
use dbal_derive::Table;

#[derive(Table, Debug, PartialEq)]
#[dbal(table_name = "users")]
pub struct User {
    pub id: i64,
    #[dbal(column = "user_name")]
    pub name: String,
    pub age: i32,
    pub email: Option<String>,
}

#[derive(Table)]
pub struct Invoice {
    pub total: f64,
}

fn user_row() -> Row {
    Row::new()
        .with("id", ScalarValue::Int64(7))
        .with("user_name", ScalarValue::Utf8("Alice".into()))
        .with("age", ScalarValue::Int64(30))
        .with("email", ScalarValue::Null)
}

#[test]
fn test_table_name() {
    assert_eq!(User::TABLE_NAME, "users");
    assert_eq!(Invoice::TABLE_NAME, "invoice");
}

#[test]
fn test_columns() {
    assert_eq!(User::COLUMNS, &["id", "user_name", "age", "email"]);
    assert_eq!(Invoice::COLUMNS, &["total"]);
}

#[test]
fn test_from_row() {
    let user = User::from_row(&user_row()).unwrap();
    assert_eq!(
        user,
        User {
            id: 7,
            name: "Alice".to_string(),
            age: 30,
            email: None,
        }
    );
}

#[test]
fn test_from_row_missing_column() {
    let row = Row::new().with("id", ScalarValue::Int64(1));
    let err = User::from_row(&row).unwrap_err();
    assert!(matches!(err, DbalError::ColumnNotFound(ref c) if c == "user_name"));
}

#[test]
fn test_from_row_type_mismatch() {
    let row = user_row().with("age", ScalarValue::Utf8("thirty".into()));
    assert!(matches!(
        User::from_row(&row),
        Err(DbalError::TypeMismatch { .. })
    ));
}
