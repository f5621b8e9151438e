// 쿼리 컴파일러 통합 테스트
//
// 리터럴 보호, 마커 확장, 테이블 토큰, 다이얼렉트별 렌더링

use dbal_core::sql::{
    Dialect, DialectKind, MssqlDialect, MysqlDialect, PostgresDialect, QueryCompiler, TableMap,
    compile,
};
use dbal_core::{DbalError, DbalResult, ScalarValue, named_params, params};
use proptest::prelude::*;

#[test]
fn test_update_with_table_token_and_list() -> DbalResult<()> {
    let compiler = QueryCompiler::new().with_tables(TableMap::new().with("t", "orders"));
    let out = compiler.compile(
        "UPDATE {t} SET val=? WHERE id IN ?",
        &params!["x", vec![1, 2]],
        &MysqlDialect,
    )?;

    assert_eq!(out.query, "UPDATE `orders` SET val=? WHERE id IN (?,?)");
    assert_eq!(
        out.params,
        vec![
            ScalarValue::Utf8("x".into()),
            ScalarValue::Int64(1),
            ScalarValue::Int64(2),
        ]
    );
    assert_eq!(out.rendered, "UPDATE `orders` SET val='x' WHERE id IN (1,2)");
    Ok(())
}

#[test]
fn test_in_expansion_cases() -> DbalResult<()> {
    let empty = compile("WHERE x IN ?", &params![Vec::<i64>::new()], &MysqlDialect)?;
    assert_eq!(empty.query, "WHERE x = ?");
    assert_eq!(empty.params.len(), 1);

    let one = compile("WHERE x IN ?", &params![vec![5]], &MysqlDialect)?;
    assert_eq!(one.query, "WHERE x = ?");
    assert_eq!(one.params, vec![ScalarValue::Int64(5)]);

    let many = compile("WHERE x IN ?", &params![vec![5, 6, 7]], &MysqlDialect)?;
    assert_eq!(many.query, "WHERE x IN (?,?,?)");
    assert_eq!(many.params.len(), 3);
    Ok(())
}

#[test]
fn test_named_to_positional() -> DbalResult<()> {
    let out = compile("SELECT ?a, ?b", &named_params! { "b" => 2, "a" => 1 }, &MysqlDialect)?;
    assert_eq!(out.query, "SELECT ?, ?");
    assert_eq!(out.params, vec![ScalarValue::Int64(1), ScalarValue::Int64(2)]);
    Ok(())
}

#[test]
fn test_named_list_with_not_in() -> DbalResult<()> {
    let out = compile(
        "SELECT * FROM t WHERE status NOT IN ?statuses AND owner = ?owner",
        &named_params! { "owner" => "bob", "statuses" => vec!["closed"] },
        &PostgresDialect,
    )?;
    assert_eq!(
        out.rendered,
        "SELECT * FROM t WHERE status <> 'closed' AND owner = 'bob'"
    );
    Ok(())
}

#[test]
fn test_compile_errors() {
    let mismatch = compile("SELECT ?, ?", &params![1], &MysqlDialect).unwrap_err();
    assert!(matches!(mismatch, DbalError::ParameterCountMismatch { markers: 2, params: 1 }));

    let missing = compile("SELECT ?id", &named_params! {}, &MysqlDialect).unwrap_err();
    assert!(matches!(missing, DbalError::MissingParameter(ref n) if n == "id"));

    let malformed = compile("SELECT 'open", &params![], &MysqlDialect).unwrap_err();
    assert!(malformed.is_compile_error());
}

#[test]
fn test_same_template_per_dialect() -> DbalResult<()> {
    let template = "SELECT IFNULL(`name`, ?) FROM {users} WHERE note = 'it''s `x`'";
    let expected = [
        (
            DialectKind::Mysql,
            "SELECT IFNULL(`name`, 'a\\\\b') FROM `users` WHERE note = 'it''s `x`'",
        ),
        (
            DialectKind::Postgres,
            "SELECT COALESCE(\"name\", E'a\\\\b') FROM \"users\" WHERE note = 'it''s `x`'",
        ),
        (
            DialectKind::Mssql,
            "SELECT ISNULL([name], 'a\\b') FROM [users] WHERE note = 'it''s `x`'",
        ),
        (
            DialectKind::Sqlite,
            "SELECT IFNULL(`name`, 'a\\b') FROM `users` WHERE note = 'it''s `x`'",
        ),
    ];

    for (kind, rendered) in expected {
        let rules = kind.rules();
        let out = compile(template, &params![r"a\b"], rules.as_ref())?;
        assert_eq!(out.rendered, rendered, "{kind:?}");
    }
    Ok(())
}

#[test]
fn test_qualified_table_mapping() -> DbalResult<()> {
    let tables = TableMap::new().with("users", "accounts.users");
    let out = QueryCompiler::new()
        .with_tables(tables)
        .compile("SELECT * FROM {users}", &params![], &MssqlDialect)?;
    assert_eq!(out.rendered, "SELECT * FROM [accounts].[users]");
    Ok(())
}

fn render_with(dialect: &dyn Dialect, template: &str) -> DbalResult<String> {
    Ok(compile(template, &params![1], dialect)?.rendered)
}

proptest! {
    #[test]
    fn prop_literal_contents_untouched(body in "[^']{0,24}") {
        let literal = format!("'{body}'");
        let template = format!("SELECT {literal} FROM t WHERE a = ?");
        for dialect in [&MysqlDialect as &dyn Dialect, &PostgresDialect, &MssqlDialect] {
            let rendered = render_with(dialect, &template).unwrap();
            prop_assert!(rendered.contains(&literal));
            prop_assert!(rendered.ends_with("= 1"));
        }
    }

    #[test]
    fn prop_marker_free_template_unchanged(template in "[A-Za-z0-9 ,.*=()_<>]{0,48}") {
        let out = compile(&template, &params![], &MysqlDialect).unwrap();
        prop_assert_eq!(&out.rendered, &template);
        prop_assert_eq!(&out.query, &template);
        prop_assert!(out.params.is_empty());
    }

    #[test]
    fn prop_list_expansion_marker_count(values in proptest::collection::vec(any::<i64>(), 2..12)) {
        let out = compile("WHERE x IN ?", &params![values.clone()], &MysqlDialect).unwrap();
        prop_assert_eq!(out.query.matches('?').count(), values.len());
        prop_assert_eq!(out.params.len(), values.len());
    }
}
