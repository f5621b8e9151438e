// 서버 레지스트리 테스트

mod common;

use common::{MockServer, Script};
use dbal_core::{DbalError, DbalResult, ServerRegistry, Sql, params};
use std::sync::Arc;

fn registry(script: &Script) -> DbalResult<ServerRegistry> {
    let mut registry = ServerRegistry::new();
    let main = script.clone();
    registry.add_server("main", move || Sql::new(MockServer::new(&main)))?;
    let reports = script.clone();
    registry.add_server("reports", move || Sql::new(MockServer::new(&reports)))?;
    Ok(registry)
}

#[test]
fn test_first_server_is_default() -> DbalResult<()> {
    let registry = registry(&Script::default())?;
    assert_eq!(registry.default_server(), Some("main"));
    assert_eq!(registry.names(), vec!["main", "reports"]);
    Ok(())
}

#[test]
fn test_invalid_names_rejected() -> DbalResult<()> {
    let script = Script::default();
    let mut registry = registry(&script)?;

    let empty = registry.add_server("", || Sql::new(MockServer::new(&Script::default())));
    assert!(matches!(empty, Err(DbalError::Registry(_))));

    let duplicate = registry.add_server("main", || Sql::new(MockServer::new(&Script::default())));
    assert!(matches!(duplicate, Err(DbalError::Registry(_))));

    assert!(registry.get_instance(Some("nope")).is_err());
    assert!(ServerRegistry::new().get_instance(None).is_err());
    Ok(())
}

#[test]
fn test_get_instance_is_shared() -> DbalResult<()> {
    let script = Script::default();
    let registry = registry(&script)?;

    let a = registry.get_instance(None)?;
    let b = registry.get_instance(Some("main"))?;
    assert!(Arc::ptr_eq(&a, &b));

    let reports = registry.get_instance(Some("reports"))?;
    assert!(!Arc::ptr_eq(&a, &reports));

    a.lock().query("SELECT 1", &params![])?;
    b.lock().query("SELECT 2", &params![])?;
    assert!(b.lock().is_connected());
    assert_eq!(script.connects(), 1);
    Ok(())
}

#[test]
fn test_new_instance_is_fresh() -> DbalResult<()> {
    let script = Script::default();
    let registry = registry(&script)?;

    let shared = registry.get_instance(None)?;
    shared.lock().query("SELECT 1", &params![])?;

    let mut fresh = registry.new_instance(None)?;
    assert!(!fresh.is_connected());
    fresh.query("SELECT 1", &params![])?;
    assert_eq!(script.connects(), 2);
    Ok(())
}
