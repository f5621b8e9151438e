// 테스트용 스크립트 백엔드
//
// 모든 쿼리의 rendered SQL을 기록하고, SELECT에는 미리 정해진 행을 돌려준다.

#![allow(dead_code)]

use dbal_core::ScalarValue;
use dbal_core::api::Row;
use dbal_core::driver::{BufferedResult, DriverResult, Server};
use dbal_core::sql::{Dialect, MysqlDialect};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Clone, Default)]
pub struct Script {
    pub queries: Arc<Mutex<Vec<String>>>,
    pub connects: Arc<AtomicUsize>,
    pub disconnects: Arc<AtomicUsize>,
}

impl Script {
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().len()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

pub struct MockServer {
    script: Script,
    rows: Vec<Row>,
    refuse_connect: bool,
    fail_queries: bool,
}

impl MockServer {
    pub fn new(script: &Script) -> Self {
        Self {
            script: script.clone(),
            rows: Vec::new(),
            refuse_connect: false,
            fail_queries: false,
        }
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    pub fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }
}

impl Dialect for MockServer {
    fn quote_value(&self, value: &str) -> String {
        MysqlDialect.quote_value(value)
    }
}

impl Server for MockServer {
    fn connect(&mut self) -> bool {
        self.script.connects.fetch_add(1, Ordering::SeqCst);
        !self.refuse_connect
    }

    fn query(
        &mut self,
        _query: &str,
        _params: &[ScalarValue],
        rendered: &str,
    ) -> Option<Box<dyn DriverResult>> {
        self.script.queries.lock().push(rendered.to_string());
        if self.fail_queries {
            return None;
        }
        let columns = self
            .rows
            .first()
            .map(|r| r.columns().to_vec())
            .unwrap_or_default();
        Some(Box::new(BufferedResult::new(columns, self.rows.clone())))
    }

    fn error_code(&self) -> String {
        "42".to_string()
    }

    fn error_message(&self) -> String {
        "scripted failure".to_string()
    }

    fn disconnect(&mut self) -> bool {
        self.script.disconnects.fetch_add(1, Ordering::SeqCst);
        true
    }
}

/// `n` rows of `{id, name}` with padded names.
pub fn numbered_rows(n: i64) -> Vec<Row> {
    (0..n)
        .map(|i| {
            Row::new()
                .with("id", ScalarValue::Int64(i))
                .with("name", ScalarValue::Utf8(format!("row{i}  ")))
        })
        .collect()
}
