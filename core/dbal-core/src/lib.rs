//! # DBAL - Database Abstraction Layer
//!
//! 여러 데이터베이스 엔진(MySQL, PostgreSQL, SQL Server, SQLite)을 하나의 인터페이스로
//! 다루는 쿼리 컴파일러 + 디스크 기반 결과 캐시.
//!
//! ## 주요 특징
//!
//! - **Query Compiler**: `?` / `?name` 마커, 배열 → `IN (...)` 확장, `{table}` 토큰,
//!   backtick 식별자 재인용. 작은따옴표 리터럴 내부는 절대 수정하지 않음
//! - **Dialects**: 엔진별 문자열 이스케이프와 함수 이름 변환
//! - **Result Cache**: 샤딩된 디렉토리에 결과를 저장하고 컬럼별 정렬 인덱스를 지연 생성
//! - **Table / Where builders**: 자주 쓰는 CRUD 구문 생성
//!
//! ## 빠른 시작
//!
//! ```rust
//! # #[cfg(feature = "sqlite")]
//! # fn main() -> dbal_core::DbalResult<()> {
//! use dbal_core::driver::SqliteServer;
//! use dbal_core::{Sql, params};
//!
//! let mut sql = Sql::new(SqliteServer::in_memory());
//! sql.query("CREATE TABLE users (id INTEGER, name TEXT)", &params![])?;
//! sql.query("INSERT INTO users VALUES (?, ?)", &params![1, "Alice"])?;
//!
//! let mut result = sql.query("SELECT name FROM `users` WHERE id IN ?", &params![vec![1]])?;
//! let row = result.fetch()?.expect("one row");
//! assert_eq!(row.get("name").map(|v| v.to_string()), Some("Alice".to_string()));
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "sqlite"))]
//! # fn main() {}
//! ```
//!
//! ### 캐시
//!
//! ```rust,ignore
//! let options = CacheOptions::new().with_time(CacheTime::hours(6));
//! let mut result = sql.cache("SELECT * FROM {orders}", &params![], &options)?;
//! result.order_by("total", true)?;
//! ```
//!
//! ## 모듈 구조
//!
//! - [`sql`] - 템플릿 스캐너, 컴파일러, 다이얼렉트, WHERE 빌더
//! - [`driver`] - 엔진 백엔드 트레이트와 SQLite 구현
//! - [`result`] - live / cached 결과 커서
//! - [`cache`] - 디스크 캐시 저장소
//! - [`connection`] - [`Sql`] facade
//! - [`registry`] - 이름 → 연결 팩토리

// Derive 매크로가 생성하는 `dbal_core::` 경로를 크레이트 내부에서도 사용
extern crate self as dbal_core;

pub mod api;
pub mod cache;
pub mod connection;
pub mod driver;
pub mod error;
pub mod registry;
pub mod result;
pub mod sql;
pub mod table;

// Logging utilities
pub mod logging;

// Re-export commonly used types
pub use api::{FromRow, Param, Params, Row, ScalarValue};
pub use cache::{CacheOptions, CacheTime};
pub use connection::Sql;
pub use error::{DbalError, DbalResult};
pub use registry::ServerRegistry;
pub use result::{ResultSet, Rows};
pub use table::{InsertMode, Table};

// Re-export derive macros
pub use dbal_derive::Table;
