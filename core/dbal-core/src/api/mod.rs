//! API 모듈 - 파라미터, 행, 변환 트레이트, Fluent Query Builder

pub mod query;
pub mod row;
pub mod traits;
pub mod value;

pub use query::Query;
pub use row::Row;
pub use traits::FromRow;
pub use value::{FromScalar, IntoParam, IntoScalar, Param, Params, ScalarValue};
