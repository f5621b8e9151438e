//! API 트레이트 정의

use crate::api::row::Row;
use crate::error::DbalResult;

/// Row에서 구조체로 변환하는 트레이트
///
/// `#[derive(Table)]` generates this by looking every field up by column name.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> DbalResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> DbalResult<Self> {
        Ok(row.clone())
    }
}

// 단일 컬럼 결과: 첫 번째 컬럼 값을 사용
macro_rules! first_column_impls {
    ($($ty:ty),*) => {
        $(
            impl FromRow for $ty {
                fn from_row(row: &Row) -> DbalResult<Self> {
                    let value = row.get_index(0).ok_or_else(|| {
                        crate::error::DbalError::ColumnNotFound("0".to_string())
                    })?;
                    <$ty as crate::api::FromScalar>::from_scalar(value)
                }
            }
        )*
    };
}

first_column_impls!(i64, i32, f64, bool, String);
