//! Error types / 错误类型

use crate::models::RecordId;

/// Catalog store failures, propagated unmodified / 存储错误
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("malformed {column} on record {id}: {source}")]
    Decode {
        id: RecordId,
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Search pipeline errors / 搜索错误
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Rejected before any store access / 参数校验失败
    #[error("invalid request: {0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SearchError {
    pub fn is_validation(&self) -> bool {
        matches!(self, SearchError::Validation(_))
    }
}
