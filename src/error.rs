use thiserror::Error;

/// 存储层错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("prefix must not be empty")]
    EmptyPrefix,

    #[error("prefix {0:?} contains undecodable bytes")]
    InvalidPrefix(String),

    #[error("invalid voice rate {value:?} for prefix {prefix}")]
    InvalidRate { prefix: String, value: String },

    #[error("supplier {0} not found")]
    UnknownSupplier(i64),

    #[error("consolidated route for prefix {0} already exists")]
    DuplicateRoute(String),

    #[error("no consolidated route for prefix {0}")]
    MissingRoute(String),

    /// MemoryRateStore 注入的写失败
    #[error("injected failure: {0}")]
    Injected(String),
}

/// 导入的硬失败 (数据质量问题不会走到这里)
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read rate file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to resolve supplier {name:?}: {source}")]
    Supplier {
        name: String,
        #[source]
        source: StoreError,
    },
}

/// 汇总失败, 整次运行作废
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("failed to list prefixes: {0}")]
    Prefixes(#[source] StoreError),

    #[error("failed to consolidate prefix {prefix}: {source}")]
    Prefix {
        prefix: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to prune stale routes: {0}")]
    Prune(#[source] StoreError),
}
