/// Boxed backend error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error from a collection or settings write.
///
/// Reads never fail: a missing or unreadable slot reads as empty.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store rejected the write (quota, I/O, lock).
    #[error("failed to write {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: BoxError,
    },
    /// The records could not be serialized.
    #[error("failed to encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// A migration step failed on a stored record.
    #[error("failed to migrate {key}: {source}")]
    Migration {
        key: String,
        #[source]
        source: lifelog_migrate::MigrationError,
    },
    /// A patch did not produce a valid record.
    #[error("invalid patch for {key}: {reason}")]
    Patch { key: String, reason: String },
}

impl StoreError {
    pub(crate) fn write(key: &str, source: impl Into<BoxError>) -> Self {
        Self::Write {
            key: key.to_string(),
            source: source.into(),
        }
    }

    /// The slot the failed operation targeted.
    pub fn key(&self) -> &str {
        match self {
            Self::Write { key, .. }
            | Self::Encode { key, .. }
            | Self::Migration { key, .. }
            | Self::Patch { key, .. } => key,
        }
    }
}
