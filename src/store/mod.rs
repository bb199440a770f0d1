//! Local JSON persistence for player profiles

pub mod atomic;
pub mod profiles;

pub use atomic::atomic_write_json;
pub use profiles::{PlayerProfile, ProfileStore};

/// Persistence errors, always propagated to the caller
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
