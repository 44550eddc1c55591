pub mod cascade;
pub mod diff;
pub mod fetch;
pub mod merge;
pub mod normalize;
pub mod types;

pub use cascade::ChangeDiscovery;
pub use types::{ChangeStatus, FileChange, PrTarget};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChangeError {
    #[error("raw diff request failed: {0}")]
    DiffRequest(#[from] reqwest::Error),

    #[error("required capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error(transparent)]
    Tool(#[from] crate::tools::ToolError),
}
