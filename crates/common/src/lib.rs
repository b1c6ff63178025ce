use thiserror::Error;

pub mod types;
pub mod utils;
pub mod posts;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("parse error: {0}")]
    Parse(String),
}
