use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A text source needs at least one candidate to pick from
    #[error("text source contains no texts")]
    EmptyTextSource,

    #[error("text #{0} in the text source is empty")]
    EmptyText(usize),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}
