//! Error kinds shared by the trie core and the surrounding driver.

/// Errors surfaced by the core (spec §7) plus I/O errors from the driver layer.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("sequence is not 7-bit ASCII or exceeds the length limit")]
    BadInput,
    #[error("alphabet is full ({} characters already observed)", crate::alphabet::MAX_SIZE)]
    AlphabetFull,
    #[error("trie holds no sequences")]
    Empty,
    #[error("allocation failed")]
    OutOfMemory,
    #[error("trie invariant violated: {0}")]
    Corruption(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
