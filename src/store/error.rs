use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    LockPoisoned(&'static str),
    /// Encoding or decoding a store snapshot failed.
    Snapshot(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::LockPoisoned(operation) => {
                write!(f, "store lock poisoned during {}", operation)
            }
            StoreError::Snapshot(message) => write!(f, "store snapshot error: {}", message),
        }
    }
}

impl std::error::Error for StoreError {}
