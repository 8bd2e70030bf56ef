use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    LockPoisoned(&'static str),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::LockPoisoned(operation) => {
                write!(f, "result cache lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for CacheError {}
