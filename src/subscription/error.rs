use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    LockPoisoned(&'static str),
}

impl fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionError::LockPoisoned(operation) => {
                write!(f, "subscription lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for SubscriptionError {}
