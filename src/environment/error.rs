use std::error::Error;
use std::fmt;

use crate::cache::CacheError;
use crate::normalize::NormalizeError;
use crate::read::ReadError;
use crate::store::StoreError;
use crate::subscription::SubscriptionError;

#[derive(Debug)]
pub enum EnvironmentError {
    Normalize(NormalizeError),
    Read(ReadError),
    Store(StoreError),
    Subscription(SubscriptionError),
    Cache(CacheError),
    /// The network function failed.
    Network(String),
    /// The server answered without usable data.
    InvalidResponse(String),
    LockPoisoned(&'static str),
}

impl fmt::Display for EnvironmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentError::Normalize(e) => write!(f, "normalize error: {}", e),
            EnvironmentError::Read(e) => write!(f, "read error: {}", e),
            EnvironmentError::Store(e) => write!(f, "store error: {}", e),
            EnvironmentError::Subscription(e) => write!(f, "subscription error: {}", e),
            EnvironmentError::Cache(e) => write!(f, "cache error: {}", e),
            EnvironmentError::Network(msg) => write!(f, "network error: {}", msg),
            EnvironmentError::InvalidResponse(msg) => write!(f, "invalid response: {}", msg),
            EnvironmentError::LockPoisoned(operation) => {
                write!(f, "environment lock poisoned during {}", operation)
            }
        }
    }
}

impl Error for EnvironmentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EnvironmentError::Normalize(e) => Some(e),
            EnvironmentError::Read(e) => Some(e),
            EnvironmentError::Store(e) => Some(e),
            EnvironmentError::Subscription(e) => Some(e),
            EnvironmentError::Cache(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NormalizeError> for EnvironmentError {
    fn from(err: NormalizeError) -> Self {
        EnvironmentError::Normalize(err)
    }
}

impl From<ReadError> for EnvironmentError {
    fn from(err: ReadError) -> Self {
        EnvironmentError::Read(err)
    }
}

impl From<StoreError> for EnvironmentError {
    fn from(err: StoreError) -> Self {
        EnvironmentError::Store(err)
    }
}

impl From<SubscriptionError> for EnvironmentError {
    fn from(err: SubscriptionError) -> Self {
        EnvironmentError::Subscription(err)
    }
}

impl From<CacheError> for EnvironmentError {
    fn from(err: CacheError) -> Self {
        EnvironmentError::Cache(err)
    }
}
