//! Disposable result cache - one shared result per request signature.
//!
//! Each distinct signature maps to one reference-counted pointer group.
//! Requesting a signature that is already cached hands out another handle
//! onto the same result instead of producing it again. When the last handle
//! of a result is disposed, its teardown runs and the entry leaves the cache.
//!
//! ## Example
//!
//! ```
//! use normalized_cache::{CacheError, ResultCache, Teardown};
//!
//! fn fetch() -> Result<(String, Teardown), CacheError> {
//!     Ok(("response".to_string(), Box::new(|| {})))
//! }
//!
//! let cache: ResultCache<String> = ResultCache::new();
//! let mut first = cache.get_or_insert_with("query{}", fetch)?;
//! let mut second = cache.get_or_insert_with("query{}", fetch)?;
//! assert!(second.hit);
//!
//! first.pointer.dispose().unwrap();
//! second.pointer.dispose().unwrap();
//! assert!(cache.is_empty()?);
//! # Ok::<(), CacheError>(())
//! ```

mod error;
mod result_cache;

pub use error::CacheError;
pub use result_cache::{stable_signature, CacheLookup, ResultCache};
