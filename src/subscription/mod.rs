//! Subscription channel - lets readers find out the store has changed.
//!
//! Every completed write is announced with the set of record ids it changed.
//! Plain subscriptions hear about every write; record subscriptions only about
//! writes that touched their record. [`NextChange`] is a one-shot version that
//! a reader stuck on missing data can await before retrying.
//!
//! ## Example
//!
//! ```
//! use normalized_cache::{EncounteredIds, SubscriptionChannel};
//!
//! let channel = SubscriptionChannel::new();
//! let mut next = channel.on_next_change()?;
//! assert!(!next.has_fired());
//!
//! channel.notify(&EncounteredIds::new())?;
//! assert!(next.has_fired());
//! # Ok::<(), normalized_cache::SubscriptionError>(())
//! ```

mod channel;
mod error;
mod next_change;

pub use channel::{ChangeCallback, SubscriptionChannel, SubscriptionId};
pub use error::SubscriptionError;
pub use next_change::NextChange;
