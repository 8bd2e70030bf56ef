//! Normalized entity cache for client-side data binding.
//!
//! Server responses are flattened into a [`Store`] of records keyed by
//! [`EntityId`], read back through selections into [`ReadValue`]s, and kept
//! alive exactly as long as something uses them via
//! [`ReferenceCountedPointer`]s.

mod cache;
mod check;
mod environment;
mod gc;
mod normalize;
mod pointer;
mod read;
mod selection;
mod store;
mod subscription;

pub use cache::{stable_signature, CacheError, CacheLookup, ResultCache};
pub use check::{check, CheckResult, FetchPolicy};
pub use environment::{
    Entrypoint, Environment, EnvironmentConfig, EnvironmentError, NetworkFunction, NetworkRequest,
    NetworkResponse, ReadOutcome,
};
pub use gc::{garbage_collect, RetainedQuery, Retention, RetentionId, DEFAULT_GC_BUFFER_SIZE};
pub use normalize::{normalize, EncounteredIds, NormalizeError, Normalizer, DEFAULT_ID_FIELD};
pub use pointer::{create_reference_counted_pointer, DisposeError, ReferenceCountedPointer, Teardown};
pub use read::{
    read_data, read_data_tracked, DeferredComponent, FragmentReference, MissingData, ReadDataResult,
    ReadError, ReadValue, TrackedRead,
};
pub use selection::{
    child_variables, field_key, resolve_arguments, Argument, ArgumentValue, ComputedDefinition,
    ComputedField, ComputedKind, LinkedField, ScalarField, SelectionNode, SelectionRegistry,
    SelectionSet, Transform, UnboundVariable, Variables,
};
#[cfg(feature = "snapshot")]
pub use store::StoreSnapshot;
pub use store::{
    canonical_json, EntityId, EntityRecord, FieldKey, FieldValue, RecordMap, Scalar, Store,
    StoreError, ROOT_ID,
};
pub use subscription::{ChangeCallback, NextChange, SubscriptionChannel, SubscriptionError, SubscriptionId};
