use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::trace;

use super::DisposeError;

/// Cleanup run once the last handle of a pointer group is disposed.
pub type Teardown = Box<dyn FnOnce() + Send>;

struct RefCountState<T> {
    item: Arc<T>,
    teardown: Teardown,
    // Invariant: > 0
    active_references: usize,
}

/// Shared state of one pointer group.
///
/// There is deliberately no way to ask whether the item itself was torn down,
/// or to force it. Code that needs that must track its own handles.
pub(crate) struct RefCounter<T> {
    state: Mutex<Option<RefCountState<T>>>,
}

impl<T> RefCounter<T> {
    /// Create a pointer group together with its first live handle.
    pub(crate) fn new(item: T, teardown: Teardown) -> (Arc<Self>, ReferenceCountedPointer<T>) {
        let counter = Arc::new(RefCounter {
            state: Mutex::new(Some(RefCountState {
                item: Arc::new(item),
                teardown,
                active_references: 1,
            })),
        });
        let handle = ReferenceCountedPointer {
            group: Some(Arc::clone(&counter)),
        };
        (counter, handle)
    }

    /// Hand out another live handle, unless the group was already torn down.
    pub(crate) fn retain_if_not_disposed(self: &Arc<Self>) -> Option<ReferenceCountedPointer<T>> {
        let mut guard = self.state.lock().ok()?;
        let state = guard.as_mut()?;
        state.active_references += 1;
        trace!(active = state.active_references, "pointer.retain");

        Some(ReferenceCountedPointer {
            group: Some(Arc::clone(self)),
        })
    }

    fn item_if_not_disposed(&self) -> Option<Arc<T>> {
        let guard = self.state.lock().ok()?;
        guard.as_ref().map(|state| Arc::clone(&state.item))
    }

    fn release(&self) -> Result<(), DisposeError> {
        let teardown = {
            let mut guard = self
                .state
                .lock()
                .map_err(|_| DisposeError::LockPoisoned("release"))?;
            let state = guard.as_mut().ok_or(DisposeError::PointerTornDown)?;
            state.active_references -= 1;
            trace!(active = state.active_references, "pointer.release");

            if state.active_references > 0 {
                return Ok(());
            }
            guard.take().map(|state| state.teardown)
        };

        // The lock is released before tearing down, so teardowns may touch
        // other pointers or caches.
        if let Some(teardown) = teardown {
            trace!("pointer.teardown");
            teardown();
        }
        Ok(())
    }
}

/// One live (or disposed) handle onto a shared, disposable item.
///
/// Disposal status is per handle: disposing this handle does not affect its
/// siblings. The item stays alive until every handle of the group is gone.
///
/// Dropping an undisposed handle releases it. Disposing explicitly twice is an
/// error.
pub struct ReferenceCountedPointer<T> {
    // Invariant: Some(_) => the group is not torn down.
    group: Option<Arc<RefCounter<T>>>,
}

/// Create an undisposed pointer guarding `item`; `teardown` runs once all
/// handles cloned from it have been disposed.
pub fn create_reference_counted_pointer<T, F>(item: T, teardown: F) -> ReferenceCountedPointer<T>
where
    F: FnOnce() + Send + 'static,
{
    let (_, handle) = RefCounter::new(item, Box::new(teardown));
    handle
}

impl<T> ReferenceCountedPointer<T> {
    /// Whether this specific handle has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.group.is_none()
    }

    /// The guarded item, only while this handle is undisposed.
    ///
    /// The returned item must not be used as a proof of liveness once this
    /// handle is disposed.
    pub fn get_item(&self) -> Option<Arc<T>> {
        self.group.as_ref()?.item_if_not_disposed()
    }

    /// Another handle onto the same item, or `None` if this handle is disposed.
    ///
    /// Racing a disposal is expected in a DAG of owners, so this never fails.
    pub fn clone_if_not_disposed(&self) -> Option<ReferenceCountedPointer<T>> {
        self.group.as_ref()?.retain_if_not_disposed()
    }

    /// Release this handle. Runs the teardown if it was the last live one.
    #[must_use = "disposing twice is a lifetime bug and must be surfaced"]
    pub fn dispose(&mut self) -> Result<(), DisposeError> {
        let group = self.group.take().ok_or(DisposeError::AlreadyDisposed)?;
        group.release()
    }

    /// Whether both handles belong to the same pointer group.
    pub fn shares_item_with(&self, other: &ReferenceCountedPointer<T>) -> bool {
        match (&self.group, &other.group) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T> Drop for ReferenceCountedPointer<T> {
    fn drop(&mut self) {
        if let Some(group) = self.group.take() {
            if let Err(err) = group.release() {
                tracing::warn!(error = %err, "pointer.release_on_drop_failed");
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReferenceCountedPointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceCountedPointer")
            .field("disposed", &self.is_disposed())
            .field("item", &self.get_item())
            .finish()
    }
}
