use std::fmt;

/// Error returned by [`ReferenceCountedPointer::dispose`](super::ReferenceCountedPointer::dispose).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisposeError {
    /// The handle was already disposed. This is a lifetime bug in the caller.
    AlreadyDisposed,
    /// The shared state was gone while a live handle still pointed at it.
    PointerTornDown,
    LockPoisoned(&'static str),
}

impl fmt::Display for DisposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisposeError::AlreadyDisposed => {
                write!(f, "do not dispose an already-disposed reference-counted pointer")
            }
            DisposeError::PointerTornDown => write!(
                f,
                "attempted to dispose a live handle whose pointer was already torn down"
            ),
            DisposeError::LockPoisoned(operation) => {
                write!(f, "reference count lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for DisposeError {}
