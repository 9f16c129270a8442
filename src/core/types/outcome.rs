//! Result of an operation paired with the soft errors it accumulated

use super::error::{MemoryError, MemoryResult};

/// What every public memwalk operation returns.
///
/// `result` carries the value or the single hard error that aborted the call.
/// `soft_errors` lists, in the order they happened, recoverable problems that
/// did not invalidate the result (skipped unreadable spans, chunk reads that
/// exhausted their retries, unrecognized charset tags passed to a tag-based
/// search). Soft errors are kept even when the call ultimately failed.
#[derive(Debug)]
#[must_use]
pub struct Outcome<T> {
    pub result: MemoryResult<T>,
    pub soft_errors: Vec<MemoryError>,
}

impl<T> Outcome<T> {
    /// A successful outcome without soft errors
    pub fn ok(value: T) -> Self {
        Outcome {
            result: Ok(value),
            soft_errors: Vec::new(),
        }
    }

    /// A failed outcome without soft errors
    pub fn err(error: MemoryError) -> Self {
        Outcome {
            result: Err(error),
            soft_errors: Vec::new(),
        }
    }

    /// Builds an outcome from a result and already collected soft errors
    pub fn new(result: MemoryResult<T>, soft_errors: Vec<MemoryError>) -> Self {
        Outcome {
            result,
            soft_errors,
        }
    }

    /// Whether the operation finished without a hard error
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Moves the soft errors into `sink` and returns the bare result.
    ///
    /// This is how internal helpers chain operations while keeping the soft
    /// error order intact.
    pub fn collect_into(self, sink: &mut Vec<MemoryError>) -> MemoryResult<T> {
        sink.extend(self.soft_errors);
        self.result
    }

    /// Splits the outcome into its result and soft errors
    pub fn into_parts(self) -> (MemoryResult<T>, Vec<MemoryError>) {
        (self.result, self.soft_errors)
    }

    /// Maps the successful value, keeping soft errors
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            result: self.result.map(f),
            soft_errors: self.soft_errors,
        }
    }
}

impl<T> From<MemoryResult<T>> for Outcome<T> {
    fn from(result: MemoryResult<T>) -> Self {
        Outcome::new(result, Vec::new())
    }
}
