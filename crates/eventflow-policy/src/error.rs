//! Errors raised while normalizing an event.

use thiserror::Error;

/// A transform received an event whose payload did not match its expected
/// shape (e.g. `long_name` present but not a string).
///
/// This is treated as a schema/programmer error (§7, error kind 3): the
/// aggregator does not catch or translate it into a dropped event the way
/// it drops malformed uuids.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// A field present on the event had the wrong [`crate::Value`] shape
    /// for the transform that reads it.
    #[error("field {field:?} must be {expected} for its transform, event had a different shape")]
    MalformedField {
        /// The offending field name.
        field: &'static str,
        /// A short description of the expected shape, e.g. `"a string"`.
        expected: &'static str,
    },
}
