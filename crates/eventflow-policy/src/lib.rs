#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **eventflow-policy** – Field policy registry, deep merge, event
//! normalizer, and change detector for Eventflow.
//!
//! Together these pure, side-effect-free pieces turn one raw event into a
//! delta against an existing (or about-to-exist) task record. None of
//! this crate touches a store; `eventflow-aggregator` orchestrates it
//! against one.

mod diff;
mod error;
mod merge;
mod normalize;
mod registry;
mod transforms;

pub use diff::diff;
pub use error::PolicyError;
pub use merge::{merge_maps, merge_values, restrict};
pub use normalize::normalize;
pub use registry::{FieldPolicyRegistry, FieldPolicySpec};
pub use transforms::FieldTransform;
