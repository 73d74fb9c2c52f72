//! Run-state vocabulary: the partition of task states into incomplete and
//! complete, supplied by the host at configuration time rather than baked
//! into the aggregator.

use std::collections::HashSet;

use thiserror::Error;

/// `task-revoked`, the canonical state name the `type` transform
/// normalizes both genuine revoke events and `firex-revoke-complete`
/// events onto.
pub const REVOKED_EVENT_TYPE: &str = "task-revoked";

/// The framework's explicit revoke-completed event type. Fired only once a
/// task has actually finished revoking, so it is the authoritative revoke
/// signal and must not be overridden by a later plain state event.
pub const REVOKE_COMPLETE_EVENT_TYPE: &str = "firex-revoke-complete";

/// Error returned when an [`RunstateVocabulary`] is built from
/// non-disjoint `incomplete`/`complete` sets.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunstateVocabularyError {
    /// A state name appeared in both the incomplete and complete sets.
    #[error("runstate {0:?} is listed as both incomplete and complete")]
    Overlap(String),
}

/// The three disjoint, labelled runstate sets the aggregator needs:
/// `all = incomplete ⊎ complete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunstateVocabulary {
    all: HashSet<String>,
    incomplete: HashSet<String>,
    complete: HashSet<String>,
}

impl RunstateVocabulary {
    /// Build a vocabulary from its incomplete and complete halves.
    ///
    /// Fails if the two sets overlap — the original system trusted this
    /// partition silently; this repository validates it once, here,
    /// instead of carrying the assumption forward ungrounded.
    pub fn new(
        incomplete: impl IntoIterator<Item = impl Into<String>>,
        complete: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, RunstateVocabularyError> {
        let incomplete: HashSet<String> = incomplete.into_iter().map(Into::into).collect();
        let complete: HashSet<String> = complete.into_iter().map(Into::into).collect();

        if let Some(overlap) = incomplete.intersection(&complete).next() {
            return Err(RunstateVocabularyError::Overlap(overlap.clone()));
        }

        let all = incomplete.union(&complete).cloned().collect();
        Ok(Self { all, incomplete, complete })
    }

    /// The canonical lifecycle vocabulary for the default deployment:
    /// received/started/blocked/unblocked as incomplete, and
    /// succeeded/failed/revoked/completed as complete.
    pub fn canonical() -> Self {
        Self::new(
            ["task-received", "task-started", "task-blocked", "task-unblocked"],
            ["task-succeeded", "task-failed", REVOKED_EVENT_TYPE, "task-completed"],
        )
        .expect("canonical vocabulary halves are disjoint by construction")
    }

    /// True if `state` is a member of either half.
    pub fn contains(&self, state: &str) -> bool {
        self.all.contains(state)
    }

    /// True if `state` is incomplete.
    pub fn is_incomplete(&self, state: &str) -> bool {
        self.incomplete.contains(state)
    }

    /// True if `state` is complete.
    pub fn is_complete(&self, state: &str) -> bool {
        self.complete.contains(state)
    }

    /// `ALL_RUNSTATES ∪ {firex-revoke-complete}` — the full set of event
    /// `type` values the `type` transform treats as state-bearing.
    pub fn run_state_event_types(&self) -> HashSet<String> {
        let mut types = self.all.clone();
        types.insert(REVOKE_COMPLETE_EVENT_TYPE.to_string());
        types
    }
}

impl Default for RunstateVocabulary {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Maps a raw event `type` to the canonical task state it represents.
///
/// `firex-revoke-complete` canonicalizes to [`REVOKED_EVENT_TYPE`]; every
/// other event type passes through unchanged.
pub fn canonicalize_event_type(event_type: &str) -> &str {
    if event_type == REVOKE_COMPLETE_EVENT_TYPE {
        REVOKED_EVENT_TYPE
    } else {
        event_type
    }
}
