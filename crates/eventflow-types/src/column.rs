//! Canonical task-record field names.
//!
//! The task record is an open string-keyed map (unknown fields are stored
//! but never trigger merge/keep-initial behavior), but the fields the
//! aggregator itself knows about are fixed. Naming them here instead of
//! scattering string literals keeps the field policy table (see
//! `eventflow-policy`) and the aggregator in sync.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskColumn {
    Uuid,
    TaskNum,
    Hostname,
    ParentId,
    State,
    States,
    Name,
    LongName,
    Retries,
    BoundArgs,
    DefaultBoundArgs,
    ActualRuntime,
    Utcoffset,
    FromPlugin,
    Results,
    Traceback,
    Exception,
    ChainDepth,
    FirstStarted,
    ExceptionCauseUuid,
    LogsUrl,
}

impl TaskColumn {
    /// The field name as it appears in task records and change-sets.
    pub const fn as_str(self) -> &'static str {
        match self {
            TaskColumn::Uuid => "uuid",
            TaskColumn::TaskNum => "task_num",
            TaskColumn::Hostname => "hostname",
            TaskColumn::ParentId => "parent_id",
            TaskColumn::State => "state",
            TaskColumn::States => "states",
            TaskColumn::Name => "name",
            TaskColumn::LongName => "long_name",
            TaskColumn::Retries => "retries",
            TaskColumn::BoundArgs => "bound_args",
            TaskColumn::DefaultBoundArgs => "default_bound_args",
            TaskColumn::ActualRuntime => "actual_runtime",
            TaskColumn::Utcoffset => "utcoffset",
            TaskColumn::FromPlugin => "from_plugin",
            TaskColumn::Results => "results",
            TaskColumn::Traceback => "traceback",
            TaskColumn::Exception => "exception",
            TaskColumn::ChainDepth => "chain_depth",
            TaskColumn::FirstStarted => "first_started",
            TaskColumn::ExceptionCauseUuid => "exception_cause_uuid",
            TaskColumn::LogsUrl => "logs_url",
        }
    }
}

impl std::fmt::Display for TaskColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
