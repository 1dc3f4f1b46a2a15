use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::query::Metric;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("year slot must be a four digit year, got `{0}`")]
    MalformedYear(String),
}

/// Failures reported by a query executor.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExecError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    #[error("query did not finish within {after_ms}ms")]
    Timeout { after_ms: u64 },
    #[error("query failed: {0}")]
    Query(String),
}

/// Problems observed while dispatching one request. None of these abort the request: the
/// dispatcher always answers, and reports these next to the response.
///
/// Serializes as `{"kind": ..., "message": ...}`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unrecognized intent `{name}`")]
    InvalidIntent { name: String },
    #[error("query executor unavailable: {reason}")]
    ExecutorUnavailable { reason: String },
    #[error("no data returned for {metric}")]
    NoData { metric: Metric },
    #[error("malformed `{slot}` slot value `{value}`")]
    MalformedSlot { slot: &'static str, value: String },
}

impl DispatchError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidIntent { .. } => "invalid_intent",
            Self::ExecutorUnavailable { .. } => "executor_unavailable",
            Self::NoData { .. } => "no_data",
            Self::MalformedSlot { .. } => "malformed_slot",
        }
    }

    /// Only executor failures degrade the answer; everything else is handled in place.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::ExecutorUnavailable { .. })
    }
}

impl Serialize for DispatchError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DispatchError", 2)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl From<ExecError> for DispatchError {
    fn from(value: ExecError) -> Self {
        Self::ExecutorUnavailable { reason: value.to_string() }
    }
}

impl From<SlotError> for DispatchError {
    fn from(value: SlotError) -> Self {
        match value {
            SlotError::MalformedYear(value) => Self::MalformedSlot { slot: "year", value },
        }
    }
}
