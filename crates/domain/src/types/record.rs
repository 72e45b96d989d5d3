//! Computation records and their status lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::impl_wire_str_conversions;
use crate::utils::serde::lenient_datetime;

/// Status of a record on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordStatus {
    Waiting,
    Running,
    Complete,
    Error,
    Cancelled,
    Invalid,
    Deleted,
}

impl_wire_str_conversions!(RecordStatus {
    Waiting => "waiting",
    Running => "running",
    Complete => "complete",
    Error => "error",
    Cancelled => "cancelled",
    Invalid => "invalid",
    Deleted => "deleted",
});

impl RecordStatus {
    /// No further automatic progress happens from a terminal status.
    ///
    /// `invalid` and `deleted` are only reached through explicit user action
    /// and never advance on their own, so they count as terminal too.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Waiting | Self::Running)
    }
}

/// Scheduling priority; travels as an integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    /// Integer wire value
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Normal => 1,
            Self::High => 2,
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Low),
            1 => Ok(Self::Normal),
            2 => Ok(Self::High),
            other => Err(format!("Invalid Priority: {other}")),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u8::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// A record as returned by the server
///
/// Only the fields the cache reasons about are typed; everything else
/// (the kind-specific specification, results, history) stays in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    #[serde(default)]
    pub record_type: Option<String>,
    pub status: RecordStatus,
    #[serde(default)]
    pub is_service: bool,
    #[serde(default, alias = "manager_name")]
    pub compute_tag: Option<String>,
    #[serde(default)]
    pub compute_priority: Option<Priority>,
    #[serde(default, with = "lenient_datetime")]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default, with = "lenient_datetime")]
    pub modified_on: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
