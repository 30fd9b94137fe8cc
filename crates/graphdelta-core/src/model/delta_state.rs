use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::GraphDeltaError;

/// Classification of a node or relationship after delta marking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeltaState {
    #[serde(rename = "EXACT_MATCH")]
    ExactMatch,
    #[serde(rename = "MODIFICATION")]
    Modification,
    #[serde(rename = "ADDITION")]
    Addition,
    #[serde(rename = "DELETION")]
    Deletion,
}

impl DeltaState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeltaState::ExactMatch => "EXACT_MATCH",
            DeltaState::Modification => "MODIFICATION",
            DeltaState::Addition => "ADDITION",
            DeltaState::Deletion => "DELETION",
        }
    }

    /// Combine a recorded mark with a newly proposed one
    ///
    /// An unmarked element takes the proposal. A recorded ExactMatch yields to
    /// any proposal. Any other recorded state sticks.
    pub fn merge(old: Option<DeltaState>, new: DeltaState) -> DeltaState {
        match old {
            None | Some(DeltaState::ExactMatch) => new,
            Some(recorded) => recorded,
        }
    }
}

impl fmt::Display for DeltaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeltaState {
    type Err = GraphDeltaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EXACT_MATCH" => Ok(DeltaState::ExactMatch),
            "MODIFICATION" => Ok(DeltaState::Modification),
            "ADDITION" => Ok(DeltaState::Addition),
            "DELETION" => Ok(DeltaState::Deletion),
            other => Err(GraphDeltaError::UnknownDeltaState {
                name: other.to_string(),
            }),
        }
    }
}
