//! Vote values and point arithmetic.

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// A single vote on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    pub fn as_i64(self) -> i64 {
        match self {
            VoteValue::Up => 1,
            VoteValue::Down => -1,
        }
    }
}

impl TryFrom<i64> for VoteValue {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteValue::Up),
            -1 => Ok(VoteValue::Down),
            other => Err(DomainError::validation(format!(
                "vote value must be 1 or -1, got {other}"
            ))),
        }
    }
}

impl From<VoteValue> for i64 {
    fn from(value: VoteValue) -> Self {
        value.as_i64()
    }
}

/// Recorded vote of the current user on a post. `0` and absence both mean
/// no vote.
pub fn recorded_vote(status: Option<i64>) -> Result<Option<VoteValue>, DomainError> {
    match status {
        None | Some(0) => Ok(None),
        Some(value) => VoteValue::try_from(value).map(Some),
    }
}

/// Points after applying `vote` on top of the recorded vote.
///
/// Returns `None` when the vote repeats the recorded one or the new total
/// does not fit in an `i64`.
pub fn points_after_vote(points: i64, recorded: Option<VoteValue>, vote: VoteValue) -> Option<i64> {
    match recorded {
        Some(previous) if previous == vote => None,
        Some(_) => points.checked_add(2 * vote.as_i64()),
        None => points.checked_add(vote.as_i64()),
    }
}
