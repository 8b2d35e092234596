//! Order queue numbers.

use serde::{Deserialize, Serialize};

/// Sequential number assigned to each order for fulfillment ordering.
///
/// Queue numbers start at 1 and are strictly increasing in the order the
/// counter transaction commits. Zero is never a valid queue number; a counter
/// that has never been used is represented by the absence of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct QueueNumber(u64);

/// Error returned when converting zero into a [`QueueNumber`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("queue numbers start at 1")]
pub struct ZeroQueueNumber;

impl QueueNumber {
    /// The number handed to the very first order.
    pub const FIRST: Self = Self(1);

    /// Create a queue number, rejecting zero.
    #[must_use]
    pub const fn new(value: u64) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    /// The queue number following `current`, or [`Self::FIRST`] when no number
    /// has been assigned yet. Returns `None` on overflow.
    #[must_use]
    pub fn after(current: Option<Self>) -> Option<Self> {
        match current {
            None => Some(Self::FIRST),
            Some(Self(value)) => value.checked_add(1).map(Self),
        }
    }

    /// Get the underlying integer.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for QueueNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for QueueNumber {
    type Error = ZeroQueueNumber;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ZeroQueueNumber)
    }
}

impl From<QueueNumber> for u64 {
    fn from(number: QueueNumber) -> Self {
        number.0
    }
}
