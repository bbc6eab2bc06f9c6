//! Rating Events
//!
//! One rating event is appended per vote cast. Events are immutable:
//! there is no update or delete path, and repeat votes from the same
//! voter to the same target all persist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::profile::ProfileId;

/// A star rating, always in `1..=5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Lowest allowed rating.
    pub const MIN: u8 = 1;
    /// Highest allowed rating.
    pub const MAX: u8 = 5;

    /// Validate and wrap a raw value.
    pub fn new(value: u8) -> Result<Self, CoreError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CoreError::InputInvalid(format!(
                "rating must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// The raw value.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// A row of filled stars, e.g. `"★★★"` for a 3.
    pub fn stars(&self) -> String {
        "★".repeat(self.0 as usize)
    }

    /// Whether this is the extreme negative rating.
    pub fn is_lowest(&self) -> bool {
        self.0 == Self::MIN
    }

    /// Whether this is the extreme positive rating.
    pub fn is_highest(&self) -> bool {
        self.0 == Self::MAX
    }
}

impl TryFrom<u8> for Rating {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// One row of the unfiltered event listing consumed by the ranking
/// engine. Only the target and the value matter for aggregation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct VoteRow {
    /// The rated profile.
    #[serde(rename = "voted_for_id")]
    pub voted_for: ProfileId,
    /// The star value.
    pub rating: Rating,
}

/// A new rating event to append.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NewVote {
    /// Who cast the vote.
    pub voter_id: ProfileId,
    /// Who the vote is for.
    pub voted_for_id: ProfileId,
    /// The star value.
    pub rating: Rating,
}

/// An inserted rating event as delivered over the realtime channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct VoteInsert {
    /// Who cast the vote.
    pub voter_id: ProfileId,
    /// Who the vote is for.
    pub voted_for_id: ProfileId,
    /// The star value.
    pub rating: Rating,
}

/// One row of the recent-votes listing, already joined with both
/// display names, newest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecentVote {
    /// Display name of the voter.
    pub voter_name: String,
    /// Display name of the rated member.
    pub voted_for_name: String,
    /// The star value.
    pub rating: Rating,
    /// When the vote was recorded.
    pub timestamp: DateTime<Utc>,
}

impl RecentVote {
    /// Humanized age label relative to `now`: "now", "12 min ago",
    /// "3h ago", "yesterday", "4 days ago", or a short date.
    pub fn age_label(&self, now: DateTime<Utc>) -> String {
        let elapsed = now.signed_duration_since(self.timestamp);
        let mins = elapsed.num_minutes();
        let hours = elapsed.num_hours();
        let days = elapsed.num_days();

        if mins < 1 {
            "now".to_string()
        } else if mins < 60 {
            format!("{mins} min ago")
        } else if hours < 24 {
            format!("{hours}h ago")
        } else if days == 1 {
            "yesterday".to_string()
        } else if days < 7 {
            format!("{days} days ago")
        } else {
            self.timestamp.format("%d/%m").to_string()
        }
    }
}
