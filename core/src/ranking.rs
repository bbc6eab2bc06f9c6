//! Ranking Engine
//!
//! Aggregates the full rating-event set into a per-profile average and
//! count, sorted into a total order. Pure functions of their inputs:
//! no caching, no incremental maintenance - the ranking is recomputed
//! from scratch on every screen visit and the O(members x events) cost
//! is accepted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::profile::{Profile, ProfileId};
use crate::votes::VoteRow;

/// One derived ranking entry. Never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct RankingEntry {
    /// The ranked profile.
    pub profile: Profile,
    /// Mean of all ratings targeting this profile, 0.0 when none.
    pub average: f64,
    /// Number of ratings targeting this profile.
    pub count: usize,
}

impl RankingEntry {
    /// Whether this profile has received any votes.
    pub fn has_votes(&self) -> bool {
        self.count > 0
    }
}

/// A profile's place in the computed ranking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankPosition {
    /// 1-based rank.
    pub rank: usize,
    /// Whether the profile occupies the last position.
    pub is_last: bool,
    /// Total number of ranked profiles.
    pub total: usize,
}

/// Compute the ranking over the full event set.
///
/// Every profile gets exactly one entry; profiles with no incoming
/// votes rank with average 0 and count 0. The order is total:
/// descending by average, then descending by count, then ascending by
/// profile id. The tertiary key makes ties deterministic regardless of
/// the order the backend returned the profiles in.
pub fn compute_ranking(votes: &[VoteRow], profiles: &[Profile]) -> Vec<RankingEntry> {
    let mut sums: HashMap<ProfileId, (u64, usize)> = HashMap::new();
    for vote in votes {
        let slot = sums.entry(vote.voted_for).or_insert((0, 0));
        slot.0 += u64::from(vote.rating.value());
        slot.1 += 1;
    }

    let mut entries: Vec<RankingEntry> = profiles
        .iter()
        .map(|profile| {
            let (sum, count) = sums.get(&profile.id).copied().unwrap_or((0, 0));
            let average = if count > 0 {
                sum as f64 / count as f64
            } else {
                0.0
            };
            RankingEntry {
                profile: profile.clone(),
                average,
                count,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.average
            .total_cmp(&a.average)
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| a.profile.id.cmp(&b.profile.id))
    });

    entries
}

/// Locate a profile in a computed ranking.
///
/// Returns `None` when the profile is not ranked (e.g. the event set
/// could not be retrieved and the caller ranked nothing).
pub fn ranking_position(entries: &[RankingEntry], id: ProfileId) -> Option<RankPosition> {
    let index = entries.iter().position(|e| e.profile.id == id)?;
    Some(RankPosition {
        rank: index + 1,
        is_last: index + 1 == entries.len(),
        total: entries.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::votes::Rating;
    use pretty_assertions::assert_eq;

    fn profile(name: &str) -> Profile {
        Profile {
            id: ProfileId::random(),
            email: format!("{name}@famstar.local"),
            display_name: Some(name.to_string()),
        }
    }

    fn vote(target: ProfileId, rating: u8) -> VoteRow {
        VoteRow {
            voted_for: target,
            rating: Rating::new(rating).unwrap(),
        }
    }

    #[test]
    fn test_one_entry_per_profile() {
        let profiles = vec![profile("a"), profile("b"), profile("c")];
        let votes = vec![vote(profiles[0].id, 3)];
        let ranking = compute_ranking(&votes, &profiles);
        assert_eq!(ranking.len(), 3);
    }

    #[test]
    fn test_scenario_two_targets() {
        // events = [(A->B,5), (C->B,3), (A->D,1)]
        let b = profile("b");
        let d = profile("d");
        let a = profile("a");
        let c = profile("c");
        let votes = vec![vote(b.id, 5), vote(b.id, 3), vote(d.id, 1)];
        let profiles = vec![a.clone(), b.clone(), c.clone(), d.clone()];

        let ranking = compute_ranking(&votes, &profiles);

        assert_eq!(ranking[0].profile.id, b.id);
        assert_eq!(ranking[0].average, 4.0);
        assert_eq!(ranking[0].count, 2);
        assert_eq!(ranking[1].profile.id, d.id);
        assert_eq!(ranking[1].average, 1.0);
        assert_eq!(ranking[1].count, 1);
        for entry in &ranking[2..] {
            assert_eq!(entry.average, 0.0);
            assert_eq!(entry.count, 0);
            assert!(!entry.has_votes());
        }

        let pos = ranking_position(&ranking, b.id).unwrap();
        assert_eq!(pos.rank, 1);
        assert!(!pos.is_last);
        assert_eq!(pos.total, 4);
    }

    #[test]
    fn test_sorted_non_increasing() {
        let profiles: Vec<Profile> = (0..5).map(|i| profile(&format!("p{i}"))).collect();
        let votes = vec![
            vote(profiles[0].id, 2),
            vote(profiles[1].id, 5),
            vote(profiles[1].id, 1),
            vote(profiles[2].id, 4),
            vote(profiles[3].id, 4),
            vote(profiles[3].id, 4),
        ];
        let ranking = compute_ranking(&votes, &profiles);

        for pair in ranking.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            assert!(
                first.average > second.average
                    || (first.average == second.average && first.count >= second.count)
            );
        }
    }

    #[test]
    fn test_count_breaks_average_ties() {
        let many = profile("many");
        let few = profile("few");
        let votes = vec![
            vote(many.id, 4),
            vote(many.id, 4),
            vote(few.id, 4),
        ];
        let ranking = compute_ranking(&votes, &[few.clone(), many.clone()]);
        assert_eq!(ranking[0].profile.id, many.id);
        assert_eq!(ranking[1].profile.id, few.id);
    }

    #[test]
    fn test_full_ties_ordered_by_profile_id() {
        let p1 = profile("p1");
        let p2 = profile("p2");
        let (lo, hi) = if p1.id < p2.id {
            (p1.clone(), p2.clone())
        } else {
            (p2.clone(), p1.clone())
        };

        // Same average, same count, both input orders.
        let forward = compute_ranking(&[], &[p1.clone(), p2.clone()]);
        let backward = compute_ranking(&[], &[p2, p1]);
        assert_eq!(forward[0].profile.id, lo.id);
        assert_eq!(backward[0].profile.id, lo.id);
        assert_eq!(forward[1].profile.id, hi.id);
    }

    #[test]
    fn test_position_last_place() {
        let a = profile("a");
        let b = profile("b");
        let votes = vec![vote(a.id, 5)];
        let ranking = compute_ranking(&votes, &[a.clone(), b.clone()]);

        let pos = ranking_position(&ranking, b.id).unwrap();
        assert_eq!(pos.rank, 2);
        assert!(pos.is_last);
    }

    #[test]
    fn test_position_unknown_profile() {
        let a = profile("a");
        let ranking = compute_ranking(&[], &[a]);
        assert!(ranking_position(&ranking, ProfileId::random()).is_none());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(compute_ranking(&[], &[]).is_empty());
        assert!(ranking_position(&[], ProfileId::random()).is_none());
    }
}
