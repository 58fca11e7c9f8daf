//! Candidate selection: qualification predicates and tiered ordering

use crate::Policy;
use nightvac_domain::{Reason, TableName, TableStat};
use std::cmp::Ordering;
use std::collections::HashSet;

/// A table chosen for maintenance, tagged with why it was chosen
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledItem {
    /// Statistics as read at the start of the run
    pub stat: TableStat,

    /// Highest-priority reason the table qualified for
    pub reason: Reason,
}

impl ScheduledItem {
    /// The table to vacuum
    pub fn table(&self) -> &TableName {
        &self.stat.identifier
    }

    /// The number the table was ranked by within its tier, for display
    pub fn metric(&self) -> String {
        match self.reason {
            Reason::FreezeAge => self.stat.freeze_age.to_string(),
            Reason::DeadTuples => format_ratio(self.stat.dead_ratio()),
            Reason::InsertedTuples => format_ratio(self.stat.insert_ratio()),
        }
    }
}

fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{:.4}", r),
        None => "n/a".to_string(),
    }
}

/// Build the ordered work queue for a snapshot
///
/// Tables are grouped by reason in priority order (freeze age, dead tuples,
/// inserted tuples) and the groups are concatenated. A table lands in the
/// first group it qualifies for and nowhere else. Within a group:
/// - freeze age: `freeze_age` descending
/// - dead tuples: dead/live ratio descending
/// - inserted tuples: inserted/live ratio descending
///
/// Undefined ratios (zero live estimate) sort last; ties fall back to the
/// identifier so the order is reproducible.
///
/// # Examples
///
/// ```
/// use nightvac_domain::{Reason, TableName, TableStat};
/// use nightvac_scheduler::{select, Policy};
///
/// let snapshot = vec![
///     TableStat::new(TableName::new("public", "busy"), 0, 1000, 10_000),
///     TableStat::new(TableName::new("public", "old"), 200_000_000, 0, 10),
/// ];
/// let queue = select(&snapshot, &Policy::default());
///
/// assert_eq!(queue.len(), 2);
/// assert_eq!(queue[0].reason, Reason::FreezeAge);
/// assert_eq!(queue[1].reason, Reason::DeadTuples);
/// ```
pub fn select(snapshot: &[TableStat], policy: &Policy) -> Vec<ScheduledItem> {
    let mut scheduled: HashSet<&TableName> = HashSet::new();
    let mut queue = Vec::new();

    for reason in Reason::ALL {
        let mut tier: Vec<&TableStat> = snapshot
            .iter()
            .filter(|stat| !scheduled.contains(&stat.identifier))
            .filter(|stat| qualifies(stat, policy, reason))
            .collect();
        tier.sort_by(|a, b| rank(reason, a, b));

        for stat in tier {
            if scheduled.insert(&stat.identifier) {
                queue.push(ScheduledItem {
                    stat: stat.clone(),
                    reason,
                });
            }
        }
    }

    queue
}

/// Whether a table satisfies the predicate for `reason`
pub fn qualifies(stat: &TableStat, policy: &Policy, reason: Reason) -> bool {
    match reason {
        Reason::FreezeAge => stat.freeze_age > policy.freeze_max_age,
        Reason::DeadTuples => {
            cooled_down(stat, policy)
                && exceeds(
                    stat.dead_tuple_count,
                    policy.dead_tuple_threshold,
                    policy.dead_tuple_scale_factor,
                    stat.live_tuple_estimate,
                )
        }
        Reason::InsertedTuples => {
            cooled_down(stat, policy)
                && stat.inserted_since_vacuum.is_some_and(|inserted| {
                    exceeds(
                        inserted,
                        policy.insert_threshold,
                        policy.insert_scale_factor,
                        stat.live_tuple_estimate,
                    )
                })
        }
    }
}

/// `count > threshold + scale * live`; with a zero estimate the scale term vanishes
fn exceeds(count: u64, threshold: u64, scale_factor: f64, live: u64) -> bool {
    let limit = threshold as f64 + scale_factor * live as f64;
    count as f64 > limit
}

/// Autovacuum ran recently enough that dead/insert pressure is already handled
fn cooled_down(stat: &TableStat, policy: &Policy) -> bool {
    if policy.autovacuum_cooldown_secs == 0 {
        return true;
    }
    stat.since_last_autovacuum
        .map_or(true, |since| since > policy.autovacuum_cooldown())
}

fn rank(reason: Reason, a: &TableStat, b: &TableStat) -> Ordering {
    let primary = match reason {
        Reason::FreezeAge => b.freeze_age.cmp(&a.freeze_age),
        Reason::DeadTuples => descending(a.dead_ratio(), b.dead_ratio()),
        Reason::InsertedTuples => descending(a.insert_ratio(), b.insert_ratio()),
    };
    primary.then_with(|| a.identifier.cmp(&b.identifier))
}

fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
