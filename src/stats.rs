//! Pure aggregation over the bug collection.
//!
//! Every dashboard, chart, and leaderboard view calls the same
//! [`aggregate`] function with its own grouping key and sort policy, so
//! the grouping/summing semantics cannot drift between views. All
//! functions here are total and synchronous: empty input yields empty
//! output, never an error.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{BugDetails, PenaltyStatus, Sprint};

/// Label used when a bug's developer reference is null (name-keyed views).
pub const UNASSIGNED_LABEL: &str = "Unassigned";
/// Label used when a bug's sprint reference is null.
pub const NO_SPRINT_LABEL: &str = "No Sprint";
/// Label used when a leaderboard entry's developer row is missing.
pub const UNKNOWN_DEVELOPER_LABEL: &str = "Unknown";

/// Grouping key for [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Developer,
    Sprint,
    Status,
}

/// Ordering applied to aggregated groups. `Unsorted` keeps first-seen
/// order, which is deterministic for a given input sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortPolicy {
    Unsorted,
    /// Penalty sum descending, ties broken by count descending.
    /// The canonical leaderboard order.
    PenaltyThenCount,
    /// Count descending, ties broken by penalty sum descending.
    CountThenPenalty,
}

/// One aggregated group: a display name with its bug count and summed
/// penalty amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    pub name: String,
    pub count: usize,
    pub penalty_sum: f64,
}

/// Headline numbers for the statistics page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_bugs: usize,
    pub total_penalty: f64,
    pub pending_count: usize,
    pub paid_count: usize,
    pub waived_count: usize,
    pub pending_penalty: f64,
}

/// One leaderboard row, keyed by developer id so same-named developers
/// stay distinct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub developer_id: String,
    pub developer_name: String,
    pub bug_count: usize,
    pub penalty_sum: f64,
}

/// Penalty amounts are coerced to a usable number: anything non-finite
/// counts as zero, mirroring the store's "missing means 0" default.
fn penalty_of(bug: &BugDetails) -> f64 {
    let amount = bug.bug.penalty_amount;
    if amount.is_finite() { amount } else { 0.0 }
}

/// Group the bug collection by the given key and sum penalties per group.
///
/// A bug with a null developer or sprint reference is still counted,
/// under the fallback label for that key.
pub fn aggregate(bugs: &[BugDetails], group_by: GroupBy, sort: SortPolicy) -> Vec<GroupStat> {
    let mut groups: Vec<GroupStat> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for bug in bugs {
        let name = match group_by {
            GroupBy::Developer => bug
                .developer
                .as_ref()
                .map(|d| d.name.clone())
                .unwrap_or_else(|| UNASSIGNED_LABEL.to_string()),
            GroupBy::Sprint => bug
                .sprint
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_else(|| NO_SPRINT_LABEL.to_string()),
            GroupBy::Status => bug.bug.penalty_status.as_str().to_string(),
        };

        let amount = penalty_of(bug);
        match index.get(&name) {
            Some(&i) => {
                groups[i].count += 1;
                groups[i].penalty_sum += amount;
            }
            None => {
                index.insert(name.clone(), groups.len());
                groups.push(GroupStat {
                    name,
                    count: 1,
                    penalty_sum: amount,
                });
            }
        }
    }

    sort_groups(&mut groups, sort);
    groups
}

fn sort_groups(groups: &mut [GroupStat], sort: SortPolicy) {
    match sort {
        SortPolicy::Unsorted => {}
        SortPolicy::PenaltyThenCount => groups.sort_by(|a, b| {
            b.penalty_sum
                .total_cmp(&a.penalty_sum)
                .then(b.count.cmp(&a.count))
        }),
        SortPolicy::CountThenPenalty => groups.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then(b.penalty_sum.total_cmp(&a.penalty_sum))
        }),
    }
}

/// Headline totals over the (possibly filtered) bug collection.
pub fn summarize(bugs: &[BugDetails]) -> Summary {
    let mut summary = Summary {
        total_bugs: bugs.len(),
        total_penalty: 0.0,
        pending_count: 0,
        paid_count: 0,
        waived_count: 0,
        pending_penalty: 0.0,
    };
    for bug in bugs {
        let amount = penalty_of(bug);
        summary.total_penalty += amount;
        match bug.bug.penalty_status {
            PenaltyStatus::Pending => {
                summary.pending_count += 1;
                summary.pending_penalty += amount;
            }
            PenaltyStatus::Paid => summary.paid_count += 1,
            PenaltyStatus::Waived => summary.waived_count += 1,
        }
    }
    summary
}

/// Per-developer ranking over the given bugs (callers pre-filter to one
/// sprint). Keyed by developer id; bugs whose developer row is gone all
/// land in one entry under the "Unknown" name.
pub fn leaderboard(bugs: &[BugDetails], sort: SortPolicy) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for bug in bugs {
        let developer_id = bug.bug.developer_id.clone().unwrap_or_default();
        let amount = penalty_of(bug);
        match index.get(&developer_id) {
            Some(&i) => {
                entries[i].bug_count += 1;
                entries[i].penalty_sum += amount;
            }
            None => {
                let developer_name = bug
                    .developer
                    .as_ref()
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|| UNKNOWN_DEVELOPER_LABEL.to_string());
                index.insert(developer_id.clone(), entries.len());
                entries.push(LeaderboardEntry {
                    developer_id,
                    developer_name,
                    bug_count: 1,
                    penalty_sum: amount,
                });
            }
        }
    }

    match sort {
        SortPolicy::Unsorted => {}
        SortPolicy::PenaltyThenCount => entries.sort_by(|a, b| {
            b.penalty_sum
                .total_cmp(&a.penalty_sum)
                .then(b.bug_count.cmp(&a.bug_count))
        }),
        SortPolicy::CountThenPenalty => entries.sort_by(|a, b| {
            b.bug_count
                .cmp(&a.bug_count)
                .then(b.penalty_sum.total_cmp(&a.penalty_sum))
        }),
    }
    entries
}

/// Whether `today` falls inside the sprint's date window (inclusive on
/// both ends). Unparseable dates make the sprint inactive rather than
/// erroring.
pub fn is_active(sprint: &Sprint, today: NaiveDate) -> bool {
    let start = NaiveDate::parse_from_str(&sprint.start_date, "%Y-%m-%d");
    let end = NaiveDate::parse_from_str(&sprint.end_date, "%Y-%m-%d");
    match (start, end) {
        (Ok(start), Ok(end)) => start <= today && today <= end,
        _ => false,
    }
}

pub fn count_active(sprints: &[Sprint], today: NaiveDate) -> usize {
    sprints.iter().filter(|s| is_active(s, today)).count()
}

// ── Tests ────────────────────────────────────────────────────────────
