//! Per-participant counters and the Active -> Inactive escalation machine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::judge::DayJudgment;

/// Membership status. The only transition is Active -> Inactive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    #[default]
    Active,
    Inactive,
}

/// Accumulated counters for one participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualRecord {
    pub late: u32,
    pub absent: u32,
    #[serde(default)]
    pub status: MembershipStatus,
}

impl AccrualRecord {
    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }
}

/// Escalation thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Lates that convert into one absence warning.
    pub late_to_warning: u32,
    /// Absence warnings that demote a participant.
    pub warnings_to_inactive: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            late_to_warning: 3,
            warnings_to_inactive: 3,
        }
    }
}

/// Something noteworthy that happened while applying a day's judgments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccrualEvent {
    /// Accumulated lates were converted into one absence warning.
    LateConverted { participant_id: String },
    /// Absence warnings reached the threshold; the participant is now Inactive.
    Demoted { participant_id: String },
}

/// Store of accrual records keyed by participant id.
///
/// The store is a plain value: callers own it for the length of a run and
/// decide when (and whether) the result is committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccrualStore {
    records: HashMap<String, AccrualRecord>,
}

impl AccrualStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, participant_id: &str) -> Option<&AccrualRecord> {
        self.records.get(participant_id)
    }

    /// Record for `participant_id`, created Active and zeroed on first use.
    pub fn entry(&mut self, participant_id: &str) -> &mut AccrualRecord {
        self.records.entry(participant_id.to_string()).or_default()
    }

    /// Overwrite a record wholesale (used by reconstruction).
    pub fn insert(&mut self, participant_id: impl Into<String>, record: AccrualRecord) {
        self.records.insert(participant_id.into(), record);
    }

    pub fn contains(&self, participant_id: &str) -> bool {
        self.records.contains_key(participant_id)
    }

    pub fn is_inactive(&self, participant_id: &str) -> bool {
        self.records
            .get(participant_id)
            .is_some_and(|r| !r.is_active())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &HashMap<String, AccrualRecord> {
        &self.records
    }

    /// Apply one day's judgments in order.
    ///
    /// Inactive participants are skipped. Late conversion runs before the
    /// demotion check so a participant can be demoted by the same run that
    /// produced their last warning.
    pub fn apply(&mut self, judgments: &[DayJudgment], thresholds: Thresholds) -> Vec<AccrualEvent> {
        let mut events = Vec::new();

        for j in judgments {
            let record = self.entry(&j.participant_id);
            if !record.is_active() {
                continue;
            }

            // Counters come from report text and may be arbitrarily large.
            record.late = record.late.saturating_add(j.late_delta);
            record.absent = record.absent.saturating_add(j.absent_delta);

            if record.late >= thresholds.late_to_warning {
                record.absent = record.absent.saturating_add(1);
                record.late = 0;
                events.push(AccrualEvent::LateConverted {
                    participant_id: j.participant_id.clone(),
                });
            }

            if record.absent >= thresholds.warnings_to_inactive {
                record.status = MembershipStatus::Inactive;
                record.late = 0;
                record.absent = 0;
                events.push(AccrualEvent::Demoted {
                    participant_id: j.participant_id.clone(),
                });
            }
        }

        events
    }
}
