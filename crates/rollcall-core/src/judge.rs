//! Daily attendance judgment.
//!
//! Combines the morning and core-time signals of each participant into a
//! late/absent delta for the day. Pure: no clock reads, no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::clock::{TimeWindowClassifier, VerificationKind};
use crate::roster::Participant;

/// Earliest check-in per participant id for one verification window.
pub type SignalMap = HashMap<String, DateTime<Utc>>;

/// How the two daily signals combine into a day's deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgmentPolicy {
    /// At most one late per day. A single missing signal counts as late.
    #[default]
    CappedDaily,
    /// Each signal is scored on its own, up to two lates per day.
    PerSignal,
}

/// Outcome of one day for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayJudgment {
    pub participant_id: String,
    pub late_delta: u32,
    pub absent_delta: u32,
}

/// On-time status of a single signal, `None` when it is missing.
fn signal_on_time(
    classifier: &TimeWindowClassifier,
    kind: VerificationKind,
    signals: &SignalMap,
    participant_id: &str,
) -> Option<bool> {
    signals
        .get(participant_id)
        .map(|ts| classifier.is_on_time(kind, *ts))
}

/// Judge one day for every participant, in roster order.
pub fn judge_attendance(
    participants: &[Participant],
    morning: &SignalMap,
    core_time: &SignalMap,
    classifier: &TimeWindowClassifier,
    policy: JudgmentPolicy,
) -> Vec<DayJudgment> {
    participants
        .iter()
        .map(|p| {
            let m = signal_on_time(classifier, VerificationKind::MorningCheck, morning, &p.id);
            let c = signal_on_time(classifier, VerificationKind::CoreTimeCheck, core_time, &p.id);
            let (late_delta, absent_delta) = combine(m, c, policy);
            DayJudgment {
                participant_id: p.id.clone(),
                late_delta,
                absent_delta,
            }
        })
        .collect()
}

fn combine(morning: Option<bool>, core_time: Option<bool>, policy: JudgmentPolicy) -> (u32, u32) {
    match (morning, core_time, policy) {
        (None, None, _) => (0, 1),
        (Some(m), Some(c), JudgmentPolicy::CappedDaily) => (u32::from(!(m && c)), 0),
        (_, _, JudgmentPolicy::CappedDaily) => (1, 0),
        (m, c, JudgmentPolicy::PerSignal) => {
            let late = |s: Option<bool>| u32::from(s != Some(true));
            (late(m) + late(c), 0)
        }
    }
}
