//! State reconstruction from previously published report text.
//!
//! Messages must be supplied oldest first. Every recognized line overwrites
//! what earlier lines said about the same name, so the most recent report is
//! authoritative.

use std::collections::HashMap;

use super::grammar::{parse_line, ReportLine};
use crate::accrual::{AccrualRecord, AccrualStore, MembershipStatus};
use crate::roster::Roster;

/// Result of reading report history back into a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconstruction {
    pub store: AccrualStore,

    /// Names found in the text with no roster entry, in first-seen order
    pub unmapped_names: Vec<String>,

    /// Most recent month header seen, if any
    pub last_month: Option<String>,

    /// Number of lines that matched a grammar rule
    pub matched_lines: usize,

    /// Parts of split reports ignored because their report was incomplete
    pub skipped_parts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Ledger,
    Roster(MembershipStatus),
}

#[derive(Debug, Default, Clone, Copy)]
struct NameState {
    counters: Option<(u32, u32)>,
    status: Option<MembershipStatus>,
}

#[derive(Default)]
struct Accumulator<'a> {
    by_name: HashMap<&'a str, NameState>,
    seen_order: Vec<&'a str>,
    last_month: Option<String>,
    matched_lines: usize,
}

impl<'a> Accumulator<'a> {
    fn state(&mut self, name: &'a str) -> &mut NameState {
        let seen_order = &mut self.seen_order;
        self.by_name.entry(name).or_insert_with(|| {
            seen_order.push(name);
            NameState::default()
        })
    }

    fn apply(&mut self, message: &'a str) {
        let mut mode = Mode::Ledger;

        for line in message.lines() {
            let Some(parsed) = parse_line(line) else {
                continue;
            };
            self.matched_lines += 1;

            match parsed {
                ReportLine::Part { .. } => {}
                ReportLine::MonthHeader { month } => {
                    mode = Mode::Ledger;
                    self.last_month = Some(month.to_string());
                }
                ReportLine::ActiveHeader => mode = Mode::Roster(MembershipStatus::Active),
                ReportLine::InactiveHeader => mode = Mode::Roster(MembershipStatus::Inactive),
                ReportLine::Ledger { name, late, absent } => {
                    self.state(name).counters = Some((late, absent));
                }
                ReportLine::Bullet { name } => {
                    if let Mode::Roster(status) = mode {
                        self.state(name).status = Some(status);
                    }
                }
            }
        }
    }
}

/// `(index, total)` when the message is one part of a split report.
fn part_of(message: &str) -> Option<(u32, u32)> {
    let first = message.lines().find(|l| !l.trim().is_empty())?;
    match parse_line(first)? {
        ReportLine::Part { index, total } => Some((index, total)),
        _ => None,
    }
}

/// Rebuild accrual state from report messages, oldest first.
///
/// The parts of a split report are applied only once every part has been
/// seen, in order; a report with missing parts is skipped entirely.
pub fn reconstruct<'a, I>(messages: I, roster: &Roster) -> Reconstruction
where
    I: IntoIterator<Item = &'a str>,
{
    let mut acc = Accumulator::default();
    let mut pending: Vec<&'a str> = Vec::new();
    let mut pending_total = 0;
    let mut skipped_parts = 0;

    for message in messages {
        let Some((index, total)) = part_of(message) else {
            skipped_parts += std::mem::take(&mut pending).len();
            acc.apply(message);
            continue;
        };

        if index == 1 {
            skipped_parts += std::mem::take(&mut pending).len();
            pending_total = total;
        }
        if total != pending_total || index as usize != pending.len() + 1 {
            skipped_parts += std::mem::take(&mut pending).len() + 1;
            continue;
        }

        pending.push(message);
        if pending.len() == total as usize {
            for part in pending.drain(..) {
                acc.apply(part);
            }
        }
    }
    skipped_parts += pending.len();

    let mut store = AccrualStore::new();
    let mut unmapped_names = Vec::new();

    for name in acc.seen_order {
        let state = acc.by_name[name];
        let Some(id) = roster.id_for_name(name) else {
            unmapped_names.push(name.to_string());
            continue;
        };
        let (late, absent) = state.counters.unwrap_or_default();
        store.insert(
            id,
            AccrualRecord {
                late,
                absent,
                status: state.status.unwrap_or_default(),
            },
        );
    }

    Reconstruction {
        store,
        unmapped_names,
        last_month: acc.last_month,
        matched_lines: acc.matched_lines,
        skipped_parts,
    }
}
