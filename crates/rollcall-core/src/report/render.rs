//! Report rendering.
//!
//! Produces the daily report in three sections (daily ledger, monthly ledger,
//! roster) separated by blank lines. Iteration always follows roster order.

use serde::{Deserialize, Serialize};

use super::grammar::{
    bullet, daily_title, ledger_line, month_header, parse_line, part_marker, status_header,
    ReportLine, ACTIVE_HEADER, INACTIVE_HEADER,
};
use crate::accrual::{AccrualEvent, AccrualStore, Thresholds};
use crate::roster::Roster;

/// What happened in the current run, as needed by the renderer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Local `YYYY-MM-DD` of the run
    pub date: String,

    /// Local `YYYY-MM` of the run
    pub month: String,

    /// Participants whose counters were updated this run, roster order
    pub judged_ids: Vec<String>,

    /// Escalation events emitted this run
    pub events: Vec<AccrualEvent>,
}

fn demotion_notice(name: &str, threshold: u32) -> String {
    format!("⚠️ {name} 님은 경고 {threshold}회 누적으로 비활성 처리되었습니다.")
}

fn conversion_notice(name: &str, threshold: u32) -> String {
    format!("ℹ️ {name} 님의 지각 {threshold}회가 결석 1회로 전환되었습니다.")
}

/// Renders the report for one run.
pub struct ReportRenderer<'a> {
    roster: &'a Roster,
    thresholds: Thresholds,
}

impl<'a> ReportRenderer<'a> {
    pub fn new(roster: &'a Roster, thresholds: Thresholds) -> Self {
        Self { roster, thresholds }
    }

    /// The full report text.
    pub fn render(&self, store: &AccrualStore, summary: &RunSummary) -> String {
        self.sections(store, summary).join("\n\n")
    }

    /// Report sections in output order.
    pub fn sections(&self, store: &AccrualStore, summary: &RunSummary) -> Vec<String> {
        vec![
            self.daily_section(store, summary),
            self.monthly_section(store, &summary.month),
            self.roster_section(store),
        ]
    }

    fn daily_section(&self, store: &AccrualStore, summary: &RunSummary) -> String {
        let mut lines = vec![daily_title(&summary.date)];

        for p in self.roster.iter() {
            if !summary.judged_ids.iter().any(|id| id == &p.id) {
                continue;
            }
            let Some(record) = store.get(&p.id) else {
                continue;
            };
            lines.push(ledger_line(&p.name, record.late, record.absent));

            for event in &summary.events {
                match event {
                    AccrualEvent::LateConverted { participant_id } if participant_id == &p.id => {
                        lines.push(conversion_notice(&p.name, self.thresholds.late_to_warning));
                    }
                    AccrualEvent::Demoted { participant_id } if participant_id == &p.id => {
                        lines.push(demotion_notice(&p.name, self.thresholds.warnings_to_inactive));
                    }
                    _ => {}
                }
            }
        }

        lines.join("\n")
    }

    fn monthly_section(&self, store: &AccrualStore, month: &str) -> String {
        let mut lines = vec![month_header(month)];
        for p in self.roster.iter() {
            if let Some(record) = store.get(&p.id) {
                lines.push(ledger_line(&p.name, record.late, record.absent));
            }
        }
        lines.join("\n")
    }

    fn roster_section(&self, store: &AccrualStore) -> String {
        let (active, inactive): (Vec<_>, Vec<_>) = self
            .roster
            .iter()
            .filter_map(|p| store.get(&p.id).map(|r| (p, r.is_active())))
            .partition(|(_, is_active)| *is_active);

        let mut lines = vec![status_header(ACTIVE_HEADER, active.len())];
        lines.extend(active.iter().map(|(p, _)| bullet(&p.name)));
        lines.push(status_header(INACTIVE_HEADER, inactive.len()));
        lines.extend(inactive.iter().map(|(p, _)| bullet(&p.name)));
        lines.join("\n")
    }
}

/// Room kept free in each part of a split report for its `(i/n)` marker line.
pub const PART_MARKER_RESERVE: usize = 12;

/// Pack report sections into messages no longer than `limit` characters.
///
/// A report that fits in one message is returned as-is. Otherwise every part
/// starts with an `(i/n)` marker line so a reader can tell a complete report
/// from one whose later parts never arrived.
///
/// Sections are kept whole where possible. A section that is too long on its
/// own is cut at line boundaries and its heading (the first line, or the
/// latest roster status header) is repeated at the top of each continuation,
/// so every part still parses on its own. Lines longer than a part are cut
/// hard; headings are assumed to fit.
pub fn split_for_delivery(sections: &[String], limit: usize) -> Vec<String> {
    let whole = pack(sections, limit);
    if whole.len() <= 1 {
        return whole;
    }

    let parts = pack(sections, limit.saturating_sub(PART_MARKER_RESERVE).max(1));
    let total = parts.len();
    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| format!("{}\n{part}", part_marker(i + 1, total)))
        .collect()
}

fn is_status_header(line: &str) -> bool {
    matches!(
        parse_line(line),
        Some(ReportLine::ActiveHeader | ReportLine::InactiveHeader)
    )
}

fn hard_wrap(line: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() <= width {
        return vec![line.to_string()];
    }
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

fn pack(sections: &[String], limit: usize) -> Vec<String> {
    let mut messages: Vec<String> = Vec::new();
    let mut current = String::new();

    let push_piece = |piece: String, current: &mut String, messages: &mut Vec<String>| {
        let needed = if current.is_empty() {
            piece.chars().count()
        } else {
            current.chars().count() + 2 + piece.chars().count()
        };
        if needed > limit && !current.is_empty() {
            messages.push(std::mem::take(current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(&piece);
    };

    for section in sections {
        if section.chars().count() <= limit {
            push_piece(section.clone(), &mut current, &mut messages);
            continue;
        }

        let mut lines = section.lines();
        let mut header = lines.next().unwrap_or_default().to_string();
        let mut chunk = header.clone();
        for line in lines {
            // bullets after a split must stay under the status they belong to
            if is_status_header(line) {
                header = line.to_string();
                if chunk.chars().count() + 1 + line.chars().count() > limit {
                    push_piece(std::mem::replace(&mut chunk, header.clone()), &mut current, &mut messages);
                } else {
                    chunk.push('\n');
                    chunk.push_str(line);
                }
                continue;
            }

            let width = limit.saturating_sub(header.chars().count() + 1).max(1);
            for piece in hard_wrap(line, width) {
                if chunk.chars().count() + 1 + piece.chars().count() > limit && chunk != header {
                    push_piece(std::mem::replace(&mut chunk, header.clone()), &mut current, &mut messages);
                }
                chunk.push('\n');
                chunk.push_str(&piece);
            }
        }
        push_piece(chunk, &mut current, &mut messages);
    }

    if !current.is_empty() {
        messages.push(current);
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accrual::{AccrualRecord, MembershipStatus, Thresholds};
    use crate::roster::Participant;

    fn roster() -> Roster {
        Roster::new(vec![
            Participant::new("u1", "Kim"),
            Participant::new("u2", "Lee"),
            Participant::new("u3", "Park"),
        ])
        .unwrap()
    }

    fn store() -> AccrualStore {
        let mut store = AccrualStore::new();
        store.insert("u3", AccrualRecord { late: 1, absent: 0, status: MembershipStatus::Active });
        store.insert("u1", AccrualRecord { late: 2, absent: 1, status: MembershipStatus::Active });
        store.insert("u2", AccrualRecord { late: 0, absent: 0, status: MembershipStatus::Inactive });
        store
    }

    #[test]
    fn renders_sections_in_roster_order() {
        let roster = roster();
        let summary = RunSummary {
            date: "2026-10-19".into(),
            month: "2026-10".into(),
            judged_ids: vec!["u1".into(), "u2".into(), "u3".into()],
            events: vec![AccrualEvent::Demoted { participant_id: "u2".into() }],
        };
        let text = ReportRenderer::new(&roster, Thresholds::default()).render(&store(), &summary);

        let expected = "\
2026-10-19 출석체크
Kim : 지각:2, 결석:1
Lee : 지각:0, 결석:0
⚠️ Lee 님은 경고 3회 누적으로 비활성 처리되었습니다.
Park : 지각:1, 결석:0

2026-10 출석결과
Kim : 지각:2, 결석:1
Lee : 지각:0, 결석:0
Park : 지각:1, 결석:0

Active (2명)
- Kim
- Park
InActive (1명)
- Lee";
        assert_eq!(text, expected);
    }

    #[test]
    fn daily_section_only_lists_judged_participants() {
        let roster = roster();
        let summary = RunSummary {
            date: "2026-10-19".into(),
            month: "2026-10".into(),
            judged_ids: vec!["u3".into()],
            events: vec![],
        };
        let sections = ReportRenderer::new(&roster, Thresholds::default()).sections(&store(), &summary);
        assert_eq!(sections[0], "2026-10-19 출석체크\nPark : 지각:1, 결석:0");
    }

    #[test]
    fn short_report_is_a_single_message() {
        let sections = vec!["a\nb".to_string(), "c".to_string()];
        assert_eq!(split_for_delivery(&sections, 2000), vec!["a\nb\n\nc".to_string()]);
    }

    #[test]
    fn splits_at_section_boundaries_and_tags_parts() {
        let sections = vec!["x".repeat(12), "y".repeat(12)];
        let messages = split_for_delivery(&sections, 24);
        assert_eq!(
            messages,
            vec![format!("(1/2)\n{}", "x".repeat(12)), format!("(2/2)\n{}", "y".repeat(12))]
        );
    }

    #[test]
    fn oversized_section_repeats_its_header() {
        let section = "HEAD\nline-1\nline-2\nline-3\nline-4\nline-5".to_string();
        let messages = split_for_delivery(&[section], 30);
        assert_eq!(messages.len(), 3);
        for (i, m) in messages.iter().enumerate() {
            assert!(m.starts_with(&format!("({}/3)\nHEAD\n", i + 1)));
            assert!(m.chars().count() <= 30);
        }
    }

    #[test]
    fn overlong_line_is_cut_to_fit() {
        let section = format!("HEAD\n{}", "z".repeat(50));
        let messages = split_for_delivery(&[section], 30);
        assert!(messages.len() > 1);
        assert!(messages.iter().all(|m| m.chars().count() <= 30));
        let z: usize = messages.iter().map(|m| m.matches('z').count()).sum();
        assert_eq!(z, 50);
    }

    #[test]
    fn split_roster_keeps_bullets_under_their_status() {
        let roster = Roster::new(vec![
            Participant::new("u1", "Kim"),
            Participant::new("u2", "Lee"),
            Participant::new("u3", "Park"),
        ])
        .unwrap();
        let section = "Active (1명)\n- Kim\nInActive (2명)\n- Lee\n- Park".to_string();
        let messages = split_for_delivery(&[section], 32);

        assert_eq!(
            messages,
            vec![
                "(1/3)\nActive (1명)\n- Kim".to_string(),
                "(2/3)\nInActive (2명)\n- Lee".to_string(),
                "(3/3)\nInActive (2명)\n- Park".to_string(),
            ]
        );
        let rebuilt = crate::report::reconstruct(messages.iter().map(String::as_str), &roster);
        assert!(rebuilt.store.get("u1").unwrap().is_active());
        assert!(rebuilt.store.is_inactive("u2"));
        assert!(rebuilt.store.is_inactive("u3"));
    }
}
