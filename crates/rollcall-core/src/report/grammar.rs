//! Line grammar shared by the renderer and the reconstructor.
//!
//! Report text is the persisted state of the system: anything written here
//! must stay parseable by the functions below, and old reports must keep
//! parsing after any change.

use chrono::NaiveDate;

pub const DAILY_TITLE_SUFFIX: &str = " 출석체크";
pub const MONTH_HEADER_SUFFIX: &str = " 출석결과";
pub const ACTIVE_HEADER: &str = "Active";
pub const INACTIVE_HEADER: &str = "InActive";
pub const BULLET_PREFIX: &str = "- ";

const LEDGER_SEPARATOR: &str = " : ";
const LATE_LABEL: &str = "지각:";
const ABSENT_LABEL: &str = ", 결석:";

/// One recognized report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine<'a> {
    MonthHeader { month: &'a str },
    Ledger { name: &'a str, late: u32, absent: u32 },
    ActiveHeader,
    InactiveHeader,
    Bullet { name: &'a str },
    /// `(i/n)` heading of one part of a report split across messages
    Part { index: u32, total: u32 },
}

pub fn ledger_line(name: &str, late: u32, absent: u32) -> String {
    format!("{name}{LEDGER_SEPARATOR}{LATE_LABEL}{late}{ABSENT_LABEL}{absent}")
}

pub fn month_header(month: &str) -> String {
    format!("{month}{MONTH_HEADER_SUFFIX}")
}

pub fn daily_title(date: &str) -> String {
    format!("{date}{DAILY_TITLE_SUFFIX}")
}

pub fn status_header(header: &str, count: usize) -> String {
    format!("{header} ({count}명)")
}

pub fn bullet(name: &str) -> String {
    format!("{BULLET_PREFIX}{name}")
}

pub fn part_marker(index: usize, total: usize) -> String {
    format!("({index}/{total})")
}

/// Classify a single line. Unrecognized lines yield `None`.
pub fn parse_line(line: &str) -> Option<ReportLine<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some((index, total)) = parse_part(line) {
        return Some(ReportLine::Part { index, total });
    }
    if is_header(line, INACTIVE_HEADER) {
        return Some(ReportLine::InactiveHeader);
    }
    if is_header(line, ACTIVE_HEADER) {
        return Some(ReportLine::ActiveHeader);
    }
    if let Some(month) = line.strip_suffix(MONTH_HEADER_SUFFIX) {
        if is_month(month) {
            return Some(ReportLine::MonthHeader { month });
        }
    }
    if let Some(entry) = parse_ledger(line) {
        return Some(entry);
    }
    if let Some(name) = line.strip_prefix(BULLET_PREFIX) {
        let name = name.trim();
        if !name.is_empty() {
            return Some(ReportLine::Bullet { name });
        }
    }
    None
}

/// `"Active"` alone or followed by a `" (<n>명)"` count.
fn is_header(line: &str, header: &str) -> bool {
    match line.strip_prefix(header) {
        Some("") => true,
        Some(rest) => rest.starts_with(" (") && rest.ends_with(')'),
        None => false,
    }
}

fn is_month(s: &str) -> bool {
    s.len() == 7 && NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").is_ok()
}

fn parse_part(line: &str) -> Option<(u32, u32)> {
    let (index, total) = line.strip_prefix('(')?.strip_suffix(')')?.split_once('/')?;
    let index: u32 = index.parse().ok()?;
    let total: u32 = total.parse().ok()?;
    (1..=total).contains(&index).then_some((index, total))
}

fn parse_ledger(line: &str) -> Option<ReportLine<'_>> {
    let (name, counters) = line.rsplit_once(LEDGER_SEPARATOR)?;
    let (late, absent) = counters.strip_prefix(LATE_LABEL)?.split_once(ABSENT_LABEL)?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(ReportLine::Ledger {
        name,
        late: late.trim().parse().ok()?,
        absent: absent.trim().parse().ok()?,
    })
}
