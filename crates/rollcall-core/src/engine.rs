//! The daily attendance run.
//!
//! reconstruct -> collect -> judge -> accrue -> render -> publish, strictly in
//! that order. Runs on one engine are serialized by a run lock, and a run
//! that fails or times out before publishing commits nothing.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::accrual::{AccrualSnapshot, AccrualStore};
use crate::clock::{TimeWindowClassifier, VerificationKind};
use crate::error::{ConfigError, CoreError, PlatformError, Result};
use crate::judge::{judge_attendance, DayJudgment, SignalMap};
use crate::platform::{ChatMessage, ChatPlatform, MessageHandle};
use crate::report::{reconstruct, split_for_delivery, ReportRenderer, RunSummary};
use crate::roster::Roster;
use crate::signals::earliest_signals;
use crate::storage::{Config, StateBackend};

/// Whether a run publishes its report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Publish,
    /// Compute and render only; nothing is sent or committed.
    DryRun,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub judgments: Vec<DayJudgment>,
    #[serde(skip)]
    pub store: AccrualStore,
    pub report: String,
    pub published: Vec<MessageHandle>,
    pub unmapped_names: Vec<String>,
}

/// Await a collaborator call with a deadline.
pub(crate) async fn bounded<T, F>(operation: &'static str, timeout_secs: u64, fut: F) -> Result<T>
where
    F: Future<Output = Result<T, PlatformError>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), fut).await {
        Ok(result) => result.map_err(CoreError::from),
        Err(_) => Err(CoreError::Timeout {
            operation,
            timeout_secs,
        }),
    }
}

/// Runs the attendance pipeline against a chat platform.
pub struct AttendanceEngine<P: ChatPlatform> {
    platform: P,
    config: Config,
    roster: Roster,
    classifier: TimeWindowClassifier,
    run_lock: Mutex<()>,
}

impl<P: ChatPlatform> AttendanceEngine<P> {
    /// Validate the configuration and roster and build an engine.
    pub fn new(platform: P, config: Config) -> Result<Self> {
        config.validate()?;
        let roster = config.roster()?;
        let classifier = TimeWindowClassifier::new(config.schedule.utc_offset_hours);
        Ok(Self {
            platform,
            config,
            roster,
            classifier,
            run_lock: Mutex::new(()),
        })
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    async fn call<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T, PlatformError>>,
    {
        bounded(operation, self.config.engine.request_timeout_secs, fut).await
    }

    /// Execute one daily run as of `now`.
    pub async fn run(&self, now: DateTime<Utc>, mode: RunMode) -> Result<RunOutcome> {
        let _guard = self.run_lock.lock().await;

        let date = self.classifier.date_label(now);
        let month = self.classifier.month_label(now);
        tracing::info!(%date, platform = self.platform.name(), ?mode, "attendance run started");

        let (mut store, unmapped_names) = self.restore_state().await?;

        let morning = self.collect_signals(VerificationKind::MorningCheck, &date).await?;
        let core_time = self.collect_signals(VerificationKind::CoreTimeCheck, &date).await?;

        let judged_ids: Vec<String> = self
            .roster
            .iter()
            .filter(|p| !store.is_inactive(&p.id))
            .map(|p| p.id.clone())
            .collect();
        let judgments: Vec<DayJudgment> = judge_attendance(
            self.roster.participants(),
            &morning,
            &core_time,
            &self.classifier,
            self.config.engine.policy,
        )
        .into_iter()
        .filter(|j| judged_ids.contains(&j.participant_id))
        .collect();

        let events = store.apply(&judgments, self.config.thresholds);
        for event in &events {
            tracing::info!(?event, "escalation");
        }

        let summary = RunSummary {
            date,
            month,
            judged_ids,
            events,
        };
        let renderer = ReportRenderer::new(&self.roster, self.config.thresholds);
        let sections = renderer.sections(&store, &summary);
        let report = sections.join("\n\n");

        let mut published = Vec::new();
        if mode == RunMode::Publish {
            let channel = self.report_channel()?;
            for chunk in split_for_delivery(&sections, self.config.engine.message_char_limit) {
                let handle = self
                    .call("send report", self.platform.send_message(channel, &chunk))
                    .await?;
                published.push(handle);
            }
            self.commit(&store, &summary.date)?;
            tracing::info!(messages = published.len(), "report published");
        }

        Ok(RunOutcome {
            summary,
            judgments,
            store,
            report,
            published,
            unmapped_names,
        })
    }

    fn report_channel(&self) -> Result<&str> {
        let id = self.config.discord.report_channel_id.as_str();
        if id.is_empty() {
            return Err(ConfigError::MissingKey("discord.report_channel_id".into()).into());
        }
        Ok(id)
    }

    /// Load the store the run starts from, plus any names that could not be mapped.
    async fn restore_state(&self) -> Result<(AccrualStore, Vec<String>)> {
        match self.config.engine.state_backend {
            StateBackend::Snapshot => {
                let path = self.config.snapshot_path()?;
                let snapshot = AccrualSnapshot::load(&path)?;
                tracing::debug!(path = %path.display(), records = snapshot.records.len(), "loaded snapshot");
                Ok((AccrualStore::from_snapshot(&snapshot), Vec::new()))
            }
            StateBackend::ReportText => {
                let channel = self.config.discord.report_channel_id.as_str();
                if channel.is_empty() {
                    tracing::warn!("report channel not configured; starting from empty state");
                    return Ok((AccrualStore::new(), Vec::new()));
                }

                let mut history = self
                    .call(
                        "fetch report history",
                        self.platform
                            .fetch_recent_messages(channel, self.config.fetch.report_history_limit),
                    )
                    .await?;
                history.reverse();

                let reports = history
                    .iter()
                    .filter(|m| self.is_report_author(m))
                    .map(|m| m.content.as_str());
                let rebuilt = reconstruct(reports, &self.roster);
                for name in &rebuilt.unmapped_names {
                    tracing::warn!(%name, "report names a participant missing from the roster; dropped");
                }
                if rebuilt.skipped_parts > 0 {
                    tracing::warn!(
                        parts = rebuilt.skipped_parts,
                        "ignored an incompletely published report"
                    );
                }
                tracing::debug!(
                    messages = history.len(),
                    matched = rebuilt.matched_lines,
                    records = rebuilt.store.len(),
                    "reconstructed state from report history"
                );
                Ok((rebuilt.store, rebuilt.unmapped_names))
            }
        }
    }

    /// Only the bot's own posts in the report channel count as reports.
    fn is_report_author(&self, message: &ChatMessage) -> bool {
        let bot_id = self.config.discord.bot_user_id.as_str();
        if bot_id.is_empty() {
            message.author_is_bot
        } else {
            message.author_id == bot_id
        }
    }

    /// Earliest qualifying post per participant in today's thread for `kind`.
    ///
    /// A missing channel or thread yields no signals.
    async fn collect_signals(&self, kind: VerificationKind, date: &str) -> Result<SignalMap> {
        let Some(channel) = self.config.channel_for(kind) else {
            tracing::warn!(?kind, "channel not configured; nobody checked in");
            return Ok(SignalMap::new());
        };

        let title = self.config.thread_title(kind, date);
        let thread = self
            .call("find thread", self.platform.find_active_thread(channel, &title))
            .await?;
        let Some(thread) = thread else {
            tracing::warn!(%title, "thread not found; nobody checked in");
            return Ok(SignalMap::new());
        };

        let messages = self
            .call(
                "fetch thread messages",
                self.platform
                    .fetch_recent_messages(&thread.id, self.config.fetch.thread_message_limit),
            )
            .await?;
        let require_image =
            kind == VerificationKind::MorningCheck && self.config.engine.require_image_for_morning;
        let signals = earliest_signals(&messages, &self.roster, require_image);
        tracing::debug!(%title, messages = messages.len(), signals = signals.len(), "collected signals");
        Ok(signals)
    }

    fn commit(&self, store: &AccrualStore, date: &str) -> Result<()> {
        if self.config.engine.state_backend != StateBackend::Snapshot {
            return Ok(());
        }
        let mut snapshot = store.snapshot();
        snapshot.run_date = Some(date.to_string());
        snapshot.save(&self.config.snapshot_path()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accrual::{AccrualEvent, AccrualRecord, MembershipStatus};
    use crate::platform::MemoryPlatform;
    use crate::roster::Participant;
    use chrono::{FixedOffset, TimeZone};
    use std::sync::Arc;

    const MORNING: &str = "c-morning";
    const CORE: &str = "c-core";
    const REPORT: &str = "c-report";

    fn kst(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, day, hour, minute, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn config() -> Config {
        let mut cfg = Config::default();
        cfg.discord.morning_channel_id = MORNING.into();
        cfg.discord.core_time_channel_id = CORE.into();
        cfg.discord.report_channel_id = REPORT.into();
        cfg.participants = vec![Participant::new("u1", "Kim"), Participant::new("u2", "Lee")];
        cfg
    }

    fn open_threads(platform: &MemoryPlatform, day: u32) -> (String, String) {
        let date = format!("2026-10-{day:02}");
        (
            platform.add_thread(MORNING, &format!("{date} 미모인증")),
            platform.add_thread(CORE, &format!("{date} 코어타임")),
        )
    }

    fn record(outcome: &RunOutcome, id: &str) -> AccrualRecord {
        *outcome.store.get(id).unwrap()
    }

    #[tokio::test]
    async fn judges_and_publishes_the_scenario_day() {
        let platform = MemoryPlatform::new();
        let (morning, _core) = open_threads(&platform, 19);
        platform.post_as(&morning, "u1", kst(19, 8, 5), "", true);

        let engine = AttendanceEngine::new(platform, config()).unwrap();
        let outcome = engine.run(kst(19, 18, 0), RunMode::Publish).await.unwrap();

        assert_eq!(
            outcome.judgments,
            vec![
                DayJudgment { participant_id: "u1".into(), late_delta: 1, absent_delta: 0 },
                DayJudgment { participant_id: "u2".into(), late_delta: 0, absent_delta: 1 },
            ]
        );
        assert_eq!(outcome.published.len(), 1);
        let sent = engine.platform().texts(REPORT);
        assert_eq!(sent, vec![outcome.report.clone()]);
        assert!(outcome.report.contains("Kim : 지각:1, 결석:0"));
        assert!(outcome.report.contains("2026-10 출석결과"));
    }

    #[tokio::test]
    async fn state_carries_across_runs_through_report_text() {
        let platform = MemoryPlatform::new();
        let engine = AttendanceEngine::new(platform, config()).unwrap();

        for day in 19..=21 {
            let (morning, core) = open_threads(engine.platform(), day);
            engine.platform().post_as(&morning, "u1", kst(day, 9, 0), "", true);
            engine.platform().post_as(&core, "u1", kst(day, 14, 0), "", false);
            engine.platform().post_as(&morning, "u2", kst(day, 7, 0), "", true);
            engine.platform().post_as(&core, "u2", kst(day, 14, 0), "", false);
            engine.run(kst(day, 18, 0), RunMode::Publish).await.unwrap();
        }

        let outcome = engine.run(kst(22, 18, 0), RunMode::DryRun).await.unwrap();
        // day 22 has no threads: both absent on top of what was accrued
        let kim = record(&outcome, "u1");
        assert_eq!((kim.late, kim.absent), (0, 2));
        let lee = record(&outcome, "u2");
        assert_eq!((lee.late, lee.absent), (0, 1));
    }

    #[tokio::test]
    async fn demoted_participants_stay_untouched() {
        let platform = MemoryPlatform::new();
        platform.post_as_bot(
            REPORT,
            kst(18, 18, 0),
            "2026-10 출석결과\nKim : 지각:0, 결석:2\nLee : 지각:0, 결석:0\nActive (2명)\n- Kim\n- Lee\nInActive (0명)",
        );
        let engine = AttendanceEngine::new(platform, config()).unwrap();

        let first = engine.run(kst(19, 18, 0), RunMode::Publish).await.unwrap();
        assert_eq!(record(&first, "u1").status, MembershipStatus::Inactive);
        assert!(first.report.contains("InActive (1명)\n- Kim"));

        let second = engine.run(kst(20, 18, 0), RunMode::Publish).await.unwrap();
        let kim = record(&second, "u1");
        assert_eq!((kim.late, kim.absent, kim.status), (0, 0, MembershipStatus::Inactive));
        assert!(!second.summary.judged_ids.contains(&"u1".to_string()));
        assert_eq!(record(&second, "u2").absent, 2);
    }

    #[tokio::test]
    async fn unmapped_names_are_surfaced() {
        let platform = MemoryPlatform::new();
        platform.post_as_bot(REPORT, kst(18, 18, 0), "Choi : 지각:1, 결석:1");
        let engine = AttendanceEngine::new(platform, config()).unwrap();
        let outcome = engine.run(kst(19, 18, 0), RunMode::DryRun).await.unwrap();
        assert_eq!(outcome.unmapped_names, vec!["Choi".to_string()]);
        assert!(!outcome.report.contains("Choi"));
    }

    #[tokio::test]
    async fn ledger_lines_posted_by_people_are_ignored() {
        let engine = AttendanceEngine::new(MemoryPlatform::new(), config()).unwrap();
        engine.run(kst(19, 18, 0), RunMode::Publish).await.unwrap();
        engine.run(kst(20, 18, 0), RunMode::Publish).await.unwrap();
        engine
            .platform()
            .post_as(REPORT, "u1", kst(20, 19, 0), "Kim : 지각:0, 결석:0", false);

        let outcome = engine.run(kst(21, 18, 0), RunMode::DryRun).await.unwrap();
        assert_eq!(record(&outcome, "u1").status, MembershipStatus::Inactive);
        assert!(outcome
            .summary
            .events
            .contains(&AccrualEvent::Demoted { participant_id: "u1".into() }));
    }

    #[tokio::test]
    async fn only_the_configured_bot_counts() {
        let mut cfg = config();
        cfg.discord.bot_user_id = "rollcall-bot".into();
        let platform = MemoryPlatform::new();
        // Another bot in the channel is not our report.
        platform.post_as_bot(REPORT, kst(18, 18, 0), "Kim : 지각:0, 결석:2");
        let engine = AttendanceEngine::new(platform, cfg).unwrap();

        let outcome = engine.run(kst(19, 18, 0), RunMode::DryRun).await.unwrap();
        let kim = record(&outcome, "u1");
        assert_eq!((kim.absent, kim.status), (1, MembershipStatus::Active));
    }

    #[tokio::test]
    async fn partially_published_report_is_not_restored() {
        let mut cfg = config();
        cfg.engine.message_char_limit = 60;
        let platform = MemoryPlatform::new().failing_send_at(3);
        platform.post_as_bot(
            REPORT,
            kst(18, 18, 0),
            "2026-10 출석결과\nKim : 지각:0, 결석:2\nLee : 지각:0, 결석:0",
        );
        let engine = AttendanceEngine::new(platform, cfg).unwrap();

        let err = engine.run(kst(19, 18, 0), RunMode::Publish).await.unwrap_err();
        assert!(matches!(err, CoreError::Platform(PlatformError::Api { status: 500, .. })));
        let sent = engine.platform().texts(REPORT);
        assert_eq!(sent.len(), 3);
        assert!(sent[1].starts_with("(1/"));
        assert!(sent[2].starts_with("(2/"));

        // The parts that went out carry Kim's post-demotion ledger line.
        let outcome = engine.run(kst(20, 18, 0), RunMode::DryRun).await.unwrap();
        assert_eq!(record(&outcome, "u1").status, MembershipStatus::Inactive);
        assert!(outcome
            .summary
            .events
            .contains(&AccrualEvent::Demoted { participant_id: "u1".into() }));
        assert_eq!(record(&outcome, "u2").absent, 1);
    }

    #[tokio::test]
    async fn dry_run_sends_nothing() {
        let engine = AttendanceEngine::new(MemoryPlatform::new(), config()).unwrap();
        let outcome = engine.run(kst(19, 18, 0), RunMode::DryRun).await.unwrap();
        assert!(outcome.published.is_empty());
        assert!(engine.platform().texts(REPORT).is_empty());
    }

    #[tokio::test]
    async fn failed_publish_fails_the_run_and_commits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("accrual.json");
        let mut cfg = config();
        cfg.engine.state_backend = StateBackend::Snapshot;
        cfg.engine.snapshot_path = Some(snapshot.display().to_string());

        let engine = AttendanceEngine::new(MemoryPlatform::new().failing_sends(), cfg).unwrap();
        let err = engine.run(kst(19, 18, 0), RunMode::Publish).await.unwrap_err();
        assert!(matches!(err, CoreError::Platform(PlatformError::Api { status: 500, .. })));
        assert!(!snapshot.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_publish_times_out() {
        let mut cfg = config();
        cfg.engine.request_timeout_secs = 1;
        let platform = MemoryPlatform::new().with_send_delay(Duration::from_secs(5));
        let engine = AttendanceEngine::new(platform, cfg).unwrap();
        let err = engine.run(kst(19, 18, 0), RunMode::Publish).await.unwrap_err();
        assert!(matches!(err, CoreError::Timeout { operation: "send report", .. }));
    }

    #[tokio::test]
    async fn snapshot_backend_restores_committed_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config();
        cfg.engine.state_backend = StateBackend::Snapshot;
        cfg.engine.snapshot_path = Some(dir.path().join("accrual.json").display().to_string());

        let engine = AttendanceEngine::new(MemoryPlatform::new(), cfg).unwrap();
        engine.run(kst(19, 18, 0), RunMode::Publish).await.unwrap();
        let outcome = engine.run(kst(20, 18, 0), RunMode::Publish).await.unwrap();
        assert_eq!(record(&outcome, "u1").absent, 2);

        let saved = AccrualSnapshot::load(&dir.path().join("accrual.json")).unwrap();
        assert_eq!(saved.run_date.as_deref(), Some("2026-10-20"));
    }

    #[tokio::test]
    async fn missing_channels_mean_everyone_absent() {
        let mut cfg = config();
        cfg.discord.morning_channel_id.clear();
        cfg.discord.core_time_channel_id.clear();
        let engine = AttendanceEngine::new(MemoryPlatform::new(), cfg).unwrap();
        let outcome = engine.run(kst(19, 18, 0), RunMode::Publish).await.unwrap();
        assert!(outcome.judgments.iter().all(|j| j.absent_delta == 1 && j.late_delta == 0));
    }

    #[tokio::test]
    async fn publish_requires_report_channel() {
        let mut cfg = config();
        cfg.discord.report_channel_id.clear();
        let engine = AttendanceEngine::new(MemoryPlatform::new(), cfg).unwrap();
        let err = engine.run(kst(19, 18, 0), RunMode::Publish).await.unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::MissingKey(_))));
    }

    #[tokio::test]
    async fn concurrent_runs_are_serialized() {
        let engine = Arc::new(AttendanceEngine::new(MemoryPlatform::new(), config()).unwrap());
        let a = engine.run(kst(19, 18, 0), RunMode::Publish);
        let b = engine.run(kst(20, 18, 0), RunMode::Publish);
        let (a, b) = tokio::join!(a, b);
        a.unwrap();
        b.unwrap();

        // The second run saw the first run's report, not an empty history.
        let sent = engine.platform().texts(REPORT);
        assert_eq!(sent.len(), 2);
        assert!(sent[1].contains("Lee : 지각:0, 결석:2"));
    }

    #[test]
    fn rejects_zero_thresholds() {
        let mut cfg = config();
        cfg.thresholds.warnings_to_inactive = 0;
        assert!(matches!(
            AttendanceEngine::new(MemoryPlatform::new(), cfg),
            Err(CoreError::Config(ConfigError::InvalidValue { .. }))
        ));

        let mut cfg = config();
        cfg.engine.message_char_limit = 0;
        assert!(AttendanceEngine::new(MemoryPlatform::new(), cfg).is_err());
    }

    #[tokio::test]
    async fn rejects_duplicate_roster_names() {
        let mut cfg = config();
        cfg.participants.push(Participant::new("u3", "Kim"));
        assert!(matches!(
            AttendanceEngine::new(MemoryPlatform::new(), cfg),
            Err(CoreError::Validation(_))
        ));
    }
}
