//! # Rollcall Core Library
//!
//! Daily attendance bookkeeping for a small study group that verifies itself
//! by posting in chat threads. Each run reads the day's threads, judges every
//! participant as on time, late or absent, accrues the result into running
//! counters, and publishes a report. The published report text is also the
//! persistent state: the next run parses it back.
//!
//! ## Architecture
//!
//! - **Clock**: fixed-offset wall clock and the two verification windows
//! - **Judge / Accrual**: per-day judgment and the Active -> Inactive escalation
//! - **Report**: rendering and the reverse parse of published reports
//! - **Platform**: the chat platform seam, with a Discord REST implementation
//! - **Engine**: the serialized daily run tying it all together
//! - **Storage**: TOML configuration with environment overrides
//!
//! The `rollcall` CLI is a thin layer over this crate.

pub mod accrual;
pub mod clock;
pub mod engine;
pub mod error;
pub mod judge;
pub mod platform;
pub mod report;
pub mod roster;
pub mod signals;
pub mod storage;
pub mod threads;

pub use accrual::{AccrualEvent, AccrualRecord, AccrualSnapshot, AccrualStore, MembershipStatus, Thresholds};
pub use clock::{TimeWindowClassifier, VerificationKind};
pub use engine::{AttendanceEngine, RunMode, RunOutcome};
pub use error::{ConfigError, CoreError, PlatformError, ValidationError};
pub use judge::{judge_attendance, DayJudgment, JudgmentPolicy};
pub use platform::{ChatPlatform, DiscordPlatform, MemoryPlatform};
pub use report::{reconstruct, Reconstruction, ReportRenderer, RunSummary};
pub use roster::{Participant, Roster};
pub use storage::{Config, StateBackend};
pub use threads::open_daily_thread;
