//! Failshot - failure artifact capture for acceptance-test runners.
//!
//! This crate provides:
//! - A listener that reacts to scenario/step lifecycle events and saves a
//!   screenshot for every failing step
//! - Fallback to page markup when the driver cannot take screenshots
//! - Deterministic, filesystem-safe artifact paths rooted in the run start time
//! - Replay of recorded event streams
//!
//! # Example
//!
//! ```rust,no_run
//! use failshot::{FailureCaptureListener, MarkupSession, ScenarioInfo, StepInfo, StepResult};
//!
//! let mut listener = FailureCaptureListener::new("/tmp/shots", MarkupSession::new("<html/>"));
//! listener.on_scenario_start(ScenarioInfo::new("Login Flow", "Invalid password"));
//! listener.on_step_completed(&StepInfo::new("I see an error"), StepResult::Failed, None).unwrap();
//! ```

pub mod config;
pub mod event;
pub mod framebuffer;
pub mod listener;
pub mod path;
pub mod replay;
pub mod run;
pub mod session;

// Re-export event types
pub use event::{LifecycleEvent, ScenarioInfo, StepError, StepInfo, StepResult};

// Re-export the listener and its results
pub use listener::{Artifact, CaptureError, CaptureOutcome, FailureCaptureListener};

// Re-export path building
pub use path::{ArtifactKind, build_path, sanitize};
pub use run::Run;

// Re-export sessions
pub use framebuffer::Framebuffer;
pub use session::{CaptureResult, FramebufferSession, MarkupSession, Session, SessionError, SessionResult};

pub use replay::{ReplayError, ReplayOptions, ReplayResult, ReplaySummary, replay};
