//! Failure capture listener.
//!
//! Tracks the current scenario and the step ordinal within it, and when a
//! step fails, saves a screenshot (or the page markup when the driver cannot
//! render) to a path derived from the run, scenario, and step.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::DEFAULT_DIR_MODE;
use crate::event::{LifecycleEvent, ScenarioInfo, StepError, StepInfo, StepResult};
use crate::path::{ArtifactKind, build_path};
use crate::run::Run;
use crate::session::{CaptureResult, Session, SessionError};

/// Result type for capture operations
pub type CaptureOutcome<T> = Result<T, CaptureError>;

/// Errors that escape the listener
#[derive(Debug)]
pub enum CaptureError {
    /// Could not create the directory chain for an artifact
    CreateDir { path: PathBuf, source: io::Error },
    /// Could not write the artifact file
    Write { path: PathBuf, source: io::Error },
    /// The session failed for a reason other than missing screenshot support
    Session(SessionError),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::CreateDir { path, source } => {
                write!(f, "Failed to create directory {}: {}", path.display(), source)
            }
            CaptureError::Write { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
            CaptureError::Session(err) => write!(f, "Session error: {}", err),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::CreateDir { source, .. } => Some(source),
            CaptureError::Write { source, .. } => Some(source),
            CaptureError::Session(err) => Some(err),
        }
    }
}

impl From<SessionError> for CaptureError {
    fn from(err: SessionError) -> Self {
        CaptureError::Session(err)
    }
}

/// A file written for a failing step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Where the artifact was written
    pub path: PathBuf,
    /// Screenshot or page markup
    pub kind: ArtifactKind,
    /// 1-based ordinal of the step within its scenario
    pub step: usize,
    /// Number of bytes written
    pub size: usize,
}

/// Listens to scenario/step lifecycle events and captures failing steps.
///
/// One instance per run. Events must be delivered one at a time, in
/// execution order.
pub struct FailureCaptureListener<S> {
    run: Run,
    session: S,
    scenario: Option<ScenarioInfo>,
    step_number: usize,
    dir_mode: u32,
}

impl<S: Session> FailureCaptureListener<S> {
    /// Start a run now, writing artifacts under `base_path`
    pub fn new(base_path: &str, session: S) -> Self {
        Self::with_run(Run::new(base_path), session)
    }

    /// Create a listener for an existing run
    pub fn with_run(run: Run, session: S) -> Self {
        Self {
            run,
            session,
            scenario: None,
            step_number: 0,
            dir_mode: DEFAULT_DIR_MODE,
        }
    }

    /// Set the mode for directories created on Unix
    pub fn dir_mode(mut self, mode: u32) -> Self {
        self.dir_mode = mode;
        self
    }

    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// The scenario steps are currently attributed to
    pub fn current_scenario(&self) -> Option<&ScenarioInfo> {
        self.scenario.as_ref()
    }

    /// Number of steps completed in the current scenario
    pub fn step_number(&self) -> usize {
        self.step_number
    }

    /// Dispatch a lifecycle event to the matching handler
    pub fn handle(&mut self, event: &LifecycleEvent) -> CaptureOutcome<Option<Artifact>> {
        match event {
            LifecycleEvent::ScenarioStarted { scenario } => {
                self.on_scenario_start(scenario.clone());
                Ok(None)
            }
            LifecycleEvent::StepCompleted {
                step,
                result,
                error,
            } => self.on_step_completed(step, *result, error.as_ref()),
        }
    }

    /// A new scenario begins: replace the context and reset the step counter
    pub fn on_scenario_start(&mut self, scenario: ScenarioInfo) {
        debug!(
            feature = %scenario.feature_title,
            scenario = %scenario.scenario_title,
            "scenario started"
        );
        self.scenario = Some(scenario);
        self.step_number = 0;
    }

    /// A step finished.
    ///
    /// Returns the artifact written, or `None` when the step did not need one.
    pub fn on_step_completed(
        &mut self,
        step: &StepInfo,
        result: StepResult,
        error: Option<&StepError>,
    ) -> CaptureOutcome<Option<Artifact>> {
        self.step_number += 1;

        if !result.is_failed() {
            return Ok(None);
        }

        // The diff extension already saved its own comparison image
        if error.is_some_and(StepError::is_perceptual_diff) {
            debug!(step = self.step_number, "skipping capture for perceptual diff failure");
            return Ok(None);
        }

        let Some(scenario) = self.scenario.as_ref() else {
            warn!(
                step = self.step_number,
                text = %step.text,
                "step failed outside of a scenario, nothing captured"
            );
            return Ok(None);
        };

        match self.session.capture_screenshot() {
            CaptureResult::Screenshot(bytes) => self
                .write_artifact(scenario, step, ArtifactKind::Screenshot, &bytes)
                .map(Some),
            CaptureResult::Unsupported(reason)
            | CaptureResult::Failure(SessionError::Unsupported(reason)) => {
                debug!(
                    driver = self.session.driver_name(),
                    %reason,
                    "screenshots unsupported, saving page content"
                );
                let content = self.session.page_content()?;
                self.write_artifact(scenario, step, ArtifactKind::PageContent, content.as_bytes())
                    .map(Some)
            }
            CaptureResult::Failure(err) => Err(CaptureError::Session(err)),
        }
    }

    /// Path an artifact for `step` would be written to, given the current
    /// scenario and step counter
    pub fn artifact_path(&self, step: &StepInfo, kind: ArtifactKind) -> Option<PathBuf> {
        let scenario = self.scenario.as_ref()?;
        Some(build_path(&self.run, scenario, self.step_number, &step.text, kind))
    }

    fn write_artifact(
        &self,
        scenario: &ScenarioInfo,
        step: &StepInfo,
        kind: ArtifactKind,
        data: &[u8],
    ) -> CaptureOutcome<Artifact> {
        let path = build_path(&self.run, scenario, self.step_number, &step.text, kind);
        create_parent_dirs(&path, self.dir_mode)?;
        fs::write(&path, data).map_err(|source| CaptureError::Write {
            path: path.clone(),
            source,
        })?;

        info!(
            path = %path.display(),
            step = self.step_number,
            kind = kind.extension(),
            "saved failure artifact"
        );

        Ok(Artifact {
            path,
            kind,
            step: self.step_number,
            size: data.len(),
        })
    }
}

/// Create every missing directory above `path`
fn create_parent_dirs(path: &Path, mode: u32) -> CaptureOutcome<()> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    builder.create(dir).map_err(|source| CaptureError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}
