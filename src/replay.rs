//! Replay a recorded lifecycle event stream through a listener.
//!
//! Streams are JSON lines, one [`LifecycleEvent`] per line. Blank lines and
//! lines starting with `#` are ignored.

use serde::Serialize;
use std::io::BufRead;
use tracing::{info, warn};

use crate::event::{LifecycleEvent, ScenarioInfo, StepInfo};
use crate::listener::{Artifact, CaptureError, FailureCaptureListener};
use crate::session::Session;

/// Result type for replay operations
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Errors that stop a replay
#[derive(Debug)]
pub enum ReplayError {
    /// Reading the event stream failed
    Io(std::io::Error),
    /// A line was not a valid event
    Parse { line: usize, source: serde_json::Error },
    /// Capturing a failing step failed
    Capture { line: usize, source: CaptureError },
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayError::Io(err) => write!(f, "I/O error: {}", err),
            ReplayError::Parse { line, source } => write!(f, "Invalid event on line {}: {}", line, source),
            ReplayError::Capture { line, source } => write!(f, "Capture failed on line {}: {}", line, source),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplayError::Io(err) => Some(err),
            ReplayError::Parse { source, .. } => Some(source),
            ReplayError::Capture { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for ReplayError {
    fn from(err: std::io::Error) -> Self {
        ReplayError::Io(err)
    }
}

/// How a replay reacts to capture errors
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    /// Log capture errors and continue instead of stopping
    pub keep_going: bool,
}

/// What a replay did
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplaySummary {
    pub scenarios: usize,
    pub steps: usize,
    pub failed_steps: usize,
    /// Capture errors skipped because of `keep_going`
    pub capture_errors: usize,
    pub artifacts: Vec<Artifact>,
}

/// Parse one line of an event stream; `None` for blank and comment lines
pub fn parse_event(line: &str) -> Result<Option<LifecycleEvent>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some)
}

/// Feed every event in `reader` to `listener`.
///
/// `before_step` runs ahead of each step completion so the caller can put the
/// session into the state the step left it in.
pub fn replay<S, R, F>(
    listener: &mut FailureCaptureListener<S>,
    reader: R,
    options: ReplayOptions,
    mut before_step: F,
) -> ReplayResult<ReplaySummary>
where
    S: Session,
    R: BufRead,
    F: FnMut(&mut S, Option<&ScenarioInfo>, &StepInfo),
{
    let mut summary = ReplaySummary::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let Some(event) = parse_event(&line).map_err(|source| ReplayError::Parse { line: line_no, source })?
        else {
            continue;
        };

        match &event {
            LifecycleEvent::ScenarioStarted { .. } => summary.scenarios += 1,
            LifecycleEvent::StepCompleted { step, result, .. } => {
                summary.steps += 1;
                if result.is_failed() {
                    summary.failed_steps += 1;
                }
                let scenario = listener.current_scenario().cloned();
                before_step(listener.session_mut(), scenario.as_ref(), step);
            }
        }

        match listener.handle(&event) {
            Ok(Some(artifact)) => summary.artifacts.push(artifact),
            Ok(None) => {}
            Err(err) if options.keep_going => {
                warn!(line = line_no, error = %err, "capture failed, continuing");
                summary.capture_errors += 1;
            }
            Err(source) => return Err(ReplayError::Capture { line: line_no, source }),
        }
    }

    info!(
        scenarios = summary.scenarios,
        steps = summary.steps,
        failed = summary.failed_steps,
        artifacts = summary.artifacts.len(),
        "replay finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MarkupSession;
    use std::io::Cursor;
    use tempfile::TempDir;

    const STREAM: &str = r#"
# login feature
{"event":"scenario_started","feature_title":"Login Flow","scenario_title":"Invalid password"}
{"event":"step_completed","text":"I am on the login page","result":"passed"}
{"event":"step_completed","text":"I see an error","result":"failed","error":{"kind":"other","message":"missing"}}
"#;

    #[test]
    fn test_parse_event_skips_blank_and_comments() {
        assert!(parse_event("").unwrap().is_none());
        assert!(parse_event("   ").unwrap().is_none());
        assert!(parse_event("# note").unwrap().is_none());
        assert!(parse_event("{not json}").is_err());
    }

    #[test]
    fn test_replay_counts_and_captures() {
        let dir = TempDir::new().unwrap();
        let mut listener =
            FailureCaptureListener::new(&dir.path().to_string_lossy(), MarkupSession::new("<p/>"));

        let summary = replay(&mut listener, Cursor::new(STREAM), ReplayOptions::default(), |_, _, _| {})
            .unwrap();

        assert_eq!(summary.scenarios, 1);
        assert_eq!(summary.steps, 2);
        assert_eq!(summary.failed_steps, 1);
        assert_eq!(summary.artifacts.len(), 1);
        assert!(summary.artifacts[0].path.ends_with("Login-Flow/Invalid-password/2-I-see-an-error.html"));
    }

    #[test]
    fn test_replay_reports_bad_line_number() {
        let dir = TempDir::new().unwrap();
        let mut listener =
            FailureCaptureListener::new(&dir.path().to_string_lossy(), MarkupSession::new("<p/>"));
        let stream = "{\"event\":\"scenario_started\",\"feature_title\":\"F\",\"scenario_title\":\"S\"}\n{\"event\":\"bogus\"}\n";

        let err = replay(&mut listener, Cursor::new(stream), ReplayOptions::default(), |_, _, _| {})
            .unwrap_err();
        assert!(matches!(err, ReplayError::Parse { line: 2, .. }), "got {:?}", err);
    }

    #[test]
    fn test_before_step_sees_current_scenario() {
        let dir = TempDir::new().unwrap();
        let mut listener =
            FailureCaptureListener::new(&dir.path().to_string_lossy(), MarkupSession::new("<p/>"));

        let mut seen = Vec::new();
        replay(&mut listener, Cursor::new(STREAM), ReplayOptions::default(), |session, scenario, step| {
            session.set_page_content(format!("<p>{}</p>", step.text));
            seen.push(scenario.map(|s| s.scenario_title.clone()));
        })
        .unwrap();

        assert_eq!(seen, vec![Some("Invalid password".to_string()); 2]);
    }
}
