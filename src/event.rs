//! Scenario and step lifecycle events delivered by the test runner.

use serde::{Deserialize, Serialize};

/// The scenario currently executing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioInfo {
    /// Title of the feature the scenario belongs to
    pub feature_title: String,
    /// Title of the scenario itself
    pub scenario_title: String,
}

impl ScenarioInfo {
    pub fn new(feature_title: impl Into<String>, scenario_title: impl Into<String>) -> Self {
        Self {
            feature_title: feature_title.into(),
            scenario_title: scenario_title.into(),
        }
    }
}

/// A single step within a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Step text as written in the feature file
    pub text: String,
}

impl StepInfo {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Outcome of a completed step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepResult {
    Passed,
    Failed,
    Skipped,
    Pending,
    Undefined,
}

impl StepResult {
    pub fn is_failed(self) -> bool {
        matches!(self, StepResult::Failed)
    }
}

/// Error attached to a failed step, classified by kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum StepError {
    /// Visual regression mismatch; the diff tool writes its own artifact
    PerceptualDiffMismatch,
    /// Anything else
    Other(String),
}

impl StepError {
    pub fn other(message: impl Into<String>) -> Self {
        StepError::Other(message.into())
    }

    pub fn is_perceptual_diff(&self) -> bool {
        matches!(self, StepError::PerceptualDiffMismatch)
    }
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepError::PerceptualDiffMismatch => write!(f, "perceptual diff mismatch"),
            StepError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// A lifecycle event, in the order the runner emits them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    ScenarioStarted {
        #[serde(flatten)]
        scenario: ScenarioInfo,
    },
    StepCompleted {
        #[serde(flatten)]
        step: StepInfo,
        result: StepResult,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<StepError>,
    },
}
