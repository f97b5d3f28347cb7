use serde::{Deserialize, Serialize};

/// Confirmation text captured after submit is cut to this many characters
pub const CONFIRMATION_LIMIT: usize = 500;

/// Entity payload written into the filing form.
///
/// Supplied by the entity-extraction collaborator; every field is optional
/// and the pipeline never blocks on an absent one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessFilingData {
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub registered_agent_name: Option<String>,
    #[serde(default)]
    pub registered_agent_address: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

impl BusinessFilingData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the business name
    pub fn business_name(mut self, name: impl Into<String>) -> Self {
        self.business_name = Some(name.into());
        self
    }

    /// Builder method: set the registered agent name
    pub fn registered_agent_name(mut self, name: impl Into<String>) -> Self {
        self.registered_agent_name = Some(name.into());
        self
    }

    /// Builder method: set the registered agent address
    pub fn registered_agent_address(mut self, address: impl Into<String>) -> Self {
        self.registered_agent_address = Some(address.into());
        self
    }

    /// Builder method: set the business purpose
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// Builder method: set the duration
    pub fn duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }
}

/// One ordered step of the automation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Login,
    Navigate,
    Fill,
    Submit,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Login => "login",
            Stage::Navigate => "navigate",
            Stage::Fill => "fill",
            Stage::Submit => "submit",
        }
    }
}

/// Where the pipeline currently stands.
///
/// Sessions enter at `Researched`: research runs during session entry, so
/// there is no observable state before it. Transitions are forward-only and
/// there is no automatic retry; re-running a stage (e.g. re-login before a
/// resubmission) is the caller's explicit choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Researched,
    LoggedIn,
    Navigated,
    Filled,
    Submitted,
    Failed(Stage),
}

/// Outcome of one pipeline stage.
///
/// Failures are returned, never raised past the stage boundary, so callers
/// branch on the result instead of catching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StageResult {
    Success,
    Failure(String),
}

impl StageResult {
    pub fn failure(reason: impl Into<String>) -> Self {
        StageResult::Failure(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StageResult::Success)
    }

    /// The failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            StageResult::Success => None,
            StageResult::Failure(reason) => Some(reason),
        }
    }
}

/// Terminal result of the submit stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilingOutcome {
    pub success: bool,
    pub jurisdiction: String,
    pub confirmation: Option<String>,
    pub url: Option<String>,
    pub error: Option<String>,
}

impl FilingOutcome {
    /// Successful submission, with the confirmation text truncated
    pub fn confirmed(jurisdiction: impl Into<String>, confirmation: &str, url: String) -> Self {
        Self {
            success: true,
            jurisdiction: jurisdiction.into(),
            confirmation: Some(truncate_chars(confirmation, CONFIRMATION_LIMIT)),
            url: Some(url),
            error: None,
        }
    }

    /// Failed submission with an error message
    pub fn failed(jurisdiction: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            jurisdiction: jurisdiction.into(),
            confirmation: None,
            url: None,
            error: Some(error.into()),
        }
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
