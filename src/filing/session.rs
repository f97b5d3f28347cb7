//! Filing session: owns the browser for one jurisdiction and drives the
//! ordered stages login -> navigate -> fill -> submit.
//!
//! Stage methods never return `Err`. Browser-layer errors inside a stage
//! become a [`StageResult::Failure`] (or a failed [`FilingOutcome`]) with a
//! descriptive reason, so callers branch on outcomes instead of catching.
//! Selectors are rediscovered on every page the pipeline visits; a map from
//! a previous page is never reused.

use crate::browser::{BrowserDriver, ChromeDriver, LaunchOptions};
use crate::discovery::{SelectorDiscovery, SelectorMap};
use crate::error::Result;
use crate::filing::types::{
    BusinessFilingData, FilingOutcome, PipelineState, Stage, StageResult,
};
use crate::jurisdiction::JurisdictionCode;
use crate::llm::{OllamaClient, TextGenerator};
use crate::research::{JurisdictionConfig, ResearchEngine};
use crate::settings::Settings;
use std::path::PathBuf;
use std::sync::Arc;

/// One filing session: a validated jurisdiction, its researched
/// configuration, and exclusive ownership of a browser page.
pub struct FilingSession {
    code: JurisdictionCode,
    config: JurisdictionConfig,
    driver: Arc<dyn BrowserDriver>,
    generator: Arc<dyn TextGenerator>,
    state: PipelineState,
    closed: bool,
}

impl FilingSession {
    /// Open a session: validate the code, launch Chrome, and research the
    /// jurisdiction's filing process.
    ///
    /// Fails with `UnsupportedJurisdiction` before any network or browser
    /// work, and with `DriverUnavailable` when Chrome cannot be started.
    pub async fn open(code: &str, settings: &Settings) -> Result<Self> {
        let code = JurisdictionCode::new(code)?;

        let generator: Arc<dyn TextGenerator> = Arc::new(OllamaClient::new(settings)?);
        let driver: Arc<dyn BrowserDriver> = Arc::new(ChromeDriver::launch(
            LaunchOptions::new()
                .headless(settings.headless)
                .page_load_timeout(settings.page_load_timeout),
        )?);

        Self::enter(code, driver, generator).await
    }

    /// Open a session with injected collaborators.
    ///
    /// Used by tests and by callers bringing their own driver or model
    /// client; research still runs automatically on entry.
    pub async fn open_with(
        code: &str,
        driver: Arc<dyn BrowserDriver>,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self> {
        let code = JurisdictionCode::new(code)?;
        Self::enter(code, driver, generator).await
    }

    async fn enter(
        code: JurisdictionCode,
        driver: Arc<dyn BrowserDriver>,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self> {
        let config = ResearchEngine::new(generator.as_ref()).research(&code).await;
        log::info!("opened filing session for {} ({})", code.display_name(), code);

        Ok(Self {
            code,
            config,
            driver,
            generator,
            state: PipelineState::Researched,
            closed: false,
        })
    }

    /// The researched jurisdiction configuration (immutable for the session)
    pub fn config(&self) -> &JurisdictionConfig {
        &self.config
    }

    /// The session's jurisdiction
    pub fn jurisdiction(&self) -> &JurisdictionCode {
        &self.code
    }

    /// Where the pipeline currently stands
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Log in to the portal with the given credentials.
    ///
    /// Short-circuits to `Failure("login")` without touching the browser
    /// when research found no online filing or no login URL. Success is
    /// judged by the post-login URL: it must contain neither "login" nor
    /// "error".
    pub async fn login(&mut self, username: &str, password: &str) -> StageResult {
        if self.closed {
            return self.fail_with(Stage::Login, "session closed");
        }
        if !self.config.online_filing_available {
            log::warn!("{}: online filing unavailable, skipping login", self.code);
            return self.fail_stage(Stage::Login);
        }
        let Some(login_url) = self.config.login_url.clone() else {
            log::warn!("{}: no login URL researched, skipping login", self.code);
            return self.fail_stage(Stage::Login);
        };

        if let Err(e) = self.driver.navigate(&login_url).await {
            return self.fail_with(Stage::Login, e);
        }
        if let Err(e) = self.driver.wait_for_settle().await {
            return self.fail_with(Stage::Login, e);
        }

        let selectors = match self.discover_current_page().await {
            Ok(map) => map,
            Err(e) => return self.fail_with(Stage::Login, e),
        };

        if let Some(selector) = &selectors.username {
            if let Err(e) = self.driver.fill(selector, username).await {
                return self.fail_with(Stage::Login, e);
            }
        }
        if let Some(selector) = &selectors.password {
            if let Err(e) = self.driver.fill(selector, password).await {
                return self.fail_with(Stage::Login, e);
            }
        }

        let Some(login_button) = &selectors.login_button else {
            return self.fail_with(Stage::Login, "no login button found");
        };
        if let Err(e) = self.driver.click(login_button).await {
            return self.fail_with(Stage::Login, e);
        }
        if let Err(e) = self.driver.wait_for_settle().await {
            return self.fail_with(Stage::Login, e);
        }

        match self.driver.current_url().await {
            Ok(url) => {
                let url = url.to_lowercase();
                if url.contains("login") || url.contains("error") {
                    log::warn!("{}: still on login/error page after submit", self.code);
                    self.fail_stage(Stage::Login)
                } else {
                    self.state = PipelineState::LoggedIn;
                    log::info!("{}: logged in", self.code);
                    StageResult::Success
                }
            }
            Err(e) => self.fail_with(Stage::Login, e),
        }
    }

    /// Load the filing form page.
    ///
    /// Does not require a prior login; research-only callers may invoke it
    /// directly when the portal exposes the form without credentials.
    pub async fn navigate(&mut self) -> StageResult {
        if self.closed {
            return self.fail_with(Stage::Navigate, "session closed");
        }
        if !self.config.online_filing_available {
            log::warn!("{}: online filing unavailable, skipping navigate", self.code);
            return self.fail_stage(Stage::Navigate);
        }
        let Some(form_url) = self.config.filing_form_url.clone() else {
            log::warn!("{}: no filing form URL researched", self.code);
            return self.fail_stage(Stage::Navigate);
        };

        if let Err(e) = self.driver.navigate(&form_url).await {
            return self.fail_with(Stage::Navigate, e);
        }
        if let Err(e) = self.driver.wait_for_settle().await {
            return self.fail_with(Stage::Navigate, e);
        }

        self.state = PipelineState::Navigated;
        log::info!("{}: on filing form page", self.code);
        StageResult::Success
    }

    /// Write the filing data into the form.
    ///
    /// Selector discovery is heuristic, so requiring every field would make
    /// the stage brittle against a single mis-mapping: the stage succeeds
    /// when at least one field was written, and the caller is expected to
    /// inspect a screenshot before submitting.
    pub async fn fill(&mut self, data: &BusinessFilingData) -> StageResult {
        if self.closed {
            return self.fail_with(Stage::Fill, "session closed");
        }
        if !matches!(self.state, PipelineState::Navigated | PipelineState::Filled) {
            log::warn!("{}: fill invoked before navigate succeeded", self.code);
            return self.fail_stage(Stage::Fill);
        }

        let selectors = match self.discover_current_page().await {
            Ok(map) => map,
            Err(e) => return self.fail_with(Stage::Fill, e),
        };

        let fields: [(&str, &Option<String>, &Option<String>); 4] = [
            ("business_name", &selectors.business_name, &data.business_name),
            (
                "registered_agent_name",
                &selectors.registered_agent_name,
                &data.registered_agent_name,
            ),
            (
                "registered_agent_address",
                &selectors.registered_agent_address,
                &data.registered_agent_address,
            ),
            ("purpose", &selectors.purpose, &data.purpose),
        ];

        let mut written = 0usize;
        for (field, selector, value) in fields {
            let (Some(selector), Some(value)) = (selector, value) else {
                log::debug!("{}: skipping {} (selector or data absent)", self.code, field);
                continue;
            };
            match self.driver.fill(selector, value).await {
                Ok(()) => {
                    log::debug!("{}: wrote {}", self.code, field);
                    written += 1;
                }
                Err(e) => {
                    log::warn!("{}: could not write {}: {}", self.code, field, e);
                }
            }
        }

        if written == 0 {
            log::warn!("{}: no form field could be written", self.code);
            return self.fail_stage(Stage::Fill);
        }

        self.state = PipelineState::Filled;
        log::info!("{}: wrote {} of {} form fields", self.code, written, fields.len());
        StageResult::Success
    }

    /// Submit the filled form. Calling this method is the caller's explicit
    /// confirmation; nothing submits implicitly.
    pub async fn submit(&mut self) -> FilingOutcome {
        let jurisdiction = self.code.display_name();

        if self.closed {
            return FilingOutcome::failed(jurisdiction, "session closed");
        }
        if self.state != PipelineState::Filled {
            log::warn!("{}: submit invoked before fill succeeded", self.code);
            return FilingOutcome::failed(jurisdiction, "fill stage has not succeeded");
        }

        let selectors = match self.discover_current_page().await {
            Ok(map) => map,
            Err(e) => {
                self.state = PipelineState::Failed(Stage::Submit);
                return FilingOutcome::failed(jurisdiction, e.to_string());
            }
        };

        let Some(submit_button) = &selectors.submit_button else {
            self.state = PipelineState::Failed(Stage::Submit);
            return FilingOutcome::failed(jurisdiction, "no submit button found");
        };

        if let Err(e) = self.driver.click(submit_button).await {
            self.state = PipelineState::Failed(Stage::Submit);
            return FilingOutcome::failed(jurisdiction, e.to_string());
        }
        if let Err(e) = self.driver.wait_for_settle().await {
            self.state = PipelineState::Failed(Stage::Submit);
            return FilingOutcome::failed(jurisdiction, e.to_string());
        }

        let confirmation = self.driver.page_text().await.unwrap_or_default();
        let url = self.driver.current_url().await.unwrap_or_default();

        self.state = PipelineState::Submitted;
        log::info!("{}: form submitted, landed on {}", self.code, url);
        FilingOutcome::confirmed(jurisdiction, &confirmation, url)
    }

    /// Capture the current page for human review before submitting.
    ///
    /// Defaults the filename to `<CODE>_llc_form.png`.
    pub async fn screenshot(&self, path: Option<PathBuf>) -> Result<PathBuf> {
        let path = path.unwrap_or_else(|| PathBuf::from(format!("{}_llc_form.png", self.code)));
        self.driver.screenshot(&path).await?;
        log::info!("{}: screenshot written to {}", self.code, path.display());
        Ok(path)
    }

    /// Tear the session down: close the page, then the browser process.
    ///
    /// The browser shutdown runs even when closing the page errs, and a
    /// second `close` call is a no-op. Dropping the session without calling
    /// this still kills the browser through the driver's Drop.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let page_result = self.driver.close_page().await;
        if let Err(e) = &page_result {
            log::warn!("{}: closing page failed: {}", self.code, e);
        }
        let browser_result = self.driver.close_browser().await;
        if let Err(e) = &browser_result {
            log::warn!("{}: closing browser failed: {}", self.code, e);
        }

        page_result.and(browser_result)
    }

    /// Read the current page and discover selectors for it
    async fn discover_current_page(&self) -> Result<SelectorMap> {
        let html = self.driver.page_html().await?;
        Ok(SelectorDiscovery::new(self.generator.as_ref()).discover(&html).await)
    }

    /// Fail a stage with the bare stage name as the reason (precondition
    /// and success-criterion misses)
    fn fail_stage(&mut self, stage: Stage) -> StageResult {
        self.state = PipelineState::Failed(stage);
        StageResult::failure(stage.name())
    }

    /// Fail a stage with a descriptive reason (browser-layer errors)
    fn fail_with(&mut self, stage: Stage, detail: impl std::fmt::Display) -> StageResult {
        self.state = PipelineState::Failed(stage);
        StageResult::failure(format!("{}: {}", stage.name(), detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilingError;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;

    /// Generator that answers research with a canned config and discovery
    /// with whatever JSON was scripted
    struct ScriptedGenerator {
        research_reply: String,
        discovery_reply: String,
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            if prompt.contains("CSS selector") {
                Ok(self.discovery_reply.clone())
            } else {
                Ok(self.research_reply.clone())
            }
        }
    }

    /// Driver that records calls and never fails
    #[derive(Default)]
    struct RecordingDriver {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingDriver {
        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BrowserDriver for RecordingDriver {
        async fn navigate(&self, url: &str) -> Result<()> {
            self.record(format!("navigate:{}", url));
            Ok(())
        }
        async fn wait_for_settle(&self) -> Result<()> {
            self.record("settle");
            Ok(())
        }
        async fn fill(&self, selector: &str, _value: &str) -> Result<()> {
            self.record(format!("fill:{}", selector));
            Ok(())
        }
        async fn click(&self, selector: &str) -> Result<()> {
            self.record(format!("click:{}", selector));
            Ok(())
        }
        async fn page_text(&self) -> Result<String> {
            Ok("Confirmation number 12345".to_string())
        }
        async fn page_html(&self) -> Result<String> {
            Ok("<html><form></form></html>".to_string())
        }
        async fn current_url(&self) -> Result<String> {
            Ok("https://portal.example.gov/dashboard".to_string())
        }
        async fn screenshot(&self, path: &Path) -> Result<()> {
            self.record(format!("screenshot:{}", path.display()));
            Ok(())
        }
        async fn close_page(&self) -> Result<()> {
            self.record("close_page");
            Ok(())
        }
        async fn close_browser(&self) -> Result<()> {
            self.record("close_browser");
            Ok(())
        }
    }

    fn online_config_reply() -> String {
        r#"{
            "name": "Texas",
            "base_url": "https://direct.sos.state.tx.us/",
            "login_url": "https://direct.sos.state.tx.us/acct/login.asp",
            "filing_form_url": "https://direct.sos.state.tx.us/help/forms.asp",
            "online_filing_available": true
        }"#
        .to_string()
    }

    fn full_selector_reply() -> String {
        r#"{
            "username": "input[name='username']",
            "password": "input[name='password']",
            "login_button": "input[type='submit']",
            "business_name": "input[name='entity_name']",
            "registered_agent_name": "input[name='agent_name']",
            "registered_agent_address": "textarea[name='agent_address']",
            "purpose": "textarea[name='purpose']",
            "submit_button": "input[value='Submit']"
        }"#
        .to_string()
    }

    async fn open_session(
        research_reply: String,
        discovery_reply: String,
        driver: Arc<RecordingDriver>,
    ) -> FilingSession {
        let generator = Arc::new(ScriptedGenerator { research_reply, discovery_reply });
        FilingSession::open_with("TX", driver, generator).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_runs_research_on_entry() {
        let driver = Arc::new(RecordingDriver::default());
        let session = open_session(online_config_reply(), "{}".to_string(), driver).await;

        assert_eq!(session.config().name, "Texas");
        assert!(session.config().online_filing_available);
        assert_eq!(session.state(), PipelineState::Researched);
    }

    #[tokio::test]
    async fn test_open_rejects_unsupported_code_before_any_io() {
        let driver = Arc::new(RecordingDriver::default());
        let generator = Arc::new(ScriptedGenerator {
            research_reply: online_config_reply(),
            discovery_reply: "{}".to_string(),
        });

        let result = FilingSession::open_with("ZZ", driver.clone(), generator).await;
        assert!(matches!(result, Err(FilingError::UnsupportedJurisdiction(_))));
        assert!(driver.calls().is_empty());
    }

    #[tokio::test]
    async fn test_login_short_circuits_when_filing_unavailable() {
        let offline = r#"{"name": "Texas", "online_filing_available": false}"#.to_string();
        let driver = Arc::new(RecordingDriver::default());
        let mut session = open_session(offline, full_selector_reply(), driver.clone()).await;

        let result = session.login("user", "pass").await;
        assert_eq!(result, StageResult::failure("login"));
        assert_eq!(session.state(), PipelineState::Failed(Stage::Login));
        // No browser action was attempted
        assert!(driver.calls().is_empty());
    }

    #[tokio::test]
    async fn test_login_happy_path() {
        let driver = Arc::new(RecordingDriver::default());
        let mut session =
            open_session(online_config_reply(), full_selector_reply(), driver.clone()).await;

        let result = session.login("user", "secret").await;
        assert!(result.is_success());
        assert_eq!(session.state(), PipelineState::LoggedIn);

        let calls = driver.calls();
        assert!(calls[0].starts_with("navigate:https://direct.sos.state.tx.us/acct/login.asp"));
        assert!(calls.contains(&"fill:input[name='username']".to_string()));
        assert!(calls.contains(&"fill:input[name='password']".to_string()));
        assert!(calls.contains(&"click:input[type='submit']".to_string()));
    }

    #[tokio::test]
    async fn test_fill_requires_navigate_first() {
        let driver = Arc::new(RecordingDriver::default());
        let mut session = open_session(online_config_reply(), full_selector_reply(), driver).await;

        let data = BusinessFilingData::new().business_name("Tech Solutions LLC");
        let result = session.fill(&data).await;
        assert_eq!(result, StageResult::failure("fill"));
    }

    #[tokio::test]
    async fn test_full_pipeline_to_submit() {
        let driver = Arc::new(RecordingDriver::default());
        let mut session =
            open_session(online_config_reply(), full_selector_reply(), driver.clone()).await;

        assert!(session.login("user", "pass").await.is_success());
        assert!(session.navigate().await.is_success());

        let data = BusinessFilingData::new()
            .business_name("Tech Solutions LLC")
            .registered_agent_name("Jane Smith")
            .registered_agent_address("100 Congress Ave, Austin TX")
            .purpose("All lawful purposes");
        assert!(session.fill(&data).await.is_success());

        let outcome = session.submit().await;
        assert!(outcome.success);
        assert_eq!(outcome.jurisdiction, "Texas");
        assert_eq!(outcome.confirmation.as_deref(), Some("Confirmation number 12345"));
        assert_eq!(session.state(), PipelineState::Submitted);

        assert!(driver.calls().contains(&"click:input[value='Submit']".to_string()));
    }

    #[tokio::test]
    async fn test_submit_before_fill_fails() {
        let driver = Arc::new(RecordingDriver::default());
        let mut session = open_session(online_config_reply(), full_selector_reply(), driver).await;

        let outcome = session.submit().await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("fill stage has not succeeded"));
    }

    #[tokio::test]
    async fn test_screenshot_default_filename() {
        let driver = Arc::new(RecordingDriver::default());
        let session =
            open_session(online_config_reply(), full_selector_reply(), driver.clone()).await;

        let path = session.screenshot(None).await.unwrap();
        assert_eq!(path, PathBuf::from("TX_llc_form.png"));
        assert!(driver.calls().contains(&"screenshot:TX_llc_form.png".to_string()));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_ordered() {
        let driver = Arc::new(RecordingDriver::default());
        let mut session =
            open_session(online_config_reply(), full_selector_reply(), driver.clone()).await;

        session.close().await.unwrap();
        session.close().await.unwrap();

        assert_eq!(driver.calls(), vec!["close_page", "close_browser"]);
    }
}
