//! # state-filing
//!
//! AI-driven business registration filing via Chrome DevTools Protocol (CDP).
//!
//! Instead of hand-maintained per-jurisdiction configuration, the library
//! discovers a government portal's URLs and form-field selectors at runtime:
//!
//! - **Research**: one model call per session describes the jurisdiction's
//!   LLC filing process (URLs, requirements, cost)
//! - **Selector discovery**: one model call per visited page maps semantic
//!   form fields to CSS selectors
//! - **Pipeline**: login -> navigate -> fill -> submit, each stage returning
//!   a typed result instead of raising
//!
//! Both model-facing engines carry deterministic fallbacks, so a malformed
//! or unavailable model never blocks the pipeline: research degrades to an
//! "online filing unavailable" stub and discovery degrades to a fixed table
//! of broad CSS selectors.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use state_filing::{BusinessFilingData, FilingSession, Settings};
//!
//! # async fn run() -> state_filing::Result<()> {
//! let settings = Settings::from_env();
//! let mut session = FilingSession::open("TX", &settings).await?;
//!
//! println!("researched: {:?}", session.config());
//!
//! session.login("user", "secret").await;
//! session.navigate().await;
//!
//! let data = BusinessFilingData::new()
//!     .business_name("Tech Solutions LLC")
//!     .registered_agent_name("Jane Smith")
//!     .purpose("All lawful purposes");
//! session.fill(&data).await;
//!
//! // Review before submitting; session.submit() is the explicit confirmation
//! let shot = session.screenshot(None).await?;
//! println!("review {}", shot.display());
//!
//! let outcome = session.submit().await;
//! println!("submitted: {:?}", outcome);
//!
//! session.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`jurisdiction`]: the closed set of supported jurisdiction codes
//! - [`research`]: per-session AI research of a jurisdiction's filing process
//! - [`discovery`]: per-page AI mapping of semantic fields to CSS selectors
//! - [`filing`]: the session lifecycle and stage pipeline
//! - [`browser`]: the fallible browser driver seam and its CDP implementation
//! - [`llm`]: the text-generation collaborator seam and the Ollama client
//! - [`error`]: error types and result alias

pub mod browser;
pub mod discovery;
pub mod error;
pub mod filing;
pub mod jurisdiction;
pub mod llm;
pub mod research;
pub mod settings;

pub use browser::{BrowserDriver, ChromeDriver, LaunchOptions};
pub use discovery::{SelectorDiscovery, SelectorMap};
pub use error::{FilingError, Result};
pub use filing::{
    BusinessFilingData, FilingOutcome, FilingSession, PipelineState, Stage, StageResult,
};
pub use jurisdiction::JurisdictionCode;
pub use llm::{OllamaClient, TextGenerator};
pub use research::{JurisdictionConfig, ResearchEngine};
pub use settings::Settings;

/// Open a filing session for a jurisdiction using environment settings
pub async fn open_session(code: &str) -> Result<FilingSession> {
    FilingSession::open(code, &Settings::from_env()).await
}
