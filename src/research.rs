//! Jurisdiction research engine.
//!
//! Asks the model for a structured description of a jurisdiction's LLC
//! filing process (URLs, requirements, cost). A single malformed reply is
//! terminal for the pass: the engine falls back to a conservative stub
//! config so the pipeline always has something to work with, trading
//! accuracy for availability.

use crate::jurisdiction::JurisdictionCode;
use crate::llm::{TextGenerator, extract_json_object};
use serde::{Deserialize, Serialize};

/// Runtime configuration for one jurisdiction, produced once per session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionConfig {
    /// Jurisdiction display name (mandatory in the model's reply)
    pub name: String,

    /// Root of the agency's portal
    #[serde(default)]
    pub base_url: String,

    /// Login page, if the portal has one
    #[serde(default)]
    pub login_url: Option<String>,

    /// Page carrying the LLC formation form
    #[serde(default)]
    pub filing_form_url: Option<String>,

    /// Whether the jurisdiction supports filing online at all
    #[serde(default)]
    pub online_filing_available: bool,

    /// Typical requirements, in the order the agency lists them
    #[serde(default)]
    pub typical_requirements: Vec<String>,

    /// Free-form cost estimate, e.g. "$300 filing fee"
    #[serde(default)]
    pub estimated_cost: Option<String>,

    /// Free-form notes about the process
    #[serde(default)]
    pub notes: Option<String>,
}

impl JurisdictionConfig {
    /// Conservative stub used when research fails: filing is marked
    /// unavailable so the pipeline short-circuits instead of driving the
    /// browser against guessed URLs.
    pub fn fallback(code: &JurisdictionCode) -> Self {
        Self {
            name: code.display_name().to_string(),
            base_url: format!("https://www.sos.state.{}.us/", code.as_str().to_ascii_lowercase()),
            login_url: None,
            filing_form_url: None,
            online_filing_available: false,
            typical_requirements: Vec::new(),
            estimated_cost: None,
            notes: Some("research failed; needs manual verification".to_string()),
        }
    }
}

/// Asks the text-generation collaborator to research one jurisdiction
pub struct ResearchEngine<'a> {
    generator: &'a dyn TextGenerator,
}

impl<'a> ResearchEngine<'a> {
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self { generator }
    }

    /// Research the jurisdiction's filing process.
    ///
    /// Never fails: a generate error or unparseable reply yields
    /// [`JurisdictionConfig::fallback`].
    pub async fn research(&self, code: &JurisdictionCode) -> JurisdictionConfig {
        let prompt = build_research_prompt(code);

        let reply = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("research for {} failed: {}; using fallback config", code, e);
                return JurisdictionConfig::fallback(code);
            }
        };

        match parse_research_reply(&reply) {
            Some(config) => {
                log::info!(
                    "researched {}: online filing {}",
                    code,
                    if config.online_filing_available { "available" } else { "unavailable" }
                );
                config
            }
            None => {
                log::warn!(
                    "unusable research reply for {} ({} chars); using fallback config",
                    code,
                    reply.len()
                );
                JurisdictionConfig::fallback(code)
            }
        }
    }
}

/// Build the research prompt for one jurisdiction
fn build_research_prompt(code: &JurisdictionCode) -> String {
    format!(
        "You are researching how to form a limited liability company (LLC) online in \
         {name}, United States (jurisdiction code {code}).\n\
         Only consider official government websites (.gov or official Secretary of State \
         domains).\n\n\
         Reply with ONLY a JSON object, no prose and no markdown, with exactly these keys:\n\
         {{\n\
           \"name\": \"{name}\",\n\
           \"base_url\": \"root URL of the official filing portal\",\n\
           \"login_url\": \"login page URL, or null if none\",\n\
           \"filing_form_url\": \"URL of the online LLC formation form, or null\",\n\
           \"online_filing_available\": true or false,\n\
           \"typical_requirements\": [\"ordered list of required items\"],\n\
           \"estimated_cost\": \"filing cost as text, or null\",\n\
           \"notes\": \"anything a filer should know, or null\"\n\
         }}",
        name = code.display_name(),
        code = code
    )
}

/// Parse the model's reply; `None` when it is unusable
fn parse_research_reply(reply: &str) -> Option<JurisdictionConfig> {
    let json = extract_json_object(reply)?;
    let config: JurisdictionConfig = serde_json::from_str(json).ok()?;
    // serde enforces the mandatory name key; an empty one is as useless
    if config.name.trim().is_empty() {
        return None;
    }
    Some(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FilingError, Result};
    use async_trait::async_trait;

    struct FixedGenerator(String);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(FilingError::ModelRequestFailed("connection refused".to_string()))
        }
    }

    fn tx() -> JurisdictionCode {
        JurisdictionCode::new("TX").unwrap()
    }

    #[tokio::test]
    async fn test_research_parses_well_formed_reply() {
        let generator = FixedGenerator(
            r#"{
                "name": "Texas",
                "base_url": "https://direct.sos.state.tx.us/",
                "login_url": "https://direct.sos.state.tx.us/acct/login.asp",
                "filing_form_url": "https://direct.sos.state.tx.us/help/forms.asp",
                "online_filing_available": true,
                "typical_requirements": ["Certificate of Formation", "Registered agent"],
                "estimated_cost": "$300",
                "notes": null
            }"#
            .to_string(),
        );

        let config = ResearchEngine::new(&generator).research(&tx()).await;
        assert_eq!(config.name, "Texas");
        assert!(config.online_filing_available);
        assert_eq!(config.typical_requirements.len(), 2);
        assert_eq!(config.estimated_cost.as_deref(), Some("$300"));
    }

    #[tokio::test]
    async fn test_research_tolerates_markdown_fences() {
        let generator = FixedGenerator(
            "Sure! Here is the information:\n```json\n{\"name\": \"Texas\", \
             \"online_filing_available\": true}\n```"
                .to_string(),
        );

        let config = ResearchEngine::new(&generator).research(&tx()).await;
        assert_eq!(config.name, "Texas");
        assert!(config.online_filing_available);
        // Missing optional keys default, never crash
        assert!(config.login_url.is_none());
        assert!(config.typical_requirements.is_empty());
    }

    #[tokio::test]
    async fn test_research_fallback_on_non_json() {
        let generator = FixedGenerator("I'm sorry, I can't help with that.".to_string());

        let config = ResearchEngine::new(&generator).research(&tx()).await;
        assert!(!config.online_filing_available);
        assert_eq!(config.name, "Texas");
        assert_eq!(config.base_url, "https://www.sos.state.tx.us/");
        assert!(config.notes.as_deref().unwrap().contains("manual verification"));
    }

    #[tokio::test]
    async fn test_research_fallback_on_missing_name() {
        let generator =
            FixedGenerator(r#"{"online_filing_available": true, "base_url": "x"}"#.to_string());

        let config = ResearchEngine::new(&generator).research(&tx()).await;
        assert!(!config.online_filing_available);
        assert!(config.notes.is_some());
    }

    #[tokio::test]
    async fn test_research_fallback_on_generate_error() {
        let config = ResearchEngine::new(&FailingGenerator).research(&tx()).await;
        assert!(!config.online_filing_available);
        assert_eq!(config.name, "Texas");
    }

    #[test]
    fn test_prompt_mentions_jurisdiction_and_shape() {
        let prompt = build_research_prompt(&tx());
        assert!(prompt.contains("Texas"));
        assert!(prompt.contains("TX"));
        assert!(prompt.contains("online_filing_available"));
        assert!(prompt.contains("official government"));
    }
}
