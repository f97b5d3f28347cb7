//! Per-page selector discovery.
//!
//! Given the rendered HTML of the page the pipeline is currently on, asks
//! the model to map the semantic form fields to CSS selectors. When the
//! reply is unusable the engine returns a fixed table of broad selectors
//! instead, so an unavailable or confused model never blocks the pipeline.
//! Discovery runs on every page visited; a map is only valid for the HTML
//! snapshot it was computed from.

use crate::llm::{TextGenerator, extract_json_object};
use serde::{Deserialize, Serialize};

/// HTML snapshots are cut to this many characters before prompting, to keep
/// prompt size, latency, and cost bounded. Fields rendered past the cutoff
/// may be missed; the generic fallback still covers them.
pub const HTML_SNAPSHOT_LIMIT: usize = 4000;

/// The semantic fields discovery looks for, in prompt order
pub const SEMANTIC_FIELDS: &[&str] = &[
    "username",
    "password",
    "login_button",
    "business_name",
    "registered_agent_name",
    "registered_agent_address",
    "purpose",
    "submit_button",
];

/// Map from semantic field to a CSS selector on one specific page.
///
/// `None` means the field is not present on that page; it is never treated
/// as a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorMap {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub login_button: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub registered_agent_name: Option<String>,
    #[serde(default)]
    pub registered_agent_address: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub submit_button: Option<String>,
}

impl SelectorMap {
    /// Broad heuristics keyed by common name/type attribute substrings,
    /// used verbatim whenever the model's reply is unusable.
    pub fn generic_fallback() -> Self {
        Self {
            username: Some(
                "input[type='email'], input[name*='user'], input[name*='email'], input[id*='user']"
                    .to_string(),
            ),
            password: Some("input[type='password']".to_string()),
            login_button: Some("button[type='submit'], input[type='submit']".to_string()),
            business_name: Some(
                "input[name*='entity'], input[name*='business'], input[id*='entity'], \
                 input[id*='business']"
                    .to_string(),
            ),
            registered_agent_name: Some(
                "input[name*='agent'], input[id*='agent']".to_string(),
            ),
            registered_agent_address: Some(
                "textarea[name*='address'], input[name*='address'], textarea[id*='address']"
                    .to_string(),
            ),
            purpose: Some(
                "textarea[name*='purpose'], input[name*='purpose'], textarea[id*='purpose']"
                    .to_string(),
            ),
            submit_button: Some(
                "button[type='submit'], input[type='submit'], input[value*='Submit']".to_string(),
            ),
        }
    }
}

/// Maps semantic field names to selectors on the current page
pub struct SelectorDiscovery<'a> {
    generator: &'a dyn TextGenerator,
}

impl<'a> SelectorDiscovery<'a> {
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self { generator }
    }

    /// Discover selectors for the given page snapshot.
    ///
    /// Never fails: a generate error or unusable reply yields
    /// [`SelectorMap::generic_fallback`].
    pub async fn discover(&self, page_html: &str) -> SelectorMap {
        let snapshot = truncate_chars(page_html, HTML_SNAPSHOT_LIMIT);
        let prompt = build_discovery_prompt(snapshot);

        let reply = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("selector discovery failed: {}; using generic fallback", e);
                return SelectorMap::generic_fallback();
            }
        };

        match parse_discovery_reply(&reply) {
            Some(map) => {
                log::debug!(
                    "discovered selectors: {}",
                    serde_json::to_string(&map).unwrap_or_default()
                );
                map
            }
            None => {
                log::warn!(
                    "unusable discovery reply ({} chars); using generic fallback",
                    reply.len()
                );
                SelectorMap::generic_fallback()
            }
        }
    }
}

/// Cut a string to its first `limit` characters (not bytes)
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

fn build_discovery_prompt(snapshot: &str) -> String {
    let field_list = SEMANTIC_FIELDS.join(", ");
    format!(
        "Below is the HTML of a government business-filing web page. Identify CSS selectors \
         for these form fields: {field_list}.\n\n\
         Reply with ONLY a JSON object, no prose and no markdown. Use each field name as a \
         key, with a CSS selector string as the value, or null if that field is not on this \
         page. Do not guess selectors for elements that are not in the HTML.\n\n\
         HTML:\n{snapshot}"
    )
}

fn parse_discovery_reply(reply: &str) -> Option<SelectorMap> {
    let json = extract_json_object(reply)?;
    serde_json::from_str(json).ok()
}
