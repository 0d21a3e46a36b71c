use anyhow::{Context, Result};
use headless_chrome::protocol::cdp::Network::CookieParam;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One cookie in a devtools/Puppeteer-style JSON export.
///
/// Only the fields the browser needs are kept; exports carry extra bookkeeping
/// keys (`session`, `storeId`, ...) which are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Unix timestamp; some exporters call this `expirationDate`
    #[serde(default, alias = "expirationDate", skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

impl CookieRecord {
    /// Normalize exporter quirks and map into a CDP cookie parameter.
    fn into_param(mut self) -> Result<CookieParam> {
        // Negative expiry marks a session cookie; the CDP call rejects it
        if self.expires.is_some_and(|e| e <= 0.0) {
            self.expires = None;
        }
        self.same_site = self.same_site.as_deref().and_then(normalize_same_site);

        let value = serde_json::to_value(&self).context("failed to serialize cookie record")?;
        serde_json::from_value(value).context("cookie record does not map to a CDP cookie")
    }
}

fn normalize_same_site(raw: &str) -> Option<String> {
    match raw.to_ascii_lowercase().as_str() {
        "strict" => Some("Strict".to_string()),
        "lax" => Some("Lax".to_string()),
        "none" | "no_restriction" => Some("None".to_string()),
        _ => None,
    }
}

/// Load a JSON cookie file and convert it to CDP cookie parameters.
pub fn load_cookie_file(path: &Path) -> Result<Vec<CookieParam>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read cookie file: {}", path.display()))?;
    let records: Vec<CookieRecord> =
        serde_json::from_str(&data).context("failed to parse cookie file as JSON")?;
    records.into_iter().map(CookieRecord::into_param).collect()
}
