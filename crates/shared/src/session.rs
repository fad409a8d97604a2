use anyhow::{Context, Result};
use reqwest::cookie::Jar;
use reqwest::Client;
use std::sync::Arc;
use url::Url;

/// Text that only appears on the cookie-consent interstitial. Seeing it in a
/// response body means the preset cookies no longer bypass the wall.
const CONSENT_MARKER: &str = "Cookie Consent and Choices";

/// Cookies the consent banner would set on acceptance. Preset before any
/// request so NPR serves page content instead of the interstitial.
const CONSENT_COOKIES: [(&str, &str); 3] = [
    ("trackingChoice", "true"),
    ("choiceVersion", "1"),
    ("dateOfChoice", "1595872056076"),
];

pub struct Session {
    client: Client,
}

impl Session {
    pub fn new(base_url: &str) -> Result<Self> {
        let base: Url = base_url
            .parse()
            .with_context(|| format!("Invalid base URL: {}", base_url))?;
        let host = base.host_str().context("Base URL has no host")?;
        let domain = host.trim_start_matches("www.");

        let jar = Jar::default();
        for (name, value) in CONSENT_COOKIES {
            let cookie = format!("{}={}; Domain=.{}; Path=/", name, value, domain);
            jar.add_cookie_str(&cookie, &base);
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; MusicSegmentFeed/1.0)")
            .cookie_provider(Arc::new(jar))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// GET a page and return its body. Any non-success status is fatal, as is
    /// a body that is still the consent interstitial.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP error: {} for {}", status, url);
        }

        let html = response
            .text()
            .await
            .context("Failed to read response body")?;

        if html.contains(CONSENT_MARKER) {
            anyhow::bail!(
                "Got the consent wall for {}; the preset cookies no longer bypass it",
                url
            );
        }

        Ok(html)
    }
}
