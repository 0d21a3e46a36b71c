use anyhow::{anyhow, Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::cookies;

pub const DEFAULT_VIEWPORT: (u32, u32) = (1280, 800);
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SCROLL_DELAY_MS: u64 = 1000;

/// Options for a single headless-browser page render.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub url: String,
    pub viewport: (u32, u32),
    pub user_agent: String,
    pub navigation_timeout: Duration,
    pub scroll_delay: Duration,
    /// JSON cookie export to load before navigating (authenticated scrapes)
    pub cookies_file: Option<PathBuf>,
}

impl ScrapeOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            viewport: DEFAULT_VIEWPORT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            navigation_timeout: Duration::from_secs(DEFAULT_NAVIGATION_TIMEOUT_SECS),
            scroll_delay: Duration::from_millis(DEFAULT_SCROLL_DELAY_MS),
            cookies_file: None,
        }
    }

    /// Build options from the `[scrape]` config section, falling back to the
    /// defaults above for anything unset. The cookie file is not applied here;
    /// only the authenticated route opts into it via `with_cookies_file`.
    pub fn from_config(url: impl Into<String>, config: Option<&common::ScrapeConfig>) -> Self {
        let mut options = Self::new(url);
        if let Some(cfg) = config {
            let (dw, dh) = DEFAULT_VIEWPORT;
            options.viewport = (
                cfg.viewport_width.unwrap_or(dw),
                cfg.viewport_height.unwrap_or(dh),
            );
            if let Some(ua) = &cfg.user_agent {
                options.user_agent = ua.clone();
            }
            if let Some(secs) = cfg.navigation_timeout_seconds {
                options.navigation_timeout = Duration::from_secs(secs);
            }
            if let Some(ms) = cfg.scroll_delay_ms {
                options.scroll_delay = Duration::from_millis(ms);
            }
        }
        options
    }

    pub fn with_cookies_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookies_file = Some(path.into());
        self
    }
}

/// Renders the page in a headless browser and returns the serialized DOM.
///
/// The browser binding is synchronous, so the whole render runs on a blocking
/// thread and must not be awaited from inside another blocking section.
pub async fn fetch_rendered_page(options: ScrapeOptions) -> Result<String> {
    let url = options.url.clone();
    let html = tokio::task::spawn_blocking(move || render_page(&options))
        .await
        .context("scrape task panicked")?
        .with_context(|| format!("failed to scrape {url}"))?;
    info!("scraping: serialized {} bytes of DOM from {}", html.len(), url);
    Ok(html)
}

fn render_page(options: &ScrapeOptions) -> Result<String> {
    let launch_options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .window_size(Some(options.viewport))
        .idle_browser_timeout(options.navigation_timeout)
        .args(vec![OsStr::new("--disable-setuid-sandbox")])
        .build()
        .map_err(|e| anyhow!("failed to build browser launch options: {e}"))?;

    let browser = Browser::new(launch_options).context("failed to launch headless browser")?;
    let tab = browser.new_tab().context("failed to open browser tab")?;
    tab.set_default_timeout(options.navigation_timeout);
    tab.set_user_agent(&options.user_agent, None, None)
        .context("failed to set user agent")?;

    if let Some(path) = &options.cookies_file {
        // A missing or malformed cookie file downgrades to an anonymous scrape
        match cookies::load_cookie_file(path) {
            Ok(cookies) if !cookies.is_empty() => {
                let count = cookies.len();
                tab.set_cookies(cookies).context("failed to set cookies")?;
                info!("scraping: loaded {} session cookies from {}", count, path.display());
            }
            Ok(_) => warn!("scraping: cookie file {} is empty", path.display()),
            Err(e) => warn!("scraping: could not load cookie file {}: {e:#}", path.display()),
        }
    }

    tab.navigate_to(&options.url)
        .with_context(|| format!("failed to navigate to {}", options.url))?;
    tab.wait_until_navigated()
        .context("page did not finish loading")?;

    scroll_page(&tab, options.scroll_delay)?;

    let html = tab.get_content().context("failed to serialize page DOM")?;
    if html.trim().is_empty() {
        anyhow::bail!("page produced an empty DOM serialization");
    }
    Ok(html)
}

/// Fixed scroll sequence to trigger lazy-loaded content: scroll one viewport
/// height in viewport-sized steps, pausing after each step, and stop early
/// once the bottom of the document is reached.
fn scroll_page(tab: &Tab, delay: Duration) -> Result<()> {
    let viewport_height = eval_number(tab, "window.innerHeight")?;
    let target_scroll_height = viewport_height;
    let mut current_position = 0.0;

    while current_position < target_scroll_height {
        tab.evaluate(&format!("window.scrollBy(0, {viewport_height})"), false)
            .context("scroll step failed")?;
        std::thread::sleep(delay);

        current_position = eval_number(tab, "window.pageYOffset")?;
        let total_height = eval_number(tab, "document.body.scrollHeight")?;
        if current_position + viewport_height >= total_height {
            break;
        }
    }
    Ok(())
}

fn eval_number(tab: &Tab, expression: &str) -> Result<f64> {
    tab.evaluate(expression, false)
        .with_context(|| format!("failed to evaluate `{expression}`"))?
        .value
        .and_then(|v| v.as_f64())
        .ok_or_else(|| anyhow!("`{expression}` did not return a number"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_fall_back_to_defaults() {
        let options = ScrapeOptions::from_config("https://example.com", None);
        assert_eq!(options.viewport, DEFAULT_VIEWPORT);
        assert_eq!(options.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(
            options.navigation_timeout,
            Duration::from_secs(DEFAULT_NAVIGATION_TIMEOUT_SECS)
        );
        assert!(options.cookies_file.is_none());
    }

    #[test]
    fn options_respect_config_overrides() {
        let cfg = common::ScrapeConfig {
            viewport_width: Some(1920),
            viewport_height: None,
            user_agent: Some("TestAgent/1.0".to_string()),
            navigation_timeout_seconds: Some(10),
            scroll_delay_ms: Some(250),
            cookies_file: Some("cookies/x.json".to_string()),
        };
        let options = ScrapeOptions::from_config("https://example.com", Some(&cfg));
        // Partial viewport override keeps the default for the missing axis
        assert_eq!(options.viewport, (1920, DEFAULT_VIEWPORT.1));
        assert_eq!(options.user_agent, "TestAgent/1.0");
        assert_eq!(options.scroll_delay, Duration::from_millis(250));
        // The cookie file is opt-in per route, not inherited from config
        assert!(options.cookies_file.is_none());

        let options = options.with_cookies_file("cookies/x.json");
        assert_eq!(
            options.cookies_file,
            Some(PathBuf::from("cookies/x.json"))
        );
    }
}
