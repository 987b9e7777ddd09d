// src/config/options.rs
use std::path::PathBuf;
use std::time::Duration;

use super::consts::*;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppOptions {
    pub site: SiteOptions,
    pub browser: BrowserOptions,
    pub store: StoreOptions,
    pub output: OutputOptions,
    pub log: LogOptions,
}

#[derive(Clone, PartialEq, Eq)]
pub struct SiteOptions {
    pub url: String,
    pub login: String,
    pub password: String,
    /// Substring of the URL that means "this is the login page".
    pub login_marker: String,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            url: s!(STATS_URL),
            login: s!(),
            password: s!(),
            login_marker: s!(LOGIN_MARKER),
        }
    }
}

// Keep the password out of debug logs.
impl std::fmt::Debug for SiteOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteOptions")
            .field("url", &self.url)
            .field("login", &self.login)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("login_marker", &self.login_marker)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrowserOptions {
    pub webdriver_host: String,
    pub webdriver_port: u16,
    pub headless: bool,
    pub chrome_bin: Option<PathBuf>,
    pub element_wait: Duration,
    pub page_load_timeout: Duration,
    pub submit_settle: Duration,
    pub render_settle: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            webdriver_host: s!(WEBDRIVER_HOST),
            webdriver_port: WEBDRIVER_PORT,
            headless: true,
            chrome_bin: None,
            element_wait: Duration::from_millis(ELEMENT_WAIT_MS),
            page_load_timeout: Duration::from_millis(PAGE_LOAD_TIMEOUT_MS),
            submit_settle: Duration::from_millis(SUBMIT_SETTLE_MS),
            render_settle: Duration::from_millis(RENDER_SETTLE_MS),
        }
    }
}

impl BrowserOptions {
    /// Zero waits; for offline runs against scripted browsers.
    pub fn instant() -> Self {
        Self {
            element_wait: Duration::ZERO,
            submit_settle: Duration::ZERO,
            render_settle: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreOptions {
    pub snapshot_path: PathBuf,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { snapshot_path: PathBuf::from(SNAPSHOT_FILE) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputOptions {
    pub dir: PathBuf,
    pub charts: bool,
    /// Write the rendered page here when extraction fails.
    pub dump_html: Option<PathBuf>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUT_DIR),
            charts: true,
            dump_html: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogOptions {
    pub verbose: bool,
    /// `None` logs to stderr.
    pub file: Option<PathBuf>,
}
