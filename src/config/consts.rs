// src/config/consts.rs

// Dashboard
pub const STATS_URL: &str = "https://admin.doxmediagroup.com/Statistic";
pub const LOGIN_MARKER: &str = "login"; // URL fragment of the login page

// WebDriver (chromedriver default port)
pub const WEBDRIVER_HOST: &str = "127.0.0.1";
pub const WEBDRIVER_PORT: u16 = 9515;
pub const HTTP_TIMEOUT_SECS: u64 = 60;

// Waits
pub const ELEMENT_WAIT_MS: u64 = 10_000;
pub const PAGE_LOAD_TIMEOUT_MS: u64 = 30_000;
pub const POLL_INTERVAL_MS: u64 = 250;
pub const SUBMIT_SETTLE_MS: u64 = 3_000; // after clicking "login"
pub const RENDER_SETTLE_MS: u64 = 2_000; // after <main> shows up

// Local state
pub const SNAPSHOT_FILE: &str = "stats_history.json";
pub const DEFAULT_OUT_DIR: &str = "out";
pub const REPORT_FILE: &str = "report.html";
pub const HTML_DUMP_FILE: &str = "last_page.html";

// Report
pub const REPORT_MARKER: &str = "#Report";
pub const P2P_GROUP_NAME: &str = "p2pDox";
pub const POSTING_GROUP_NAME: &str = "Doxposting";
pub const POSTS_SUBGROUP: &str = "Посты";
pub const STORIES_SUBGROUP: &str = "Сторис";

// Charts
pub const ZERO_SLICE_VALUE: f64 = 0.1;
pub const PIE_SIZE_PX: u32 = 480;
