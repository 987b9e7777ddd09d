// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use dox_stats::browser::{Browser, ElementRef};
use dox_stats::config::{AppOptions, BrowserOptions};
use dox_stats::error::{Result, StatsError};

pub const LOGIN_FIELD: &str = "input[type='text'], input[type='email']";
pub const PASSWORD_FIELD: &str = "input[type='password']";
pub const SUBMIT_BUTTON: &str = "button[type='submit'], button";
pub const MAIN: &str = "main";

pub const LOGIN_URL: &str = "https://admin.example.test/Account/Login?ReturnUrl=%2FStatistic";
pub const DASHBOARD_URL: &str = "https://admin.example.test/Statistic";

pub const USER: &str = "operator";
pub const PASSWORD: &str = "s3cret";

/// Full dashboard: P2P card with info items, Posting card with flex rows
/// and both sub-cards.
pub fn dashboard_html(active: &str, posts_planned: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ru"><head><meta charset="utf-8"><title>Statistic</title>
<script>var tpl = "<div class='card'><div class='card-header'>P2P</div></div>";</script>
</head>
<body>
<main class="container">
  <div class="card shadow-sm mb-3">
    <div class="card-header"><h5 class="mb-0">P2P Bot</h5></div>
    <div class="card-body">
      <div class="info-item"><label>Всего пользователей:</label> <span class="badge bg-primary">1&nbsp;234</span></div>
      <div class="info-item"><label>Активных:</label> <span class="badge bg-success">{active}</span></div>
      <div class="info-item"><label>Конверсия:</label> <span class="badge">1,83</span></div>
    </div>
  </div>
  <div class="card shadow-sm">
    <div class="card-header">Posting Bot</div>
    <div class="card-body">
      <div class="d-flex justify-content-between"><label>Каналов:</label><span class="badge">12</span></div>
      <div class="d-flex justify-content-between"><label>Постов сегодня</label><span class="badge">3</span></div>
      <div class="card border-primary mt-3">
        <div class="card-body">
          <div class="row">
            <div class="col text-center"><div class="fs-3 fw-bold">{posts_planned}</div><div class="text-muted">Запланировано</div></div>
            <div class="col text-center"><div class="fs-3 fw-bold">0</div><div class="text-muted">Ошибок</div></div>
          </div>
          <div class="d-flex"><label>Внутри:</label><span class="badge">999</span></div>
        </div>
      </div>
      <div class="card border-info mt-3">
        <div class="card-body">
          <div class="text-center"><div class="fs-3 fw-bold">7</div><div class="text-muted">Опубликовано</div></div>
        </div>
      </div>
    </div>
  </div>
</main>
</body></html>"#
    )
}

/// P2P card that only has generic flex rows.
pub const P2P_FLEX_ONLY: &str = r#"<main>
  <div class="card"><div class="card-header">P2P</div>
    <div class="card-body">
      <div class="d-flex"><label>Активных:</label><span class="badge">10</span></div>
      <div class="d-flex"><label>Новых:</label><span class="badge">2</span></div>
    </div>
  </div>
</main>"#;

pub const NO_CARDS: &str = "<html><body><main><p>Нет данных</p></main></body></html>";

pub fn options() -> AppOptions {
    let mut opts = AppOptions::default();
    opts.site.url = DASHBOARD_URL.into();
    opts.site.login = USER.into();
    opts.site.password = PASSWORD.into();
    opts.browser = BrowserOptions::instant();
    opts
}

pub fn options_in(dir: &Path) -> AppOptions {
    let mut opts = options();
    opts.store.snapshot_path = dir.join("stats_history.json");
    opts.output.dir = dir.join("out");
    opts
}

/// In-memory browser following a script: which selectors resolve, whether
/// the site accepts the credentials, what page is rendered afterwards.
#[derive(Debug, Clone)]
pub struct FakeBrowser {
    pub url: String,
    pub elements: HashSet<String>,
    pub logged_in: bool,
    pub accept_credentials: bool,
    pub unreachable: bool,
    pub html: String,
    pub typed: Vec<(String, String)>,
    pub clicked: Vec<String>,
    pub submitted: Vec<String>,
    pub closed: bool,
}

impl FakeBrowser {
    /// A login form with every field present, then `html` once in.
    pub fn login_page(html: impl Into<String>) -> Self {
        Self {
            url: String::new(),
            elements: [LOGIN_FIELD, PASSWORD_FIELD, SUBMIT_BUTTON, MAIN].iter().map(|s| s.to_string()).collect(),
            logged_in: false,
            accept_credentials: true,
            unreachable: false,
            html: html.into(),
            typed: Vec::new(),
            clicked: Vec::new(),
            submitted: Vec::new(),
            closed: false,
        }
    }

    /// A session that is still valid: no login page is shown.
    pub fn logged_in(html: impl Into<String>) -> Self {
        Self { logged_in: true, ..Self::login_page(html) }
    }

    pub fn without(mut self, selector: &str) -> Self {
        self.elements.remove(selector);
        self
    }

    pub fn rejecting(mut self) -> Self {
        self.accept_credentials = false;
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    fn typed_value(&self, field: &str) -> Option<&str> {
        self.typed.iter().rev().find(|(f, _)| f == field).map(|(_, v)| v.as_str())
    }

    fn try_login(&mut self) {
        let ok = self.typed_value(LOGIN_FIELD) == Some(USER) && self.typed_value(PASSWORD_FIELD) == Some(PASSWORD);
        if ok && self.accept_credentials {
            self.logged_in = true;
            self.url = DASHBOARD_URL.into();
        }
    }
}

impl Browser for FakeBrowser {
    fn navigate(&mut self, url: &str) -> Result<()> {
        if self.unreachable {
            return Err(StatsError::Http(format!("connect to {url}: connection refused")));
        }
        self.url = if self.logged_in { url.into() } else { LOGIN_URL.into() };
        Ok(())
    }

    fn current_url(&mut self) -> Result<String> {
        Ok(self.url.clone())
    }

    fn find_element(&mut self, selector: &str, _timeout: Option<Duration>) -> Result<Option<ElementRef>> {
        Ok(self.elements.contains(selector).then(|| ElementRef(selector.to_string())))
    }

    fn type_text(&mut self, element: &ElementRef, text: &str) -> Result<()> {
        self.typed.push((element.0.clone(), text.to_string()));
        Ok(())
    }

    fn click(&mut self, element: &ElementRef) -> Result<()> {
        self.clicked.push(element.0.clone());
        self.try_login();
        Ok(())
    }

    fn submit(&mut self, element: &ElementRef) -> Result<()> {
        self.submitted.push(element.0.clone());
        self.try_login();
        Ok(())
    }

    fn rendered_html(&mut self) -> Result<String> {
        Ok(self.html.clone())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
