// src/session.rs
//! Login flow against the dashboard.
//!
//! ```text
//! Start -> Navigated -> AlreadyAuthenticated                       (ok)
//!                    -> AtLoginForm -> CredentialsEntered -> Submitted -> Verified (ok | rejected)
//! ```
//! Every attempt ends in `Verified`, failed ones with `authenticated: false`
//! right after the state where they stopped. The failure itself comes back
//! as a `StatsError` value.

use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::browser::Browser;
use crate::config::{BrowserOptions, SiteOptions};
use crate::error::{Result, StatsError};

const LOGIN_FIELD: &str = "input[type='text'], input[type='email']";
const PASSWORD_FIELD: &str = "input[type='password']";
const SUBMIT_BUTTON: &str = "button[type='submit'], button";
const DASHBOARD_READY: &str = "main";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Start,
    Navigated,
    AlreadyAuthenticated,
    AtLoginForm,
    CredentialsEntered,
    Submitted,
    Verified { authenticated: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The session was still valid; no form was shown.
    AlreadyAuthenticated,
    LoggedIn,
}

pub struct SessionDriver {
    site: SiteOptions,
    element_wait: Duration,
    submit_settle: Duration,
    render_settle: Duration,
    trail: Vec<SessionState>,
}

impl SessionDriver {
    pub fn new(site: &SiteOptions, browser: &BrowserOptions) -> Self {
        Self {
            site: site.clone(),
            element_wait: browser.element_wait,
            submit_settle: browser.submit_settle,
            render_settle: browser.render_settle,
            trail: Vec::new(),
        }
    }

    /// States visited by the last `login` call, in order.
    pub fn trail(&self) -> &[SessionState] {
        &self.trail
    }

    pub fn state(&self) -> Option<SessionState> {
        self.trail.last().copied()
    }

    fn enter(&mut self, state: SessionState) {
        debug!("Session: -> {state:?}");
        self.trail.push(state);
    }

    fn on_login_page(&self, url: &str) -> bool {
        url.to_lowercase().contains(&self.site.login_marker.to_lowercase())
    }

    /// Bring the browser to an authenticated dashboard page.
    pub fn login(&mut self, browser: &mut dyn Browser) -> Result<LoginOutcome> {
        self.trail.clear();
        let res = self.drive(browser);
        self.enter(SessionState::Verified { authenticated: res.is_ok() });
        match &res {
            Ok(outcome) => info!("Session: verified ({outcome:?})"),
            Err(e) => error!("Session: login failed: {e}"),
        }
        res
    }

    fn drive(&mut self, browser: &mut dyn Browser) -> Result<LoginOutcome> {
        self.enter(SessionState::Start);

        let url = self.site.url.clone();
        info!("Session: navigating to {url}");
        browser.navigate(&url).map_err(|e| match e {
            StatsError::Navigation { .. } => e,
            other => StatsError::Navigation { url: url.clone(), reason: other.to_string() },
        })?;
        self.enter(SessionState::Navigated);

        let landed = browser.current_url()?;
        if !self.on_login_page(&landed) {
            info!("Session: already logged in or no login required");
            self.enter(SessionState::AlreadyAuthenticated);
            return Ok(LoginOutcome::AlreadyAuthenticated);
        }
        self.enter(SessionState::AtLoginForm);

        let login_field = browser
            .find_element(LOGIN_FIELD, Some(self.element_wait))?
            .ok_or(StatsError::LoginFieldMissing)?;
        let password_field = browser
            .find_element(PASSWORD_FIELD, None)?
            .ok_or(StatsError::PasswordFieldMissing)?;

        browser.type_text(&login_field, &self.site.login)?;
        browser.type_text(&password_field, &self.site.password)?;
        self.enter(SessionState::CredentialsEntered);

        match browser.find_element(SUBMIT_BUTTON, None)? {
            Some(button) => {
                browser.click(&button)?;
                debug!("Session: clicked submit button");
            }
            None => {
                browser.submit(&password_field)?;
                debug!("Session: submitted form via Enter key");
            }
        }
        self.enter(SessionState::Submitted);

        thread::sleep(self.submit_settle);

        let after = browser.current_url()?;
        info!("Session: URL after login: {after}");
        if self.on_login_page(&after) {
            return Err(StatsError::AuthenticationRejected { url: after });
        }
        Ok(LoginOutcome::LoggedIn)
    }

    /// Wait (bounded) for the dashboard's `<main>` and give scripts a moment
    /// to fill it. Returns whether `<main>` showed up; its absence is not
    /// an error, the extractor decides what the page holds.
    pub fn wait_for_dashboard(&self, browser: &mut dyn Browser) -> Result<bool> {
        let ready = browser.find_element(DASHBOARD_READY, Some(self.element_wait))?.is_some();
        if ready {
            thread::sleep(self.render_settle);
        } else {
            warn!("Session: <{DASHBOARD_READY}> did not appear; reading the page anyway");
        }
        Ok(ready)
    }
}
