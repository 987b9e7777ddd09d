// src/core/webdriver.rs
//! W3C WebDriver client (chromedriver or compatible) over `core::net`.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde_json::{json, Value};

use crate::browser::{Browser, ElementRef};
use crate::config::BrowserOptions;
use crate::config::consts::POLL_INTERVAL_MS;
use crate::core::net::http_request;
use crate::error::{Result, StatsError};

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const ENTER_KEY: &str = "\u{E007}";

// Flags that let Chrome run inside a container.
const CHROME_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--window-size=1920,1080",
    "--disable-extensions",
    "--disable-infobars",
];

pub struct WebDriver {
    host: String,
    port: u16,
    session: Option<String>,
}

impl WebDriver {
    /// Open a new Chrome session and apply the page-load timeout.
    pub fn connect(opts: &BrowserOptions) -> Result<Self> {
        let mut args: Vec<&str> = Vec::with_capacity(CHROME_ARGS.len() + 1);
        if opts.headless {
            args.push("--headless");
        }
        args.extend_from_slice(CHROME_ARGS);

        let mut chrome = json!({ "args": args });
        if let Some(bin) = &opts.chrome_bin {
            chrome["binary"] = json!(bin.to_string_lossy());
        }
        let caps = json!({
            "capabilities": {
                "alwaysMatch": { "browserName": "chrome", "goog:chromeOptions": chrome }
            }
        });

        let mut wd = Self {
            host: opts.webdriver_host.clone(),
            port: opts.webdriver_port,
            session: None,
        };
        let value = wd.command("POST", "/session", Some(caps))?;
        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| StatsError::Http(s!("new session answer has no sessionId")))?;
        info!("WebDriver: session {id} on {}:{}", wd.host, wd.port);
        wd.session = Some(s!(id));

        let page_load = opts.page_load_timeout.as_millis() as u64;
        wd.session_command("POST", "/timeouts", Some(json!({ "pageLoad": page_load, "implicit": 0 })))?;
        Ok(wd)
    }

    fn command(&self, method: &str, path: &str, body: Option<Value>) -> Result<Value> {
        let body_txt = body.map(|b| b.to_string());
        let resp = http_request(&self.host, self.port, method, path, body_txt.as_deref())?;

        let parsed: Value = if resp.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&resp.body)?
        };
        let value = parsed.get("value").cloned().unwrap_or(Value::Null);

        let error = value.get("error").and_then(Value::as_str);
        if error.is_some() || !(200..300).contains(&resp.status) {
            return Err(StatsError::WebDriver {
                command: join!(method, " ", path),
                error: s!(error.unwrap_or("unknown error")),
                message: s!(value.get("message").and_then(Value::as_str).unwrap_or("")),
            });
        }
        Ok(value)
    }

    fn session_command(&self, method: &str, suffix: &str, body: Option<Value>) -> Result<Value> {
        let id = self
            .session
            .as_deref()
            .ok_or_else(|| StatsError::Http(s!("webdriver session already closed")))?;
        self.command(method, &join!("/session/", id, suffix), body)
    }

    fn element_command(&self, element: &ElementRef, action: &str, body: Value) -> Result<Value> {
        self.session_command("POST", &join!("/element/", &element.0, action), Some(body))
    }
}

fn element_id(value: &Value) -> Option<String> {
    value
        .get(ELEMENT_KEY)
        .or_else(|| value.get("ELEMENT"))
        .and_then(Value::as_str)
        .map(String::from)
}

impl Browser for WebDriver {
    fn navigate(&mut self, url: &str) -> Result<()> {
        debug!("WebDriver: GET {url}");
        self.session_command("POST", "/url", Some(json!({ "url": url })))
            .map(|_| ())
            .map_err(|e| StatsError::Navigation { url: s!(url), reason: e.to_string() })
    }

    fn current_url(&mut self) -> Result<String> {
        let v = self.session_command("GET", "/url", None)?;
        Ok(s!(v.as_str().unwrap_or("")))
    }

    fn find_element(&mut self, selector: &str, timeout: Option<Duration>) -> Result<Option<ElementRef>> {
        let deadline = Instant::now() + timeout.unwrap_or(Duration::ZERO);
        let query = json!({ "using": "css selector", "value": selector });
        loop {
            match self.session_command("POST", "/element", Some(query.clone())) {
                Ok(v) => return Ok(element_id(&v).map(ElementRef)),
                Err(e) if e.is_no_such_element() => {}
                Err(e) => return Err(e),
            }
            let now = Instant::now();
            if now >= deadline {
                debug!("WebDriver: no element for {selector:?}");
                return Ok(None);
            }
            thread::sleep(Duration::from_millis(POLL_INTERVAL_MS).min(deadline - now));
        }
    }

    fn type_text(&mut self, element: &ElementRef, text: &str) -> Result<()> {
        self.element_command(element, "/clear", json!({}))?;
        self.element_command(element, "/value", json!({ "text": text }))?;
        Ok(())
    }

    fn click(&mut self, element: &ElementRef) -> Result<()> {
        self.element_command(element, "/click", json!({})).map(|_| ())
    }

    fn submit(&mut self, element: &ElementRef) -> Result<()> {
        self.element_command(element, "/value", json!({ "text": ENTER_KEY })).map(|_| ())
    }

    fn rendered_html(&mut self) -> Result<String> {
        let v = self.session_command("GET", "/source", None)?;
        Ok(s!(v.as_str().unwrap_or("")))
    }

    fn close(&mut self) -> Result<()> {
        if let Some(id) = self.session.take() {
            self.command("DELETE", &join!("/session/", &id), None)?;
            info!("WebDriver: session {id} closed");
        }
        Ok(())
    }
}

impl Drop for WebDriver {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("WebDriver: close on drop failed: {e}");
        }
    }
}
