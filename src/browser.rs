// src/browser.rs
//! The browser capability the session driver and runner consume.
//! The pipeline never names an engine; `core::webdriver` is one backend,
//! tests script their own.

use std::time::Duration;

use crate::error::Result;

/// Opaque handle to an element found in the current page.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

pub trait Browser {
    fn navigate(&mut self, url: &str) -> Result<()>;

    fn current_url(&mut self) -> Result<String>;

    /// First element matching the CSS selector. With a timeout, keeps
    /// looking until it elapses; `Ok(None)` means not found.
    fn find_element(&mut self, selector: &str, timeout: Option<Duration>) -> Result<Option<ElementRef>>;

    /// Replace the element's value with `text`.
    fn type_text(&mut self, element: &ElementRef, text: &str) -> Result<()>;

    fn click(&mut self, element: &ElementRef) -> Result<()>;

    /// Implicit form submission from inside the element (Enter key).
    fn submit(&mut self, element: &ElementRef) -> Result<()>;

    fn rendered_html(&mut self) -> Result<String>;

    fn close(&mut self) -> Result<()>;
}
