// src/specs/mod.rs
//! # Page extraction
//!
//! Page-specific extraction rules. Each module encodes *where the
//! ground truth lives in the HTML* and *how to extract it robustly*.
//!
//! ## What lives here
//! - **Selector choice & precedence**: ordered fallback strategies per field,
//!   first non-empty result wins.
//! - **Tolerant extraction** over the `core::html` tree: a missing card,
//!   sub-card or row is skipped and logged, never an error.
//! - **Light shaping** of results into `data::MetricGroup`s.
//!
//! ## What does **not** live here
//! - **Browser control and login**: `session`.
//! - **Persistence and diffing**: `store`, `diff`.
//! - **Report formatting**: `report`.
//!
//! ## Testing notes
//! Extraction is testable **offline** against captured or synthetic HTML.
pub mod dashboard;
