// src/report/mod.rs
//! Turning a snapshot (and its deltas) into something a person reads: the
//! chat message and the chart images that go with it.

pub mod chart;
pub mod plot;
pub mod text;

pub use plot::{render_charts, Chart};
pub use text::render_text;
