// src/lib.rs

#[macro_use]
pub mod macros;

pub mod cli;
pub mod config;
pub mod core;
pub mod specs;

pub mod browser;
pub mod data;
pub mod diff;
pub mod error;
pub mod file;
pub mod logging;
pub mod notify;
pub mod progress;
pub mod report;
pub mod runner;
pub mod session;
pub mod store;
