//! Driver layer for browser automation.
//!
//! This crate exposes the browser session abstraction used by the scrape
//! pipeline and its WebDriver-backed implementation.
//!
//! - [`browser::session::BrowserSession`]: the operations a scrape step may perform
//! - [`browser::driver::TrawlDriver`]: `fantoccini` WebDriver client wrapper
//! - [`browser::behavioral::BehavioralEngine`]: human-like timings and typing
pub mod browser;
