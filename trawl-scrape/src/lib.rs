//! Job listing acquisition over a browser session.
//!
//! - Search form submission (`search`)
//! - Listing link collection and pagination (`listings`, `paginate`)
//! - Per-listing field extraction (`detail`)
//! - Output records and JSON-lines persistence (`record`)
//! - Request spacing (`pacing`)
//! - The end-to-end run (`run`)
//!
//! Every step borrows the run's single [`BrowserSession`] mutably; nothing
//! here spawns tasks.
//!
//! [`BrowserSession`]: trawl_drivers::browser::session::BrowserSession

pub mod detail;
pub mod listings;
pub mod pacing;
pub mod paginate;
pub mod record;
pub mod run;
pub mod search;
