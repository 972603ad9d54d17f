//! Diagnostics for captured Zoho CRM responses.

pub mod config;
pub mod inspect;

pub use config::{resolve_log_level, resolve_parse_options};
pub use inspect::{inspect, read_document, render_error, render_response, InspectOutcome};
