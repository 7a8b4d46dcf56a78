//! Error primitives shared by the user admin crates.
//!
//! - `ErrorEnvelope`: the JSON body every failing endpoint returns
//! - `Severity`: coarse impact classification carried in the envelope
//! - `ErrDef`: a static catalog entry (status, code, default message, severity)
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod catalog;
pub mod envelope;

pub use catalog::ErrDef;
pub use envelope::{ErrorEnvelope, Severity};

/// Attach request-specific context to an envelope before it is returned.
pub fn finalize(
    mut envelope: ErrorEnvelope,
    technical_message: Option<String>,
    details: Option<serde_json::Value>,
) -> ErrorEnvelope {
    if let Some(msg) = technical_message {
        envelope = envelope.with_technical_message(msg);
    }
    if let Some(details) = details {
        envelope = envelope.with_details(details);
    }
    envelope
}
