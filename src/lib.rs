//! # Entra Radius
//!
//! `entra-radius` verifies RADIUS credential pairs (EAP-TTLS/PAP, so the password
//! arrives in clear text) against Microsoft Entra ID, and keeps authentication
//! available while Entra is unreachable by falling back to a short-lived cache of
//! previously successful logins.
//!
//! ## Decisions
//!
//! Every attempt ends in exactly one of four decisions:
//!
//! - **Success / remote:** Entra accepted the credentials; their fingerprint is cached.
//! - **Success / cache:** Entra could not be reached and the credentials match a live
//!   cache entry.
//! - **Failure / invalid credentials:** Entra answered and rejected the credentials. The
//!   cache is never consulted or modified.
//! - **Failure / provider unavailable and not cached:** Entra could not be reached and
//!   no usable cache entry exists.
//!
//! ## Cache
//!
//! The cache stores only salted SHA-256 fingerprints keyed by the lowercased username,
//! with a TTL (60 minutes by default). It lives in process memory and is not persisted.

pub mod auth;
pub mod cli;
pub mod radius;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
