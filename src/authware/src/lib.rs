//! # authware
//!
//! Client SDK for Authware: initialize an application, authenticate and
//! register users, and read application metadata.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 Application                   │
//! │   (id, version, token, hardware ID provider)  │
//! └──────────────────────┬───────────────────────┘
//!                        │ HeaderContext + JSON body
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │            Transport (HttpsTransport)         │
//! │      ureq agent, 10s timeouts, no proxy       │
//! │  ┌────────────────────────────────────────┐  │
//! │  │        IssuerPinningVerifier            │  │
//! │  │  (issuer allow-list + webpki roots)    │  │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────┬───────────────────────┘
//!                        │ status + body
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │                  decoder                      │
//! │  200/201/204 → payload, else → DefaultResponse│
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//!
//! - **Issuer pinning**: the leaf certificate must be issued by Cloudflare
//!   or Let's Encrypt, on top of standard chain validation
//! - **No proxy**: system and environment proxies are never used
//! - **HTTPS only**: plain HTTP base URLs are rejected

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod application;
pub mod config;
pub mod decoder;
pub mod error;
pub mod transport;
pub mod trust;
pub mod types;

pub use application::{AppMetadata, Application, ApplicationBuilder, HardwareIdProvider};
pub use config::ClientConfig;
pub use error::AuthwareError;
pub use transport::{HttpsTransport, OutboundRequest, RawResponse, Transport};
pub use trust::{IssuerAllowList, IssuerPinningVerifier, TamperedCertificate};
pub use types::{Api, DefaultResponse};
