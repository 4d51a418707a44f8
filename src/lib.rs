//! # mytools
//!
//! Toolkit for a teaching assistant who collects lab reports by email.
//!
//! The core workflow has three steps:
//! - fetch a window of the inbox over IMAP (optionally through a SOCKS5 proxy)
//!   into a CSV listing ([`client`], [`table`]);
//! - attribute each email to a student, course and lab from its subject and
//!   attachment names ([`identify`], [`course`]);
//! - check submissions against class rosters ([`roster`], [`lab`]).
//!
//! A few unrelated utilities live in [`tools`].
//!
//! ## Fetching
//!
//! ```no_run
//! use mytools::{fetch_emails, table, ImapConfig};
//! use std::path::Path;
//!
//! # async fn example() -> mytools::Result<()> {
//! let config = ImapConfig::builder()
//!     .email("ta@qq.com")
//!     .password("authorization-code")
//!     .latest(50)
//!     .build()?;
//!
//! let emails = fetch_emails(config).await?;
//! table::write_listing(Path::new("email.csv"), &emails, false)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Identifying submissions
//!
//! ```
//! use mytools::identify::{identify, LabCatalog};
//!
//! let mut catalog = LabCatalog::new();
//! catalog.insert("实验一", "Java程序设计");
//!
//! let found = identify(
//!     "张三_2021001 实验一",
//!     &["张三-2021001-实验一.docx".to_string()],
//!     &catalog,
//! )
//! .unwrap();
//! assert_eq!(found.student_id, "2021001");
//! assert_eq!(found.labs, vec!["实验一"]);
//! ```
//!
//! ## Error Handling
//!
//! All errors implement `std::error::Error` and provide context. Use [`Error::is_retryable`]
//! to decide whether a network operation is worth repeating:
//!
//! ```
//! use mytools::Error;
//!
//! fn handle_error(error: &Error) {
//!     if error.is_retryable() {
//!         println!("Transient error, can retry: {}", error);
//!     } else {
//!         println!("Permanent error ({}): {}", error.category(), error);
//!     }
//! }
//! ```
//!
//! ## Observability
//!
//! Operations emit `tracing` spans with structured fields:
//!
//! - `ImapFetcher::connect` - connection and login
//! - `ImapFetcher::fetch_inbox` - listing, selecting and fetching
//! - `ImapFetcher::logout` - logout
//! - `session::authenticate` - IMAP authentication
//! - `connection::open` - TCP/SOCKS5 and TLS
//!
//! [`logging::init`] installs a subscriber that writes to stderr and can tee
//! into a log file.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod client;
pub mod config;
pub mod course;
pub mod email;
pub mod error;
pub mod identify;
pub mod known_servers;
pub mod lab;
pub mod logging;
pub mod parser;
pub mod proxy;
pub mod roster;
pub mod settings;
pub mod table;
pub mod tools;

// Internal modules
mod connection;
mod session;

// Re-exports for ergonomic API
pub use client::{fetch_emails, ImapFetcher};
pub use config::{FetchWindow, ImapConfig, ImapConfigBuilder, TimeoutConfig};
pub use email::EmailInfo;
pub use email_address::EmailAddress;
pub use error::{Error, ErrorCategory, Result};
pub use known_servers::ServerRegistry;
pub use proxy::{ProxyAuth, Socks5Proxy};
pub use settings::Settings;
