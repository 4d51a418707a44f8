//! IMAP client that pulls basic information about a window of messages.
//!
//! # Example
//!
//! ```no_run
//! use mytools::{ImapConfig, ImapFetcher};
//!
//! # async fn example() -> mytools::Result<()> {
//! let config = ImapConfig::builder()
//!     .email("ta@qq.com")
//!     .password("authorization-code")
//!     .latest(30)
//!     .build()?;
//!
//! let mut fetcher = ImapFetcher::connect(config).await?;
//! let emails = fetcher.fetch_inbox().await?;
//! fetcher.logout().await?;
//! println!("fetched {} messages", emails.len());
//! # Ok(())
//! # }
//! ```

use crate::config::ImapConfig;
use crate::connection;
use crate::email::EmailInfo;
use crate::error::{Error, Result};
use crate::parser::{self, ParseOutcome};
use crate::session::{self, ImapSession};
use futures::StreamExt;
use tracing::{debug, info, instrument};

/// Mailbox the lab reports arrive in.
pub const INBOX: &str = "INBOX";

/// Authenticated IMAP connection.
///
/// Create using [`ImapFetcher::connect`], then call [`logout`](Self::logout)
/// when done.
pub struct ImapFetcher {
    session: Box<ImapSession>,
    config: ImapConfig,
}

impl ImapFetcher {
    /// Connects over TLS and logs in.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or authentication fails or times out.
    #[instrument(
        name = "ImapFetcher::connect",
        skip_all,
        fields(
            email = %config.email(),
            imap_host = %config.effective_imap_host(),
            proxy_enabled = config.proxy.is_some()
        )
    )]
    pub async fn connect(config: ImapConfig) -> Result<Self> {
        let imap_host = config.effective_imap_host();
        let target_addr = config.server_address();
        let timeouts = &config.timeouts;

        let tls_stream = tokio::time::timeout(
            timeouts.connect,
            connection::open_tls(&imap_host, &target_addr, config.proxy.as_ref()),
        )
        .await
        .map_err(|_| Error::ConnectTimeout {
            target: target_addr.clone(),
            timeout: timeouts.connect,
        })??;

        debug!("TLS connection established");

        let session = tokio::time::timeout(
            timeouts.auth,
            session::authenticate(tls_stream, config.email(), config.password()),
        )
        .await
        .map_err(|_| Error::AuthTimeout {
            email: config.email().to_string(),
            timeout: timeouts.auth,
        })??;

        debug!("Authenticated");

        Ok(Self {
            session: Box::new(session),
            config,
        })
    }

    /// Lists every mailbox of the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the LIST command fails or times out.
    pub async fn mailboxes(&mut self) -> Result<Vec<String>> {
        let timeout = self.config.timeouts.select;
        tokio::time::timeout(timeout, session::list_mailboxes(&mut self.session))
            .await
            .map_err(|_| Error::SelectTimeout {
                mailbox: "*".to_string(),
                timeout,
            })?
    }

    /// Lists mailboxes, selects the inbox and fetches the configured window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyMailbox`] if the inbox has no messages, or an
    /// IMAP error if any step fails.
    #[instrument(name = "ImapFetcher::fetch_inbox", skip(self))]
    pub async fn fetch_inbox(&mut self) -> Result<Vec<EmailInfo>> {
        let names = self.mailboxes().await?;
        info!("Mailboxes:");
        for name in &names {
            info!("* {name}");
        }

        let exists = self.select(INBOX).await?;
        if exists == 0 {
            return Err(Error::EmptyMailbox {
                mailbox: INBOX.to_string(),
            });
        }
        info!(messages = exists, "Selected {INBOX}");

        let Some(range) = self.config.window.resolve(exists) else {
            info!(window = ?self.config.window, "Fetch window is outside the mailbox");
            return Ok(Vec::new());
        };

        self.fetch_range(&format!("{}:{}", range.start(), range.end()))
            .await
    }

    /// Logs out from the IMAP server.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout command fails or times out.
    #[instrument(name = "ImapFetcher::logout", skip(self))]
    pub async fn logout(&mut self) -> Result<()> {
        let timeout = self.config.timeouts.logout;
        tokio::time::timeout(timeout, session::logout(&mut self.session))
            .await
            .map_err(|_| Error::LogoutTimeout { timeout })?
    }

    async fn select(&mut self, mailbox: &str) -> Result<u32> {
        let timeout = self.config.timeouts.select;
        tokio::time::timeout(timeout, session::select_mailbox(&mut self.session, mailbox))
            .await
            .map_err(|_| Error::SelectTimeout {
                mailbox: mailbox.to_string(),
                timeout,
            })?
    }

    #[instrument(name = "ImapFetcher::fetch_range", skip(self))]
    async fn fetch_range(&mut self, seq_range: &str) -> Result<Vec<EmailInfo>> {
        let timeout = self.config.timeouts.message_fetch;

        let collect = async {
            let mut stream = session::fetch_by_sequence(&mut self.session, seq_range).await?;
            let mut emails = Vec::new();
            let mut count = 0usize;

            while let Some(message) = stream.next().await {
                let message = message.map_err(|source| Error::FetchMessage { source })?;
                count += 1;
                info!(seq = message.message, "Message {count}");

                if let ParseOutcome::Parsed(email) = parser::email_from_fetch(&message) {
                    info!(date = %email.date, from = %email.from, subject = %email.subject, "Fetched");
                    emails.push(email);
                }
            }
            Ok::<_, Error>(emails)
        };

        tokio::time::timeout(timeout, collect)
            .await
            .map_err(|_| Error::FetchTimeout {
                seq_range: seq_range.to_string(),
                timeout,
            })?
    }
}

impl std::fmt::Debug for ImapFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapFetcher")
            .field("email", &self.config.email())
            .field("imap_host", &self.config.effective_imap_host())
            .field("window", &self.config.window)
            .finish_non_exhaustive()
    }
}

/// Connects, fetches the configured window of the inbox and logs out.
///
/// # Errors
///
/// Returns the first error from connecting, fetching or logging out.
pub async fn fetch_emails(config: ImapConfig) -> Result<Vec<EmailInfo>> {
    let mut fetcher = ImapFetcher::connect(config).await?;
    let emails = fetcher.fetch_inbox().await;
    let logout = fetcher.logout().await;
    let emails = emails?;
    logout?;
    Ok(emails)
}
