//! Configuration for the IMAP fetcher.
//!
//! Use [`ImapConfigBuilder`] to create a configuration with sensible defaults:
//!
//! ```
//! use mytools::ImapConfig;
//!
//! let config = ImapConfig::builder()
//!     .email("ta@qq.com")
//!     .password("authorization-code")
//!     .latest(20)
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.server_address(), "imap.qq.com:993");
//! ```

use crate::error::{Error, Result};
use crate::known_servers::ServerRegistry;
use crate::proxy::Socks5Proxy;
use email_address::EmailAddress;
use secrecy::{ExposeSecret, SecretString};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Default IMAP port (IMAPS).
pub const DEFAULT_IMAP_PORT: u16 = 993;

/// Number of most recent messages fetched when no window is given.
pub const DEFAULT_LATEST: u32 = 50;

/// Configuration for connecting to an IMAP server.
///
/// The password is stored as a [`SecretString`] so it never shows up in logs.
#[derive(Clone)]
pub struct ImapConfig {
    email: EmailAddress,
    password: SecretString,
    /// IMAP server hostname (auto-discovered from email domain if not set).
    pub imap_host: Option<String>,
    /// IMAP server port.
    pub imap_port: u16,
    /// Optional SOCKS5 proxy for connection.
    pub proxy: Option<Socks5Proxy>,
    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
    /// Which messages of the mailbox to fetch.
    pub window: FetchWindow,
}

impl std::fmt::Debug for ImapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapConfig")
            .field("email", &self.email.as_str())
            .field("password", &"[REDACTED]")
            .field("imap_host", &self.imap_host)
            .field("imap_port", &self.imap_port)
            .field("proxy", &self.proxy)
            .field("timeouts", &self.timeouts)
            .field("window", &self.window)
            .finish()
    }
}

impl ImapConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ImapConfigBuilder {
        ImapConfigBuilder::default()
    }

    /// Returns the login address.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the password for authentication.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Returns the configured host or the one discovered from the email domain.
    #[must_use]
    pub fn effective_imap_host(&self) -> String {
        match &self.imap_host {
            Some(host) => host.clone(),
            None => crate::known_servers::discover_imap_host(self.email.as_str()),
        }
    }

    /// Returns the full IMAP server address as "host:port".
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.effective_imap_host(), self.imap_port)
    }
}

/// Timeout configuration for each IMAP stage.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Establishing the TCP/TLS connection.
    pub connect: Duration,
    /// Logging in.
    pub auth: Duration,
    /// Listing and selecting mailboxes.
    pub select: Duration,
    /// Fetching the whole message window.
    pub message_fetch: Duration,
    /// Logging out.
    pub logout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            auth: Duration::from_secs(30),
            select: Duration::from_secs(10),
            message_fetch: Duration::from_secs(300),
            logout: Duration::from_secs(5),
        }
    }
}

/// Sequence-number window of messages to fetch.
///
/// `0` means "unset" for every field. A non-zero `latest` takes precedence
/// over `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    /// First sequence number.
    pub start: u32,
    /// Last sequence number.
    pub end: u32,
    /// Fetch only the newest N messages.
    pub latest: u32,
}

impl Default for FetchWindow {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            latest: DEFAULT_LATEST,
        }
    }
}

impl FetchWindow {
    /// Resolves the window against the number of messages in the mailbox.
    ///
    /// Returns `None` when the mailbox is empty or the window lies entirely
    /// past the last message.
    #[must_use]
    pub fn resolve(&self, exists: u32) -> Option<RangeInclusive<u32>> {
        if exists == 0 {
            return None;
        }
        let end = if self.end == 0 {
            exists
        } else {
            self.end.min(exists)
        };
        let start = if self.latest > 0 {
            exists.saturating_sub(self.latest) + 1
        } else {
            self.start.max(1)
        };
        (start <= end).then_some(start..=end)
    }
}

/// Validates an email address format.
fn validate_email(email: &str) -> Result<EmailAddress> {
    EmailAddress::parse_with_options(email, email_address::Options::default()).map_err(|_| {
        Error::InvalidEmailFormat {
            email: email.to_string(),
        }
    })
}

/// Builder for [`ImapConfig`].
#[derive(Debug, Default)]
pub struct ImapConfigBuilder {
    email: Option<String>,
    password: Option<String>,
    imap_host: Option<String>,
    imap_port: Option<u16>,
    proxy: Option<Socks5Proxy>,
    timeouts: Option<TimeoutConfig>,
    window: Option<FetchWindow>,
    server_registry: Option<ServerRegistry>,
}

impl ImapConfigBuilder {
    /// Sets the login address (required).
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the password or provider authorization code (required).
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the IMAP server hostname explicitly.
    #[must_use]
    pub fn imap_host(mut self, host: impl Into<String>) -> Self {
        self.imap_host = Some(host.into());
        self
    }

    /// Sets the IMAP server port. Default is 993.
    #[must_use]
    pub fn imap_port(mut self, port: u16) -> Self {
        self.imap_port = Some(port);
        self
    }

    /// Sets a registry used to resolve the host when none is set explicitly.
    #[must_use]
    pub fn server_registry(mut self, registry: ServerRegistry) -> Self {
        self.server_registry = Some(registry);
        self
    }

    /// Routes the connection through a SOCKS5 proxy.
    #[must_use]
    pub fn proxy(mut self, proxy: Socks5Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Sets timeout configuration.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts
            .get_or_insert_with(TimeoutConfig::default)
            .connect = timeout;
        self
    }

    /// Sets the whole fetch window.
    #[must_use]
    pub fn window(mut self, window: FetchWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Fetches only the newest `latest` messages (0 disables).
    #[must_use]
    pub fn latest(mut self, latest: u32) -> Self {
        self.window.get_or_insert_with(FetchWindow::default).latest = latest;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the address or password is missing or invalid, or
    /// if the port is zero.
    pub fn build(self) -> Result<ImapConfig> {
        let email_raw = self
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Error::config("username or password is empty"))?;
        let password_raw = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::config("username or password is empty"))?;

        let email = validate_email(&email_raw)?;

        let imap_port = self.imap_port.unwrap_or(DEFAULT_IMAP_PORT);
        if imap_port == 0 {
            return Err(Error::config("host or port is empty"));
        }

        // Resolve IMAP host: explicit > registry > default discovery
        let imap_host = self.imap_host.filter(|h| !h.is_empty()).or_else(|| {
            self.server_registry
                .map(|registry| registry.discover(email.as_str()).into_owned())
        });

        Ok(ImapConfig {
            email,
            password: SecretString::from(password_raw),
            imap_host,
            imap_port,
            proxy: self.proxy,
            timeouts: self.timeouts.unwrap_or_default(),
            window: self.window.unwrap_or_default(),
        })
    }
}
