//! IMAP host discovery from the mail domain of the login address.
//!
//! Campus and domestic providers rarely follow a single naming scheme, so a
//! small table covers the common ones and everything else falls back to
//! `imap.<domain>`. The settings file may add or override entries through a
//! [`ServerRegistry`].
//!
//! ```
//! use mytools::known_servers::{discover_imap_host, ServerRegistry};
//!
//! assert_eq!(discover_imap_host("teacher@foxmail.com"), "imap.qq.com");
//!
//! let mut registry = ServerRegistry::with_defaults();
//! registry.register("whu.edu.cn", "mail.whu.edu.cn");
//! assert_eq!(registry.discover("ta@whu.edu.cn"), "mail.whu.edu.cn");
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

const BUILTIN: &[(&str, &str)] = &[
    ("qq.com", "imap.qq.com"),
    ("foxmail.com", "imap.qq.com"),
    ("vip.qq.com", "imap.qq.com"),
    ("exmail.qq.com", "imap.exmail.qq.com"),
    ("163.com", "imap.163.com"),
    ("126.com", "imap.126.com"),
    ("yeah.net", "imap.yeah.net"),
    ("sina.com", "imap.sina.com"),
    ("sohu.com", "imap.sohu.com"),
    ("aliyun.com", "imap.aliyun.com"),
    ("gmail.com", "imap.gmail.com"),
    ("outlook.com", "outlook.office365.com"),
    ("hotmail.com", "outlook.office365.com"),
    ("live.com", "outlook.office365.com"),
    ("icloud.com", "imap.mail.me.com"),
];

static KNOWN_SERVERS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| BUILTIN.iter().copied().collect());

fn domain_of(email: &str) -> String {
    email
        .rsplit_once('@')
        .map_or(email, |(_, domain)| domain)
        .to_lowercase()
}

/// Domain-to-host mappings layered over the built-in table.
#[derive(Debug, Clone, Default)]
pub struct ServerRegistry {
    custom: HashMap<String, String>,
    use_defaults: bool,
}

impl ServerRegistry {
    /// Creates an empty registry that ignores the built-in table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that consults the built-in table after custom entries.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            custom: HashMap::new(),
            use_defaults: true,
        }
    }

    /// Adds or replaces a mapping. Domains are case-insensitive.
    pub fn register(&mut self, domain: impl Into<String>, imap_host: impl Into<String>) {
        self.custom
            .insert(domain.into().to_lowercase(), imap_host.into());
    }

    /// Adds several mappings at once.
    pub fn register_many<I, D, H>(&mut self, mappings: I)
    where
        I: IntoIterator<Item = (D, H)>,
        D: Into<String>,
        H: Into<String>,
    {
        for (domain, host) in mappings {
            self.register(domain, host);
        }
    }

    /// Resolves the IMAP host for a login address.
    ///
    /// Custom entries win over the built-in table, which wins over the
    /// `imap.<domain>` fallback.
    #[must_use]
    pub fn discover(&self, email: &str) -> Cow<'_, str> {
        let domain = domain_of(email);

        if let Some(host) = self.custom.get(&domain) {
            return Cow::Borrowed(host);
        }
        if self.use_defaults {
            if let Some(&host) = KNOWN_SERVERS.get(domain.as_str()) {
                return Cow::Borrowed(host);
            }
        }
        Cow::Owned(format!("imap.{domain}"))
    }

    /// Returns `true` if the domain resolves without the fallback.
    #[must_use]
    pub fn is_known(&self, domain: &str) -> bool {
        let domain = domain.to_lowercase();
        self.custom.contains_key(&domain)
            || (self.use_defaults && KNOWN_SERVERS.contains_key(domain.as_str()))
    }
}

/// Resolves the IMAP host for a login address using only the built-in table.
#[must_use]
pub fn discover_imap_host(email: &str) -> String {
    let domain = domain_of(email);
    KNOWN_SERVERS
        .get(domain.as_str())
        .map_or_else(|| format!("imap.{domain}"), |&host| host.to_string())
}
