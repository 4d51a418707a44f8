//! Internal IMAP session management.
//!
//! This module wraps async-imap operations with proper error handling.

use crate::connection::TlsStream;
use crate::error::{Error, Result};
use async_imap::Session;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use tracing::{debug, instrument};

/// Type alias for IMAP session over TLS.
pub(crate) type ImapSession = Session<TlsStream>;

/// Authenticates to the IMAP server and returns a session.
#[instrument(name = "session::authenticate", skip_all, fields(email = %email))]
pub(crate) async fn authenticate(
    tls_stream: TlsStream,
    email: &str,
    password: &str,
) -> Result<ImapSession> {
    let client = async_imap::Client::new(tls_stream);

    debug!("Authenticating to IMAP server");

    client
        .login(email, password)
        .await
        .map_err(|e| Error::ImapLogin {
            email: email.to_string(),
            source: e.0,
        })
}

/// Lists every mailbox name visible to the account.
#[instrument(name = "session::list", skip(session))]
pub(crate) async fn list_mailboxes(session: &mut ImapSession) -> Result<Vec<String>> {
    let names: Vec<String> = session
        .list(Some(""), Some("*"))
        .await
        .map_err(|source| Error::ListMailboxes { source })?
        .map_ok(|name| name.name().to_string())
        .try_collect()
        .await
        .map_err(|source| Error::ListMailboxes { source })?;

    debug!(count = names.len(), "Listed mailboxes");
    Ok(names)
}

/// Selects a mailbox and returns how many messages it holds.
#[instrument(name = "session::select", skip(session), fields(mailbox = %mailbox))]
pub(crate) async fn select_mailbox(session: &mut ImapSession, mailbox: &str) -> Result<u32> {
    let selected = session
        .select(mailbox)
        .await
        .map_err(|source| Error::SelectMailbox {
            mailbox: mailbox.to_string(),
            source,
        })?;

    debug!(exists = selected.exists, "Selected mailbox");
    Ok(selected.exists)
}

/// Fetches full messages by sequence range without setting `\Seen`.
pub(crate) async fn fetch_by_sequence<'a>(
    session: &'a mut ImapSession,
    seq_range: &str,
) -> Result<BoxStream<'a, std::result::Result<async_imap::types::Fetch, async_imap::error::Error>>>
{
    debug!(seq_range = %seq_range, "Fetching messages");

    let stream = session
        .fetch(seq_range, "BODY.PEEK[]")
        .await
        .map_err(|source| Error::ImapFetch {
            seq_range: seq_range.to_string(),
            source,
        })?;

    Ok(stream.boxed())
}

/// Logs out from IMAP session.
#[instrument(name = "session::logout", skip(session))]
pub(crate) async fn logout(session: &mut ImapSession) -> Result<()> {
    debug!("Logging out");

    session
        .logout()
        .await
        .map_err(|source| Error::ImapLogout { source })
}
