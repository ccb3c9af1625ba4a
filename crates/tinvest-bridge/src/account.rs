//! Operating account selection, run once while the session is built.

use std::fmt;

use tinvest_client::Broker;
use tracing::{debug, info};

use crate::error::AccountResolveError;

/// Where the operating account id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSource {
    Explicit,
    ClientConfig,
    FirstOpen,
}

impl fmt::Display for AccountSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccountSource::Explicit => "explicit",
            AccountSource::ClientConfig => "client-config",
            AccountSource::FirstOpen => "first-open",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAccount {
    pub id: String,
    pub source: AccountSource,
}

fn present(id: Option<String>, source: AccountSource) -> Option<ResolvedAccount> {
    id.map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .map(|id| ResolvedAccount { id, source })
}

/// Explicit id, then the client's own account, then the first OPEN account
/// in listing order. The first two are used as-is without asking the backend.
pub async fn resolve_account<B>(
    explicit: Option<&str>,
    broker: &B,
) -> Result<ResolvedAccount, AccountResolveError>
where
    B: Broker + ?Sized,
{
    let known = present(explicit.map(str::to_string), AccountSource::Explicit)
        .or_else(|| present(broker.configured_account_id(), AccountSource::ClientConfig));

    let resolved = match known {
        Some(resolved) => resolved,
        None => {
            let accounts = broker.get_accounts().await?;
            debug!(count = accounts.len(), "Listed accounts");
            let first_open = accounts.into_iter().find(|a| a.is_open()).map(|a| a.id);
            present(first_open, AccountSource::FirstOpen)
                .ok_or(AccountResolveError::NoOpenAccount)?
        }
    };

    info!(account_id = %resolved.id, source = %resolved.source, "Operating account resolved");
    Ok(resolved)
}
