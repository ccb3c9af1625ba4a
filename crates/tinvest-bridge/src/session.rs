use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tinvest_client::Broker;
use tracing::{info, warn};

use crate::account::{resolve_account, AccountSource, ResolvedAccount};
use crate::error::{BootstrapError, ToolError};

/// The process-wide brokerage session: one connection plus the operating
/// account. Read-only once built, so tool calls share it without locking.
pub struct Session {
    broker: Arc<dyn Broker>,
    account: ResolvedAccount,
    released: AtomicBool,
}

impl Session {
    /// Resolve the operating account against an already connected broker.
    ///
    /// On failure the broker is closed before the error is returned.
    pub async fn bootstrap(
        broker: Arc<dyn Broker>,
        explicit_account: Option<&str>,
    ) -> Result<Self, BootstrapError> {
        match resolve_account(explicit_account, broker.as_ref()).await {
            Ok(account) => {
                info!(account_id = %account.id, source = %account.source, "Session ready");
                Ok(Self {
                    broker,
                    account,
                    released: AtomicBool::new(false),
                })
            }
            Err(e) => {
                if let Err(close_err) = broker.close().await {
                    warn!(error = %close_err, "Failed to close broker after bootstrap error");
                }
                Err(BootstrapError::NoAccountResolved(e))
            }
        }
    }

    pub fn broker(&self) -> &dyn Broker {
        self.broker.as_ref()
    }

    pub fn account_source(&self) -> AccountSource {
        self.account.source
    }

    /// The operating account id for account-scoped operations.
    pub fn account_id(&self, operation: &'static str) -> Result<&str, ToolError> {
        let id = self.account.id.as_str();
        if id.trim().is_empty() {
            return Err(ToolError::AccountUnresolved { operation });
        }
        Ok(id)
    }

    /// Release the connection. Only the first call reaches the broker.
    pub async fn shutdown(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        match self.broker.close().await {
            Ok(()) => info!("Session closed"),
            Err(e) => warn!(error = %e, "Error while closing session"),
        }
    }
}
