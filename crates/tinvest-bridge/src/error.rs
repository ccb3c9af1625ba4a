use thiserror::Error;
use tinvest_client::ClientError;
use tinvest_models::ConfigError;

/// Bad tool arguments. Per call, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required argument '{0}'")]
    Missing(&'static str),

    #[error("argument '{name}' must be {expected}")]
    WrongType {
        name: &'static str,
        expected: &'static str,
    },

    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("unknown interval {0:?}; allowed: 1m, 5m, 15m, 1h, 1d")]
    UnknownInterval(String),
}

/// Outcome of a failed tool call. Every variant is terminal for that call
/// only; the session and other calls are unaffected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("instrument {query:?} not found")]
    NotFound { query: String },

    #[error("{operation} failed: no operating account is set; configure TINKOFF_ACCOUNT_ID or open an account and restart the server")]
    AccountUnresolved { operation: &'static str },

    #[error("{operation} failed: resource not found (NotFound/50004). Check the account id, that the endpoint matches the token environment (sandbox vs prod), and the token permissions. Backend said: {message}")]
    BackendNotFound {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },

    #[error("unknown tool {0:?}")]
    UnknownTool(String),
}

#[derive(Error, Debug)]
pub enum AccountResolveError {
    #[error("failed to list accounts: {0}")]
    Listing(#[from] ClientError),

    #[error("no account with status OPEN")]
    NoOpenAccount,
}

/// Startup failures. Any of these aborts the process.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("failed to connect to the brokerage: {0}")]
    Connect(#[source] ClientError),

    #[error("could not resolve an operating account: {0}")]
    NoAccountResolved(#[from] AccountResolveError),
}
