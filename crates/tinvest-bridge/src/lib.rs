//! Session bootstrap and tool dispatch for the brokerage bridge.
//!
//! A [`Session`] is built once at startup (connection + operating account);
//! [`ToolBridge`] then turns named tool calls with loosely-typed JSON
//! arguments into validated backend requests and renders a single text
//! result or a classified [`ToolError`].

pub mod account;
pub mod classify;
pub mod dispatch;
pub mod error;
pub mod instrument;
pub mod render;
pub mod session;
pub mod tools;
pub mod validate;

pub use account::{resolve_account, AccountSource, ResolvedAccount};
pub use dispatch::ToolBridge;
pub use error::{AccountResolveError, BootstrapError, ToolError, ValidationError};
pub use session::Session;
pub use tools::{tool_definitions, ToolDefinition, ToolName};
