//! Boundary to the brokerage backend.
//!
//! Each backend collaborator is an async trait so the bridge can run against
//! the REST gateway ([`RestClient`]) or the in-memory [`test_support::MockBroker`].

pub mod backend;
pub mod error;
pub mod rest;
mod wire;

pub mod test_support;

pub use backend::{
    AccountsService, Broker, InstrumentSearch, MarketDataService, OrderService, PortfolioService,
};
pub use error::{ClientError, Code, Failure};
pub use rest::RestClient;
