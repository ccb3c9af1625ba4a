use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tinvest_models::{
    Account, BrokerConfig, Candle, CandleInterval, InstrumentRef, LastPrice, OrderBook,
    OrderIntent, OrderReceipt, Portfolio, TimeRange, TradingStatus,
};
use tracing::{debug, info, warn};

use crate::backend::{
    AccountsService, Broker, InstrumentSearch, MarketDataService, OrderService, PortfolioService,
};
use crate::error::{ClientError, Code};
use crate::wire;

const API_PREFIX: &str = "rest/tinkoff.public.invest.api.contract.v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PORTFOLIO_CURRENCY: &str = "RUB";

/// Brokerage client speaking the REST gateway of the Invest API.
///
/// One instance is shared by every tool call for the life of the process.
pub struct RestClient {
    http: Client,
    base_url: String,
    token: String,
    app_name: String,
    account_id: Option<String>,
    closed: AtomicBool,
}

impl RestClient {
    /// Build the client. Against a sandbox endpoint with no account configured,
    /// the first sandbox account is adopted as the client's own account.
    pub async fn connect(config: &BrokerConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(config.app_name.clone())
            .build()?;

        let mut client = Self {
            http,
            base_url: base_url(&config.endpoint),
            token: config.token.clone(),
            app_name: config.app_name.clone(),
            account_id: config.account_id.clone(),
            closed: AtomicBool::new(false),
        };

        if client.account_id.is_none() && config.is_sandbox() {
            let accounts = client.sandbox_accounts().await?;
            client.account_id = accounts.into_iter().next().map(|a| a.id);
            if let Some(id) = &client.account_id {
                info!(account_id = %id, "Adopted sandbox account");
            }
        }

        info!(base_url = %client.base_url, app = %client.app_name, "Gateway client ready");
        Ok(client)
    }

    async fn sandbox_accounts(&self) -> Result<Vec<Account>, ClientError> {
        let resp: wire::GetAccountsResponse = self
            .call("SandboxService", "GetSandboxAccounts", &wire::Empty {})
            .await?;
        Ok(resp.accounts.into_iter().map(Into::into).collect())
    }

    async fn call<Req, Resp>(&self, service: &str, method: &str, body: &Req) -> Result<Resp, ClientError>
    where
        Req: Serialize + ?Sized + Sync,
        Resp: DeserializeOwned,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(ClientError::Closed);
        }

        let url = format!("{}/{API_PREFIX}.{service}/{method}", self.base_url);
        debug!(%service, %method, "Calling gateway");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("x-app-name", &self.app_name)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            let payload = if text.trim().is_empty() { "{}" } else { text.as_str() };
            return Ok(serde_json::from_str(payload)?);
        }

        let err = status_error(status.as_u16(), &text);
        warn!(%service, %method, http_status = status.as_u16(), error = %err, "Gateway call failed");
        Err(err)
    }
}

/// `host:port` becomes `https://host:port`; explicit schemes are kept.
pub fn base_url(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

fn status_error(http_status: u16, body: &str) -> ClientError {
    let parsed: wire::ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed
        .code
        .map(Code::from_i32)
        .unwrap_or_else(|| Code::from_http_status(http_status));
    let message = parsed.text().unwrap_or_else(|| {
        let raw = body.trim();
        if raw.is_empty() {
            format!("HTTP {http_status}")
        } else {
            raw.to_string()
        }
    });
    ClientError::status(code, message)
}

#[async_trait]
impl InstrumentSearch for RestClient {
    async fn find_instrument(&self, query: &str) -> Result<Vec<InstrumentRef>, ClientError> {
        let resp: wire::FindInstrumentResponse = self
            .call(
                "InstrumentsService",
                "FindInstrument",
                &wire::FindInstrumentRequest { query },
            )
            .await?;
        Ok(resp.instruments.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl AccountsService for RestClient {
    async fn get_accounts(&self) -> Result<Vec<Account>, ClientError> {
        let resp: wire::GetAccountsResponse =
            self.call("UsersService", "GetAccounts", &wire::Empty {}).await?;
        Ok(resp.accounts.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl OrderService for RestClient {
    async fn post_order(&self, intent: &OrderIntent) -> Result<OrderReceipt, ClientError> {
        let resp: wire::PostOrderResponse = self
            .call("OrdersService", "PostOrder", &wire::PostOrderRequest::from(intent))
            .await?;
        Ok(resp.into())
    }
}

#[async_trait]
impl PortfolioService for RestClient {
    async fn get_portfolio(&self, account_id: &str) -> Result<Portfolio, ClientError> {
        let resp: wire::PortfolioResponse = self
            .call(
                "OperationsService",
                "GetPortfolio",
                &wire::PortfolioRequest {
                    account_id,
                    currency: PORTFOLIO_CURRENCY,
                },
            )
            .await?;
        Ok(resp.into_portfolio(account_id))
    }
}

#[async_trait]
impl MarketDataService for RestClient {
    async fn last_prices(&self, instrument_keys: &[String]) -> Result<Vec<LastPrice>, ClientError> {
        let resp: wire::LastPricesResponse = self
            .call(
                "MarketDataService",
                "GetLastPrices",
                &wire::LastPricesRequest {
                    instrument_id: instrument_keys,
                },
            )
            .await?;
        Ok(resp.last_prices.into_iter().map(Into::into).collect())
    }

    async fn order_book(&self, instrument_key: &str, depth: u32) -> Result<OrderBook, ClientError> {
        let resp: wire::OrderBookResponse = self
            .call(
                "MarketDataService",
                "GetOrderBook",
                &wire::OrderBookRequest {
                    instrument_id: instrument_key,
                    depth,
                },
            )
            .await?;
        Ok(resp.into())
    }

    async fn candles(
        &self,
        instrument_key: &str,
        range: TimeRange,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>, ClientError> {
        let resp: wire::CandlesResponse = self
            .call(
                "MarketDataService",
                "GetCandles",
                &wire::CandlesRequest {
                    instrument_id: instrument_key,
                    from: range.from(),
                    to: range.to(),
                    interval: wire::interval_name(interval),
                },
            )
            .await?;
        Ok(resp.candles.into_iter().map(Into::into).collect())
    }

    async fn trading_status(&self, instrument_key: &str) -> Result<TradingStatus, ClientError> {
        let resp: wire::TradingStatusResponse = self
            .call(
                "MarketDataService",
                "GetTradingStatus",
                &wire::InstrumentRequest {
                    instrument_id: instrument_key,
                },
            )
            .await?;
        Ok(resp.into())
    }
}

#[async_trait]
impl Broker for RestClient {
    fn configured_account_id(&self) -> Option<String> {
        self.account_id.clone()
    }

    async fn close(&self) -> Result<(), ClientError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            warn!("Gateway client closed twice");
            return Err(ClientError::Closed);
        }
        info!("Gateway client closed");
        Ok(())
    }
}
