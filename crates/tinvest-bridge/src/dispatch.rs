use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tinvest_models::{InstrumentKind, OrderDirection, OrderIntent};
use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::error::ToolError;
use crate::instrument::{resolve, resolve_by_kind};
use crate::render;
use crate::session::Session;
use crate::tools::ToolName;
use crate::validate;

/// Routes named tool calls to the brokerage and renders their results.
///
/// Cheap to clone; every clone shares the one session.
#[derive(Clone)]
pub struct ToolBridge {
    session: Arc<Session>,
}

impl ToolBridge {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Run one tool call: validate, resolve, one domain call, render.
    ///
    /// Every failure is scoped to this call and comes back as a [`ToolError`].
    pub async fn call(&self, name: &str, args: &Value) -> Result<String, ToolError> {
        let start = Instant::now();
        let Some(tool) = ToolName::parse(name) else {
            warn!(tool = %name, "Unknown tool");
            return Err(ToolError::UnknownTool(name.to_string()));
        };

        let result = self.run(tool, args).await;
        let elapsed_ms = start.elapsed().as_millis();
        match &result {
            Ok(_) => info!(%tool, elapsed_ms, "Tool call succeeded"),
            Err(e) => warn!(%tool, elapsed_ms, error = %e, "Tool call failed"),
        }
        result
    }

    async fn run(&self, tool: ToolName, args: &Value) -> Result<String, ToolError> {
        match tool {
            ToolName::SearchStocks => self.search(tool, args, InstrumentKind::Share).await,
            ToolName::SearchBonds => self.search(tool, args, InstrumentKind::Bond).await,
            ToolName::SearchFunds => self.search(tool, args, InstrumentKind::Etf).await,
            ToolName::Buy => self.place_order(tool, args, OrderDirection::Buy).await,
            ToolName::Sell => self.place_order(tool, args, OrderDirection::Sell).await,
            ToolName::Portfolio => self.portfolio(tool).await,
            ToolName::LastPrice => self.last_price(tool, args).await,
            ToolName::OrderBook => self.order_book(tool, args).await,
            ToolName::Candles => self.candles(tool, args).await,
            ToolName::TradingStatus => self.trading_status(tool, args).await,
        }
    }

    async fn search(
        &self,
        tool: ToolName,
        args: &Value,
        kind: InstrumentKind,
    ) -> Result<String, ToolError> {
        let query = validate::required_str(args, "query")?;
        let found = resolve_by_kind(self.session.broker(), query, kind)
            .await
            .map_err(|e| classify(tool.as_str(), &e))?;
        debug!(%query, count = found.len(), "Search finished");
        Ok(render::search(kind, query, &found))
    }

    async fn place_order(
        &self,
        tool: ToolName,
        args: &Value,
        direction: OrderDirection,
    ) -> Result<String, ToolError> {
        let ticker = validate::required_str(args, "ticker")?;
        let lots = validate::lots(validate::required_number(args, "lots")?);
        let account_id = self.session.account_id(tool.as_str())?;

        let broker = self.session.broker();
        let instrument = resolve(broker, ticker).await?;
        let intent = OrderIntent::market(&instrument.key, direction, lots, account_id);
        info!(
            figi = %instrument.key,
            direction = direction.as_str(),
            lots,
            order_id = %intent.order_id,
            "Submitting market order"
        );
        let receipt = broker
            .post_order(&intent)
            .await
            .map_err(|e| classify(tool.as_str(), &e))?;
        Ok(render::order(direction, lots, &instrument, &receipt))
    }

    async fn portfolio(&self, tool: ToolName) -> Result<String, ToolError> {
        let account_id = self.session.account_id(tool.as_str())?;
        let portfolio = self
            .session
            .broker()
            .get_portfolio(account_id)
            .await
            .map_err(|e| classify(tool.as_str(), &e))?;
        Ok(render::portfolio(&portfolio))
    }

    async fn last_price(&self, tool: ToolName, args: &Value) -> Result<String, ToolError> {
        let query = validate::required_str(args, "query")?;
        let broker = self.session.broker();
        let instrument = resolve(broker, query).await?;
        let prices = broker
            .last_prices(std::slice::from_ref(&instrument.key))
            .await
            .map_err(|e| classify(tool.as_str(), &e))?;
        let price = prices
            .iter()
            .find(|p| p.instrument_key == instrument.key)
            .or_else(|| prices.first());
        Ok(render::last_price(&instrument, price))
    }

    async fn order_book(&self, tool: ToolName, args: &Value) -> Result<String, ToolError> {
        let query = validate::required_str(args, "query")?;
        let depth = validate::depth(validate::required_number(args, "depth")?);
        let broker = self.session.broker();
        let instrument = resolve(broker, query).await?;
        let book = broker
            .order_book(&instrument.key, depth)
            .await
            .map_err(|e| classify(tool.as_str(), &e))?;
        Ok(render::order_book(&instrument, depth, &book))
    }

    async fn candles(&self, tool: ToolName, args: &Value) -> Result<String, ToolError> {
        let query = validate::required_str(args, "query")?;
        let range = validate::time_range(
            validate::required_str(args, "from")?,
            validate::required_str(args, "to")?,
        )?;
        let interval_token = validate::required_str(args, "interval")?;
        let interval = validate::interval(interval_token)?;

        let broker = self.session.broker();
        let instrument = resolve(broker, query).await?;
        let candles = broker
            .candles(&instrument.key, range, interval)
            .await
            .map_err(|e| classify(tool.as_str(), &e))?;
        Ok(render::candles(&instrument, interval_token, range, &candles))
    }

    async fn trading_status(&self, tool: ToolName, args: &Value) -> Result<String, ToolError> {
        let query = validate::required_str(args, "query")?;
        let broker = self.session.broker();
        let instrument = resolve(broker, query).await?;
        let status = broker
            .trading_status(&instrument.key)
            .await
            .map_err(|e| classify(tool.as_str(), &e))?;
        Ok(render::trading_status(&instrument, &status))
    }
}
