//! Paper trading broker.
//!
//! Serves configured prices, a synthetic strike grid and weekly expirations,
//! and simulates fills without any network connection.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use chrono_tz::US::Eastern;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use spread_bot_core::{
    BrokerAck, BrokerError, BrokerPort, OptionChainSnapshot, OrderRequest, OrderType, PaperConfig,
};

use crate::calendar::{is_session_open, weekly_expirations};

pub struct PaperBroker {
    config: PaperConfig,
    as_of: Option<NaiveDate>,
}

impl PaperBroker {
    #[must_use]
    pub fn new(config: PaperConfig) -> Self {
        Self { config, as_of: None }
    }

    /// Pins the listing date instead of following the Eastern wall clock.
    #[must_use]
    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    fn price(&self, symbol: &str) -> Option<Decimal> {
        self.config.prices.get(symbol).copied()
    }

    fn expirations_from(&self, today: NaiveDate) -> Vec<NaiveDate> {
        weekly_expirations(today, self.config.listed_weeks, &self.config.holidays)
    }

    fn today(&self) -> NaiveDate {
        self.as_of
            .unwrap_or_else(|| Utc::now().with_timezone(&Eastern).date_naive())
    }

    /// Strikes on the configured increment around `price`, lowest first.
    ///
    /// The grid is centred on the increment multiple nearest to `price` and
    /// never lists a non-positive strike.
    #[must_use]
    pub fn strike_grid(&self, price: Decimal) -> Vec<Decimal> {
        let step = self.config.strike_increment;
        if step <= Decimal::ZERO {
            return Vec::new();
        }
        let center = (price / step).round() * step;
        let side = i64::from(self.config.strikes_per_side);
        (-side..=side)
            .map(|k| center + step * Decimal::from(k))
            .filter(|strike| *strike > Decimal::ZERO)
            .collect()
    }

    fn check_listed(&self, order: &OrderRequest, price: Decimal) -> Result<(), BrokerError> {
        if !self.expirations_from(self.today()).contains(&order.expiration) {
            return Err(BrokerError::MalformedOrder(format!(
                "{} has no expiration on {}",
                order.symbol, order.expiration
            )));
        }
        let grid = self.strike_grid(price);
        for strike in [order.short_strike, order.long_strike] {
            if !grid.contains(&strike) {
                return Err(BrokerError::InvalidStrike(format!("{} {strike}P", order.symbol)));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BrokerPort for PaperBroker {
    async fn is_market_open(&self) -> Result<bool, BrokerError> {
        Ok(self.config.always_open || is_session_open(Utc::now(), &self.config.holidays))
    }

    async fn get_current_price(&self, symbol: &str) -> Result<Decimal, BrokerError> {
        self.price(symbol)
            .ok_or_else(|| BrokerError::price_unavailable(symbol, "no paper price configured"))
    }

    async fn list_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, BrokerError> {
        if self.price(symbol).is_none() {
            return Err(BrokerError::chain_unavailable(symbol, "unknown underlying"));
        }
        Ok(self.expirations_from(self.today()))
    }

    async fn get_option_chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
    ) -> Result<OptionChainSnapshot, BrokerError> {
        let price = self
            .price(symbol)
            .ok_or_else(|| BrokerError::chain_unavailable(symbol, "unknown underlying"))?;
        if !self.expirations_from(self.today()).contains(&expiration) {
            return Err(BrokerError::chain_unavailable(
                symbol,
                format!("no expiration listed on {expiration}"),
            ));
        }

        let strikes = self.strike_grid(price);
        debug!(symbol, %expiration, strikes = strikes.len(), "Paper chain generated");
        Ok(OptionChainSnapshot::new(symbol, expiration, strikes))
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<BrokerAck, BrokerError> {
        let price = self
            .price(&order.symbol)
            .ok_or_else(|| BrokerError::MalformedOrder(format!("invalid symbol {}", order.symbol)))?;
        self.check_listed(order, price)?;

        let fill_price = match order.order_type {
            OrderType::Limit { credit } => Some(credit),
            OrderType::Market => self.config.fill_credit,
        };
        let ack = BrokerAck {
            order_id: format!("PAPER-{}", Uuid::new_v4()),
            status: "filled".to_string(),
            fill_price,
        };

        info!(
            order_id = %ack.order_id,
            symbol = %order.symbol,
            short_strike = %order.short_strike,
            long_strike = %order.long_strike,
            expiration = %order.expiration,
            quantity = order.quantity,
            credit = ?fill_price,
            "Paper fill simulated"
        );

        Ok(ack)
    }

    fn name(&self) -> &str {
        "paper"
    }
}
