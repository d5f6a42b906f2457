use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use spread_bot_core::{
    AppConfig, BrokerAck, BrokerError, BrokerPort, CycleRunner, CycleStatus, FailureClass,
    OptionChainSnapshot, OrderRequest,
};
use spread_bot_orchestrator::CycleOrchestrator;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Tuesday; with the default one-week offset the target is 2026-10-30.
fn execution_date() -> NaiveDate {
    date(2026, 10, 20)
}

struct MockBroker {
    market: Result<bool, BrokerError>,
    prices: HashMap<String, Decimal>,
    expirations: Vec<NaiveDate>,
    empty_chains: Vec<String>,
    panic_on: Option<String>,
    submit_error: Option<BrokerError>,
    submitted: Mutex<Vec<OrderRequest>>,
    price_requests: Mutex<Vec<String>>,
}

impl MockBroker {
    fn new() -> Self {
        let prices = [("SPY", dec!(450)), ("QQQ", dec!(380)), ("IWM", dec!(200)), ("DIA", dec!(420))]
            .into_iter()
            .map(|(s, p)| (s.to_string(), p))
            .collect();
        Self {
            market: Ok(true),
            prices,
            expirations: vec![date(2026, 10, 23), date(2026, 10, 30), date(2026, 11, 6)],
            empty_chains: Vec::new(),
            panic_on: None,
            submit_error: None,
            submitted: Mutex::new(Vec::new()),
            price_requests: Mutex::new(Vec::new()),
        }
    }

    fn submitted(&self) -> Vec<OrderRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrokerPort for MockBroker {
    async fn is_market_open(&self) -> Result<bool, BrokerError> {
        self.market.clone()
    }

    async fn get_current_price(&self, symbol: &str) -> Result<Decimal, BrokerError> {
        self.price_requests.lock().unwrap().push(symbol.to_string());
        if self.panic_on.as_deref() == Some(symbol) {
            panic!("quote feed exploded for {symbol}");
        }
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| BrokerError::price_unavailable(symbol, "no quote"))
    }

    async fn list_expirations(&self, _symbol: &str) -> Result<Vec<NaiveDate>, BrokerError> {
        Ok(self.expirations.clone())
    }

    async fn get_option_chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
    ) -> Result<OptionChainSnapshot, BrokerError> {
        if self.empty_chains.iter().any(|s| s == symbol) {
            return Ok(OptionChainSnapshot::new(symbol, expiration, Vec::new()));
        }
        let strikes = (100..=500).map(Decimal::from);
        Ok(OptionChainSnapshot::new(symbol, expiration, strikes))
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<BrokerAck, BrokerError> {
        self.submitted.lock().unwrap().push(order.clone());
        if let Some(e) = &self.submit_error {
            return Err(e.clone());
        }
        Ok(BrokerAck {
            order_id: format!("ORD-{}", order.symbol),
            status: "filled".to_string(),
            fill_price: Some(dec!(0.95)),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn config(symbols: &[&str]) -> AppConfig {
    let mut config = AppConfig::default();
    config.strategy.symbols = symbols.iter().map(|s| (*s).to_string()).collect();
    config
}

fn orchestrator(broker: Arc<MockBroker>, config: &AppConfig) -> CycleOrchestrator {
    CycleOrchestrator::new(broker, config).unwrap()
}

#[tokio::test]
async fn one_failing_symbol_does_not_stop_the_rest() {
    let mut broker = MockBroker::new();
    broker.prices.remove("QQQ");
    let broker = Arc::new(broker);
    let config = config(&["SPY", "QQQ", "IWM", "DIA"]);
    let orchestrator = orchestrator(broker.clone(), &config);

    let summary = orchestrator
        .run_cycle_on(&config.strategy.symbols, execution_date())
        .await;

    assert_eq!(summary.status, CycleStatus::Completed);
    assert_eq!(summary.total_symbols, 4);
    assert_eq!(summary.success_count, 3);
    assert_eq!(summary.failure_count, 1);
    let symbols: Vec<_> = summary.outcomes.iter().map(|o| o.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["SPY", "QQQ", "IWM", "DIA"]);

    let failed = &summary.outcomes[1];
    assert!(!failed.success);
    assert_eq!(failed.failure_class(), Some(FailureClass::PriceUnavailable));
    assert_eq!(failed.attempt_count, 0);
    assert_eq!(summary.failed_symbols(), vec!["QQQ"]);

    let submitted: Vec<_> = broker.submitted().into_iter().map(|o| o.symbol).collect();
    assert_eq!(submitted, vec!["SPY", "IWM", "DIA"]);
}

#[tokio::test]
async fn builds_spread_from_price_and_chain() {
    let broker = Arc::new(MockBroker::new());
    let config = config(&["SPY"]);
    let summary = orchestrator(broker.clone(), &config)
        .run_cycle_on(&config.strategy.symbols, execution_date())
        .await;

    let outcome = &summary.outcomes[0];
    assert!(outcome.success);
    assert_eq!(outcome.order_id.as_deref(), Some("ORD-SPY"));
    assert_eq!(outcome.attempt_count, 1);

    // 450 * 0.95 = 427.5 ties between 427 and 428 and resolves down
    let spread = outcome.spread.as_ref().unwrap();
    assert_eq!(spread.short_strike, dec!(427));
    assert_eq!(spread.long_strike, dec!(422));
    assert_eq!(spread.expiration, date(2026, 10, 30));

    let order = &broker.submitted()[0];
    assert_eq!(order.short_strike, dec!(427));
    assert_eq!(order.expiration, date(2026, 10, 30));
    assert!(!order.dry_run);
}

#[tokio::test]
async fn market_closed_short_circuits() {
    let mut broker = MockBroker::new();
    broker.market = Ok(false);
    let broker = Arc::new(broker);
    let config = config(&["SPY", "QQQ"]);

    let summary = orchestrator(broker.clone(), &config)
        .run_cycle_on(&config.strategy.symbols, execution_date())
        .await;

    assert_eq!(summary.status, CycleStatus::MarketClosed);
    assert_eq!(summary.total_symbols, 2);
    assert!(summary.outcomes.is_empty());
    assert!(broker.price_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn market_status_error_counts_as_closed() {
    let mut broker = MockBroker::new();
    broker.market = Err(BrokerError::Network("gateway down".to_string()));
    let config = config(&["SPY"]);

    let summary = orchestrator(Arc::new(broker), &config)
        .run_cycle_on(&config.strategy.symbols, execution_date())
        .await;

    assert_eq!(summary.status, CycleStatus::MarketClosed);
}

#[tokio::test]
async fn failure_classes_per_symbol() {
    let mut broker = MockBroker::new();
    broker.empty_chains.push("IWM".to_string());
    let broker = Arc::new(broker);
    let config = config(&["SPY", "IWM"]);
    let symbols = vec!["spy".to_string(), "IWM".to_string(), "SPY".to_string()];

    let summary = orchestrator(broker, &config)
        .run_cycle_on(&symbols, execution_date())
        .await;

    let classes: Vec<_> = summary.outcomes.iter().map(|o| o.failure_class()).collect();
    assert_eq!(
        classes,
        vec![Some(FailureClass::InvalidInput), Some(FailureClass::EmptyChain), None]
    );
}

#[tokio::test]
async fn missing_expiration_week_skips_symbol() {
    let mut broker = MockBroker::new();
    broker.expirations = vec![date(2026, 10, 23), date(2026, 11, 6)];
    let config = config(&["SPY"]);

    let summary = orchestrator(Arc::new(broker), &config)
        .run_cycle_on(&config.strategy.symbols, execution_date())
        .await;

    assert_eq!(summary.outcomes[0].failure_class(), Some(FailureClass::NoValidExpiration));
}

#[tokio::test]
async fn holiday_friday_uses_thursday_listing() {
    let mut broker = MockBroker::new();
    broker.expirations = vec![date(2026, 10, 23), date(2026, 10, 29), date(2026, 11, 6)];
    let broker = Arc::new(broker);
    let config = config(&["SPY"]);

    let summary = orchestrator(broker.clone(), &config)
        .run_cycle_on(&config.strategy.symbols, execution_date())
        .await;

    assert!(summary.outcomes[0].success);
    assert_eq!(broker.submitted()[0].expiration, date(2026, 10, 29));
}

#[tokio::test]
async fn width_outside_bounds_fails_validation() {
    let broker = Arc::new(MockBroker::new());
    let mut config = config(&["SPY"]);
    config.strategy.max_spread_width = Some(dec!(2));

    let summary = orchestrator(broker.clone(), &config)
        .run_cycle_on(&config.strategy.symbols, execution_date())
        .await;

    let outcome = &summary.outcomes[0];
    assert_eq!(outcome.failure_class(), Some(FailureClass::ValidationFailed));
    assert!(outcome.spread.is_some());
    assert!(broker.submitted().is_empty());
}

#[tokio::test]
async fn panicking_symbol_is_isolated() {
    let mut broker = MockBroker::new();
    broker.panic_on = Some("QQQ".to_string());
    let config = config(&["QQQ", "SPY"]);

    let summary = orchestrator(Arc::new(broker), &config)
        .run_cycle_on(&config.strategy.symbols, execution_date())
        .await;

    assert_eq!(summary.outcomes[0].failure_class(), Some(FailureClass::Unexpected));
    assert!(summary.outcomes[0].error.as_ref().unwrap().message.contains("exploded"));
    assert!(summary.outcomes[1].success);
}

#[tokio::test]
async fn terminal_submit_error_is_recorded() {
    let mut broker = MockBroker::new();
    broker.submit_error = Some(BrokerError::from_rejection_message("Insufficient buying power"));
    let config = config(&["SPY"]);

    let summary = orchestrator(Arc::new(broker), &config)
        .run_cycle_on(&config.strategy.symbols, execution_date())
        .await;

    let outcome = &summary.outcomes[0];
    assert_eq!(outcome.failure_class(), Some(FailureClass::Terminal));
    assert_eq!(outcome.attempt_count, 1);
    assert!(outcome.spread.is_some());
}

#[tokio::test]
async fn dry_run_never_submits() {
    // execute_cycle dates the cycle today, so list every day around it
    let today = chrono::Utc::now().date_naive();
    let mut broker = MockBroker::new();
    broker.expirations = (0..70u64).map(|d| today - Days::new(7) + Days::new(d)).collect();
    let broker = Arc::new(broker);
    let config = config(&["SPY", "QQQ"]);
    let orchestrator = orchestrator(broker.clone(), &config).with_dry_run(true);

    let summary = orchestrator.execute_cycle().await.unwrap();

    assert_eq!(summary.success_count, 2);
    assert!(summary.outcomes.iter().all(|o| o.simulated));
    assert!(summary.outcomes[0].order_id.as_deref().unwrap().starts_with("DRY-RUN-SPY-"));
    assert!(broker.submitted().is_empty());
}
