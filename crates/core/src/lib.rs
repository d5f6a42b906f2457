pub mod config;
pub mod config_loader;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{
    is_valid_symbol, AppConfig, ExecutionConfig, ExecutionDay, LoggingConfig, PaperConfig,
    ScheduleConfig, StrategyConfig, MAX_OFFSET_MINUTES, MAX_RETRIES_LIMIT,
};
pub use config_loader::ConfigLoader;
pub use error::{BrokerError, ErrorClass};
pub use traits::{BrokerPort, CycleRunner};
pub use types::{
    BrokerAck, CycleStatus, CycleSummary, FailureClass, OptionChainSnapshot, OrderOutcome,
    OrderRequest, OrderType, OutcomeError, SpreadParameters, TimeInForce,
};
