//! postester — position-based backtest engine.
//!
//! Given a close price series and a target position series, derives the
//! funding curve net of transaction costs and evaluates a dependency-ordered
//! catalog of performance indicators over it.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;

pub use domain::backtester::Backtester;
pub use domain::error::{PostesterError, ValidationError};
pub use domain::indicator::{FnIndicator, Indicator, Value};
pub use domain::params::{BacktestParams, IndicatorSelection};
pub use domain::registry::{IndicatorRegistry, SharedRegistry, global_registry};
pub use domain::result::BacktestResult;
pub use domain::table::{Column, Table};
