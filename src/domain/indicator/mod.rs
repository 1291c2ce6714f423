//! Performance indicators.
//!
//! - `Indicator`: the capability every indicator provides (name, requirements,
//!   compute over the shared [`EvalContext`], display formatting)
//! - `Value`: what a compute call produces or what the context stores
//! - `FnIndicator`: closure-backed indicator for callers who do not want a type
//! - `builtin_indicators`: the explicit registration table of built-ins

pub mod drawdown;
pub mod format;
pub mod ratios;
pub mod returns;
pub mod stats;

use crate::domain::context::EvalContext;
use crate::domain::error::PostesterError;
use crate::domain::table::Table;
use std::fmt;
use std::sync::Arc;

/// A quantity held in the evaluation context or produced by an indicator.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Series(Vec<f64>),
    Table(Table),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Series(_) => "series",
            Value::Table(_) => "table",
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

/// A computable performance indicator.
///
/// Implementations are stateless. `compute` may read anything already in the
/// context, including results of the indicators named in `requires`, and must
/// store its own result under `name()` so dependents can read it. Calling
/// `compute` twice on the same context returns the same value.
pub trait Indicator: Send + Sync {
    fn name(&self) -> &str;

    fn requires(&self) -> Vec<&str> {
        Vec::new()
    }

    fn compute(&self, ctx: &mut EvalContext) -> Result<Value, PostesterError>;

    /// Display form of a scalar result.
    fn format(&self, value: f64) -> String {
        format!("{value:.4}")
    }
}

impl fmt::Debug for dyn Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Indicator")
            .field("name", &self.name())
            .field("requires", &self.requires())
            .finish()
    }
}

type ComputeFn = dyn Fn(&mut EvalContext) -> Result<Value, PostesterError> + Send + Sync;
type FormatFn = dyn Fn(f64) -> String + Send + Sync;

/// Indicator assembled from closures.
///
/// The compute closure's result is memoized in the context under the
/// indicator's name, so the closure runs at most once per context.
pub struct FnIndicator {
    name: String,
    requires: Vec<String>,
    compute: Box<ComputeFn>,
    format: Option<Box<FormatFn>>,
}

impl FnIndicator {
    pub fn new<F>(name: &str, requires: &[&str], compute: F) -> Self
    where
        F: Fn(&mut EvalContext) -> Result<Value, PostesterError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            requires: requires.iter().map(|r| r.to_string()).collect(),
            compute: Box::new(compute),
            format: None,
        }
    }

    pub fn with_format<F>(mut self, format: F) -> Self
    where
        F: Fn(f64) -> String + Send + Sync + 'static,
    {
        self.format = Some(Box::new(format));
        self
    }
}

impl Indicator for FnIndicator {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires(&self) -> Vec<&str> {
        self.requires.iter().map(String::as_str).collect()
    }

    fn compute(&self, ctx: &mut EvalContext) -> Result<Value, PostesterError> {
        if let Some(cached) = ctx.get(&self.name) {
            return Ok(cached.clone());
        }
        let value = (self.compute)(ctx)?;
        ctx.set(&self.name, value.clone());
        Ok(value)
    }

    fn format(&self, value: f64) -> String {
        match &self.format {
            Some(f) => f(value),
            None => format!("{value:.4}"),
        }
    }
}

/// Built-in indicators in registration order.
pub fn builtin_indicators() -> Vec<Arc<dyn Indicator>> {
    vec![
        Arc::new(returns::TotalReturn),
        Arc::new(returns::AnnualReturn),
        Arc::new(stats::Volatility),
        Arc::new(ratios::SharpeRatio),
        Arc::new(drawdown::MaxDrawdown),
        Arc::new(drawdown::MaxDrawdownDuration),
        Arc::new(ratios::CalmarRatio),
        Arc::new(ratios::SortinoRatio),
        Arc::new(returns::WinRate),
        Arc::new(drawdown::AvgDrawdown),
        Arc::new(returns::ProfitLossRatio),
        Arc::new(returns::MonthlyReturns),
    ]
}
