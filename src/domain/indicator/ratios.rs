//! Risk-adjusted return ratios. A zero denominator yields 0.

use super::drawdown::MaxDrawdown;
use super::returns::AnnualReturn;
use super::stats::{Volatility, sample_std};
use super::{Indicator, Value, format};
use crate::domain::context::{EvalContext, keys};
use crate::domain::error::PostesterError;

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

pub struct SharpeRatio;

impl SharpeRatio {
    pub const NAME: &'static str = "sharpe_ratio";

    pub fn value(ctx: &mut EvalContext) -> Result<f64, PostesterError> {
        let annual_return = AnnualReturn::value(ctx)?;
        let volatility = Volatility::value(ctx)?;
        ctx.memoize(Self::NAME, |_| Ok(safe_div(annual_return, volatility)))
    }
}

impl Indicator for SharpeRatio {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn requires(&self) -> Vec<&str> {
        vec![AnnualReturn::NAME, Volatility::NAME]
    }

    fn compute(&self, ctx: &mut EvalContext) -> Result<Value, PostesterError> {
        Self::value(ctx).map(Value::Scalar)
    }

    fn format(&self, value: f64) -> String {
        format::ratio(value)
    }
}

pub struct CalmarRatio;

impl CalmarRatio {
    pub const NAME: &'static str = "calmar_ratio";

    pub fn value(ctx: &mut EvalContext) -> Result<f64, PostesterError> {
        let annual_return = AnnualReturn::value(ctx)?;
        let max_drawdown = MaxDrawdown::value(ctx)?;
        ctx.memoize(Self::NAME, |_| Ok(safe_div(annual_return, max_drawdown)))
    }
}

impl Indicator for CalmarRatio {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn requires(&self) -> Vec<&str> {
        vec![AnnualReturn::NAME, MaxDrawdown::NAME]
    }

    fn compute(&self, ctx: &mut EvalContext) -> Result<Value, PostesterError> {
        Self::value(ctx).map(Value::Scalar)
    }

    fn format(&self, value: f64) -> String {
        format::ratio(value)
    }
}

/// Annual return over downside volatility, the annualized sample stdev of
/// the negative returns only.
pub struct SortinoRatio;

impl SortinoRatio {
    pub const NAME: &'static str = "sortino_ratio";

    pub fn value(ctx: &mut EvalContext) -> Result<f64, PostesterError> {
        let annual_return = AnnualReturn::value(ctx)?;
        ctx.memoize(Self::NAME, |ctx| {
            let negative: Vec<f64> = ctx
                .series(keys::RETURNS)?
                .iter()
                .copied()
                .filter(|&r| r < 0.0)
                .collect();
            if negative.is_empty() {
                return Ok(0.0);
            }
            let downside = sample_std(&negative)
                * ctx.scalar(keys::PERIODS_PER_DAY)?.sqrt()
                * ctx.scalar(keys::ANNUAL_TRADING_DAYS)?.sqrt();
            Ok(safe_div(annual_return, downside))
        })
    }
}

impl Indicator for SortinoRatio {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn requires(&self) -> Vec<&str> {
        vec![AnnualReturn::NAME]
    }

    fn compute(&self, ctx: &mut EvalContext) -> Result<Value, PostesterError> {
        Self::value(ctx).map(Value::Scalar)
    }

    fn format(&self, value: f64) -> String {
        format::ratio(value)
    }
}
