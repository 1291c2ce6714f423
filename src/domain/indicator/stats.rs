//! Sample statistics and annualized volatility.

use super::{Indicator, Value, format};
use crate::domain::context::{EvalContext, keys};
use crate::domain::error::PostesterError;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1 denominator); 0 for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// stdev(returns) * sqrt(periods_per_day * annual_trading_days)
pub struct Volatility;

impl Volatility {
    pub const NAME: &'static str = "volatility";

    pub fn value(ctx: &mut EvalContext) -> Result<f64, PostesterError> {
        ctx.memoize(Self::NAME, |ctx| {
            let returns = ctx.series(keys::RETURNS)?;
            let annual_periods =
                ctx.scalar(keys::PERIODS_PER_DAY)? * ctx.scalar(keys::ANNUAL_TRADING_DAYS)?;
            Ok(sample_std(returns) * annual_periods.sqrt())
        })
    }
}

impl Indicator for Volatility {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn compute(&self, ctx: &mut EvalContext) -> Result<Value, PostesterError> {
        Self::value(ctx).map(Value::Scalar)
    }

    fn format(&self, value: f64) -> String {
        format::percent(value)
    }
}
