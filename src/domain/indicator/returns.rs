//! Return-based indicators: total, annualized, monthly, win rate, profit/loss.

use super::stats::mean;
use super::{Indicator, Value, format};
use crate::domain::context::{EvalContext, keys};
use crate::domain::error::PostesterError;
use crate::domain::table::{Column, Table};
use chrono::Datelike;

pub struct TotalReturn;

impl TotalReturn {
    pub const NAME: &'static str = "total_return";

    pub fn value(ctx: &mut EvalContext) -> Result<f64, PostesterError> {
        ctx.memoize(Self::NAME, |ctx| {
            let curve = ctx.curve_values()?;
            Ok(match (curve.first(), curve.last()) {
                (Some(first), Some(last)) => last / first - 1.0,
                _ => 0.0,
            })
        })
    }
}

impl Indicator for TotalReturn {
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

/// Compounds the total return to a 365-day year. The elapsed time is
/// `total_periods / periods_per_day` days.
pub struct AnnualReturn;

impl AnnualReturn {
    pub const NAME: &'static str = "annual_return";

    pub fn value(ctx: &mut EvalContext) -> Result<f64, PostesterError> {
        let total_return = TotalReturn::value(ctx)?;
        ctx.memoize(Self::NAME, |ctx| {
            let actual_days = ctx.scalar(keys::TOTAL_PERIODS)? / ctx.scalar(keys::PERIODS_PER_DAY)?;
            if actual_days <= 0.0 {
                return Ok(0.0);
            }
            Ok((1.0 + total_return).powf(365.0 / actual_days) - 1.0)
        })
    }
}

impl Indicator for AnnualReturn {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn requires(&self) -> Vec<&str> {
        vec![TotalReturn::NAME]
    }

    fn compute(&self, ctx: &mut EvalContext) -> Result<Value, PostesterError> {
        Self::value(ctx).map(Value::Scalar)
    }

    fn format(&self, value: f64) -> String {
        format::percent(value)
    }
}

/// Share of periods with a strictly positive return.
pub struct WinRate;

impl WinRate {
    pub const NAME: &'static str = "win_rate";

    pub fn value(ctx: &mut EvalContext) -> Result<f64, PostesterError> {
        ctx.memoize(Self::NAME, |ctx| {
            let returns = ctx.series(keys::RETURNS)?;
            if returns.is_empty() {
                return Ok(0.0);
            }
            let wins = returns.iter().filter(|&&r| r > 0.0).count();
            Ok(wins as f64 / returns.len() as f64)
        })
    }
}

impl Indicator for WinRate {
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

/// Mean winning return over the absolute mean losing return.
///
/// Infinite when there are winners but no losers, 0 when there are neither.
pub struct ProfitLossRatio;

impl ProfitLossRatio {
    pub const NAME: &'static str = "profit_loss_ratio";

    pub fn value(ctx: &mut EvalContext) -> Result<f64, PostesterError> {
        ctx.memoize(Self::NAME, |ctx| {
            let returns = ctx.series(keys::RETURNS)?;
            let wins: Vec<f64> = returns.iter().copied().filter(|&r| r > 0.0).collect();
            let losses: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();

            Ok(match (mean(&wins), mean(&losses)) {
                (Some(win), Some(loss)) => win / loss.abs(),
                (None, Some(_)) => 0.0,
                (Some(_), None) => f64::INFINITY,
                (None, None) => 0.0,
            })
        })
    }
}

impl Indicator for ProfitLossRatio {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn compute(&self, ctx: &mut EvalContext) -> Result<Value, PostesterError> {
        Self::value(ctx).map(Value::Scalar)
    }

    fn format(&self, value: f64) -> String {
        format::ratio(value)
    }
}

/// Table of compounded returns per calendar month: `year`, `month`, `monthly_return`.
pub struct MonthlyReturns;

impl MonthlyReturns {
    pub const NAME: &'static str = "monthly_returns";

    pub fn value(ctx: &mut EvalContext) -> Result<Table, PostesterError> {
        ctx.memoize_table(Self::NAME, |ctx| {
            let times = ctx.curve_times()?;
            let returns = ctx.series(keys::RETURNS)?;

            let mut years: Vec<i64> = Vec::new();
            let mut months: Vec<i64> = Vec::new();
            let mut growth: Vec<f64> = Vec::new();
            for (t, r) in times.iter().zip(returns) {
                let (y, m) = (i64::from(t.year()), i64::from(t.month()));
                match (years.last(), months.last(), growth.last_mut()) {
                    (Some(&ly), Some(&lm), Some(g)) if ly == y && lm == m => *g *= 1.0 + r,
                    _ => {
                        years.push(y);
                        months.push(m);
                        growth.push(1.0 + r);
                    }
                }
            }

            let monthly: Vec<f64> = growth.into_iter().map(|g| g - 1.0).collect();
            Ok(Table::from_parts(vec![
                ("year", Column::Int(years)),
                ("month", Column::Int(months)),
                ("monthly_return", Column::Float(monthly)),
            ]))
        })
    }
}

impl Indicator for MonthlyReturns {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn compute(&self, ctx: &mut EvalContext) -> Result<Value, PostesterError> {
        Self::value(ctx).map(Value::Table)
    }
}
