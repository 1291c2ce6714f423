//! Per-run evaluation context shared by all indicators.
//!
//! Holds the funding curve, elapsed-time statistics and every indicator result
//! computed so far. One context is built per run and dropped after the result
//! is assembled.

use crate::domain::error::PostesterError;
use crate::domain::funding::FundingCurve;
use crate::domain::indicator::Value;
use crate::domain::table::Table;
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Keys seeded into every context before indicators run.
pub mod keys {
    /// Funding curve table: `time`, `funding_curve`, `returns` and intermediates.
    pub const CURVE: &str = "curve";
    /// Per-period net returns series.
    pub const RETURNS: &str = "returns";
    pub const ANNUAL_TRADING_DAYS: &str = "annual_trading_days";
    /// Calendar days between first and last timestamp, at least 1.
    pub const TOTAL_DAYS: &str = "total_days";
    /// Number of rows in the funding curve.
    pub const TOTAL_PERIODS: &str = "total_periods";
    /// Samples per calendar day, from the mean sampling interval.
    pub const PERIODS_PER_DAY: &str = "periods_per_day";

    pub const SEEDED: [&str; 6] = [
        CURVE,
        RETURNS,
        ANNUAL_TRADING_DAYS,
        TOTAL_DAYS,
        TOTAL_PERIODS,
        PERIODS_PER_DAY,
    ];

    /// Seeded keys cannot be used as indicator names.
    pub fn is_reserved(name: &str) -> bool {
        SEEDED.iter().any(|&key| key == name)
    }
}

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    values: HashMap<String, Value>,
}

impl EvalContext {
    /// An empty context. Mostly useful for exercising indicators in isolation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context seeded with the curve and the statistics indicators share.
    pub fn seed(curve: &FundingCurve, annual_trading_days: u32) -> Self {
        let mut ctx = Self::new();
        let (total_days, periods_per_day) = time_statistics(&curve.time);

        ctx.set(keys::CURVE, Value::Table(curve.to_table()));
        ctx.set(keys::RETURNS, Value::Series(curve.returns.clone()));
        ctx.set(
            keys::ANNUAL_TRADING_DAYS,
            Value::Scalar(f64::from(annual_trading_days)),
        );
        ctx.set(keys::TOTAL_DAYS, Value::Scalar(total_days));
        ctx.set(keys::TOTAL_PERIODS, Value::Scalar(curve.len() as f64));
        ctx.set(keys::PERIODS_PER_DAY, Value::Scalar(periods_per_day));
        ctx
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn scalar(&self, key: &str) -> Result<f64, PostesterError> {
        self.get(key)
            .and_then(Value::as_scalar)
            .ok_or_else(|| lookup_error(key, "scalar"))
    }

    pub fn series(&self, key: &str) -> Result<&[f64], PostesterError> {
        match self.get(key) {
            Some(Value::Series(v)) => Ok(v),
            _ => Err(lookup_error(key, "series")),
        }
    }

    pub fn table(&self, key: &str) -> Result<&Table, PostesterError> {
        match self.get(key) {
            Some(Value::Table(t)) => Ok(t),
            _ => Err(lookup_error(key, "table")),
        }
    }

    /// `funding_curve` column of the seeded curve table.
    pub fn curve_values(&self) -> Result<&[f64], PostesterError> {
        self.table(keys::CURVE)?
            .float_column("funding_curve")
            .ok_or_else(|| lookup_error("curve.funding_curve", "float column"))
    }

    /// `time` column of the seeded curve table.
    pub fn curve_times(&self) -> Result<&[NaiveDateTime], PostesterError> {
        self.table(keys::CURVE)?
            .time_column("time")
            .ok_or_else(|| lookup_error("curve.time", "time column"))
    }

    /// Return the scalar cached under `key`, computing and storing it first if absent.
    pub fn memoize<F>(&mut self, key: &str, compute: F) -> Result<f64, PostesterError>
    where
        F: FnOnce(&EvalContext) -> Result<f64, PostesterError>,
    {
        if let Some(v) = self.get(key).and_then(Value::as_scalar) {
            return Ok(v);
        }
        let v = compute(&*self)?;
        self.set(key, Value::Scalar(v));
        Ok(v)
    }

    /// Table counterpart of [`EvalContext::memoize`].
    pub fn memoize_table<F>(&mut self, key: &str, compute: F) -> Result<Table, PostesterError>
    where
        F: FnOnce(&EvalContext) -> Result<Table, PostesterError>,
    {
        if let Some(Value::Table(t)) = self.get(key) {
            return Ok(t.clone());
        }
        let t = compute(&*self)?;
        self.set(key, Value::Table(t.clone()));
        Ok(t)
    }
}

fn lookup_error(key: &str, expected: &'static str) -> PostesterError {
    PostesterError::ContextLookup {
        key: key.to_string(),
        expected,
    }
}

/// (total_days, periods_per_day) for a sorted timestamp column.
fn time_statistics(times: &[NaiveDateTime]) -> (f64, f64) {
    let (Some(first), Some(last)) = (times.first(), times.last()) else {
        return (1.0, 1.0);
    };
    let span_days = (*last - *first).num_milliseconds() as f64 / MILLIS_PER_DAY;
    let total_days = span_days.max(1.0);

    let periods_per_day = if times.len() > 1 {
        let avg_interval = span_days / (times.len() - 1) as f64;
        if avg_interval > 0.0 {
            1.0 / avg_interval
        } else {
            1.0
        }
    } else {
        1.0
    };

    (total_days, periods_per_day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::funding::build_funding_curve;
    use crate::domain::validation::AlignedSeries;
    use chrono::{NaiveDate, TimeDelta};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn aligned(step: TimeDelta, closes: &[f64]) -> AlignedSeries {
        AlignedSeries {
            time: (0..closes.len()).map(|i| start() + step * i as i32).collect(),
            close: closes.to_vec(),
            position: vec![1.0; closes.len()],
        }
    }

    #[test]
    fn seed_daily_statistics() {
        let curve = build_funding_curve(&aligned(TimeDelta::days(1), &[1.0, 2.0, 3.0]), 0.0);
        let ctx = EvalContext::seed(&curve, 252);

        assert_eq!(ctx.scalar(keys::TOTAL_DAYS).unwrap(), 2.0);
        assert_eq!(ctx.scalar(keys::PERIODS_PER_DAY).unwrap(), 1.0);
        assert_eq!(ctx.scalar(keys::TOTAL_PERIODS).unwrap(), 3.0);
        assert_eq!(ctx.scalar(keys::ANNUAL_TRADING_DAYS).unwrap(), 252.0);
        assert_eq!(ctx.series(keys::RETURNS).unwrap().len(), 3);
        assert_eq!(ctx.curve_values().unwrap().len(), 3);
        assert_eq!(ctx.curve_times().unwrap()[0], start());
    }

    #[test]
    fn seed_hourly_statistics() {
        let closes = vec![100.0; 49];
        let curve = build_funding_curve(&aligned(TimeDelta::hours(1), &closes), 0.0);
        let ctx = EvalContext::seed(&curve, 365);

        assert!((ctx.scalar(keys::PERIODS_PER_DAY).unwrap() - 24.0).abs() < 1e-9);
        assert!((ctx.scalar(keys::TOTAL_DAYS).unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn total_days_floor_is_one() {
        let curve = build_funding_curve(&aligned(TimeDelta::hours(1), &[1.0, 1.0]), 0.0);
        let ctx = EvalContext::seed(&curve, 252);
        assert_eq!(ctx.scalar(keys::TOTAL_DAYS).unwrap(), 1.0);
    }

    #[test]
    fn single_row_defaults_to_one_period_per_day() {
        let curve = build_funding_curve(&aligned(TimeDelta::days(1), &[1.0]), 0.0);
        let ctx = EvalContext::seed(&curve, 252);
        assert_eq!(ctx.scalar(keys::PERIODS_PER_DAY).unwrap(), 1.0);
        assert_eq!(ctx.scalar(keys::TOTAL_DAYS).unwrap(), 1.0);
    }

    #[test]
    fn seed_sets_every_reserved_key() {
        let curve = build_funding_curve(&aligned(TimeDelta::days(1), &[1.0, 2.0]), 0.0);
        let ctx = EvalContext::seed(&curve, 252);
        for key in keys::SEEDED {
            assert!(ctx.contains(key), "{key} not seeded");
            assert!(keys::is_reserved(key));
        }
        assert_eq!(ctx.len(), keys::SEEDED.len());
        assert!(!keys::is_reserved("total_return"));
    }

    #[test]
    fn memoize_computes_once() {
        let mut ctx = EvalContext::new();
        let mut calls = 0;
        let first = ctx
            .memoize("x", |_| {
                calls += 1;
                Ok(3.0)
            })
            .unwrap();
        let second = ctx
            .memoize("x", |_| {
                calls += 1;
                Ok(99.0)
            })
            .unwrap();
        assert_eq!((first, second, calls), (3.0, 3.0, 1));
    }

    #[test]
    fn typed_lookups_report_missing_and_mistyped() {
        let mut ctx = EvalContext::new();
        ctx.set("s", Value::Series(vec![1.0]));

        let err = ctx.scalar("s").unwrap_err();
        assert!(matches!(err, PostesterError::ContextLookup { expected: "scalar", .. }));
        assert!(ctx.table("nope").is_err());
        assert_eq!(ctx.series("s").unwrap(), &[1.0]);
        assert!(ctx.contains("s"));
        assert_eq!(ctx.len(), 1);
    }
}
