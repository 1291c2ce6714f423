//! Backtest engine.
//!
//! A `Backtester` holds a validated close series and parameters. Each `run`
//! validates a position series against it, derives the funding curve, seeds a
//! fresh [`EvalContext`] and evaluates the selected indicators.

use crate::domain::context::EvalContext;
use crate::domain::error::{PostesterError, SeriesKind};
use crate::domain::evaluator::EvaluationPlan;
use crate::domain::funding::build_funding_curve;
use crate::domain::indicator::Indicator;
use crate::domain::params::{BacktestParams, IndicatorSelection};
use crate::domain::registry::{self, SharedRegistry, global_registry};
use crate::domain::result::BacktestResult;
use crate::domain::table::Table;
use crate::domain::validation::{
    TimeSeries, align, validate_and_convert_input, validate_annual_trading_days,
    validate_commission, validate_indicators,
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Backtester {
    registry: SharedRegistry,
    close: TimeSeries,
    params: BacktestParams,
    /// Selection expanded with dependencies, as of construction.
    resolved: Vec<String>,
}

impl Backtester {
    /// Engine bound to the process-wide registry.
    pub fn new(close: &Table, params: BacktestParams) -> Result<Self, PostesterError> {
        Self::with_registry(global_registry(), close, params)
    }

    pub fn with_registry(
        registry: SharedRegistry,
        close: &Table,
        params: BacktestParams,
    ) -> Result<Self, PostesterError> {
        let context = "backtester parameters";
        validate_commission(params.commission).map_err(|e| e.into_invalid_argument(context))?;
        validate_annual_trading_days(i64::from(params.annual_trading_days))
            .map_err(|e| e.into_invalid_argument(context))?;
        let resolved = validate_indicators(&params.indicators, &registry::read(&registry))
            .map_err(|e| e.into_invalid_argument(context))?;

        let close = validate_and_convert_input(close, SeriesKind::Close)
            .map_err(|e| e.into_invalid_argument("close input"))?;

        debug!(
            rows = close.len(),
            commission = params.commission,
            annual_trading_days = params.annual_trading_days,
            indicators = resolved.len(),
            "backtester created"
        );
        Ok(Self {
            registry,
            close,
            params,
            resolved,
        })
    }

    /// Parameters in effect. An explicit selection is reported with its
    /// dependencies, in evaluation order.
    pub fn params(&self) -> BacktestParams {
        let indicators = match &self.params.indicators {
            IndicatorSelection::All => IndicatorSelection::All,
            IndicatorSelection::Names(_) => IndicatorSelection::Names(self.resolved.clone()),
        };
        BacktestParams {
            indicators,
            ..self.params.clone()
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Register an indicator in this engine's registry. Subsequent runs of
    /// every engine sharing the registry see it.
    pub fn add_indicator(&self, indicator: Arc<dyn Indicator>) -> Result<(), PostesterError> {
        registry::write(&self.registry).register(indicator)
    }

    pub fn run(&self, position: &Table) -> Result<BacktestResult, PostesterError> {
        let position = validate_and_convert_input(position, SeriesKind::Position)
            .map_err(|e| e.into_invalid_argument("position input"))?;
        let aligned =
            align(&self.close, &position).map_err(|e| e.into_invalid_argument("position input"))?;

        let plan = {
            let registry = registry::read(&self.registry);
            let order = validate_indicators(&self.params.indicators, &registry)
                .map_err(|e| e.into_invalid_argument("backtester parameters"))?;
            let requested = match &self.params.indicators {
                IndicatorSelection::All => order.clone(),
                IndicatorSelection::Names(names) => names.clone(),
            };
            EvaluationPlan::snapshot(&registry, &order, &requested)
        };

        info!(rows = aligned.time.len(), indicators = plan.len(), "running backtest");

        let curve = build_funding_curve(&aligned, self.params.commission);
        let mut ctx = EvalContext::seed(&curve, self.params.annual_trading_days);
        let mut result = BacktestResult::new(curve.to_table());
        plan.evaluate(&mut ctx, &mut result)?;

        info!(
            indicators = result.indicator_values().len(),
            dataframes = result.dataframes().len(),
            "backtest finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ValidationError;
    use crate::domain::indicator::{FnIndicator, Value};
    use crate::domain::registry::{IndicatorRegistry, share};
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    fn ts(day: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + TimeDelta::days(day)
    }

    fn series(name: &str, values: &[f64]) -> Table {
        let time = (0..values.len() as i64).map(ts).collect();
        Table::time_series(name, time, values.to_vec())
    }

    fn isolated() -> SharedRegistry {
        share(IndicatorRegistry::with_builtins())
    }

    #[test]
    fn run_produces_curve_and_indicators() {
        let bt = Backtester::with_registry(
            isolated(),
            &series("close", &[100.0, 110.0, 99.0]),
            BacktestParams::default(),
        )
        .unwrap();
        let result = bt.run(&series("position", &[1.0, 1.0, 1.0])).unwrap();

        let curve = result.funding_curve();
        let values = curve.float_column("funding_curve").unwrap();
        assert_relative_eq!(values[1], 1.10, epsilon = 1e-12);
        assert_relative_eq!(values[2], 0.99, epsilon = 1e-12);
        assert_relative_eq!(result.get_indicator_value("total_return").unwrap(), -0.01, epsilon = 1e-12);
        assert_eq!(result.indicator_values().len(), 11);
        assert!(result.get_dataframe("monthly_returns").is_ok());
    }

    #[test]
    fn invalid_commission_rejected() {
        let err = Backtester::with_registry(
            isolated(),
            &series("close", &[1.0]),
            BacktestParams::default().with_commission(1.5),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PostesterError::InvalidArgument {
                source: ValidationError::CommissionOutOfRange { .. },
                ..
            }
        ));
    }

    #[test]
    fn invalid_close_rejected() {
        let err = Backtester::with_registry(
            isolated(),
            &series("close", &[1.0, 0.0]),
            BacktestParams::default(),
        )
        .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn params_report_expanded_selection() {
        let bt = Backtester::with_registry(
            isolated(),
            &series("close", &[1.0, 2.0]),
            BacktestParams::default()
                .with_indicators(IndicatorSelection::names(["calmar_ratio"])),
        )
        .unwrap();
        assert_eq!(
            bt.params().indicators,
            IndicatorSelection::names(["total_return", "annual_return", "max_drawdown", "calmar_ratio"])
        );
        assert_eq!(bt.params().annual_trading_days, 252);
    }

    #[test]
    fn misaligned_position_rejected() {
        let bt = Backtester::with_registry(
            isolated(),
            &series("close", &[1.0, 2.0, 3.0]),
            BacktestParams::default(),
        )
        .unwrap();
        let err = bt.run(&series("position", &[1.0, 1.0])).unwrap_err();
        assert!(matches!(
            err,
            PostesterError::InvalidArgument {
                source: ValidationError::Misaligned { only_close: 1, only_position: 0 },
                ..
            }
        ));
    }

    #[test]
    fn added_indicator_used_by_same_instance() {
        let bt = Backtester::with_registry(
            isolated(),
            &series("close", &[1.0, 2.0]),
            BacktestParams::default(),
        )
        .unwrap();
        bt.add_indicator(Arc::new(FnIndicator::new("rows", &[], |ctx| {
            Ok(Value::Scalar(ctx.curve_values()?.len() as f64))
        })))
        .unwrap();

        let result = bt.run(&series("position", &[0.0, 1.0])).unwrap();
        assert_eq!(result.get_indicator_value("rows").unwrap(), 2.0);
    }
}
