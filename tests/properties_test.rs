//! Property tests over randomly generated price and position series.

mod common;

use common::*;
use postester::{BacktestParams, Backtester, IndicatorRegistry};
use proptest::prelude::*;

/// Closes from bounded per-period moves, so the curve stays positive.
fn series() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (1usize..60).prop_flat_map(|n| {
        (
            prop::collection::vec(-0.2f64..0.2, n).prop_map(|moves| walk(&moves)),
            prop::collection::vec(-1.0f64..=1.0, n + 1),
        )
    })
}

proptest! {
    #[test]
    fn curve_is_running_product_of_returns((closes, positions) in series(), commission in 0.0f64..0.01) {
        let bt = Backtester::with_registry(
            isolated_registry(),
            &close_table(&closes),
            BacktestParams::default().with_commission(commission),
        ).unwrap();
        let result = bt.run(&position_table(&positions)).unwrap();
        let full = result.get_dataframe("funding_curve").unwrap();
        let curve = full.float_column("funding_curve").unwrap();
        let returns = full.float_column("returns").unwrap();

        prop_assert_eq!(returns[0], 0.0);
        prop_assert_eq!(curve[0], 1.0 + returns[0]);
        let mut equity = 1.0;
        for (c, r) in curve.iter().zip(returns) {
            equity *= 1.0 + r;
            prop_assert_eq!(*c, equity);
            prop_assert!(c.is_finite());
        }

        let total = result.get_indicator_value("total_return").unwrap();
        let expected = curve[curve.len() - 1] / curve[0] - 1.0;
        prop_assert!((total - expected).abs() <= 1e-12 * expected.abs().max(1.0));
    }

    #[test]
    fn drawdowns_are_non_negative((closes, positions) in series()) {
        let bt = Backtester::with_registry(
            isolated_registry(),
            &close_table(&closes),
            BacktestParams::default(),
        ).unwrap();
        let result = bt.run(&position_table(&positions)).unwrap();

        let max_dd = result.get_indicator_value("max_drawdown").unwrap();
        let avg_dd = result.get_indicator_value("avg_drawdown").unwrap();
        prop_assert!(max_dd >= 0.0);
        prop_assert!(avg_dd >= 0.0 && avg_dd <= max_dd + 1e-12);
        prop_assert!(result.get_indicator_value("max_drawdown_duration").unwrap() >= 0.0);
    }

    #[test]
    fn any_dip_gives_positive_max_drawdown(
        (moves, dip) in (1usize..40).prop_flat_map(|n| (prop::collection::vec(-0.2f64..0.2, n), 0..n)),
    ) {
        let mut moves = moves;
        moves[dip] = -moves[dip].abs() - 0.001;
        let closes = walk(&moves);
        let bt = Backtester::with_registry(
            isolated_registry(),
            &close_table(&closes),
            BacktestParams::default(),
        ).unwrap();
        let result = bt.run(&position_table(&vec![1.0; closes.len()])).unwrap();
        prop_assert!(result.get_indicator_value("max_drawdown").unwrap() > 0.0);
    }

    #[test]
    fn non_decreasing_curve_has_no_drawdown(moves in prop::collection::vec(0.0f64..0.2, 1..40)) {
        let closes = walk(&moves);
        let bt = Backtester::with_registry(
            isolated_registry(),
            &close_table(&closes),
            BacktestParams::default(),
        ).unwrap();
        let result = bt.run(&position_table(&vec![1.0; closes.len()])).unwrap();
        prop_assert_eq!(result.get_indicator_value("max_drawdown").unwrap(), 0.0);
    }

    #[test]
    fn zero_commission_has_no_costs((closes, positions) in series()) {
        let bt = Backtester::with_registry(
            isolated_registry(),
            &close_table(&closes),
            BacktestParams::default(),
        ).unwrap();
        let result = bt.run(&position_table(&positions)).unwrap();
        let full = result.get_dataframe("funding_curve").unwrap();
        prop_assert!(full.float_column("transaction_cost").unwrap().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn sharpe_is_annual_return_over_volatility((closes, positions) in series()) {
        let bt = Backtester::with_registry(
            isolated_registry(),
            &close_table(&closes),
            BacktestParams::default(),
        ).unwrap();
        let result = bt.run(&position_table(&positions)).unwrap();

        let annual = result.get_indicator_value("annual_return").unwrap();
        let vol = result.get_indicator_value("volatility").unwrap();
        let sharpe = result.get_indicator_value("sharpe_ratio").unwrap();
        if vol == 0.0 {
            prop_assert_eq!(sharpe, 0.0);
        } else {
            prop_assert_eq!(sharpe, annual / vol);
        }
    }

    #[test]
    fn runs_are_repeatable((closes, positions) in series()) {
        let bt = Backtester::with_registry(
            isolated_registry(),
            &close_table(&closes),
            BacktestParams::default(),
        ).unwrap();
        let position = position_table(&positions);
        let first = bt.run(&position).unwrap();
        let second = bt.run(&position).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn builtin_order_is_topological(rotation in 0usize..12) {
        let mut builtins = postester::domain::indicator::builtin_indicators();
        builtins.rotate_left(rotation);
        let registry = IndicatorRegistry::from_indicators(builtins).unwrap();
        let order = registry.sorted_indicators();
        prop_assert_eq!(order.len(), 12);

        for (i, name) in order.iter().enumerate() {
            let indicator = registry.get_indicator(name).unwrap();
            for dep in indicator.requires() {
                let pos = order.iter().position(|n| n == dep).unwrap();
                prop_assert!(pos < i, "{} must precede {}", dep, name);
            }
        }
    }
}
