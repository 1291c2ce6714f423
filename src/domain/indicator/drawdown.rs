//! Drawdown indicators.
//!
//! drawdown[t] = (peak[t] - curve[t]) / peak[t], where peak is the running
//! maximum of the funding curve.

use super::{Indicator, Value, format};
use crate::domain::context::EvalContext;
use crate::domain::error::PostesterError;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Per-point drawdown and whether the point sets a new (or equal) peak.
fn drawdowns(curve: &[f64]) -> Vec<(f64, bool)> {
    let mut peak = f64::NEG_INFINITY;
    curve
        .iter()
        .map(|&value| {
            if value >= peak {
                peak = value;
                (0.0, true)
            } else if peak > 0.0 {
                ((peak - value) / peak, false)
            } else {
                (0.0, false)
            }
        })
        .collect()
}

pub struct MaxDrawdown;

impl MaxDrawdown {
    pub const NAME: &'static str = "max_drawdown";

    pub fn value(ctx: &mut EvalContext) -> Result<f64, PostesterError> {
        ctx.memoize(Self::NAME, |ctx| {
            let curve = ctx.curve_values()?;
            Ok(drawdowns(curve)
                .into_iter()
                .map(|(dd, _)| dd)
                .fold(0.0, f64::max))
        })
    }
}

impl Indicator for MaxDrawdown {
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

/// Days from the last peak at or before the deepest drawdown point to that point.
pub struct MaxDrawdownDuration;

impl MaxDrawdownDuration {
    pub const NAME: &'static str = "max_drawdown_duration";

    pub fn value(ctx: &mut EvalContext) -> Result<f64, PostesterError> {
        ctx.memoize(Self::NAME, |ctx| {
            let curve = ctx.curve_values()?;
            let times = ctx.curve_times()?;
            let points = drawdowns(curve);
            if points.is_empty() {
                return Ok(0.0);
            }

            // First index of the deepest drawdown.
            let mut trough = 0;
            for (i, &(dd, _)) in points.iter().enumerate() {
                if dd > points[trough].0 {
                    trough = i;
                }
            }
            let peak = points[..=trough]
                .iter()
                .rposition(|&(_, at_peak)| at_peak)
                .unwrap_or(0);

            match (times.get(peak), times.get(trough)) {
                (Some(&start), Some(&end)) => {
                    Ok((end - start).num_milliseconds() as f64 / MILLIS_PER_DAY)
                }
                _ => Ok(0.0),
            }
        })
    }
}

impl Indicator for MaxDrawdownDuration {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn requires(&self) -> Vec<&str> {
        vec![MaxDrawdown::NAME]
    }

    fn compute(&self, ctx: &mut EvalContext) -> Result<Value, PostesterError> {
        Self::value(ctx).map(Value::Scalar)
    }

    fn format(&self, value: f64) -> String {
        format::days(value)
    }
}

/// Mean of the strictly positive drawdowns; 0 if the curve never dips.
pub struct AvgDrawdown;

impl AvgDrawdown {
    pub const NAME: &'static str = "avg_drawdown";

    pub fn value(ctx: &mut EvalContext) -> Result<f64, PostesterError> {
        ctx.memoize(Self::NAME, |ctx| {
            let curve = ctx.curve_values()?;
            let (sum, count) = drawdowns(curve)
                .into_iter()
                .filter(|&(dd, _)| dd > 0.0)
                .fold((0.0, 0usize), |(s, c), (dd, _)| (s + dd, c + 1));
            Ok(if count > 0 { sum / count as f64 } else { 0.0 })
        })
    }
}

impl Indicator for AvgDrawdown {
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
