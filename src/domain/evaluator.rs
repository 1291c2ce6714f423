//! Dependency-ordered evaluation of indicators over a seeded context.

use crate::domain::context::EvalContext;
use crate::domain::error::PostesterError;
use crate::domain::indicator::Indicator;
use crate::domain::registry::IndicatorRegistry;
use crate::domain::result::BacktestResult;
use crate::domain::validation::{IndicatorOutput, validate_output};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Indicator handles for one run, in evaluation order.
///
/// Taken from the registry up front so indicator code never runs while the
/// registry lock is held.
pub struct EvaluationPlan {
    steps: Vec<Arc<dyn Indicator>>,
    emit: HashSet<String>,
}

impl EvaluationPlan {
    /// `order` is the evaluation order, `requested` the names whose results
    /// are reported. Names no longer registered are skipped.
    pub fn snapshot(registry: &IndicatorRegistry, order: &[String], requested: &[String]) -> Self {
        Self {
            steps: order
                .iter()
                .filter_map(|name| registry.indicator(name).cloned())
                .collect(),
            emit: requested.iter().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Compute and validate every step, then add the requested outputs to `result`.
    pub fn evaluate(
        &self,
        ctx: &mut EvalContext,
        result: &mut BacktestResult,
    ) -> Result<(), PostesterError> {
        for indicator in &self.steps {
            let name = indicator.name();
            let value = indicator.compute(ctx).map_err(|err| {
                if matches!(err, PostesterError::ContextLookup { .. }) {
                    PostesterError::Indicator {
                        name: name.to_string(),
                        reason: err.to_string(),
                    }
                } else {
                    err
                }
            })?;

            let output = validate_output(name, value)
                .map_err(|e| e.into_invalid_argument("indicator output"))?;
            if !self.emit.contains(name) {
                debug!(indicator = name, "computed dependency");
                continue;
            }
            match output {
                IndicatorOutput::Scalar(v) => {
                    debug!(indicator = name, value = v, "computed indicator");
                    result.insert_scalar(name, v, indicator.format(v));
                }
                IndicatorOutput::Table(t) => {
                    debug!(indicator = name, rows = t.height(), "computed table indicator");
                    result.insert_table(name, t);
                }
            }
        }
        Ok(())
    }
}
