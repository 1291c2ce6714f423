//! Input validation and alignment.
//!
//! Every check here fails with a [`ValidationError`]; the engine wraps those
//! into [`crate::domain::error::PostesterError::InvalidArgument`] at its
//! public entry points. The only silent correction is re-sorting unsorted
//! input by time.

use crate::domain::error::{SeriesKind, ValidationError};
use crate::domain::indicator::Value;
use crate::domain::params::IndicatorSelection;
use crate::domain::registry::IndicatorRegistry;
use crate::domain::table::{Column, Table};
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashSet};

/// A validated input: unique timestamps in ascending order, one value each.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub kind: SeriesKind,
    pub time: Vec<NaiveDateTime>,
    pub values: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Close and position joined on identical timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    pub time: Vec<NaiveDateTime>,
    pub close: Vec<f64>,
    pub position: Vec<f64>,
}

/// Scalar or table output of an indicator, after validation.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorOutput {
    Scalar(f64),
    Table(Table),
}

pub fn validate_commission(commission: f64) -> Result<f64, ValidationError> {
    if commission.is_finite() && (0.0..=1.0).contains(&commission) {
        Ok(commission)
    } else {
        Err(ValidationError::CommissionOutOfRange { value: commission })
    }
}

pub fn validate_annual_trading_days(days: i64) -> Result<u32, ValidationError> {
    match u32::try_from(days) {
        Ok(d) if (1..=365).contains(&d) => Ok(d),
        _ => Err(ValidationError::AnnualTradingDaysOutOfRange { value: days }),
    }
}

/// Resolve a selection to the indicators that must run, in evaluation order.
///
/// For explicit names the result also contains every transitive dependency
/// present in the registry, ordered as in the registry's full topological
/// order.
pub fn validate_indicators(
    selection: &IndicatorSelection,
    registry: &IndicatorRegistry,
) -> Result<Vec<String>, ValidationError> {
    let names = match selection {
        IndicatorSelection::All => return Ok(registry.sorted_indicators().to_vec()),
        IndicatorSelection::Names(names) => names,
    };

    let unknown: Vec<String> = names
        .iter()
        .filter(|n| !registry.contains(n))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(ValidationError::UnknownIndicators { names: unknown });
    }

    let mut needed: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = names.iter().map(String::as_str).collect();
    while let Some(name) = stack.pop() {
        if !needed.insert(name) {
            continue;
        }
        if let Some(indicator) = registry.indicator(name) {
            stack.extend(
                indicator
                    .requires()
                    .into_iter()
                    .filter(|dep| registry.contains(dep)),
            );
        }
    }

    Ok(registry
        .sorted_indicators()
        .iter()
        .filter(|n| needed.contains(n.as_str()))
        .cloned()
        .collect())
}

/// Check schema, types and ranges of an input table and convert it to a
/// sorted [`TimeSeries`].
pub fn validate_and_convert_input(
    table: &Table,
    kind: SeriesKind,
) -> Result<TimeSeries, ValidationError> {
    let value_name = kind.column();
    let (Some(time_col), Some(value_col)) = (table.column("time"), table.column(value_name))
    else {
        let columns = ["time", value_name]
            .into_iter()
            .filter(|c| !table.has_column(c))
            .map(str::to_string)
            .collect();
        return Err(ValidationError::MissingColumns { columns });
    };

    let time = match time_col {
        Column::Time(t) => t.clone(),
        other => {
            return Err(ValidationError::NotTemporal {
                column: "time".to_string(),
                found: other.type_name(),
            });
        }
    };
    let values = value_col.to_f64().ok_or_else(|| ValidationError::NotNumeric {
        column: value_name.to_string(),
        found: value_col.type_name(),
    })?;

    if time.is_empty() {
        return Err(ValidationError::EmptyInput { kind });
    }

    let (time, values) = if time.is_sorted() {
        (time, values)
    } else {
        sort_by_time(time, values)
    };

    if let Some(w) = time.windows(2).find(|w| w[0] == w[1]) {
        return Err(ValidationError::DuplicateTimestamp { kind, time: w[0] });
    }

    match kind {
        SeriesKind::Close => {
            if let Some((row, &value)) = values
                .iter()
                .enumerate()
                .find(|&(_, v)| !(v.is_finite() && *v > 0.0))
            {
                return Err(ValidationError::NonPositivePrice { row, value });
            }
        }
        SeriesKind::Position => {
            if let Some((row, &value)) = values
                .iter()
                .enumerate()
                .find(|&(_, v)| !(-1.0..=1.0).contains(v))
            {
                return Err(ValidationError::PositionOutOfRange { row, value });
            }
        }
    }

    Ok(TimeSeries { kind, time, values })
}

fn sort_by_time(time: Vec<NaiveDateTime>, values: Vec<f64>) -> (Vec<NaiveDateTime>, Vec<f64>) {
    let mut order: Vec<usize> = (0..time.len()).collect();
    order.sort_by_key(|&i| time[i]);
    let sorted_time = order.iter().map(|&i| time[i]).collect();
    let sorted_values = order.iter().map(|&i| values[i]).collect();
    (sorted_time, sorted_values)
}

/// Fails unless both series cover exactly the same timestamps.
pub fn validate_time_alignment(
    close: &TimeSeries,
    position: &TimeSeries,
) -> Result<(), ValidationError> {
    let close_times: BTreeSet<&NaiveDateTime> = close.time.iter().collect();
    let position_times: BTreeSet<&NaiveDateTime> = position.time.iter().collect();
    if close_times == position_times {
        return Ok(());
    }
    Err(ValidationError::Misaligned {
        only_close: close_times.difference(&position_times).count(),
        only_position: position_times.difference(&close_times).count(),
    })
}

/// Join validated close and position series into one table.
pub fn align(close: &TimeSeries, position: &TimeSeries) -> Result<AlignedSeries, ValidationError> {
    validate_time_alignment(close, position)?;
    // Both sides are sorted and unique with equal timestamp sets, so rows pair up by index.
    Ok(AlignedSeries {
        time: close.time.clone(),
        close: close.values.clone(),
        position: position.values.clone(),
    })
}

/// Indicators must produce a scalar or a table.
pub fn validate_output(indicator: &str, value: Value) -> Result<IndicatorOutput, ValidationError> {
    match value {
        Value::Scalar(v) => Ok(IndicatorOutput::Scalar(v)),
        Value::Table(t) => Ok(IndicatorOutput::Table(t)),
        other => Err(ValidationError::UnsupportedValue {
            indicator: indicator.to_string(),
            found: other.kind(),
        }),
    }
}
