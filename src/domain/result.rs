//! Immutable backtest result.

use crate::domain::error::{LookupKind, PostesterError};
use crate::domain::table::Table;
use std::collections::HashMap;
use std::fmt;

/// Name of the dataframe holding the full funding curve table.
pub const FUNDING_CURVE: &str = "funding_curve";

/// Output of one backtest run.
///
/// `dataframes` always holds the full funding curve table under
/// [`FUNDING_CURVE`], plus every requested table-valued indicator.
/// Scalar indicators appear in both `indicator_values` and
/// `formatted_indicator_values`; `order` lists them in evaluation order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BacktestResult {
    dataframes: HashMap<String, Table>,
    indicator_values: HashMap<String, f64>,
    formatted_indicator_values: HashMap<String, String>,
    order: Vec<String>,
}

impl BacktestResult {
    pub(crate) fn new(curve: Table) -> Self {
        let mut dataframes = HashMap::new();
        dataframes.insert(FUNDING_CURVE.to_string(), curve);
        Self {
            dataframes,
            indicator_values: HashMap::new(),
            formatted_indicator_values: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub(crate) fn insert_scalar(&mut self, name: &str, value: f64, formatted: String) {
        self.indicator_values.insert(name.to_string(), value);
        self.formatted_indicator_values
            .insert(name.to_string(), formatted);
        self.order.push(name.to_string());
    }

    pub(crate) fn insert_table(&mut self, name: &str, table: Table) {
        self.dataframes.insert(name.to_string(), table);
    }

    /// `time` and `funding_curve` columns of the curve table.
    pub fn funding_curve(&self) -> Table {
        self.dataframes
            .get(FUNDING_CURVE)
            .and_then(|t| t.select(&["time", "funding_curve"]))
            .unwrap_or_default()
    }

    pub fn dataframes(&self) -> &HashMap<String, Table> {
        &self.dataframes
    }

    pub fn indicator_values(&self) -> &HashMap<String, f64> {
        &self.indicator_values
    }

    pub fn formatted_indicator_values(&self) -> &HashMap<String, String> {
        &self.formatted_indicator_values
    }

    /// Scalar indicator names in evaluation order.
    pub fn indicator_names(&self) -> &[String] {
        &self.order
    }

    pub fn get_dataframe(&self, name: &str) -> Result<&Table, PostesterError> {
        self.dataframes
            .get(name)
            .ok_or_else(|| PostesterError::not_found(LookupKind::Dataframe, name))
    }

    pub fn get_indicator_value(&self, name: &str) -> Result<f64, PostesterError> {
        self.indicator_values
            .get(name)
            .copied()
            .ok_or_else(|| PostesterError::not_found(LookupKind::IndicatorValue, name))
    }

    pub fn get_formatted_indicator_value(&self, name: &str) -> Result<&str, PostesterError> {
        self.formatted_indicator_values
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| PostesterError::not_found(LookupKind::FormattedValue, name))
    }
}

impl fmt::Display for BacktestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .order
            .iter()
            .map(String::len)
            .chain(std::iter::once("indicator".len()))
            .max()
            .unwrap_or(0);

        writeln!(f, "{:<width$}  value", "indicator")?;
        for name in &self.order {
            let value = self
                .formatted_indicator_values
                .get(name)
                .map(String::as_str)
                .unwrap_or("");
            writeln!(f, "{name:<width$}  {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::Column;
    use chrono::NaiveDate;

    fn sample() -> BacktestResult {
        let t = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let curve = Table::time_series("funding_curve", vec![t], vec![1.0])
            .with_column("returns", Column::Float(vec![0.0]))
            .unwrap();
        let mut result = BacktestResult::new(curve);
        result.insert_scalar("total_return", 0.05, "5.00%".into());
        result.insert_scalar("sharpe_ratio", 1.2, "1.20".into());
        result
    }

    #[test]
    fn lookups_succeed_for_present_names() {
        let r = sample();
        assert_eq!(r.get_indicator_value("total_return").unwrap(), 0.05);
        assert_eq!(r.get_formatted_indicator_value("sharpe_ratio").unwrap(), "1.20");
        assert_eq!(r.get_dataframe(FUNDING_CURVE).unwrap().width(), 3);
        assert_eq!(r.indicator_names(), &["total_return", "sharpe_ratio"]);
    }

    #[test]
    fn lookups_fail_with_not_found() {
        let r = sample();
        assert!(matches!(
            r.get_indicator_value("alpha"),
            Err(PostesterError::NotFound { kind: LookupKind::IndicatorValue, .. })
        ));
        assert!(matches!(
            r.get_formatted_indicator_value("alpha"),
            Err(PostesterError::NotFound { kind: LookupKind::FormattedValue, .. })
        ));
        assert!(matches!(
            r.get_dataframe("monthly_returns"),
            Err(PostesterError::NotFound { kind: LookupKind::Dataframe, .. })
        ));
    }

    #[test]
    fn funding_curve_projects_two_columns() {
        let curve = sample().funding_curve();
        assert_eq!(curve.column_names(), &["time", "funding_curve"]);
        assert_eq!(curve.height(), 1);
    }

    #[test]
    fn display_lists_indicators_in_order() {
        let text = sample().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("indicator"));
        assert!(lines[1].starts_with("total_return") && lines[1].ends_with("5.00%"));
        assert!(lines[2].starts_with("sharpe_ratio") && lines[2].ends_with("1.20"));
    }
}
