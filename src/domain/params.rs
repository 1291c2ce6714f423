//! Engine parameters and their loading from configuration.

use crate::domain::error::PostesterError;
use crate::domain::validation::{validate_annual_trading_days, validate_commission};
use crate::ports::config_port::ConfigPort;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_ANNUAL_TRADING_DAYS: u32 = 252;

const SECTION: &str = "backtest";

/// Which indicators a backtest should report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum IndicatorSelection {
    #[default]
    All,
    Names(Vec<String>),
}

impl IndicatorSelection {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IndicatorSelection::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, IndicatorSelection::All)
    }
}

/// `all` (any case) or a comma-separated list of names.
impl FromStr for IndicatorSelection {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(IndicatorSelection::All);
        }
        Ok(IndicatorSelection::names(
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty()),
        ))
    }
}

impl fmt::Display for IndicatorSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorSelection::All => f.write_str("all"),
            IndicatorSelection::Names(names) => f.write_str(&names.join(",")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BacktestParams {
    /// Cost per unit of position change, as a fraction.
    pub commission: f64,
    pub annual_trading_days: u32,
    pub indicators: IndicatorSelection,
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            commission: 0.0,
            annual_trading_days: DEFAULT_ANNUAL_TRADING_DAYS,
            indicators: IndicatorSelection::All,
        }
    }
}

impl BacktestParams {
    pub fn with_commission(mut self, commission: f64) -> Self {
        self.commission = commission;
        self
    }

    pub fn with_annual_trading_days(mut self, days: u32) -> Self {
        self.annual_trading_days = days;
        self
    }

    pub fn with_indicators(mut self, indicators: IndicatorSelection) -> Self {
        self.indicators = indicators;
        self
    }

    /// Read `[backtest]` `commission`, `annual_trading_days` and `indicators`.
    /// Absent keys take their defaults; present but malformed or out-of-range
    /// values are errors.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PostesterError> {
        let defaults = Self::default();

        let commission = match config.get_double(SECTION, "commission")? {
            Some(c) => validate_commission(c).map_err(|e| invalid(e.to_string(), "commission"))?,
            None => defaults.commission,
        };

        let annual_trading_days = match config.get_int(SECTION, "annual_trading_days")? {
            Some(n) => validate_annual_trading_days(n)
                .map_err(|e| invalid(e.to_string(), "annual_trading_days"))?,
            None => defaults.annual_trading_days,
        };

        let indicators = match config.get_string(SECTION, "indicators") {
            Some(s) => match s.parse::<IndicatorSelection>() {
                Ok(IndicatorSelection::Names(names)) if names.is_empty() => {
                    return Err(invalid(
                        "expected 'all' or a comma-separated list of indicator names".into(),
                        "indicators",
                    ));
                }
                Ok(selection) => selection,
                Err(never) => match never {},
            },
            None => defaults.indicators,
        };

        Ok(Self {
            commission,
            annual_trading_days,
            indicators,
        })
    }
}

fn invalid(reason: String, key: &str) -> PostesterError {
    PostesterError::ConfigInvalid {
        section: SECTION.to_string(),
        key: key.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn defaults() {
        let p = BacktestParams::default();
        assert_eq!(p.commission, 0.0);
        assert_eq!(p.annual_trading_days, 252);
        assert!(p.indicators.is_all());
    }

    #[test]
    fn selection_parses_all_case_insensitively() {
        assert_eq!("ALL".parse::<IndicatorSelection>().unwrap(), IndicatorSelection::All);
        assert_eq!(" all ".parse::<IndicatorSelection>().unwrap(), IndicatorSelection::All);
    }

    #[test]
    fn selection_parses_list() {
        let s: IndicatorSelection = "sharpe_ratio, max_drawdown,,".parse().unwrap();
        assert_eq!(s, IndicatorSelection::names(["sharpe_ratio", "max_drawdown"]));
        assert_eq!(s.to_string(), "sharpe_ratio,max_drawdown");
    }

    #[test]
    fn from_config_reads_all_keys() {
        let config = make_config(
            "[backtest]\ncommission = 0.001\nannual_trading_days = 365\nindicators = sharpe_ratio,win_rate\n",
        );
        let p = BacktestParams::from_config(&config).unwrap();
        assert_eq!(p.commission, 0.001);
        assert_eq!(p.annual_trading_days, 365);
        assert_eq!(
            p.indicators,
            IndicatorSelection::names(["sharpe_ratio", "win_rate"])
        );
    }

    #[test]
    fn from_config_missing_keys_use_defaults() {
        let p = BacktestParams::from_config(&make_config("[backtest]\n")).unwrap();
        assert_eq!(p, BacktestParams::default());
    }

    #[test]
    fn from_config_rejects_commission_above_one() {
        let err = BacktestParams::from_config(&make_config("[backtest]\ncommission = 1.5\n"))
            .unwrap_err();
        assert!(matches!(err, PostesterError::ConfigInvalid { key, .. } if key == "commission"));
    }

    #[test]
    fn from_config_rejects_non_numeric_commission() {
        let err = BacktestParams::from_config(&make_config("[backtest]\ncommission = lots\n"))
            .unwrap_err();
        assert!(matches!(err, PostesterError::ConfigInvalid { key, .. } if key == "commission"));
    }

    #[test]
    fn from_config_rejects_trading_days_out_of_range() {
        for bad in ["0", "366", "-5"] {
            let config = make_config(&format!("[backtest]\nannual_trading_days = {bad}\n"));
            let err = BacktestParams::from_config(&config).unwrap_err();
            assert!(
                matches!(err, PostesterError::ConfigInvalid { ref key, .. } if key == "annual_trading_days"),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn from_config_rejects_empty_indicator_list() {
        let err = BacktestParams::from_config(&make_config("[backtest]\nindicators = ,\n"))
            .unwrap_err();
        assert!(matches!(err, PostesterError::ConfigInvalid { key, .. } if key == "indicators"));
    }
}
