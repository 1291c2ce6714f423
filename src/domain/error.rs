//! Domain error types.
//!
//! Two layers: [`ValidationError`] names the specific check that failed inside
//! the engine, [`PostesterError`] is what the public surface returns.

use std::fmt;

/// A specific input or output check that failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("commission must be a finite number between 0 and 1, got {value}")]
    CommissionOutOfRange { value: f64 },

    #[error("annual_trading_days must be an integer between 1 and 365, got {value}")]
    AnnualTradingDaysOutOfRange { value: i64 },

    #[error("unknown indicators: {}", .names.join(", "))]
    UnknownIndicators { names: Vec<String> },

    #[error("missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("column '{column}' must be a time column, found {found}")]
    NotTemporal { column: String, found: &'static str },

    #[error("column '{column}' must be numeric, found {found}")]
    NotNumeric { column: String, found: &'static str },

    #[error("column '{column}' has {actual} rows, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("'{name}' names a quantity seeded into every evaluation context")]
    ReservedName { name: String },

    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },

    #[error("{kind} input is empty")]
    EmptyInput { kind: SeriesKind },

    #[error("{kind} input has duplicate timestamp {time}")]
    DuplicateTimestamp {
        kind: SeriesKind,
        time: chrono::NaiveDateTime,
    },

    #[error("close price must be finite and positive, got {value} at row {row}")]
    NonPositivePrice { row: usize, value: f64 },

    #[error("position must be within [-1, 1], got {value} at row {row}")]
    PositionOutOfRange { row: usize, value: f64 },

    #[error(
        "close and position data must have identical timestamps \
         ({only_close} only in close, {only_position} only in position)"
    )]
    Misaligned {
        only_close: usize,
        only_position: usize,
    },

    #[error("indicator '{indicator}' returned a {found}; expected a scalar or a table")]
    UnsupportedValue {
        indicator: String,
        found: &'static str,
    },
}

impl ValidationError {
    /// Wrap into the boundary error with a short description of the stage that failed.
    pub fn into_invalid_argument(self, context: &'static str) -> PostesterError {
        PostesterError::InvalidArgument {
            context,
            source: self,
        }
    }
}

/// Which input series a validation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    Close,
    Position,
}

impl SeriesKind {
    /// Name of the value column this kind of input carries.
    pub fn column(self) -> &'static str {
        match self {
            SeriesKind::Close => "close",
            SeriesKind::Position => "position",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// What a failed lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Indicator,
    IndicatorValue,
    FormattedValue,
    Dataframe,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LookupKind::Indicator => "indicator",
            LookupKind::IndicatorValue => "indicator value",
            LookupKind::FormattedValue => "formatted indicator value",
            LookupKind::Dataframe => "dataframe",
        };
        f.write_str(s)
    }
}

/// Top-level error type for postester.
#[derive(Debug, thiserror::Error)]
pub enum PostesterError {
    #[error("invalid {context}: {source}")]
    InvalidArgument {
        context: &'static str,
        #[source]
        source: ValidationError,
    },

    #[error("{kind} '{name}' not found")]
    NotFound { kind: LookupKind, name: String },

    #[error("dependency cycle among indicators: {}", .path.join(" -> "))]
    DependencyCycle { path: Vec<String> },

    #[error("indicator '{name}' failed: {reason}")]
    Indicator { name: String, reason: String },

    #[error("evaluation context has no {expected} named '{key}'")]
    ContextLookup { key: String, expected: &'static str },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PostesterError {
    pub(crate) fn not_found(kind: LookupKind, name: &str) -> Self {
        PostesterError::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    /// True for errors raised because caller-supplied arguments failed validation.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, PostesterError::InvalidArgument { .. })
    }
}
