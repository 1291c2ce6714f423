//! Display formats shared by the built-in indicators.

/// 0.1234 -> "12.34%"
pub fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Two decimals; infinities print as `inf`.
pub fn ratio(value: f64) -> String {
    format!("{value:.2}")
}

pub fn days(value: f64) -> String {
    format!("{value:.1} days")
}
