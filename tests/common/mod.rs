#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use postester::domain::registry::{IndicatorRegistry, SharedRegistry, share};
use postester::domain::table::Table;

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn day(n: i64) -> NaiveDateTime {
    start() + TimeDelta::days(n)
}

pub fn daily_times(n: usize) -> Vec<NaiveDateTime> {
    (0..n as i64).map(day).collect()
}

pub fn close_table(values: &[f64]) -> Table {
    Table::time_series("close", daily_times(values.len()), values.to_vec())
}

pub fn position_table(values: &[f64]) -> Table {
    Table::time_series("position", daily_times(values.len()), values.to_vec())
}

pub fn close_at(times: Vec<NaiveDateTime>, values: &[f64]) -> Table {
    Table::time_series("close", times, values.to_vec())
}

pub fn position_at(times: Vec<NaiveDateTime>, values: &[f64]) -> Table {
    Table::time_series("position", times, values.to_vec())
}

/// Registry with the built-ins, isolated from the process-wide one.
pub fn isolated_registry() -> SharedRegistry {
    share(IndicatorRegistry::with_builtins())
}

/// Closes starting at 100, compounding each of `returns` in turn.
pub fn walk(returns: &[f64]) -> Vec<f64> {
    let mut price = 100.0;
    let mut out = vec![price];
    for r in returns {
        price *= 1.0 + r;
        out.push(price);
    }
    out
}
