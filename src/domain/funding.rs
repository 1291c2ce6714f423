//! Funding curve derivation.
//!
//! price_return[t]     = close[t] / close[t-1] - 1            (0 at t = 0)
//! position_return[t]  = price_return[t] * position[t-1]      (no exposure before t = 0)
//! position_change[t]  = |position[t] - position[t-1]|        (0 at t = 0)
//! transaction_cost[t] = position_change[t] * commission
//! returns[t]          = position_return[t] - transaction_cost[t]
//! funding_curve[t]    = prod_{k<=t} (1 + returns[k])

use crate::domain::table::{Column, Table};
use crate::domain::validation::AlignedSeries;
use chrono::NaiveDateTime;

/// Every per-period quantity of the curve derivation, one entry per timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct FundingCurve {
    pub time: Vec<NaiveDateTime>,
    pub close: Vec<f64>,
    pub position: Vec<f64>,
    pub price_return: Vec<f64>,
    pub position_return: Vec<f64>,
    pub position_change: Vec<f64>,
    pub transaction_cost: Vec<f64>,
    pub returns: Vec<f64>,
    pub funding_curve: Vec<f64>,
}

impl FundingCurve {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Full table: time, inputs, intermediates, `funding_curve` and `returns`.
    pub fn to_table(&self) -> Table {
        Table::from_parts(vec![
            ("time", Column::Time(self.time.clone())),
            ("close", Column::Float(self.close.clone())),
            ("position", Column::Float(self.position.clone())),
            ("price_return", Column::Float(self.price_return.clone())),
            ("position_return", Column::Float(self.position_return.clone())),
            ("position_change", Column::Float(self.position_change.clone())),
            ("transaction_cost", Column::Float(self.transaction_cost.clone())),
            ("funding_curve", Column::Float(self.funding_curve.clone())),
            ("returns", Column::Float(self.returns.clone())),
        ])
    }
}

pub fn build_funding_curve(aligned: &AlignedSeries, commission: f64) -> FundingCurve {
    let n = aligned.time.len();
    let mut price_return = Vec::with_capacity(n);
    let mut position_return = Vec::with_capacity(n);
    let mut position_change = Vec::with_capacity(n);
    let mut transaction_cost = Vec::with_capacity(n);
    let mut returns = Vec::with_capacity(n);
    let mut funding_curve = Vec::with_capacity(n);

    let mut equity = 1.0_f64;
    for i in 0..n {
        let (pr, prev_position, change) = if i == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let prev = aligned.position[i - 1];
            (
                aligned.close[i] / aligned.close[i - 1] - 1.0,
                prev,
                (aligned.position[i] - prev).abs(),
            )
        };

        let held = pr * prev_position;
        let cost = change * commission;
        let net = held - cost;
        equity *= 1.0 + net;

        price_return.push(pr);
        position_return.push(held);
        position_change.push(change);
        transaction_cost.push(cost);
        returns.push(net);
        funding_curve.push(equity);
    }

    FundingCurve {
        time: aligned.time.clone(),
        close: aligned.close.clone(),
        position: aligned.position.clone(),
        price_return,
        position_return,
        position_change,
        transaction_cost,
        returns,
        funding_curve,
    }
}
