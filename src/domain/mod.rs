//! Core domain: validation, funding curve, indicators and the engine.

pub mod backtester;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod funding;
pub mod indicator;
pub mod params;
pub mod registry;
pub mod result;
pub mod table;
pub mod validation;
