//! recalc_engine - Formula parsing, dependency tracking and recalculation ordering.

pub mod engine;
