//! Operator-facing terminal output.

pub mod output;
