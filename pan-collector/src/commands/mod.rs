//! Commands implemented by the `pan-collector` binary.

pub mod export;
