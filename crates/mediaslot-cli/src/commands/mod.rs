//! CLI command implementations

pub mod audit;
pub mod generate;
pub mod resolve;
pub mod select;
pub mod serve;
pub mod slots;
