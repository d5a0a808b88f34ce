//! Generator registry
//!
//! Maps generator names to concrete implementations.

pub mod command;
pub mod mock;

use crate::config::KindConfig;
use crate::generator::Generator;
use mediaslot_core::{MediaError, Result};

/// Create a generator by name with configuration
pub fn create_generator(name: &str, config: &KindConfig) -> Result<Box<dyn Generator>> {
    match name {
        "command" => Ok(Box::new(command::CommandGenerator::from_config(config)?)),
        "mock" => Ok(Box::new(mock::MockGenerator::new(config.clone()))),
        _ => Err(MediaError::ConfigError(format!(
            "Unknown generator '{}'. Available: {}",
            name,
            available_generators().join(", ")
        ))),
    }
}

/// List all available generator names
pub fn available_generators() -> Vec<&'static str> {
    vec!["command", "mock"]
}
