#[macro_use]
extern crate serde_derive;

pub use hcl_edit as hcl;

use hiro_system_kit::Logger;

pub mod config;
pub mod errors;
pub mod parser;
pub mod project;
pub mod runner;
pub mod types;
pub mod validation;

#[cfg(test)]
mod tests;

pub use config::ValidationConfig;
pub use errors::ValidatorError;
pub use project::validate_project;
pub use runner::{CancellationToken, DefaultTerraformRunner, TerraformRunner};
pub use types::ValidationFinding;

/// Execution context shared by the orchestrator and its workers. The logger
/// is optional so library consumers and tests can run without one.
#[derive(Clone)]
pub struct Context {
    pub logger: Option<Logger>,
    pub tracer: bool,
}

impl Context {
    pub fn empty() -> Context {
        Context { logger: None, tracer: false }
    }

    pub fn try_log<F>(&self, closure: F)
    where
        F: FnOnce(&Logger),
    {
        if let Some(ref logger) = self.logger {
            closure(logger)
        }
    }

    pub fn expect_logger(&self) -> &Logger {
        self.logger.as_ref().unwrap()
    }
}
