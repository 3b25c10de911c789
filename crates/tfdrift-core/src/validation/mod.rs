pub mod conformance;
pub mod findings;
pub mod module_validator;

pub use conformance::validate_block_data;
pub use findings::{deduplicate_findings, format_finding};
pub use module_validator::validate_module;
