pub mod cli;
pub mod config;
pub mod conformance;
pub mod probe;
pub mod validate;
pub mod workload;

// re-export selected public API
pub use probe::compiler::{CompiledProbe, ShellRenderer, compile};
pub use probe::evidence::EvidenceId;
pub use validate::validator::{EvidenceValidator, ValidationResult, ValidatorOptions};
