pub mod classifier;
pub mod providers;
pub mod routing;
pub mod types;

// Re-export core types at crate root for convenience.
pub use classifier::classify_error;
pub use providers::anthropic::AnthropicHealthCheck;
pub use providers::vertex::{GcloudTokenSource, VertexHealthCheck};
pub use providers::{HealthCheck, ProbeError, TokenSource};
pub use routing::{FailoverOutcome, build_prompt_response, evaluate_failover, remediation_hint};
pub use types::*;
