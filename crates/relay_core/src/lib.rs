pub mod config;
pub mod logging;
pub mod persistence;
pub mod session;

pub use config::{
    AuthConfig, AuthMethod, GcpConfig, ModelPricing, PricingTable, ProviderConfig, RelayConfig,
};
pub use persistence::{DailyUsage, ModelUsage, NewRequest, SessionRow, UsageLedger, UsageStats};
pub use session::{SessionState, StateManager};
