//! HTTP inbound adapter exposing REST endpoints.

pub mod harbors;
pub mod health;
pub mod state;

pub use harbors::upsert_harbors;
pub use health::{HealthState, live, ready};
pub use state::HttpState;
