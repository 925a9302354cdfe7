pub mod client;

use async_trait::async_trait;

use crate::error::OracleError;
use crate::planner::types::{CookSnapshot, Recommendation};

pub use client::ChatOracle;

/// External decision service. Untrusted: implementations must turn any
/// reply that is not a known action into an `OracleError`.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn consult(&self, snapshot: &CookSnapshot) -> Result<Recommendation, OracleError>;
}
