use super::reports_model::{RunReport, RunRequest};
use crate::errors::Result;

/// Trait for running cost-basis reports.
pub trait CostBasisServiceTrait: Send + Sync {
    /// Settles every operation of the request and reports the sales of its tax year.
    fn run(&self, request: RunRequest) -> Result<RunReport>;
}
