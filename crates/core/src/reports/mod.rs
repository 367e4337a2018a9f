//! Reports module - one cost-basis run from raw records to a yearly report.

mod cost_basis_service;
mod reports_model;
mod reports_traits;

#[cfg(test)]
mod cost_basis_service_tests;

pub use cost_basis_service::CostBasisService;
pub use reports_model::{RunReport, RunRequest, YearSummary};
pub use reports_traits::CostBasisServiceTrait;
