pub mod model;
pub mod plan;
pub mod sets_and_parameters;

pub use model::{NetworkModel, PunctualityForm, COST, PUNCTUALITY};
pub use plan::{NetworkPlan, PlanViolation, Route};
