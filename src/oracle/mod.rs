//! The boundary to external MIP solvers.
//!
//! An [`Oracle`] takes a [`Mip`] with an active objective and reports how the solve ended, together
//! with the variable values when the solver produced any.

#[cfg(feature = "gurobi")]
pub mod gurobi;
#[cfg(feature = "microlp")]
pub mod microlp;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::mip::{Mip, ModelError, Solution};

/// Coarse outcome of the solver run itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverStatus {
    #[display(fmt = "ok")]
    Ok,
    #[display(fmt = "warning")]
    Warning,
    #[display(fmt = "error")]
    Error,
    #[display(fmt = "aborted")]
    Aborted,
    #[display(fmt = "unknown")]
    Unknown,
}

/// Why the solver stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TerminationCondition {
    #[display(fmt = "optimal")]
    Optimal,
    #[display(fmt = "feasible")]
    Feasible,
    #[display(fmt = "infeasible")]
    Infeasible,
    #[display(fmt = "unbounded")]
    Unbounded,
    #[display(fmt = "infeasibleOrUnbounded")]
    InfeasibleOrUnbounded,
    #[display(fmt = "maxTimeLimit")]
    MaxTimeLimit,
    #[display(fmt = "maxIterations")]
    MaxIterations,
    #[display(fmt = "interrupted")]
    Interrupted,
    #[display(fmt = "other")]
    Other,
}

impl TerminationCondition {
    /// Whether a solution that ended this way can be used as an objective extreme
    pub fn is_acceptable(&self) -> bool {
        matches!(
            self,
            TerminationCondition::Optimal | TerminationCondition::Feasible
        )
    }
}

/// Result of a single solve
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: SolverStatus,
    pub termination: TerminationCondition,
    /// Values of all variables, present whenever the solver found a feasible point
    pub solution: Option<Solution>,
}

impl SolveOutcome {
    pub fn optimal(solution: Solution) -> SolveOutcome {
        SolveOutcome {
            status: SolverStatus::Ok,
            termination: TerminationCondition::Optimal,
            solution: Some(solution),
        }
    }

    /// An outcome without any solution
    pub fn without_solution(status: SolverStatus, termination: TerminationCondition) -> SolveOutcome {
        SolveOutcome {
            status,
            termination,
            solution: None,
        }
    }

    /// The solution, if the solve ended in an acceptable state
    pub fn accepted(&self) -> Option<&Solution> {
        match self.termination.is_acceptable() {
            true => self.solution.as_ref(),
            false => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleOptions {
    /// Wall clock limit per solve, in seconds
    pub time_limit: Option<f64>,
    /// Let the solver print its own log
    pub verbose: bool,
}

impl OracleOptions {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
            .filter(|t| t.is_finite() && *t >= 0.0)
            .map(Duration::from_secs_f64)
    }
}

#[derive(Debug, Display, From)]
pub enum OracleError {
    /// The requested backend is not compiled in or cannot be started
    #[display(fmt = "solver `{}` is not available", _0)]
    #[from(ignore)]
    Unavailable(String),
    /// The backend failed while building or solving the model
    #[display(fmt = "solver failure: {}", _0)]
    #[from(ignore)]
    Backend(String),
    #[display(fmt = "{}", _0)]
    Model(ModelError),
}

impl std::error::Error for OracleError {}

/// A MIP solver
pub trait Oracle {
    /// Short name of the backend, used in logs
    fn name(&self) -> &str;

    /// Solves `model` for its active objective. Infeasible or unbounded models are reported in the
    /// outcome; `Err` is reserved for failures of the solver itself.
    fn solve(&mut self, model: &Mip) -> Result<SolveOutcome, OracleError>;
}

/// Names of the backends compiled into this build
pub fn available() -> Vec<&'static str> {
    #[allow(unused_mut)]
    let mut names = Vec::new();
    #[cfg(feature = "microlp")]
    names.push("microlp");
    #[cfg(feature = "gurobi")]
    names.push("gurobi");
    names
}

/// Creates the backend named `name`
pub fn from_name(name: &str, options: OracleOptions) -> Result<Box<dyn Oracle>, OracleError> {
    match name {
        #[cfg(feature = "microlp")]
        "microlp" => Ok(Box::new(microlp::MicroLp::new(options))),
        #[cfg(feature = "gurobi")]
        "gurobi" => Ok(Box::new(gurobi::Gurobi::new(options))),
        _ => {
            let _ = options;
            Err(OracleError::Unavailable(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_optimal_and_feasible_are_acceptable() {
        use TerminationCondition::*;
        let accepted = [
            Optimal,
            Feasible,
            Infeasible,
            Unbounded,
            InfeasibleOrUnbounded,
            MaxTimeLimit,
            MaxIterations,
            Interrupted,
            Other,
        ]
        .iter()
        .filter(|t| t.is_acceptable())
        .count();
        assert_eq!(accepted, 2);
    }

    #[test]
    fn time_limit_outcome_keeps_its_incumbent_out_of_accepted() {
        let outcome = SolveOutcome {
            status: SolverStatus::Warning,
            termination: TerminationCondition::MaxTimeLimit,
            solution: Some(Solution::default()),
        };
        assert_eq!(outcome.accepted(), None);
        assert!(SolveOutcome::optimal(Solution::default()).accepted().is_some());
    }

    #[test]
    fn conditions_serialize_like_their_display() {
        let json = serde_json::to_string(&TerminationCondition::InfeasibleOrUnbounded).unwrap();
        assert_eq!(json, "\"infeasibleOrUnbounded\"");
        assert_eq!(TerminationCondition::MaxTimeLimit.to_string(), "maxTimeLimit");
    }

    #[test]
    fn unknown_backend_is_unavailable() {
        assert!(matches!(
            from_name("cplex", OracleOptions::default()),
            Err(OracleError::Unavailable(_))
        ));
    }

    #[test]
    fn negative_time_limit_is_ignored() {
        let options = OracleOptions {
            time_limit: Some(-1.0),
            verbose: false,
        };
        assert_eq!(options.time_limit(), None);
        let options = OracleOptions {
            time_limit: Some(1.5),
            verbose: false,
        };
        assert_eq!(options.time_limit(), Some(Duration::from_millis(1500)));
    }
}
