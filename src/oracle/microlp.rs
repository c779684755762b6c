use good_lp::solvers::microlp::microlp;
use good_lp::{ResolutionError, Solution as _, SolverModel};
use log::{debug, warn};
use std::collections::HashMap;

use super::{Oracle, OracleError, OracleOptions, SolveOutcome, SolverStatus, TerminationCondition};
use crate::models::mip::{Mip, ModelError, Sense, Solution};

/// Pure Rust branch and bound through `good_lp`. Needs no native solver installation.
pub struct MicroLp {
    options: OracleOptions,
}

impl MicroLp {
    pub fn new(options: OracleOptions) -> MicroLp {
        if options.time_limit().is_some() {
            warn!("microlp does not support time limits, solves will run to completion");
        }
        MicroLp { options }
    }
}

impl Oracle for MicroLp {
    fn name(&self) -> &str {
        "microlp"
    }

    fn solve(&mut self, model: &Mip) -> Result<SolveOutcome, OracleError> {
        let objective = model
            .active_objective()
            .ok_or(OracleError::Model(ModelError::NoActiveObjective))?;

        let vars = model.variables().clone();
        let unsolved = match objective.sense {
            Sense::Minimize => vars.minimise(objective.expr.clone()),
            Sense::Maximize => vars.maximise(objective.expr.clone()),
        };
        let mut problem = unsolved.using(microlp);
        for row in model.constrs() {
            problem.add_constraint(row.constraint());
        }

        debug!(
            "microlp: solving `{}` for {} ({} columns, {} rows, verbose = {})",
            model.name(),
            objective.name,
            model.num_vars(),
            model.constrs().len(),
            self.options.verbose
        );

        match problem.solve() {
            Ok(solved) => {
                let values = model
                    .vars()
                    .map(|(var, _)| (var, solved.value(var)))
                    .collect::<HashMap<_, _>>();
                Ok(SolveOutcome::optimal(Solution::from(values)))
            }
            Err(ResolutionError::Infeasible) => Ok(SolveOutcome::without_solution(
                SolverStatus::Ok,
                TerminationCondition::Infeasible,
            )),
            Err(ResolutionError::Unbounded) => Ok(SolveOutcome::without_solution(
                SolverStatus::Ok,
                TerminationCondition::Unbounded,
            )),
            Err(e) => Err(OracleError::Backend(e.to_string())),
        }
    }
}
