use good_lp::{Expression, IntoAffineExpression};
use grb::prelude::*;
use log::{debug, trace};
use std::collections::HashMap;

use super::{Oracle, OracleError, OracleOptions, SolveOutcome, SolverStatus, TerminationCondition};
use crate::models::mip::{self, ConstrSense, Mip, ModelError, Sense, Solution};

type Columns = HashMap<mip::Var, Var>;

/// Gurobi through the `grb` bindings. Needs a local Gurobi installation and licence.
pub struct Gurobi {
    options: OracleOptions,
}

impl Gurobi {
    pub fn new(options: OracleOptions) -> Gurobi {
        Gurobi { options }
    }

    fn expression(expr: &Expression, columns: &Columns) -> grb::expr::LinExpr {
        let mut out = grb::expr::LinExpr::new();
        for (var, coeff) in expr.linear_coefficients() {
            out.add_term(coeff, columns[&var]);
        }
        out.add_constant(expr.constant());
        out
    }

    fn translate(status: Status, solutions: i32) -> (SolverStatus, TerminationCondition) {
        use TerminationCondition::*;
        match status {
            Status::Optimal => (SolverStatus::Ok, Optimal),
            Status::Infeasible => (SolverStatus::Ok, Infeasible),
            Status::Unbounded => (SolverStatus::Ok, Unbounded),
            Status::InfOrUnbd => (SolverStatus::Ok, InfeasibleOrUnbounded),
            Status::TimeLimit => (SolverStatus::Warning, MaxTimeLimit),
            Status::IterationLimit | Status::NodeLimit => (SolverStatus::Warning, MaxIterations),
            Status::Interrupted => (SolverStatus::Aborted, Interrupted),
            Status::SubOptimal if solutions > 0 => (SolverStatus::Warning, Feasible),
            _ => (SolverStatus::Unknown, Other),
        }
    }

    fn build(&self, model: &Mip) -> grb::Result<(Model, Columns)> {
        let mut g = Model::new(model.name())?;
        if !self.options.verbose {
            g.set_param(param::OutputFlag, 0)?;
        }
        if let Some(limit) = self.options.time_limit() {
            g.set_param(param::TimeLimit, limit.as_secs_f64())?;
        }

        let mut columns = Columns::with_capacity(model.num_vars());
        for (var, def) in model.vars() {
            let vtype = match mip::VarType::of(def) {
                mip::VarType::Binary => VarType::Binary,
                mip::VarType::Integer => VarType::Integer,
                mip::VarType::Continuous => VarType::Continuous,
            };
            let column = g.add_var(
                def.get_name(),
                vtype,
                0.0,
                def.get_min(),
                def.get_max(),
                std::iter::empty(),
            )?;
            columns.insert(var, column);
        }

        for row in model.constrs() {
            let lhs = Self::expression(&row.expr, &columns);
            let rhs = row.rhs;
            match row.sense {
                ConstrSense::Le => g.add_constr(&row.name, c!(lhs <= rhs))?,
                ConstrSense::Eq => g.add_constr(&row.name, c!(lhs == rhs))?,
            };
        }

        Ok((g, columns))
    }
}

impl Oracle for Gurobi {
    fn name(&self) -> &str {
        "gurobi"
    }

    fn solve(&mut self, model: &Mip) -> Result<SolveOutcome, OracleError> {
        let objective = model
            .active_objective()
            .ok_or(OracleError::Model(ModelError::NoActiveObjective))?;
        let backend = |e: grb::Error| OracleError::Backend(e.to_string());

        let (mut g, columns) = self.build(model).map_err(backend)?;
        let sense = match objective.sense {
            Sense::Minimize => ModelSense::Minimize,
            Sense::Maximize => ModelSense::Maximize,
        };
        g.set_objective(Self::expression(&objective.expr, &columns), sense)
            .map_err(backend)?;

        debug!("gurobi: solving `{}` for {}", model.name(), objective.name);
        g.optimize().map_err(backend)?;

        let status = g.status().map_err(backend)?;
        let solutions = g.get_attr(attr::SolCount).map_err(backend)?;
        trace!("gurobi: status {:?} with {} solutions", status, solutions);

        let (status, termination) = Self::translate(status, solutions);
        let solution = match solutions > 0 {
            true => Some(Solution::from(
                columns
                    .iter()
                    .map(|(&var, column)| Ok((var, g.get_obj_attr(attr::X, column)?)))
                    .collect::<grb::Result<HashMap<_, _>>>()
                    .map_err(backend)?,
            )),
            false => None,
        };

        Ok(SolveOutcome {
            status,
            termination,
            solution,
        })
    }
}
