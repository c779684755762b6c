use derive_more::{Display, From};
use good_lp::{
    variable, Constraint, Expression, IntoAffineExpression, ProblemVariables, SolutionStatus,
    Variable, VariableDefinition,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::ops::Range;

/// Handle to a variable of a [`Mip`]. Only meaningful for the model (or clones of the model) that created it.
pub type Var = Variable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarType {
    Binary,
    Integer,
    Continuous,
}

impl VarType {
    /// The type a variable definition describes. Integers bounded by `[0, 1]` are binary.
    pub fn of(def: &VariableDefinition) -> VarType {
        match def.is_integer() {
            true if def.get_min() == 0.0 && def.get_max() == 1.0 => VarType::Binary,
            true => VarType::Integer,
            false => VarType::Continuous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum ConstrSense {
    #[display(fmt = "<=")]
    Le,
    #[display(fmt = "=")]
    Eq,
}

/// A named constraint as stored in the model: all variables on the left, a constant on the right.
/// `>=` constraints are stored negated as `<=` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstrRow {
    pub name: String,
    pub expr: Expression,
    pub sense: ConstrSense,
    pub rhs: f64,
}

impl ConstrRow {
    fn new(name: &str, constr: Constraint) -> ConstrRow {
        let sense = match constr.is_equality() {
            true => ConstrSense::Eq,
            false => ConstrSense::Le,
        };
        let rhs = 0.0 - constr.expression().constant();
        ConstrRow {
            name: name.to_string(),
            expr: constr.expression().clone() + rhs,
            sense,
            rhs,
        }
    }

    /// The row as a `good_lp` constraint
    pub fn constraint(&self) -> Constraint {
        let lhs = self.expr.clone();
        match self.sense {
            ConstrSense::Le => lhs.leq(self.rhs),
            ConstrSense::Eq => lhs.eq(self.rhs),
        }
    }

    /// Amount by which the row is violated (0 if satisfied)
    pub fn violation(&self, solution: &Solution) -> f64 {
        let lhs = (&self.expr).eval_with(solution);
        match self.sense {
            ConstrSense::Le => (lhs - self.rhs).max(0.0),
            ConstrSense::Eq => (lhs - self.rhs).abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sense {
    #[display(fmt = "minimize")]
    Minimize,
    #[display(fmt = "maximize")]
    Maximize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub name: String,
    pub expr: Expression,
    pub sense: Sense,
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ModelError {
    #[display(fmt = "no objective named `{}` is registered on the model", _0)]
    UnknownObjective(String),
    #[display(fmt = "the model has no active objective")]
    NoActiveObjective,
}

impl std::error::Error for ModelError {}

/// Values of the variables of a model. A variable without a value reads as zero.
#[derive(Debug, Clone, Default, PartialEq, From)]
pub struct Solution(HashMap<Var, f64>);

impl Solution {
    pub fn value(&self, var: Var) -> f64 {
        self.0.get(&var).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, var: Var, value: f64) {
        self.0.insert(var, value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl good_lp::Solution for Solution {
    fn status(&self) -> SolutionStatus {
        SolutionStatus::Optimal
    }

    fn value(&self, variable: Variable) -> f64 {
        self.0.get(&variable).copied().unwrap_or(0.0)
    }
}

/// A single reason why a solution is not feasible for a model
#[derive(Debug, Clone, PartialEq, Display)]
pub enum Violation {
    #[display(fmt = "{}: {} {} {} violated by {}", name, lhs, sense, rhs, amount)]
    Constraint {
        name: String,
        lhs: f64,
        sense: ConstrSense,
        rhs: f64,
        amount: f64,
    },
    #[display(fmt = "{} = {} outside [{}, {}]", var, value, lb, ub)]
    Bound {
        var: String,
        value: f64,
        lb: f64,
        ub: f64,
    },
    #[display(fmt = "{} = {} is not integral", var, value)]
    Integrality { var: String, value: f64 },
}

impl Violation {
    /// Name of the violated constraint or variable
    pub fn name(&self) -> &str {
        match self {
            Violation::Constraint { name, .. } => name,
            Violation::Bound { var, .. } => var,
            Violation::Integrality { var, .. } => var,
        }
    }
}

/// A mixed integer linear program with any number of named objectives, at most one of them active.
///
/// The model is a plain value: `clone` gives a fully independent copy, so activating an objective or
/// adding a bound constraint on a clone never affects the original.
#[derive(Clone)]
pub struct Mip {
    name: String,
    variables: ProblemVariables,
    constrs: Vec<ConstrRow>,
    objectives: Vec<Objective>,
    active: Option<usize>,
}

impl fmt::Debug for Mip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mip")
            .field("name", &self.name)
            .field("vars", &self.vars().map(|(_, def)| def).collect::<Vec<_>>())
            .field("constrs", &self.constrs)
            .field("objectives", &self.objectives)
            .field("active", &self.active)
            .finish()
    }
}

impl PartialEq for Mip {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.vars().map(|(_, def)| def).eq(other.vars().map(|(_, def)| def))
            && self.constrs == other.constrs
            && self.objectives == other.objectives
            && self.active == other.active
    }
}

impl Mip {
    pub fn new(name: &str) -> Mip {
        Mip {
            name: name.to_string(),
            variables: ProblemVariables::new(),
            constrs: Vec::new(),
            objectives: Vec::new(),
            active: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &ProblemVariables {
        &self.variables
    }

    /// Every variable with its definition, in creation order
    pub fn vars(&self) -> impl Iterator<Item = (Var, &VariableDefinition)> {
        self.variables.iter_variables_with_def()
    }

    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    pub fn var(&self, var: Var) -> Option<&VariableDefinition> {
        self.vars().find(|(v, _)| *v == var).map(|(_, def)| def)
    }

    pub fn constrs(&self) -> &[ConstrRow] {
        &self.constrs
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub fn add_var(&mut self, name: &str, vtype: VarType, bounds: &Range<f64>) -> Var {
        let def = variable().name(name);
        let def = match vtype {
            VarType::Binary => def
                .binary()
                .min(bounds.start.max(0.0))
                .max(bounds.end.min(1.0)),
            VarType::Integer => def.integer().min(bounds.start).max(bounds.end),
            VarType::Continuous => def.min(bounds.start).max(bounds.end),
        };
        self.variables.add(def)
    }

    pub fn add_constr(&mut self, name: &str, constr: Constraint) {
        self.constrs.push(ConstrRow::new(name, constr));
    }

    /// Registers an objective. Registering does not activate it.
    pub fn add_objective(&mut self, name: &str, expr: Expression, sense: Sense) {
        self.objectives.push(Objective {
            name: name.to_string(),
            expr,
            sense,
        });
    }

    pub fn objective(&self, name: &str) -> Result<&Objective, ModelError> {
        self.objectives
            .iter()
            .find(|o| o.name == name)
            .ok_or_else(|| ModelError::UnknownObjective(name.to_string()))
    }

    /// Activates the objective `name` and deactivates every other objective
    pub fn activate_objective(&mut self, name: &str) -> Result<(), ModelError> {
        let index = self
            .objectives
            .iter()
            .position(|o| o.name == name)
            .ok_or_else(|| ModelError::UnknownObjective(name.to_string()))?;
        self.active = Some(index);
        Ok(())
    }

    pub fn active_objective(&self) -> Option<&Objective> {
        self.active.map(|i| &self.objectives[i])
    }

    /// Adds `expr <= bound` when `sense` is minimize and `expr >= bound` when it is maximize
    pub fn add_bound(&mut self, name: &str, expr: Expression, sense: Sense, bound: f64) {
        let constr = match sense {
            Sense::Minimize => expr.leq(bound),
            Sense::Maximize => expr.geq(bound),
        };
        self.add_constr(name, constr);
    }

    /// Bounds the registered objective `objective` in the direction of its sense.
    /// Returns the sense of the objective that was bounded.
    pub fn add_bound_constraint(
        &mut self,
        name: &str,
        objective: &str,
        bound: f64,
    ) -> Result<Sense, ModelError> {
        let objective = self.objective(objective)?;
        let (expr, sense) = (objective.expr.clone(), objective.sense);
        self.add_bound(name, expr, sense, bound);
        Ok(sense)
    }

    pub fn evaluate(&self, expr: &Expression, solution: &Solution) -> f64 {
        expr.eval_with(solution)
    }

    pub fn evaluate_objective(&self, name: &str, solution: &Solution) -> Result<f64, ModelError> {
        Ok(self.evaluate(&self.objective(name)?.expr, solution))
    }

    /// The non-zero coefficients of `expr`, ordered by column
    pub fn coefficients(&self, expr: &Expression) -> Vec<(Var, f64)> {
        let columns = self.columns();
        expr.linear_coefficients()
            .into_iter()
            .filter(|&(_, coeff)| coeff != 0.0)
            .sorted_by_key(|(var, _)| columns.get(var).copied().unwrap_or(usize::MAX))
            .collect()
    }

    fn columns(&self) -> HashMap<Var, usize> {
        self.vars()
            .enumerate()
            .map(|(column, (var, _))| (var, column))
            .collect()
    }

    /// All constraint rows, variable bounds and integrality requirements violated by more than `tolerance`
    pub fn violations(&self, solution: &Solution, tolerance: f64) -> Vec<Violation> {
        let mut out = Vec::new();

        for (var, def) in self.vars() {
            let value = solution.value(var);
            let (lb, ub) = (def.get_min(), def.get_max());
            if value < lb - tolerance || value > ub + tolerance {
                out.push(Violation::Bound {
                    var: def.get_name().to_string(),
                    value,
                    lb,
                    ub,
                });
            }
            if def.is_integer() && (value - value.round()).abs() > tolerance {
                out.push(Violation::Integrality {
                    var: def.get_name().to_string(),
                    value,
                });
            }
        }

        for row in &self.constrs {
            let amount = row.violation(solution);
            if amount > tolerance {
                out.push(Violation::Constraint {
                    name: row.name.clone(),
                    lhs: (&row.expr).eval_with(solution),
                    sense: row.sense,
                    rhs: row.rhs,
                    amount,
                });
            }
        }

        out
    }

    /// Writes the model in CPLEX LP format, using the variable and constraint names.
    /// The active objective is written; without one, the first registered objective is used.
    pub fn write_lp<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let names: HashMap<Var, &str> = self.vars().map(|(v, def)| (v, def.get_name())).collect();

        writeln!(w, "\\ Model {}", self.name)?;
        for o in &self.objectives {
            writeln!(w, "\\ Objective {} ({})", o.name, o.sense)?;
        }

        let objective = self.active_objective().or_else(|| self.objectives.first());
        match objective {
            Some(o) => {
                let header = match o.sense {
                    Sense::Minimize => "Minimize",
                    Sense::Maximize => "Maximize",
                };
                writeln!(w, "{}", header)?;
                write!(w, " {}: ", o.name)?;
                self.write_terms(w, &names, &o.expr)?;
                let constant = o.expr.constant();
                if constant != 0.0 {
                    write!(w, " {} {}", sign(constant), constant.abs())?;
                }
                writeln!(w)?;
            }
            None => writeln!(w, "Minimize\n obj: ")?,
        }

        writeln!(w, "Subject To")?;
        for row in &self.constrs {
            write!(w, " {}: ", row.name)?;
            self.write_terms(w, &names, &row.expr)?;
            writeln!(w, " {} {}", row.sense, row.rhs)?;
        }

        writeln!(w, "Bounds")?;
        for (_, def) in self.vars().filter(|(_, d)| VarType::of(d) != VarType::Binary) {
            let (lb, ub, name) = (def.get_min(), def.get_max(), def.get_name());
            match (lb.is_finite(), ub.is_finite()) {
                (true, true) => writeln!(w, " {} <= {} <= {}", lb, name, ub)?,
                (true, false) => writeln!(w, " {} >= {}", name, lb)?,
                (false, true) => writeln!(w, " -inf <= {} <= {}", name, ub)?,
                (false, false) => writeln!(w, " {} free", name)?,
            }
        }

        for (header, vtype) in [("Generals", VarType::Integer), ("Binaries", VarType::Binary)] {
            let listed = self
                .vars()
                .filter(|(_, d)| VarType::of(d) == vtype)
                .map(|(_, d)| d.get_name())
                .collect::<Vec<_>>();
            if listed.is_empty() {
                continue;
            }
            writeln!(w, "{}", header)?;
            for chunk in listed.chunks(8) {
                writeln!(w, " {}", chunk.iter().join(" "))?;
            }
        }

        writeln!(w, "End")
    }

    fn write_terms<W: Write>(
        &self,
        w: &mut W,
        names: &HashMap<Var, &str>,
        expr: &Expression,
    ) -> std::io::Result<()> {
        let terms = self.coefficients(expr);
        if terms.is_empty() {
            // LP format needs at least one term on every row
            return match self.vars().next() {
                Some((_, def)) => write!(w, "0 {}", def.get_name()),
                None => write!(w, "0"),
            };
        }

        for (k, (var, coeff)) in terms.iter().enumerate() {
            let name = names.get(var).copied().unwrap_or("_");
            if k == 0 {
                write!(w, "{} {}", coeff, name)?;
            } else {
                write!(w, " {} {} {}", sign(*coeff), coeff.abs(), name)?;
            }
        }
        Ok(())
    }
}

fn sign(value: f64) -> char {
    if value < 0.0 {
        '-'
    } else {
        '+'
    }
}
