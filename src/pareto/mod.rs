//! Epsilon-constraint tracing of the tradeoff between two objectives of a [`Mip`].
//!
//! A run goes through `INIT -> EXTREMES -> GRID -> SWEEP (x2) -> DEDUP -> DONE`. Every solve works on its
//! own clone of the base model, so neither activated objectives nor bound constraints leak between steps.

use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use float_ord::FloatOrd;
use good_lp::Expression;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::models::mip::{Mip, ModelError, Sense, Solution};
use crate::models::network::{NetworkModel, PunctualityForm, COST, PUNCTUALITY};
use crate::oracle::{Oracle, OracleError, OracleOptions, SolverStatus, TerminationCondition};
use crate::problem::{Problem, ProblemConstructionError, ProblemData};

/// Name of the auxiliary constraint bounding the constrained objective during a sweep
pub const EPSILON_CONSTRAINT: &str = "epsilon_constraint";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// Number of bound values in each sweep
    pub grid_points: usize,
    /// Decimal places kept when comparing objective pairs during deduplication
    pub precision: u32,
    pub options: OracleOptions,
}

impl Default for TracerConfig {
    fn default() -> Self {
        TracerConfig {
            grid_points: 10,
            precision: 8,
            options: OracleOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    #[display(fmt = "INIT")]
    Init,
    #[display(fmt = "EXTREMES")]
    Extremes,
    #[display(fmt = "GRID")]
    Grid,
    #[display(fmt = "SWEEP ({})", _0)]
    Sweep(usize),
    #[display(fmt = "DEDUP")]
    Dedup,
    #[display(fmt = "DONE")]
    Done,
}

/// The values of both objectives at each objective's own optimum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremes {
    pub obj1_min: f64,
    pub obj2_at_obj1_min: f64,
    pub obj1_at_obj2_min: f64,
    pub obj2_min: f64,
}

impl Extremes {
    /// The range spanned by the first objective over both extreme solutions
    pub fn obj1_range(&self) -> (f64, f64) {
        ordered(self.obj1_min, self.obj1_at_obj2_min)
    }

    /// The range spanned by the second objective over both extreme solutions
    pub fn obj2_range(&self) -> (f64, f64) {
        ordered(self.obj2_min, self.obj2_at_obj1_min)
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    (a.min(b), a.max(b))
}

/// One solve of a sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeoffRow {
    pub epsilon: f64,
    pub obj1_value: Option<f64>,
    pub obj2_value: Option<f64>,
    pub constrained_value: Option<f64>,
    /// `epsilon - constrained_value` when minimizing, `constrained_value - epsilon` when maximizing
    pub slack: Option<f64>,
    pub termination_status: TerminationCondition,
    pub solver_status: SolverStatus,
    pub constrained_sense: Sense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub extremes: Extremes,
    pub obj1_grid: Vec<f64>,
    pub obj2_grid: Vec<f64>,
    /// Minimizing the first objective with the second one bounded
    pub sweep_obj1: Vec<TradeoffRow>,
    /// Minimizing the second objective with the first one bounded
    pub sweep_obj2: Vec<TradeoffRow>,
    pub pareto: Vec<TradeoffRow>,
}

#[derive(Debug, Display, From)]
pub enum TraceError {
    #[display(fmt = "invalid instance: {}", _0)]
    Data(ProblemConstructionError),
    #[display(fmt = "{}", _0)]
    Model(ModelError),
    #[display(fmt = "{}", _0)]
    Oracle(OracleError),
    #[display(fmt = "solving for {} ended with `{}`", objective, termination)]
    #[from(ignore)]
    ExtremeNotSolved {
        objective: String,
        termination: TerminationCondition,
    },
    #[display(fmt = "invalid tracer configuration: {}", _0)]
    #[from(ignore)]
    InvalidConfig(String),
}

impl std::error::Error for TraceError {}

/// Evenly spaced values from `lo` to `hi`, both included. A single point grid is `[lo]`.
pub fn grid(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n)
                .map(|k| match k == n - 1 {
                    true => hi,
                    false => lo + step * k as f64,
                })
                .collect()
        }
    }
}

fn round_key(value: Option<f64>, scale: f64) -> Option<FloatOrd<f64>> {
    // adding 0.0 turns -0.0 into 0.0
    value.map(|v| FloatOrd((v * scale).round() / scale + 0.0))
}

/// Drops rows whose objective pair equals, after rounding to `precision` decimals, that of an earlier row
pub fn dedup(rows: &[TradeoffRow], precision: u32) -> Vec<TradeoffRow> {
    let scale = 10f64.powi(precision as i32);
    let mut seen = BTreeSet::new();
    rows.iter()
        .filter(|row| {
            seen.insert((
                round_key(row.obj1_value, scale),
                round_key(row.obj2_value, scale),
            ))
        })
        .cloned()
        .collect()
}

/// Traces the tradeoff between two named objectives of a base model
pub struct ParetoTracer {
    base: Mip,
    first: String,
    second: String,
    config: TracerConfig,
}

impl ParetoTracer {
    pub fn new(
        base: Mip,
        first: &str,
        second: &str,
        config: TracerConfig,
    ) -> Result<ParetoTracer, TraceError> {
        if config.grid_points == 0 {
            return Err(TraceError::InvalidConfig(
                "grid_points must be at least 1".to_string(),
            ));
        }
        if first == second {
            return Err(TraceError::InvalidConfig(format!(
                "the two objectives must differ, got `{}` twice",
                first
            )));
        }
        base.objective(first)?;
        base.objective(second)?;

        Ok(ParetoTracer {
            base,
            first: first.to_string(),
            second: second.to_string(),
            config,
        })
    }

    /// Validates an instance and traces network cost against punctuality on its network design model
    pub fn network(
        data: ProblemData,
        form: PunctualityForm,
        config: TracerConfig,
    ) -> Result<ParetoTracer, TraceError> {
        let problem = Problem::new(data)?;
        let network = NetworkModel::create_instance(&problem, form);
        ParetoTracer::new(network.model, COST, PUNCTUALITY, config)
    }

    pub fn base(&self) -> &Mip {
        &self.base
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    pub fn run(&self, oracle: &mut dyn Oracle) -> Result<ParetoReport, TraceError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            "pareto run {} on `{}` with {}: {}",
            run_id,
            self.base.name(),
            oracle.name(),
            Phase::Init
        );

        info!("pareto run {}: {}", run_id, Phase::Extremes);
        let extremes = self.extremes(oracle)?;
        info!(
            "{} in [{}, {}], {} in [{}, {}]",
            self.first,
            extremes.obj1_min,
            extremes.obj1_at_obj2_min,
            self.second,
            extremes.obj2_min,
            extremes.obj2_at_obj1_min
        );

        info!("pareto run {}: {}", run_id, Phase::Grid);
        let n = self.config.grid_points;
        let (lo, hi) = extremes.obj1_range();
        let obj1_grid = grid(lo, hi, n);
        let (lo, hi) = extremes.obj2_range();
        let obj2_grid = grid(lo, hi, n);

        info!("pareto run {}: {}", run_id, Phase::Sweep(1));
        let sweep_obj1 = self.sweep(oracle, &self.first, &self.second, &obj2_grid)?;
        info!("pareto run {}: {}", run_id, Phase::Sweep(2));
        let sweep_obj2 = self.sweep(oracle, &self.second, &self.first, &obj1_grid)?;

        info!("pareto run {}: {}", run_id, Phase::Dedup);
        let all: Vec<TradeoffRow> = sweep_obj1.iter().chain(&sweep_obj2).cloned().collect();
        let pareto = dedup(&all, self.config.precision);

        info!(
            "pareto run {}: {} with {} distinct points out of {} rows",
            run_id,
            Phase::Done,
            pareto.len(),
            all.len()
        );

        Ok(ParetoReport {
            run_id,
            started_at,
            extremes,
            obj1_grid,
            obj2_grid,
            sweep_obj1,
            sweep_obj2,
            pareto,
        })
    }

    /// Optimizes `objective` alone and returns the accepted solution
    fn optimize(&self, oracle: &mut dyn Oracle, objective: &str) -> Result<Solution, TraceError> {
        let mut model = self.base.clone();
        model.activate_objective(objective)?;

        let outcome = oracle.solve(&model)?;
        match outcome.accepted() {
            Some(solution) => Ok(solution.clone()),
            None => Err(TraceError::ExtremeNotSolved {
                objective: objective.to_string(),
                termination: outcome.termination,
            }),
        }
    }

    /// Solves for each objective on its own and evaluates both objectives at the two solutions
    pub fn extremes(&self, oracle: &mut dyn Oracle) -> Result<Extremes, TraceError> {
        let at_first = self.optimize(oracle, &self.first)?;
        let at_second = self.optimize(oracle, &self.second)?;
        let first = &self.base.objective(&self.first)?.expr;
        let second = &self.base.objective(&self.second)?.expr;

        Ok(Extremes {
            obj1_min: self.base.evaluate(first, &at_first),
            obj2_at_obj1_min: self.base.evaluate(second, &at_first),
            obj1_at_obj2_min: self.base.evaluate(first, &at_second),
            obj2_min: self.base.evaluate(second, &at_second),
        })
    }

    /// Optimizes `main` once per bound value with `constrained` bounded by that value.
    ///
    /// A step that does not end optimally is recorded as it is; only failures of the oracle itself abort.
    pub fn sweep(
        &self,
        oracle: &mut dyn Oracle,
        main: &str,
        constrained: &str,
        epsilons: &[f64],
    ) -> Result<Vec<TradeoffRow>, TraceError> {
        let mut rows = Vec::with_capacity(epsilons.len());
        let bounded = self.base.objective(constrained)?;
        let constrained_sense = bounded.sense;
        let first = &self.base.objective(&self.first)?.expr;
        let second = &self.base.objective(&self.second)?.expr;

        for &epsilon in epsilons {
            let mut model = self.base.clone();
            model.activate_objective(main)?;
            model.add_bound(
                EPSILON_CONSTRAINT,
                bounded.expr.clone(),
                constrained_sense,
                epsilon,
            );

            let outcome = oracle.solve(&model)?;
            if !outcome.termination.is_acceptable() {
                warn!(
                    "{} with {} bounded by {} ended with `{}` ({})",
                    main, constrained, epsilon, outcome.termination, outcome.status
                );
            }

            let value = |expr: &Expression| {
                outcome
                    .solution
                    .as_ref()
                    .map(|s| self.base.evaluate(expr, s))
            };
            let obj1_value = value(first);
            let obj2_value = value(second);
            let constrained_value = match constrained == self.first {
                true => obj1_value,
                false => obj2_value,
            };
            let slack = constrained_value.map(|v| match constrained_sense {
                Sense::Minimize => epsilon - v,
                Sense::Maximize => v - epsilon,
            });

            debug!(
                "eps = {}: {} = {:?}, {} = {:?}, slack = {:?}",
                epsilon, self.first, obj1_value, self.second, obj2_value, slack
            );

            rows.push(TradeoffRow {
                epsilon,
                obj1_value,
                obj2_value,
                constrained_value,
                slack,
                termination_status: outcome.termination,
                solver_status: outcome.status,
                constrained_sense,
            });
        }

        Ok(rows)
    }
}
