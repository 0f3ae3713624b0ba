//! Solver adapter boundary. The model only needs linear (in)equalities and
//! binary variables, so any MILP backend can sit behind [`SolverAdapter`];
//! the bundled implementation uses `good_lp` with the pure-Rust microlp
//! solver.

use std::time::{Duration, Instant};

use good_lp::{constraint, default_solver, variable, variables, Expression, Solution, SolverModel};
use log::debug;
use typed_index_collections::TiVec;

use crate::model::{RescheduleModel, Sense};
use crate::variables::{VarId, VarKind};

#[derive(Debug)]
pub enum SolverError {
    /// No feasible assignment exists. Surfaced verbatim; constraints are
    /// never dropped to recover.
    Infeasible,
    Unbounded,
    Timeout,
    Backend(String),
}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverError::Infeasible => write!(f, "model is infeasible"),
            SolverError::Unbounded => write!(f, "model is unbounded"),
            SolverError::Timeout => write!(f, "solver exceeded its time limit"),
            SolverError::Backend(msg) => write!(f, "solver backend error: {}", msg),
        }
    }
}

impl std::error::Error for SolverError {}

/// An optimal variable assignment.
#[derive(Clone, Debug)]
pub struct Assignment {
    values: TiVec<VarId, f64>,
    pub objective_value: f64,
}

impl Assignment {
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var]
    }
}

pub trait SolverAdapter {
    /// Solve the assembled model. `Ok` means proven optimal; every failure
    /// mode is a distinguishable [`SolverError`].
    fn solve(
        &self,
        model: &RescheduleModel,
        time_limit: Option<Duration>,
    ) -> Result<Assignment, SolverError>;
}

/// `good_lp`/microlp backend. microlp cannot be interrupted mid-solve, so
/// the time limit is checked when the solve returns; a solve that finished
/// late is reported as [`SolverError::Timeout`] rather than silently
/// accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct MicrolpSolver;

impl SolverAdapter for MicrolpSolver {
    fn solve(
        &self,
        model: &RescheduleModel,
        time_limit: Option<Duration>,
    ) -> Result<Assignment, SolverError> {
        let start = Instant::now();

        let mut vars = variables!();
        let lp_vars: TiVec<VarId, good_lp::Variable> = model
            .variables()
            .iter()
            .map(|v| match v.kind {
                VarKind::Continuous { lower_bound } => vars.add(variable().min(lower_bound)),
                VarKind::Binary => vars.add(variable().binary()),
            })
            .collect();

        let objective = model
            .objective()
            .terms
            .iter()
            .fold(Expression::from(0.0), |acc, &(var, coeff)| {
                acc + coeff * lp_vars[var]
            });

        let mut problem = vars.minimise(objective).using(default_solver);
        for c in model.constraints() {
            let lhs = c
                .expr
                .terms
                .iter()
                .fold(Expression::from(0.0), |acc, &(var, coeff)| {
                    acc + coeff * lp_vars[var]
                });
            problem = problem.with(match c.sense {
                Sense::Le => constraint!(lhs <= c.rhs),
                Sense::Ge => constraint!(lhs >= c.rhs),
                Sense::Eq => constraint!(lhs == c.rhs),
            });
        }

        let solution = problem.solve().map_err(|err| match err {
            good_lp::ResolutionError::Infeasible => SolverError::Infeasible,
            good_lp::ResolutionError::Unbounded => SolverError::Unbounded,
            other => SolverError::Backend(other.to_string()),
        })?;

        let elapsed = start.elapsed();
        if let Some(limit) = time_limit {
            if elapsed > limit {
                return Err(SolverError::Timeout);
            }
        }

        let values: TiVec<VarId, f64> = lp_vars.iter().map(|&var| solution.value(var)).collect();
        let objective_value = model.objective().eval(|var| values[var]);
        debug!(
            "solved: objective {} in {:.3}s",
            objective_value,
            elapsed.as_secs_f64()
        );
        Ok(Assignment { values, objective_value })
    }
}
