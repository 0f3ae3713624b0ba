//! The constraint builders. Each one is a pass over the timetable that
//! appends uniquely tagged constraints; a missing decision variable means
//! "constraint not applicable" and is skipped, never an error.

pub mod blockage;
pub mod capacity;
pub mod dwell;
pub mod headway;
pub mod running_time;
pub mod single_track;

use crate::model::{Constraint, ConstraintTag, LinExpr, Sense};
use crate::timetable::{BlockageWindow, ModelParams, StationId, Timetable, TrainId};
use crate::variables::{EventKind, VarId, VariableRegistry};

/// Shared state handed to every builder. Builders are read-only over the
/// timetable and write to disjoint tag namespaces.
pub(crate) struct BuilderCtx<'a> {
    pub timetable: &'a Timetable,
    pub params: &'a ModelParams,
    /// Canonicalized: segment stored in its declared orientation.
    pub blockage: &'a BlockageWindow,
    pub registry: &'a mut VariableRegistry,
    pub constraints: &'a mut Vec<Constraint>,
    pub objective: &'a mut LinExpr,
    pub big_m: f64,
}

impl BuilderCtx<'_> {
    pub fn var(&self, train: TrainId, station: StationId, kind: EventKind) -> Option<VarId> {
        self.registry.lookup(train, station, kind)
    }

    pub fn push(&mut self, tag: ConstraintTag, expr: LinExpr, sense: Sense, rhs: f64) {
        self.constraints.push(Constraint { tag, expr, sense, rhs });
    }
}
