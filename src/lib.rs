//! Reschedules a rail timetable around a blocked single-track segment by
//! reformulating arrival/departure times as decision variables under
//! physical and operational constraints, minimizing total deviation from the
//! original plan. The numeric solver is an external collaborator behind
//! [`solver::SolverAdapter`]; a pure-Rust backend is bundled.

pub mod analysis;
pub mod builders;
pub mod model;
pub mod objective;
pub mod solver;
pub mod timetable;
pub mod variables;

pub use analysis::{analyze, EventOutcome, ScheduleAnalysis};
pub use model::{Constraint, ConstraintTag, LinExpr, ModelBuilder, RescheduleModel, Sense};
pub use solver::{Assignment, MicrolpSolver, SolverAdapter, SolverError};
pub use timetable::{
    BlockageWindow, InvalidInput, ModelParams, Station, StationId, StopEvent, Timetable,
    TimetableBuilder, Train, TrainId,
};
pub use variables::{EventKind, MissingVariable, VarId, VarKind, VarRole, Variable, VariableRegistry};
