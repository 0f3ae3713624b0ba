use log::debug;
use typed_index_collections::TiSlice;

use crate::builders::{self, BuilderCtx};
use crate::objective;
use crate::timetable::{
    BlockageWindow, InvalidInput, ModelParams, StationId, Timetable, TrainId,
};
use crate::variables::{EventKind, MissingVariable, VarId, Variable, VariableRegistry};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

/// A linear expression over decision variables; the constant part lives on
/// the constraint's right-hand side.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct LinExpr {
    pub terms: Vec<(VarId, f64)>,
}

impl LinExpr {
    pub fn term(var: VarId, coeff: f64) -> Self {
        LinExpr { terms: vec![(var, coeff)] }
    }

    pub fn with(mut self, var: VarId, coeff: f64) -> Self {
        self.terms.push((var, coeff));
        self
    }

    /// `a - b`.
    pub fn diff(a: VarId, b: VarId) -> Self {
        LinExpr::term(a, 1.0).with(b, -1.0)
    }

    pub fn eval(&self, value: impl Fn(VarId) -> f64) -> f64 {
        self.terms.iter().map(|&(v, c)| c * value(v)).sum()
    }
}

/// Structured constraint identity: (kind, participants). Unique within a
/// model and derived deterministically from the input, so regenerating the
/// model reproduces the same tags. Display strings exist only for reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintTag {
    /// `departure(follower, lower) >= arrival(leader, upper)`.
    SingleTrack { leader: TrainId, follower: TrainId, lower: StationId, upper: StationId },
    /// Departure deferred past the blockage window.
    BlockedDeparture { train: TrainId, station: StationId },
    /// Big-M link forcing the occupancy indicator on while the train dwells.
    OccupancyOnset { train: TrainId, station: StationId },
    OccupancyRelease { train: TrainId, station: StationId },
    /// Sum of occupancy indicators bounded by platform count.
    PlatformCapacity { station: StationId },
    /// `departure(first) <= arrival(second) + M * occupancy(second)`.
    PlatformNoOverlap { first: TrainId, second: TrainId, station: StationId },
    RunningTime { train: TrainId, from: StationId, to: StationId },
    MinDwell { train: TrainId, station: StationId },
    MaxDwell { train: TrainId, station: StationId },
    DepartureHeadway { leader: TrainId, follower: TrainId, station: StationId },
    ArrivalHeadway { leader: TrainId, follower: TrainId, station: StationId },
    /// `deviation >= time - scheduled`.
    DeviationAbove { train: TrainId, station: StationId, kind: EventKind },
    /// `deviation >= scheduled - time`.
    DeviationBelow { train: TrainId, station: StationId, kind: EventKind },
    /// Externally imposed departure time (disruption what-if).
    FixedDeparture { train: TrainId, station: StationId },
}

impl ConstraintTag {
    /// Human-readable label, derived at the reporting boundary.
    pub fn describe(&self, tt: &Timetable) -> String {
        let train = |t: &TrainId| tt.train(*t).name.as_str();
        let station = |s: &StationId| tt.station(*s).name.as_str();
        match self {
            ConstraintTag::SingleTrack { leader, follower, lower, upper } => format!(
                "single_track_{}_{}_{}_to_{}",
                train(leader), train(follower), station(lower), station(upper)
            ),
            ConstraintTag::BlockedDeparture { train: t, station: s } => {
                format!("block_departure_{}_{}", train(t), station(s))
            }
            ConstraintTag::OccupancyOnset { train: t, station: s } => {
                format!("occupancy_onset_{}_{}", train(t), station(s))
            }
            ConstraintTag::OccupancyRelease { train: t, station: s } => {
                format!("occupancy_release_{}_{}", train(t), station(s))
            }
            ConstraintTag::PlatformCapacity { station: s } => {
                format!("platform_capacity_{}", station(s))
            }
            ConstraintTag::PlatformNoOverlap { first, second, station: s } => format!(
                "no_overlap_{}_{}_{}",
                train(first), train(second), station(s)
            ),
            ConstraintTag::RunningTime { train: t, from, to } => format!(
                "running_{}_{}_to_{}",
                train(t), station(from), station(to)
            ),
            ConstraintTag::MinDwell { train: t, station: s } => {
                format!("min_dwell_{}_{}", train(t), station(s))
            }
            ConstraintTag::MaxDwell { train: t, station: s } => {
                format!("max_dwell_{}_{}", train(t), station(s))
            }
            ConstraintTag::DepartureHeadway { leader, follower, station: s } => format!(
                "headway_departure_{}_{}_{}",
                train(leader), train(follower), station(s)
            ),
            ConstraintTag::ArrivalHeadway { leader, follower, station: s } => format!(
                "headway_arrival_{}_{}_{}",
                train(leader), train(follower), station(s)
            ),
            ConstraintTag::DeviationAbove { train: t, station: s, kind } => {
                format!("{}_deviation_above_{}_{}", kind, train(t), station(s))
            }
            ConstraintTag::DeviationBelow { train: t, station: s, kind } => {
                format!("{}_deviation_below_{}_{}", kind, train(t), station(s))
            }
            ConstraintTag::FixedDeparture { train: t, station: s } => {
                format!("fixed_departure_{}_{}", train(t), station(s))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub tag: ConstraintTag,
    pub expr: LinExpr,
    pub sense: Sense,
    pub rhs: f64,
}

/// Fully assembled model: variables, constraints and objective, immutable
/// after construction. A run is build-then-solve-then-read.
#[derive(Clone, Debug)]
pub struct RescheduleModel {
    registry: VariableRegistry,
    constraints: Vec<Constraint>,
    objective: LinExpr,
    big_m: f64,
}

impl RescheduleModel {
    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    pub fn variables(&self) -> &TiSlice<VarId, Variable> {
        self.registry.variables()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    pub fn big_m(&self) -> f64 {
        self.big_m
    }
}

/// Translates a timetable plus a disruption into the constraint system and
/// deviation objective. Input is validated up front; builders then cannot
/// fail, they only skip inapplicable constraints.
#[derive(Debug)]
pub struct ModelBuilder<'a> {
    timetable: &'a Timetable,
    params: &'a ModelParams,
    blockage: BlockageWindow,
    registry: VariableRegistry,
    pins: Vec<(TrainId, StationId, f64)>,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(
        timetable: &'a Timetable,
        blockage: &BlockageWindow,
        params: &'a ModelParams,
    ) -> Result<Self, InvalidInput> {
        if blockage.start > blockage.end {
            return Err(InvalidInput::InvertedBlockageWindow {
                start: blockage.start,
                end: blockage.end,
            });
        }
        let (a, b) = blockage.segment;
        let segment = timetable.canonical_segment(a, b).ok_or_else(|| {
            InvalidInput::UndeclaredBlockageSegment(
                timetable.station(a).name.clone(),
                timetable.station(b).name.clone(),
            )
        })?;
        Ok(ModelBuilder {
            timetable,
            params,
            blockage: BlockageWindow { segment, ..*blockage },
            registry: VariableRegistry::from_timetable(timetable),
            pins: Vec::new(),
        })
    }

    /// Pin a departure to an absolute time with an equality constraint.
    pub fn pin_departure(
        &mut self,
        train: TrainId,
        station: StationId,
        time: f64,
    ) -> Result<&mut Self, MissingVariable> {
        self.registry.require(train, station, EventKind::Departure)?;
        self.pins.push((train, station, time));
        Ok(self)
    }

    /// Delay a departure by `delay` relative to its scheduled time.
    pub fn delay_departure(
        &mut self,
        train: TrainId,
        station: StationId,
        delay: f64,
    ) -> Result<&mut Self, MissingVariable> {
        let scheduled = self
            .timetable
            .event(train, station)
            .and_then(|e| e.scheduled_departure)
            .ok_or(MissingVariable {
                train,
                station,
                kind: EventKind::Departure,
            })?;
        self.pin_departure(train, station, scheduled + delay)
    }

    /// One shared Big-M, strictly above any time a deviation-minimizing
    /// solution can take within the instance horizon.
    fn horizon_big_m(&self) -> f64 {
        let latest = self
            .pins
            .iter()
            .map(|&(_, _, t)| t)
            .fold(
                self.timetable.latest_scheduled_time().max(self.blockage.end),
                f64::max,
            );
        2.0 * (latest + self.params.max_dwell + self.params.min_running_time + self.params.headway)
    }

    pub fn build(mut self) -> RescheduleModel {
        let big_m = self.horizon_big_m();
        let mut constraints = Vec::new();
        let mut objective = LinExpr::default();
        {
            let mut ctx = BuilderCtx {
                timetable: self.timetable,
                params: self.params,
                blockage: &self.blockage,
                registry: &mut self.registry,
                constraints: &mut constraints,
                objective: &mut objective,
                big_m,
            };
            builders::single_track::add_single_track_constraints(&mut ctx);
            builders::blockage::add_blockage_constraints(&mut ctx);
            builders::capacity::add_capacity_constraints(&mut ctx);
            builders::running_time::add_running_time_constraints(&mut ctx);
            builders::dwell::add_dwell_constraints(&mut ctx);
            builders::headway::add_headway_constraints(&mut ctx);
            for &(train, station, time) in &self.pins {
                // Presence was checked when the pin was recorded.
                if let Some(var) = ctx.var(train, station, EventKind::Departure) {
                    ctx.push(
                        ConstraintTag::FixedDeparture { train, station },
                        LinExpr::term(var, 1.0),
                        Sense::Eq,
                        time,
                    );
                }
            }
            objective::add_deviation_objective(&mut ctx);
        }
        debug!(
            "assembled model: {} variables, {} constraints, big-M {}",
            self.registry.len(),
            constraints.len(),
            big_m
        );
        RescheduleModel {
            registry: self.registry,
            constraints,
            objective,
            big_m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::TimetableBuilder;
    use std::collections::HashSet;

    fn small_instance() -> (Timetable, BlockageWindow, ModelParams) {
        let mut b = TimetableBuilder::new();
        b.station("A", 30).station("B", 6).station("C", 30);
        b.segment("A", "B").segment("B", "C");
        b.stop("T1", "A", None, Some(0.0))
            .stop("T1", "B", Some(15.0), Some(19.0))
            .stop("T1", "C", Some(34.0), None)
            .stop("T2", "A", None, Some(25.0))
            .stop("T2", "B", Some(40.0), Some(44.0))
            .stop("T2", "C", Some(59.0), None);
        let tt = b.build().unwrap();
        let blockage = BlockageWindow {
            segment: (tt.station_id("A").unwrap(), tt.station_id("B").unwrap()),
            start: 10.0,
            end: 30.0,
        };
        (tt, blockage, ModelParams::default())
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let (tt, blockage, params) = small_instance();
        let m1 = ModelBuilder::new(&tt, &blockage, &params).unwrap().build();
        let m2 = ModelBuilder::new(&tt, &blockage, &params).unwrap().build();
        assert_eq!(m1.constraints(), m2.constraints());
        assert_eq!(m1.objective(), m2.objective());
        assert_eq!(m1.variables().len(), m2.variables().len());
    }

    #[test]
    fn tags_are_unique() {
        let (tt, blockage, params) = small_instance();
        let model = ModelBuilder::new(&tt, &blockage, &params).unwrap().build();
        let mut seen = HashSet::new();
        for c in model.constraints() {
            assert!(seen.insert(c.tag), "duplicate tag {:?}", c.tag);
        }
    }

    #[test]
    fn big_m_dominates_horizon() {
        let (tt, blockage, params) = small_instance();
        let mut builder = ModelBuilder::new(&tt, &blockage, &params).unwrap();
        let t1 = tt.train_id("T1").unwrap();
        let b = tt.station_id("B").unwrap();
        builder.delay_departure(t1, b, 500.0).unwrap();
        let model = builder.build();
        assert!(model.big_m() > 519.0 + params.max_dwell);
    }

    #[test]
    fn rejects_undeclared_blockage_segment() {
        let (tt, _, params) = small_instance();
        let bad = BlockageWindow {
            segment: (tt.station_id("A").unwrap(), tt.station_id("C").unwrap()),
            start: 0.0,
            end: 1.0,
        };
        assert!(matches!(
            ModelBuilder::new(&tt, &bad, &params).unwrap_err(),
            InvalidInput::UndeclaredBlockageSegment(..)
        ));
    }

    #[test]
    fn rejects_inverted_window() {
        let (tt, blockage, params) = small_instance();
        let bad = BlockageWindow { start: 50.0, end: 10.0, ..blockage };
        assert!(matches!(
            ModelBuilder::new(&tt, &bad, &params).unwrap_err(),
            InvalidInput::InvertedBlockageWindow { .. }
        ));
    }

    #[test]
    fn pin_on_pass_through_is_missing_variable() {
        let mut b = TimetableBuilder::new();
        b.station("A", 1).station("B", 1).station("C", 1);
        b.segment("A", "B").segment("B", "C");
        b.stop("T1", "A", None, Some(0.0))
            .stop("T1", "B", None, None)
            .stop("T1", "C", Some(20.0), None);
        let tt = b.build().unwrap();
        let blockage = BlockageWindow {
            segment: (tt.station_id("A").unwrap(), tt.station_id("B").unwrap()),
            start: 0.0,
            end: 5.0,
        };
        let params = ModelParams::default();
        let mut builder = ModelBuilder::new(&tt, &blockage, &params).unwrap();
        let t1 = tt.train_id("T1").unwrap();
        let b_station = tt.station_id("B").unwrap();
        let err = builder.delay_departure(t1, b_station, 10.0).unwrap_err();
        assert_eq!(err.kind, EventKind::Departure);
        assert_eq!(err.describe(&tt), "no departure variable for train T1 at station B");
    }

    #[test]
    fn labels_render_at_reporting_boundary() {
        let (tt, blockage, params) = small_instance();
        let model = ModelBuilder::new(&tt, &blockage, &params).unwrap().build();
        let t1 = tt.train_id("T1").unwrap();
        let b = tt.station_id("B").unwrap();
        let tag = ConstraintTag::MinDwell { train: t1, station: b };
        assert!(model.constraints().iter().any(|c| c.tag == tag));
        assert_eq!(tag.describe(&tt), "min_dwell_T1_B");
    }
}
