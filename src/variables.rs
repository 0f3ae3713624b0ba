use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use typed_index_collections::{TiSlice, TiVec};

use crate::timetable::{StationId, Timetable, TrainId};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct VarId(u32);

impl From<VarId> for usize {
    fn from(v: VarId) -> Self {
        v.0 as usize
    }
}

impl From<usize> for VarId {
    fn from(x: usize) -> Self {
        VarId(x as u32)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum EventKind {
    Arrival,
    Departure,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Arrival => write!(f, "arrival"),
            EventKind::Departure => write!(f, "departure"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VarKind {
    Continuous { lower_bound: f64 },
    Binary,
}

/// What a variable stands for. Identity for debugging and reporting; the
/// solver adapter only cares about `VarKind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarRole {
    EventTime { train: TrainId, station: StationId, kind: EventKind },
    Deviation { train: TrainId, station: StationId, kind: EventKind },
    Occupancy { train: TrainId, station: StationId },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Variable {
    pub role: VarRole,
    pub kind: VarKind,
}

/// A constraint builder referenced a (train, station, kind) that was never
/// scheduled. Builders treat this as "not applicable" and skip; explicit
/// operations surface it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MissingVariable {
    pub train: TrainId,
    pub station: StationId,
    pub kind: EventKind,
}

impl MissingVariable {
    pub fn describe(&self, timetable: &Timetable) -> String {
        format!(
            "no {} variable for train {} at station {}",
            self.kind,
            timetable.train(self.train).name,
            timetable.station(self.station).name
        )
    }
}

impl std::fmt::Display for MissingVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no {} variable for train #{:?} at station #{:?}",
            self.kind, self.train, self.station
        )
    }
}

impl std::error::Error for MissingVariable {}

/// Allocates exactly one non-negative time variable per scheduled arrival or
/// departure, keyed by (train, station, kind), plus the auxiliary variables
/// the capacity and objective builders create.
#[derive(Clone, Debug)]
pub struct VariableRegistry {
    vars: TiVec<VarId, Variable>,
    times: HashMap<(TrainId, StationId, EventKind), VarId>,
}

impl VariableRegistry {
    pub fn from_timetable(timetable: &Timetable) -> Self {
        let mut registry = VariableRegistry {
            vars: TiVec::new(),
            times: HashMap::new(),
        };
        for event in timetable.events() {
            for kind in [EventKind::Arrival, EventKind::Departure] {
                if event.scheduled(kind).is_some() {
                    let id = registry.add(Variable {
                        role: VarRole::EventTime {
                            train: event.train,
                            station: event.station,
                            kind,
                        },
                        kind: VarKind::Continuous { lower_bound: 0.0 },
                    });
                    registry.times.insert((event.train, event.station, kind), id);
                }
            }
        }
        registry
    }

    /// O(1) lookup; `None` is the MissingVariable condition.
    pub fn lookup(&self, train: TrainId, station: StationId, kind: EventKind) -> Option<VarId> {
        self.times.get(&(train, station, kind)).copied()
    }

    pub fn require(
        &self,
        train: TrainId,
        station: StationId,
        kind: EventKind,
    ) -> Result<VarId, MissingVariable> {
        self.lookup(train, station, kind)
            .ok_or(MissingVariable { train, station, kind })
    }

    pub fn add_auxiliary(&mut self, role: VarRole, kind: VarKind) -> VarId {
        self.add(Variable { role, kind })
    }

    pub fn variables(&self) -> &TiSlice<VarId, Variable> {
        &self.vars
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    fn add(&mut self, variable: Variable) -> VarId {
        let id: VarId = self.vars.len().into();
        self.vars.push(variable);
        id
    }
}
