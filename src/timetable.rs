use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use typed_index_collections::{TiSlice, TiVec};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct StationId(u32);

impl From<StationId> for usize {
    fn from(v: StationId) -> Self {
        v.0 as usize
    }
}

impl From<usize> for StationId {
    fn from(x: usize) -> Self {
        StationId(x as u32)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct TrainId(u32);

impl From<TrainId> for usize {
    fn from(v: TrainId) -> Self {
        v.0 as usize
    }
}

impl From<usize> for TrainId {
    fn from(x: usize) -> Self {
        TrainId(x as u32)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Station {
    pub name: String,
    pub platform_capacity: u32,
}

/// One scheduled visit of a train to a station. A missing arrival means the
/// train originates here, a missing departure means it terminates here, and
/// both missing means the train passes through without stopping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StopEvent {
    pub train: TrainId,
    pub station: StationId,
    pub scheduled_arrival: Option<f64>,
    pub scheduled_departure: Option<f64>,
}

impl StopEvent {
    pub fn scheduled(&self, kind: crate::variables::EventKind) -> Option<f64> {
        match kind {
            crate::variables::EventKind::Arrival => self.scheduled_arrival,
            crate::variables::EventKind::Departure => self.scheduled_departure,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Train {
    pub name: String,
    /// Indices into the flat event list, in traversal order.
    stops: Vec<usize>,
}

/// A single-track segment closed for an inclusive time window. Departures
/// scheduled inside the window at the segment's lower end are deferred to the
/// window end.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockageWindow {
    pub segment: (StationId, StationId),
    pub start: f64,
    pub end: f64,
}

/// Tunable model parameters. Defaults match the reference instance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub min_running_time: f64,
    pub min_dwell: f64,
    pub max_dwell: f64,
    pub headway: f64,
    pub arrival_weight: f64,
    pub departure_weight: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        ModelParams {
            min_running_time: 10.0,
            min_dwell: 2.0,
            max_dwell: 100.0,
            headway: 5.0,
            arrival_weight: 1.0,
            departure_weight: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InvalidInput {
    DuplicateStation(String),
    UnknownStation(String),
    NonAdjacentSegment(String, String),
    DuplicateStop { train: String, station: String },
    NonAdjacentStops { train: String, from: String, to: String },
    UndeclaredBlockageSegment(String, String),
    InvertedBlockageWindow { start: f64, end: f64 },
}

impl std::fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidInput::DuplicateStation(name) => write!(f, "station {} declared twice", name),
            InvalidInput::UnknownStation(name) => write!(f, "unknown station {}", name),
            InvalidInput::NonAdjacentSegment(a, b) => {
                write!(f, "segment {}-{} does not join adjacent stations", a, b)
            }
            InvalidInput::DuplicateStop { train, station } => {
                write!(f, "train {} stops twice at {}", train, station)
            }
            InvalidInput::NonAdjacentStops { train, from, to } => {
                write!(f, "train {} jumps from {} to {} without a declared segment", train, from, to)
            }
            InvalidInput::UndeclaredBlockageSegment(a, b) => {
                write!(f, "blockage refers to undeclared segment {}-{}", a, b)
            }
            InvalidInput::InvertedBlockageWindow { start, end } => {
                write!(f, "blockage window [{}, {}] is inverted", start, end)
            }
        }
    }
}

impl std::error::Error for InvalidInput {}

/// Validated, read-only network and schedule for one optimization run.
#[derive(Clone, Debug)]
pub struct Timetable {
    stations: TiVec<StationId, Station>,
    trains: TiVec<TrainId, Train>,
    /// Flat stop-event list in input order. The fixed-order conflict and
    /// headway rules key off this ordering.
    events: Vec<StopEvent>,
    /// Segments in their declared orientation (lower end first).
    segments: Vec<(StationId, StationId)>,
    segment_set: HashSet<(StationId, StationId)>,
    event_index: HashMap<(TrainId, StationId), usize>,
}

impl Timetable {
    pub fn stations(&self) -> &TiSlice<StationId, Station> {
        &self.stations
    }

    pub fn trains(&self) -> &TiSlice<TrainId, Train> {
        &self.trains
    }

    pub fn station(&self, id: StationId) -> &Station {
        &self.stations[id]
    }

    pub fn train(&self, id: TrainId) -> &Train {
        &self.trains[id]
    }

    pub fn station_id(&self, name: &str) -> Option<StationId> {
        self.stations
            .iter_enumerated()
            .find(|(_, s)| s.name == name)
            .map(|(id, _)| id)
    }

    pub fn train_id(&self, name: &str) -> Option<TrainId> {
        self.trains
            .iter_enumerated()
            .find(|(_, t)| t.name == name)
            .map(|(id, _)| id)
    }

    pub fn events(&self) -> &[StopEvent] {
        &self.events
    }

    pub fn event(&self, train: TrainId, station: StationId) -> Option<&StopEvent> {
        self.event_index.get(&(train, station)).map(|&i| &self.events[i])
    }

    /// Stop events of one train, in traversal order.
    pub fn train_stops(&self, train: TrainId) -> impl Iterator<Item = &StopEvent> + '_ {
        self.trains[train].stops.iter().map(move |&i| &self.events[i])
    }

    /// Segment membership, matching either orientation.
    pub fn is_segment(&self, a: StationId, b: StationId) -> bool {
        self.segment_set.contains(&(a, b)) || self.segment_set.contains(&(b, a))
    }

    /// The declared orientation of the segment joining `a` and `b`, if any.
    pub fn canonical_segment(&self, a: StationId, b: StationId) -> Option<(StationId, StationId)> {
        if self.segment_set.contains(&(a, b)) {
            Some((a, b))
        } else if self.segment_set.contains(&(b, a)) {
            Some((b, a))
        } else {
            None
        }
    }

    pub fn segments(&self) -> &[(StationId, StationId)] {
        &self.segments
    }

    /// Origin/terminal stations of the line. These are exempt from
    /// platform-capacity reasoning.
    pub fn is_endpoint(&self, station: StationId) -> bool {
        let idx: usize = station.into();
        idx == 0 || idx + 1 == self.stations.len()
    }

    /// Latest scheduled time anywhere in the timetable. Input to the
    /// horizon-derived Big-M constant.
    pub fn latest_scheduled_time(&self) -> f64 {
        self.events
            .iter()
            .flat_map(|e| [e.scheduled_arrival, e.scheduled_departure])
            .flatten()
            .fold(0.0, f64::max)
    }
}

struct RawStop {
    train: String,
    station: String,
    arrival: Option<f64>,
    departure: Option<f64>,
}

/// Explicit input-construction API. Stations, segments and stops are declared
/// in order; `build` validates everything up front so model construction
/// never fails halfway.
#[derive(Default)]
pub struct TimetableBuilder {
    stations: Vec<Station>,
    segments: Vec<(String, String)>,
    stops: Vec<RawStop>,
}

impl TimetableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a station. Declaration order is the physical order of the
    /// line; the first and last stations are the line's endpoints.
    pub fn station(&mut self, name: &str, platform_capacity: u32) -> &mut Self {
        self.stations.push(Station {
            name: name.to_string(),
            platform_capacity,
        });
        self
    }

    pub fn segment(&mut self, from: &str, to: &str) -> &mut Self {
        self.segments.push((from.to_string(), to.to_string()));
        self
    }

    /// Declare a stop event. Call order defines both each train's traversal
    /// order and the flat event order used by the fixed-order pair rules.
    pub fn stop(
        &mut self,
        train: &str,
        station: &str,
        arrival: Option<f64>,
        departure: Option<f64>,
    ) -> &mut Self {
        self.stops.push(RawStop {
            train: train.to_string(),
            station: station.to_string(),
            arrival,
            departure,
        });
        self
    }

    pub fn build(&self) -> Result<Timetable, InvalidInput> {
        let mut station_ids: HashMap<&str, StationId> = HashMap::new();
        for (idx, station) in self.stations.iter().enumerate() {
            if station_ids.insert(&station.name, idx.into()).is_some() {
                return Err(InvalidInput::DuplicateStation(station.name.clone()));
            }
        }

        let mut segments = Vec::new();
        let mut segment_set = HashSet::new();
        for (from, to) in &self.segments {
            let a = *station_ids
                .get(from.as_str())
                .ok_or_else(|| InvalidInput::UnknownStation(from.clone()))?;
            let b = *station_ids
                .get(to.as_str())
                .ok_or_else(|| InvalidInput::UnknownStation(to.clone()))?;
            let (ai, bi): (usize, usize) = (a.into(), b.into());
            if ai.abs_diff(bi) != 1 {
                return Err(InvalidInput::NonAdjacentSegment(from.clone(), to.clone()));
            }
            if segment_set.insert((a, b)) {
                segments.push((a, b));
            }
        }

        let mut trains: TiVec<TrainId, Train> = TiVec::new();
        let mut train_ids: HashMap<&str, TrainId> = HashMap::new();
        let mut events: Vec<StopEvent> = Vec::new();
        let mut event_index = HashMap::new();
        for stop in &self.stops {
            let station = *station_ids
                .get(stop.station.as_str())
                .ok_or_else(|| InvalidInput::UnknownStation(stop.station.clone()))?;
            let train = *train_ids.entry(stop.train.as_str()).or_insert_with(|| {
                let id: TrainId = trains.len().into();
                trains.push(Train {
                    name: stop.train.clone(),
                    stops: Vec::new(),
                });
                id
            });
            if event_index.insert((train, station), events.len()).is_some() {
                return Err(InvalidInput::DuplicateStop {
                    train: stop.train.clone(),
                    station: stop.station.clone(),
                });
            }
            if let Some(&prev) = trains[train].stops.last() {
                let prev_station = events[prev].station;
                let adjacent = segment_set.contains(&(prev_station, station))
                    || segment_set.contains(&(station, prev_station));
                if !adjacent {
                    return Err(InvalidInput::NonAdjacentStops {
                        train: stop.train.clone(),
                        from: self.stations[usize::from(prev_station)].name.clone(),
                        to: stop.station.clone(),
                    });
                }
            }
            trains[train].stops.push(events.len());
            events.push(StopEvent {
                train,
                station,
                scheduled_arrival: stop.arrival,
                scheduled_departure: stop.departure,
            });
        }

        Ok(Timetable {
            stations: self.stations.clone().into(),
            trains,
            events,
            segments,
            segment_set,
            event_index,
        })
    }
}
