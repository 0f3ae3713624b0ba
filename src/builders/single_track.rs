use log::debug;

use super::BuilderCtx;
use crate::model::{ConstraintTag, LinExpr, Sense};
use crate::variables::EventKind;

/// Orders any two trains that could contend for a shared single-track
/// segment: for flat-event pairs (i, j) with i < j whose stations span a
/// declared segment (either orientation), the later-indexed train may not
/// depart the pair's lower station before the earlier one has arrived at the
/// upper station.
///
/// The pair direction is fixed by input-sequence position, not by solved
/// times or an explicit train heading (the timetable encodes none). This
/// over-constrains rather than risking two trains meeting on the segment.
pub(crate) fn add_single_track_constraints(ctx: &mut BuilderCtx) {
    let events = ctx.timetable.events();
    for i in 0..events.len() {
        for j in (i + 1)..events.len() {
            let (a, b) = (events[i], events[j]);
            if a.train == b.train || a.station == b.station {
                continue;
            }
            if !ctx.timetable.is_segment(a.station, b.station) {
                continue;
            }
            let departure = ctx.var(b.train, a.station, EventKind::Departure);
            let arrival = ctx.var(a.train, b.station, EventKind::Arrival);
            let (Some(departure), Some(arrival)) = (departure, arrival) else {
                debug!(
                    "single-track: skipping {}/{} over {}-{}, variable missing",
                    ctx.timetable.train(a.train).name,
                    ctx.timetable.train(b.train).name,
                    ctx.timetable.station(a.station).name,
                    ctx.timetable.station(b.station).name,
                );
                continue;
            };
            ctx.push(
                ConstraintTag::SingleTrack {
                    leader: a.train,
                    follower: b.train,
                    lower: a.station,
                    upper: b.station,
                },
                LinExpr::diff(departure, arrival),
                Sense::Ge,
                0.0,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{ConstraintTag, ModelBuilder};
    use crate::timetable::{BlockageWindow, ModelParams, TimetableBuilder};

    #[test]
    fn later_train_waits_for_segment_clearance() {
        let mut b = TimetableBuilder::new();
        b.station("A", 1).station("B", 1);
        b.segment("A", "B");
        b.stop("T1", "A", None, Some(0.0))
            .stop("T1", "B", Some(15.0), None)
            .stop("T2", "A", None, Some(25.0))
            .stop("T2", "B", Some(40.0), None);
        let tt = b.build().unwrap();
        let blockage = BlockageWindow {
            segment: (tt.station_id("A").unwrap(), tt.station_id("B").unwrap()),
            start: 0.0,
            end: 0.0,
        };
        let model = ModelBuilder::new(&tt, &blockage, &ModelParams::default())
            .unwrap()
            .build();

        let t1 = tt.train_id("T1").unwrap();
        let t2 = tt.train_id("T2").unwrap();
        let a = tt.station_id("A").unwrap();
        let b_station = tt.station_id("B").unwrap();

        // T2 departing A must wait for T1 arriving B; not the reverse.
        let forward = ConstraintTag::SingleTrack {
            leader: t1,
            follower: t2,
            lower: a,
            upper: b_station,
        };
        let reverse = ConstraintTag::SingleTrack {
            leader: t2,
            follower: t1,
            lower: a,
            upper: b_station,
        };
        assert!(model.constraints().iter().any(|c| c.tag == forward));
        assert!(!model.constraints().iter().any(|c| c.tag == reverse));
    }

    #[test]
    fn non_segment_pairs_are_ignored() {
        let mut b = TimetableBuilder::new();
        b.station("A", 1).station("B", 1).station("C", 1);
        b.segment("A", "B").segment("B", "C");
        b.stop("T1", "A", None, Some(0.0))
            .stop("T1", "B", Some(15.0), Some(19.0))
            .stop("T1", "C", Some(30.0), None)
            .stop("T2", "A", None, Some(25.0))
            .stop("T2", "B", Some(40.0), Some(44.0))
            .stop("T2", "C", Some(55.0), None);
        let tt = b.build().unwrap();
        let blockage = BlockageWindow {
            segment: (tt.station_id("A").unwrap(), tt.station_id("B").unwrap()),
            start: 0.0,
            end: 0.0,
        };
        let model = ModelBuilder::new(&tt, &blockage, &ModelParams::default())
            .unwrap()
            .build();

        let a = tt.station_id("A").unwrap();
        let c = tt.station_id("C").unwrap();
        // A and C are not adjacent: no single-track constraint spans them.
        assert!(!model.constraints().iter().any(|cstr| matches!(
            cstr.tag,
            ConstraintTag::SingleTrack { lower, upper, .. }
                if (lower, upper) == (a, c) || (lower, upper) == (c, a)
        )));
    }
}
