use log::debug;

use super::BuilderCtx;
use crate::model::{ConstraintTag, LinExpr, Sense};
use crate::variables::EventKind;

/// Minimum running time between consecutive stops of the same train. Pairs
/// where the earlier stop has no departure or the later stop no arrival
/// (origins, terminals, pass-throughs) are skipped explicitly.
pub(crate) fn add_running_time_constraints(ctx: &mut BuilderCtx) {
    let min_running_time = ctx.params.min_running_time;
    for (train, _) in ctx.timetable.trains().iter_enumerated() {
        let stops: Vec<_> = ctx.timetable.train_stops(train).copied().collect();
        for pair in stops.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            let departure = ctx.var(train, current.station, EventKind::Departure);
            let arrival = ctx.var(train, next.station, EventKind::Arrival);
            let (Some(departure), Some(arrival)) = (departure, arrival) else {
                debug!(
                    "running time: skipping {} over {}-{}, variable missing",
                    ctx.timetable.train(train).name,
                    ctx.timetable.station(current.station).name,
                    ctx.timetable.station(next.station).name,
                );
                continue;
            };
            ctx.push(
                ConstraintTag::RunningTime {
                    train,
                    from: current.station,
                    to: next.station,
                },
                LinExpr::diff(arrival, departure),
                Sense::Ge,
                min_running_time,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{ConstraintTag, ModelBuilder};
    use crate::timetable::{BlockageWindow, ModelParams, TimetableBuilder};

    #[test]
    fn pass_through_breaks_the_chain() {
        let mut b = TimetableBuilder::new();
        b.station("A", 1).station("B", 1).station("C", 1).station("D", 1);
        b.segment("A", "B").segment("B", "C").segment("C", "D");
        b.stop("T1", "A", None, Some(0.0))
            .stop("T1", "B", Some(15.0), Some(19.0))
            .stop("T1", "C", None, None)
            .stop("T1", "D", Some(53.0), None);
        let tt = b.build().unwrap();
        let blockage = BlockageWindow {
            segment: (tt.station_id("A").unwrap(), tt.station_id("B").unwrap()),
            start: 0.0,
            end: 0.0,
        };
        let model = ModelBuilder::new(&tt, &blockage, &ModelParams::default())
            .unwrap()
            .build();

        let running: Vec<_> = model
            .constraints()
            .iter()
            .filter(|c| matches!(c.tag, ConstraintTag::RunningTime { .. }))
            .collect();
        // Only A->B survives; both hops touching the pass-through drop out.
        assert_eq!(running.len(), 1);
        let a = tt.station_id("A").unwrap();
        let b_station = tt.station_id("B").unwrap();
        assert!(matches!(
            running[0].tag,
            ConstraintTag::RunningTime { from, to, .. } if from == a && to == b_station
        ));
        assert_eq!(running[0].rhs, 10.0);
    }
}
