use super::BuilderCtx;
use crate::model::{ConstraintTag, LinExpr, Sense};
use crate::variables::EventKind;

/// Minimum separation between two trains' like events at a shared station.
///
/// Which train goes first is fixed at build time by flat input-sequence
/// position; the constraint does not adapt if the solver would prefer the
/// opposite order. An exact model would add a binary order indicator per
/// pair, doubling the disjunctive constraint count.
pub(crate) fn add_headway_constraints(ctx: &mut BuilderCtx) {
    let headway = ctx.params.headway;
    let events = ctx.timetable.events();
    for i in 0..events.len() {
        for j in (i + 1)..events.len() {
            let (a, b) = (events[i], events[j]);
            if a.station != b.station || a.train == b.train {
                continue;
            }
            let station = a.station;
            if let (Some(first), Some(second)) = (
                ctx.var(a.train, station, EventKind::Departure),
                ctx.var(b.train, station, EventKind::Departure),
            ) {
                ctx.push(
                    ConstraintTag::DepartureHeadway {
                        leader: a.train,
                        follower: b.train,
                        station,
                    },
                    LinExpr::diff(second, first),
                    Sense::Ge,
                    headway,
                );
            }
            if let (Some(first), Some(second)) = (
                ctx.var(a.train, station, EventKind::Arrival),
                ctx.var(b.train, station, EventKind::Arrival),
            ) {
                ctx.push(
                    ConstraintTag::ArrivalHeadway {
                        leader: a.train,
                        follower: b.train,
                        station,
                    },
                    LinExpr::diff(second, first),
                    Sense::Ge,
                    headway,
                );
            }
        }
    }
}
