use log::debug;

use super::BuilderCtx;
use crate::model::{ConstraintTag, LinExpr, Sense};
use crate::variables::EventKind;

/// Defers departures caught by the blockage. Only trains whose *scheduled*
/// departure from the blocked segment's lower end falls inside the inclusive
/// window are constrained; trains scheduled after the window are ordered by
/// the single-track and headway rules instead.
pub(crate) fn add_blockage_constraints(ctx: &mut BuilderCtx) {
    let (entry, _) = ctx.blockage.segment;
    let (start, end) = (ctx.blockage.start, ctx.blockage.end);
    for event in ctx.timetable.events() {
        if event.station != entry {
            continue;
        }
        let Some(scheduled) = event.scheduled_departure else {
            continue;
        };
        if !(start..=end).contains(&scheduled) {
            continue;
        }
        let Some(departure) = ctx.var(event.train, event.station, EventKind::Departure) else {
            continue;
        };
        debug!(
            "blockage: deferring {} at {} from {} to {}",
            ctx.timetable.train(event.train).name,
            ctx.timetable.station(entry).name,
            scheduled,
            end,
        );
        ctx.push(
            ConstraintTag::BlockedDeparture {
                train: event.train,
                station: event.station,
            },
            LinExpr::term(departure, 1.0),
            Sense::Ge,
            end,
        );
    }
}
