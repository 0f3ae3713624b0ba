use log::debug;

use super::BuilderCtx;
use crate::model::{ConstraintTag, LinExpr, Sense};
use crate::variables::{EventKind, VarKind, VarRole};

/// Best-effort platform-capacity modeling, not exact interval packing.
///
/// Per capacity-bounded station: a binary occupancy indicator per train with
/// both arrival and departure variables, linked so that any positive dwell
/// forces the indicator on; the indicator sum is bounded by the platform
/// count. The pairwise no-overlap inequalities are relaxed whenever the
/// partner's indicator is on, so simultaneous presence is bounded by the
/// aggregate count rather than forbidden pair by pair.
///
/// Origin and terminal stations are exempt. Stopping trains missing either
/// variable contribute no occupancy and are excluded from the pairwise pass.
pub(crate) fn add_capacity_constraints(ctx: &mut BuilderCtx) {
    let big_m = ctx.big_m;
    for (station, info) in ctx.timetable.stations().iter_enumerated() {
        if ctx.timetable.is_endpoint(station) {
            debug!("capacity: skipping endpoint station {}", info.name);
            continue;
        }

        let mut occupants = Vec::new();
        for event in ctx.timetable.events().iter().filter(|e| e.station == station) {
            let arrival = ctx.var(event.train, station, EventKind::Arrival);
            let departure = ctx.var(event.train, station, EventKind::Departure);
            let (Some(arrival), Some(departure)) = (arrival, departure) else {
                debug!(
                    "capacity: {} has no full stop at {}, excluded from occupancy",
                    ctx.timetable.train(event.train).name,
                    info.name,
                );
                continue;
            };
            let occupancy = ctx.registry.add_auxiliary(
                VarRole::Occupancy { train: event.train, station },
                VarKind::Binary,
            );
            // arrival - M * (1 - occupancy) <= departure
            ctx.push(
                ConstraintTag::OccupancyOnset { train: event.train, station },
                LinExpr::diff(arrival, departure).with(occupancy, big_m),
                Sense::Le,
                big_m,
            );
            // departure <= arrival + M * occupancy
            ctx.push(
                ConstraintTag::OccupancyRelease { train: event.train, station },
                LinExpr::diff(departure, arrival).with(occupancy, -big_m),
                Sense::Le,
                0.0,
            );
            occupants.push((event.train, arrival, departure, occupancy));
        }

        if occupants.is_empty() {
            continue;
        }

        let mut total = LinExpr::default();
        for &(_, _, _, occupancy) in &occupants {
            total.terms.push((occupancy, 1.0));
        }
        ctx.push(
            ConstraintTag::PlatformCapacity { station },
            total,
            Sense::Le,
            info.platform_capacity as f64,
        );

        for (i, &(t1, arr1, dep1, occ1)) in occupants.iter().enumerate() {
            for &(t2, arr2, dep2, occ2) in &occupants[i + 1..] {
                // departure(t1) <= arrival(t2) + M * occupancy(t2), and the
                // mirror image; an active indicator absorbs the bound.
                ctx.push(
                    ConstraintTag::PlatformNoOverlap { first: t1, second: t2, station },
                    LinExpr::diff(dep1, arr2).with(occ2, -big_m),
                    Sense::Le,
                    0.0,
                );
                ctx.push(
                    ConstraintTag::PlatformNoOverlap { first: t2, second: t1, station },
                    LinExpr::diff(dep2, arr1).with(occ1, -big_m),
                    Sense::Le,
                    0.0,
                );
            }
        }
    }
}
