//! Piecewise-linear deviation minimization: per scheduled value an auxiliary
//! non-negative variable bounded below by both signed differences between the
//! decision variable and the plan, so it takes the absolute deviation at any
//! optimum. The objective is the weighted sum of these auxiliaries.

use crate::builders::BuilderCtx;
use crate::model::{ConstraintTag, LinExpr, Sense};
use crate::variables::{EventKind, VarKind, VarRole};

pub(crate) fn add_deviation_objective(ctx: &mut BuilderCtx) {
    for event in ctx.timetable.events() {
        for kind in [EventKind::Arrival, EventKind::Departure] {
            let Some(scheduled) = event.scheduled(kind) else {
                continue;
            };
            let Some(time) = ctx.var(event.train, event.station, kind) else {
                continue;
            };
            let deviation = ctx.registry.add_auxiliary(
                VarRole::Deviation {
                    train: event.train,
                    station: event.station,
                    kind,
                },
                VarKind::Continuous { lower_bound: 0.0 },
            );
            // deviation >= time - scheduled
            ctx.push(
                ConstraintTag::DeviationAbove {
                    train: event.train,
                    station: event.station,
                    kind,
                },
                LinExpr::diff(deviation, time),
                Sense::Ge,
                -scheduled,
            );
            // deviation >= scheduled - time
            ctx.push(
                ConstraintTag::DeviationBelow {
                    train: event.train,
                    station: event.station,
                    kind,
                },
                LinExpr::term(deviation, 1.0).with(time, 1.0),
                Sense::Ge,
                scheduled,
            );
            let weight = match kind {
                EventKind::Arrival => ctx.params.arrival_weight,
                EventKind::Departure => ctx.params.departure_weight,
            };
            ctx.objective.terms.push((deviation, weight));
        }
    }
}
