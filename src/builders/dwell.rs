use super::BuilderCtx;
use crate::model::{ConstraintTag, LinExpr, Sense};
use crate::variables::EventKind;

/// Dwell-time bounds for every event with both an arrival and a departure.
pub(crate) fn add_dwell_constraints(ctx: &mut BuilderCtx) {
    let (min_dwell, max_dwell) = (ctx.params.min_dwell, ctx.params.max_dwell);
    for event in ctx.timetable.events() {
        let arrival = ctx.var(event.train, event.station, EventKind::Arrival);
        let departure = ctx.var(event.train, event.station, EventKind::Departure);
        let (Some(arrival), Some(departure)) = (arrival, departure) else {
            continue;
        };
        ctx.push(
            ConstraintTag::MinDwell { train: event.train, station: event.station },
            LinExpr::diff(departure, arrival),
            Sense::Ge,
            min_dwell,
        );
        ctx.push(
            ConstraintTag::MaxDwell { train: event.train, station: event.station },
            LinExpr::diff(departure, arrival),
            Sense::Le,
            max_dwell,
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{ConstraintTag, ModelBuilder};
    use crate::timetable::{BlockageWindow, ModelParams, TimetableBuilder};

    #[test]
    fn only_full_stops_get_dwell_bounds() {
        let mut b = TimetableBuilder::new();
        b.station("A", 1).station("B", 1).station("C", 1);
        b.segment("A", "B").segment("B", "C");
        b.stop("T1", "A", None, Some(0.0))
            .stop("T1", "B", Some(15.0), Some(19.0))
            .stop("T1", "C", Some(34.0), None);
        let tt = b.build().unwrap();
        let blockage = BlockageWindow {
            segment: (tt.station_id("A").unwrap(), tt.station_id("B").unwrap()),
            start: 0.0,
            end: 0.0,
        };
        let params = ModelParams::default();
        let model = ModelBuilder::new(&tt, &blockage, &params).unwrap().build();

        let mins: Vec<_> = model
            .constraints()
            .iter()
            .filter(|c| matches!(c.tag, ConstraintTag::MinDwell { .. }))
            .collect();
        let maxs: Vec<_> = model
            .constraints()
            .iter()
            .filter(|c| matches!(c.tag, ConstraintTag::MaxDwell { .. }))
            .collect();
        assert_eq!(mins.len(), 1);
        assert_eq!(maxs.len(), 1);
        assert_eq!(mins[0].rhs, params.min_dwell);
        assert_eq!(maxs[0].rhs, params.max_dwell);
    }
}
