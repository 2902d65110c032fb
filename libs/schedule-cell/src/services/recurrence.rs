use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

use crate::models::{DatedSlotInstance, DayOfWeek, WeeklySlotTemplate};

pub const ROLLING_WINDOW_DAYS: i64 = 7;

/// Project weekly templates onto the rolling window `[today, today+6]`.
///
/// Pure projection: the Nth day of the window picks up every template whose
/// `day_of_week` matches that date's weekday, so each weekday maps to
/// exactly one date. Per-day lists are sorted by start time for display.
/// An empty payload yields an empty map, not an error.
pub fn expand_weekly_schedule(
    templates: &[WeeklySlotTemplate],
    today: NaiveDate,
) -> BTreeMap<DayOfWeek, Vec<DatedSlotInstance>> {
    let mut schedule: BTreeMap<DayOfWeek, Vec<DatedSlotInstance>> = BTreeMap::new();

    for offset in 0..ROLLING_WINDOW_DAYS {
        let date = today + Duration::days(offset);
        let weekday = DayOfWeek::from(date.weekday());

        let mut slots: Vec<DatedSlotInstance> = templates
            .iter()
            .filter(|template| template.day_of_week == weekday)
            .map(|template| DatedSlotInstance::from_template(template, date))
            .collect();

        if slots.is_empty() {
            continue;
        }

        slots.sort_by_key(|slot| slot.start_time);
        schedule.insert(weekday, slots);
    }

    schedule
}

/// The window's (weekday, date) pairs in display order, today first.
pub fn rolling_week(today: NaiveDate) -> Vec<(DayOfWeek, NaiveDate)> {
    (0..ROLLING_WINDOW_DAYS)
        .map(|offset| {
            let date = today + Duration::days(offset);
            (DayOfWeek::from(date.weekday()), date)
        })
        .collect()
}
