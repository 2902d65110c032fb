use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use std::fmt;

use crate::error::ScheduleError;

/// Wire format for schedule times is `HH:mm`; the service occasionally
/// echoes seconds, so parsing accepts `HH:mm:ss` as well.
pub mod hhmm_time {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

mod hhmm_time_opt {
    use chrono::NaiveTime;
    use serde::Serializer;

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => super::hhmm_time::serialize(t, serializer),
            None => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayOfWeek::Monday => write!(f, "Monday"),
            DayOfWeek::Tuesday => write!(f, "Tuesday"),
            DayOfWeek::Wednesday => write!(f, "Wednesday"),
            DayOfWeek::Thursday => write!(f, "Thursday"),
            DayOfWeek::Friday => write!(f, "Friday"),
            DayOfWeek::Saturday => write!(f, "Saturday"),
            DayOfWeek::Sunday => write!(f, "Sunday"),
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    None,
    Daily,
    #[default]
    Weekly,
}

/// Recurring availability unit as defined by the provider-side scheduler.
/// Read-only from the booking flow's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySlotTemplate {
    pub slot_id: Uuid,
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm_time")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm_time")]
    pub end_time: NaiveTime,
    pub is_available: bool,
    pub is_bookable: bool,
    /// Occupancy of this template's upcoming occurrence, echoed by the
    /// service on the weekly payload. Absent means free.
    #[serde(default)]
    pub is_booked: bool,
    #[serde(default)]
    pub recurrence: Recurrence,
}

impl WeeklySlotTemplate {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.start_time >= self.end_time {
            return Err(ScheduleError::InvalidTemplate(format!(
                "slot {} has start_time {} not before end_time {}",
                self.slot_id, self.start_time, self.end_time
            )));
        }
        Ok(())
    }
}

/// A template projected onto a concrete date inside the rolling window.
/// Derived on every fetch, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatedSlotInstance {
    pub slot_id: Uuid,
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm_time")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm_time")]
    pub end_time: NaiveTime,
    pub is_available: bool,
    pub is_bookable: bool,
    pub is_booked: bool,
    pub recurrence: Recurrence,
    pub date: NaiveDate,
}

impl DatedSlotInstance {
    pub fn from_template(template: &WeeklySlotTemplate, date: NaiveDate) -> Self {
        Self {
            slot_id: template.slot_id,
            day_of_week: template.day_of_week,
            start_time: template.start_time,
            end_time: template.end_time,
            is_available: template.is_available,
            is_bookable: template.is_bookable,
            is_booked: template.is_booked,
            recurrence: template.recurrence,
            date,
        }
    }

    /// Slot start composed in the clinic reference timezone.
    pub fn start_instant(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn display_time(&self) -> String {
        format!(
            "{} - {}",
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

/// The user's in-progress slot choice. At most one exists per booking flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedSlot {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm_time")]
    pub start_time: NaiveTime,
    pub time: String,
    pub is_booked: bool,
}

impl SelectedSlot {
    pub fn from_instance(slot: &DatedSlotInstance) -> Self {
        Self {
            id: slot.slot_id,
            date: slot.date,
            start_time: slot.start_time,
            time: slot.display_time(),
            is_booked: slot.is_booked,
        }
    }

    /// Slot start composed in the clinic reference timezone.
    pub fn start_instant(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }
}

/// Partial template update for the provider-side editing path.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotTemplateUpdate {
    #[serde(with = "hhmm_time_opt", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(with = "hhmm_time_opt", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_bookable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
}
