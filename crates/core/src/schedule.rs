//! Store opening hours.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

const TIME_FORMAT: &str = "%H:%M";

/// Day of the week as sent by the backend.
///
/// Lowercase English tokens on the wire; Spanish tokens are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    #[serde(alias = "lunes")]
    Monday,
    #[serde(alias = "martes")]
    Tuesday,
    #[serde(alias = "miercoles", alias = "miércoles")]
    Wednesday,
    #[serde(alias = "jueves")]
    Thursday,
    #[serde(alias = "viernes")]
    Friday,
    #[serde(alias = "sabado", alias = "sábado")]
    Saturday,
    #[serde(alias = "domingo")]
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

/// Opening hours for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub day: Weekday,
    pub is_open: bool,
    #[serde(default)]
    pub open_time: Option<String>,
    #[serde(default)]
    pub close_time: Option<String>,
}

impl ScheduleEntry {
    pub fn open(day: Weekday, open_time: &str, close_time: &str) -> Self {
        Self {
            day,
            is_open: true,
            open_time: Some(open_time.to_string()),
            close_time: Some(close_time.to_string()),
        }
    }

    pub fn closed(day: Weekday) -> Self {
        Self {
            day,
            is_open: false,
            open_time: None,
            close_time: None,
        }
    }

    /// Parsed `(open, close)` times; `None` when the day is closed.
    pub fn hours(&self) -> DomainResult<Option<(NaiveTime, NaiveTime)>> {
        if !self.is_open {
            return Ok(None);
        }

        let open = parse_time(self.day, "openTime", self.open_time.as_deref())?;
        let close = parse_time(self.day, "closeTime", self.close_time.as_deref())?;
        if open >= close {
            return Err(DomainError::validation(format!(
                "{}: opening time must be before closing time",
                self.day.as_str()
            )));
        }
        Ok(Some((open, close)))
    }

    pub fn validate(&self) -> DomainResult<()> {
        self.hours().map(|_| ())
    }

    /// Whether the store is open on this entry's day at `time`.
    pub fn is_open_at(&self, time: NaiveTime) -> bool {
        match self.hours() {
            Ok(Some((open, close))) => time >= open && time < close,
            _ => false,
        }
    }
}

fn parse_time(day: Weekday, field: &str, value: Option<&str>) -> DomainResult<NaiveTime> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DomainError::validation(format!("{}: {field} is required", day.as_str())))?;

    NaiveTime::parse_from_str(raw, TIME_FORMAT).map_err(|_| {
        DomainError::validation(format!("{}: {field} must be HH:MM, got '{raw}'", day.as_str()))
    })
}

/// A store's weekly schedule (at most one entry per day).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklySchedule(Vec<ScheduleEntry>);

impl WeeklySchedule {
    pub fn new(entries: Vec<ScheduleEntry>) -> Self {
        Self(entries)
    }

    /// Every day closed; the starting point of the schedule editor.
    pub fn all_closed() -> Self {
        Self(Weekday::ALL.iter().copied().map(ScheduleEntry::closed).collect())
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.0
    }

    pub fn entry_for(&self, day: Weekday) -> Option<&ScheduleEntry> {
        self.0.iter().find(|e| e.day == day)
    }

    /// Insert or replace the entry for `entry.day`.
    pub fn set(&mut self, entry: ScheduleEntry) {
        match self.0.iter_mut().find(|e| e.day == entry.day) {
            Some(existing) => *existing = entry,
            None => self.0.push(entry),
        }
    }

    /// Entries ordered Monday first.
    pub fn sorted(&self) -> Vec<ScheduleEntry> {
        let mut entries = self.0.clone();
        entries.sort_by_key(|e| e.day);
        entries
    }

    pub fn validate(&self) -> DomainResult<()> {
        for (i, entry) in self.0.iter().enumerate() {
            if self.0[..i].iter().any(|e| e.day == entry.day) {
                return Err(DomainError::validation(format!(
                    "{} appears more than once",
                    entry.day.as_str()
                )));
            }
            entry.validate()?;
        }
        Ok(())
    }

    pub fn is_open_at(&self, day: Weekday, time: NaiveTime) -> bool {
        self.entry_for(day).is_some_and(|e| e.is_open_at(time))
    }
}

impl From<Vec<ScheduleEntry>> for WeeklySchedule {
    fn from(entries: Vec<ScheduleEntry>) -> Self {
        Self(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn spanish_day_tokens_are_accepted() {
        let entry: ScheduleEntry = serde_json::from_str(
            r#"{"day":"sábado","isOpen":true,"openTime":"10:00","closeTime":"21:00"}"#,
        )
        .unwrap();
        assert_eq!(entry.day, Weekday::Saturday);
        assert_eq!(serde_json::to_value(entry.day).unwrap(), "saturday");
    }

    #[test]
    fn closed_day_needs_no_times() {
        let entry: ScheduleEntry =
            serde_json::from_str(r#"{"day":"sunday","isOpen":false}"#).unwrap();
        assert!(entry.validate().is_ok());
        assert!(!entry.is_open_at(t(12, 0)));
    }

    #[test]
    fn open_day_requires_ordered_times() {
        let entry = ScheduleEntry::open(Weekday::Monday, "22:00", "09:00");
        assert!(matches!(entry.validate(), Err(DomainError::Validation(_))));

        let entry = ScheduleEntry::open(Weekday::Monday, "9am", "18:00");
        assert!(entry.validate().is_err());
    }

    #[test]
    fn open_interval_is_half_open() {
        let entry = ScheduleEntry::open(Weekday::Friday, "10:00", "20:00");
        assert!(entry.is_open_at(t(10, 0)));
        assert!(entry.is_open_at(t(19, 59)));
        assert!(!entry.is_open_at(t(20, 0)));
    }

    #[test]
    fn duplicate_days_are_rejected() {
        let schedule = WeeklySchedule::new(vec![
            ScheduleEntry::closed(Weekday::Monday),
            ScheduleEntry::open(Weekday::Monday, "10:00", "12:00"),
        ]);
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn set_replaces_existing_day() {
        let mut schedule = WeeklySchedule::all_closed();
        schedule.set(ScheduleEntry::open(Weekday::Tuesday, "10:00", "18:00"));
        assert_eq!(schedule.entries().len(), 7);
        assert!(schedule.is_open_at(Weekday::Tuesday, t(11, 0)));
        assert!(schedule.validate().is_ok());
    }
}
