//! Weekly coordinate space.
//!
//! A teaching week is 5 ordered days × 7 ordered periods. `Day` and
//! `Period` are closed enumerations, so a `Slot` built from them is always
//! inside the grid; range checks happen once, at parse time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of teaching days per week.
pub const DAYS: usize = 5;
/// Number of periods per teaching day.
pub const PERIODS: usize = 7;
/// Number of slots in one weekly grid.
pub const SLOTS: usize = DAYS * PERIODS;

/// A teaching day, Monday through Friday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl Day {
    /// All days in week order.
    pub const ALL: [Day; DAYS] = [Day::Mon, Day::Tue, Day::Wed, Day::Thu, Day::Fri];

    /// Zero-based position within the week.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short name ("Mon").
    pub fn short_name(self) -> &'static str {
        match self {
            Day::Mon => "Mon",
            Day::Tue => "Tue",
            Day::Wed => "Wed",
            Day::Thu => "Thu",
            Day::Fri => "Fri",
        }
    }

    /// Full name ("Monday").
    pub fn full_name(self) -> &'static str {
        match self {
            Day::Mon => "Monday",
            Day::Tue => "Tuesday",
            Day::Wed => "Wednesday",
            Day::Thu => "Thursday",
            Day::Fri => "Friday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Rejected day or period text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotParseError {
    #[error("unknown day '{0}' (expected Mon..Fri)")]
    Day(String),
    #[error("period {0} out of range (expected 1..=7)")]
    Period(i64),
}

impl FromStr for Day {
    type Err = SlotParseError;

    /// Accepts short or full English names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Day::ALL
            .into_iter()
            .find(|d| {
                d.short_name().eq_ignore_ascii_case(needle)
                    || d.full_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| SlotParseError::Day(s.to_string()))
    }
}

impl TryFrom<String> for Day {
    type Error = SlotParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Day> for String {
    fn from(day: Day) -> Self {
        day.short_name().to_string()
    }
}

/// A teaching period, 1 through 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Period(u8);

impl Period {
    /// Creates a period from its 1-based number.
    pub fn new(number: i64) -> Result<Self, SlotParseError> {
        if (1..=PERIODS as i64).contains(&number) {
            Ok(Self(number as u8))
        } else {
            Err(SlotParseError::Period(number))
        }
    }

    /// All periods in day order.
    pub fn all() -> impl Iterator<Item = Period> {
        (1..=PERIODS as u8).map(Period)
    }

    /// 1-based period number.
    #[inline]
    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based position within the day.
    #[inline]
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Period {
    type Error = SlotParseError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Period> for u8 {
    fn from(period: Period) -> Self {
        period.0
    }
}

/// One (day, period) coordinate of the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    pub day: Day,
    pub period: Period,
}

impl Slot {
    pub fn new(day: Day, period: Period) -> Self {
        Self { day, period }
    }

    /// Parses a slot from wire values.
    pub fn parse(day: &str, period: i64) -> Result<Self, SlotParseError> {
        Ok(Self::new(day.parse()?, Period::new(period)?))
    }

    /// Every slot of the week, day-major.
    pub fn all() -> impl Iterator<Item = Slot> {
        Day::ALL
            .into_iter()
            .flat_map(|day| Period::all().map(move |period| Slot::new(day, period)))
    }

    /// Zero-based row-major position (0..35).
    #[inline]
    pub fn index(self) -> usize {
        self.day.index() * PERIODS + self.period.index()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} P{}", self.day, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_parse_short_and_full() {
        assert_eq!("Mon".parse::<Day>().unwrap(), Day::Mon);
        assert_eq!("friday".parse::<Day>().unwrap(), Day::Fri);
        assert_eq!(" Wednesday ".parse::<Day>().unwrap(), Day::Wed);
        assert!("Saturday".parse::<Day>().is_err());
    }

    #[test]
    fn test_period_bounds() {
        assert!(Period::new(0).is_err());
        assert!(Period::new(8).is_err());
        assert_eq!(Period::new(1).unwrap().index(), 0);
        assert_eq!(Period::new(7).unwrap().number(), 7);
    }

    #[test]
    fn test_slot_enumeration() {
        let slots: Vec<Slot> = Slot::all().collect();
        assert_eq!(slots.len(), SLOTS);
        for (i, slot) in slots.iter().enumerate() {
            assert_eq!(slot.index(), i);
        }
        assert_eq!(slots[0], Slot::parse("Mon", 1).unwrap());
        assert_eq!(slots[SLOTS - 1], Slot::parse("Fri", 7).unwrap());
    }

    #[test]
    fn test_slot_serde_rejects_out_of_range() {
        let ok: Slot = serde_json::from_str(r#"{"day":"Tuesday","period":3}"#).unwrap();
        assert_eq!(ok, Slot::new(Day::Tue, Period::new(3).unwrap()));
        assert_eq!(
            serde_json::to_string(&ok).unwrap(),
            r#"{"day":"Tue","period":3}"#
        );

        assert!(serde_json::from_str::<Slot>(r#"{"day":"Tue","period":9}"#).is_err());
        assert!(serde_json::from_str::<Slot>(r#"{"day":"Sun","period":1}"#).is_err());
    }
}
