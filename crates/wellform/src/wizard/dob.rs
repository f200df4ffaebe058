//! Date-of-birth entry collected as separate month/day/year parts.

use chrono::{Datelike, NaiveDate};

/// Placeholder year used to size the day range before a year is chosen.
/// A leap year, so February offers 29 days until the real year narrows it.
const PLACEHOLDER_YEAR: i32 = 2000;

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DobPart {
    Month,
    Day,
    Year,
}

/// Result of storing one part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DobUpdate {
    /// All three parts now form a valid date.
    Completed,
    /// The date is still missing at least one part.
    Incomplete,
    /// The stored day fell outside the recomputed range and was cleared.
    DayCleared,
}

/// The three dropdown selections of a date-of-birth step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DobState {
    month: Option<u32>,
    day: Option<u32>,
    year: Option<i32>,
}

impl DobState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one part. Out-of-range input is ignored; changing the month or
    /// year clears a stored day that no longer fits the month.
    pub fn set_part(&mut self, part: DobPart, value: u32) -> DobUpdate {
        match part {
            DobPart::Month => {
                if (1..=12).contains(&value) {
                    self.month = Some(value);
                    if self.clear_day_out_of_range() {
                        return DobUpdate::DayCleared;
                    }
                }
            }
            DobPart::Day => {
                if value >= 1 && value <= self.days_in_selected_month() {
                    self.day = Some(value);
                }
            }
            DobPart::Year => {
                let year = value as i32;
                if (MIN_YEAR..=MAX_YEAR).contains(&year) {
                    self.year = Some(year);
                    if self.clear_day_out_of_range() {
                        return DobUpdate::DayCleared;
                    }
                }
            }
        }

        if self.complete_date().is_some() {
            DobUpdate::Completed
        } else {
            DobUpdate::Incomplete
        }
    }

    /// Upper bound of the day dropdown for the current month/year selection.
    pub fn days_in_selected_month(&self) -> u32 {
        match self.month {
            Some(month) => days_in_month(month, self.year.unwrap_or(PLACEHOLDER_YEAR)),
            None => 31,
        }
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn day(&self) -> Option<u32> {
        self.day
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn is_complete(&self) -> bool {
        self.complete_date().is_some()
    }

    pub fn complete_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, self.day?)
    }

    /// ISO `YYYY-MM-DD` rendering of a complete date.
    pub fn iso_value(&self) -> Option<String> {
        self.complete_date()
            .map(|date| date.format("%Y-%m-%d").to_string())
    }

    /// Whole years lived as of `today`, once the date is complete.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let birth = self.complete_date()?;
        let mut age = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }

    fn clear_day_out_of_range(&mut self) -> bool {
        match self.day {
            Some(day) if day > self.days_in_selected_month() => {
                self.day = None;
                true
            }
            _ => false,
        }
    }
}

fn days_in_month(month: u32, year: i32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last_of_month| last_of_month.day())
        .unwrap_or(31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_change_clears_out_of_range_day() {
        let mut dob = DobState::new();
        assert_eq!(dob.set_part(DobPart::Month, 1), DobUpdate::Incomplete);
        assert_eq!(dob.set_part(DobPart::Day, 31), DobUpdate::Incomplete);
        assert_eq!(dob.set_part(DobPart::Month, 2), DobUpdate::DayCleared);
        assert_eq!(dob.day(), None);
    }

    #[test]
    fn year_change_clears_leap_day() {
        let mut dob = DobState::new();
        dob.set_part(DobPart::Month, 2);
        dob.set_part(DobPart::Day, 29);
        assert_eq!(dob.set_part(DobPart::Year, 1999), DobUpdate::DayCleared);
        assert_eq!(dob.day(), None);
    }

    #[test]
    fn leap_year_keeps_february_29() {
        let mut dob = DobState::new();
        dob.set_part(DobPart::Month, 2);
        dob.set_part(DobPart::Day, 29);
        assert_eq!(dob.set_part(DobPart::Year, 1996), DobUpdate::Completed);
        assert_eq!(dob.iso_value().as_deref(), Some("1996-02-29"));
    }

    #[test]
    fn day_range_defaults_until_month_known() {
        let dob = DobState::new();
        assert_eq!(dob.days_in_selected_month(), 31);

        let mut april = DobState::new();
        april.set_part(DobPart::Month, 4);
        assert_eq!(april.days_in_selected_month(), 30);
    }

    #[test]
    fn age_accounts_for_birthday_not_yet_reached() {
        let mut dob = DobState::new();
        dob.set_part(DobPart::Month, 6);
        dob.set_part(DobPart::Day, 15);
        dob.set_part(DobPart::Year, 1990);

        let before_birthday = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let on_birthday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(dob.age_on(before_birthday), Some(33));
        assert_eq!(dob.age_on(on_birthday), Some(34));
    }

    #[test]
    fn out_of_range_input_is_ignored() {
        let mut dob = DobState::new();
        dob.set_part(DobPart::Month, 13);
        assert_eq!(dob.month(), None);
        dob.set_part(DobPart::Year, 1850);
        assert_eq!(dob.year(), None);
    }
}
