use chrono::{Datelike, NaiveDate, Weekday};

use crate::model::month::MonthKey;

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Days of `month` that are neither weekend nor holiday.
pub fn working_days<F>(month: MonthKey, is_holiday: F) -> Vec<NaiveDate>
where
    F: Fn(NaiveDate) -> bool,
{
    month
        .days()
        .filter(|d| !is_weekend(*d) && !is_holiday(*d))
        .collect()
}
