//! Solar Hijri (Jalali) calendar formatting for timestamps shown to the user

use crate::interface::JalaliDate;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Shown in place of a date that could not be read
pub const MISSING_DATE: &str = "—";

const MONTH_NAMES: [&str; 12] = [
    "فروردین",
    "اردیبهشت",
    "خرداد",
    "تیر",
    "مرداد",
    "شهریور",
    "مهر",
    "آبان",
    "آذر",
    "دی",
    "بهمن",
    "اسفند",
];

/// Cumulative days before each Gregorian month in a common year
const DAYS_BEFORE_MONTH: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Convert a Gregorian date to the Solar Hijri calendar
pub fn to_jalali(date: NaiveDate) -> JalaliDate {
    let gy = i64::from(date.year());
    let gm = date.month() as usize;
    let gd = i64::from(date.day());

    let gy2 = if gm > 2 { gy + 1 } else { gy };
    let mut days = 355_666 + 365 * gy + (gy2 + 3) / 4 - (gy2 + 99) / 100 + (gy2 + 399) / 400
        + gd
        + DAYS_BEFORE_MONTH[gm - 1];

    // 33-year cycles, then 4-year groups, then single years
    let mut jy = -1595 + 33 * (days / 12053);
    days %= 12053;
    jy += 4 * (days / 1461);
    days %= 1461;
    if days > 365 {
        jy += (days - 1) / 365;
        days = (days - 1) % 365;
    }

    let (jm, jd) = if days < 186 {
        (1 + days / 31, 1 + days % 31)
    } else {
        (7 + (days - 186) / 30, 1 + (days - 186) % 30)
    };

    JalaliDate {
        year: jy as i32,
        month: jm as u32,
        day: jd as u32,
    }
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

/// `YYYY/MM/DD` in the Jalali calendar
#[uniffi::export]
pub fn format_persian_date(input: String) -> String {
    match parse_date(&input).map(to_jalali) {
        Some(j) => format!("{:04}/{:02}/{:02}", j.year, j.month, j.day),
        None => MISSING_DATE.to_string(),
    }
}

/// `D <month name> YYYY` in the Jalali calendar
#[uniffi::export]
pub fn format_persian_date_with_month(input: String) -> String {
    match parse_date(&input).map(to_jalali) {
        Some(j) => {
            let month = MONTH_NAMES[(j.month as usize).saturating_sub(1).min(11)];
            format!("{} {} {}", j.day, month, j.year)
        }
        None => MISSING_DATE.to_string(),
    }
}
