//! RTC time codec
//!
//! The RTC presents its time as BCD fields spread across four registers:
//!
//! ```text
//! RTC_DATA0  [31:24] day   [23:16] hour  [15:8] minute  [7:0] second
//! RTC_DATA1  [31] commit   [23:8] year (4 BCD digits)   [7:0] month
//! RTC_DATA2  nanoseconds (binary)
//! RTC_DATA3  [13:10] TQ [9:6] TZ [5] TZH [4] TZS [3] DST [2] DSP [1] LS [0] LSP
//! ```
//!
//! Around a leap second the FPGA briefly reports values that are not the
//! civil time (a `59` that is about to become `00`, a stray `61`).
//! [`decode`] corrects them with plain calendar arithmetic, one wall-clock
//! second at a time; no leap table is involved.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use irigb_chip::regs::rtc_data;

use crate::error::{IrigbError, Result};

/// Direction of a scheduled leap second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LeapSign {
    /// A second is inserted (`23:59:60`).
    #[default]
    Insert,
    /// A second is deleted (`23:59:58` → `00:00:00`).
    Delete,
}

/// IRIG-B control-function flags carried alongside the RTC time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TimeQuality {
    /// A leap second occurs at the end of this minute.
    pub leap_pending: bool,
    /// Leap second direction.
    pub leap_sign: LeapSign,
    /// A DST change occurs at the end of this minute.
    pub dst_pending: bool,
    /// DST in effect.
    pub dst_active: bool,
    /// Time zone offset is negative.
    pub tz_negative: bool,
    /// Time zone offset has an extra half hour.
    pub tz_half_hour: bool,
    /// Time zone offset in hours, 0..=15.
    pub tz_offset: u8,
    /// IRIG-B time quality code, 0..=15.
    pub quality: u8,
}

impl TimeQuality {
    /// Decode the `RTC_DATA3` control word.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_register(value: u32) -> Self {
        Self {
            leap_pending: value & rtc_data::LEAP_PENDING != 0,
            leap_sign: if value & rtc_data::LEAP_DELETE != 0 {
                LeapSign::Delete
            } else {
                LeapSign::Insert
            },
            dst_pending: value & rtc_data::DST_PENDING != 0,
            dst_active: value & rtc_data::DST_ACTIVE != 0,
            tz_negative: value & rtc_data::TZ_NEGATIVE != 0,
            tz_half_hour: value & rtc_data::TZ_HALF_HOUR != 0,
            tz_offset: ((value >> rtc_data::TZ_SHIFT) & rtc_data::TZ_MASK) as u8,
            quality: ((value >> rtc_data::QUALITY_SHIFT) & rtc_data::QUALITY_MASK) as u8,
        }
    }

    /// Time zone offset in minutes east of UTC.
    #[must_use]
    pub fn tz_offset_minutes(&self) -> i32 {
        let minutes = i32::from(self.tz_offset) * 60 + if self.tz_half_hour { 30 } else { 0 };
        if self.tz_negative {
            -minutes
        } else {
            minutes
        }
    }
}

/// One RTC reading.
///
/// `second` may be 60 while an inserted leap second is in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CalendarTime {
    /// Year, 0..=9999.
    pub year: u16,
    /// Month, 1..=12.
    pub month: u8,
    /// Day of month, 1..=month length.
    pub day: u8,
    /// Hour, 0..=23.
    pub hour: u8,
    /// Minute, 0..=59.
    pub minute: u8,
    /// Second, 0..=61.
    pub second: u8,
    /// Nanosecond, 0..=999 999 999.
    pub nanosecond: u32,
    /// Control-function flags.
    pub quality: TimeQuality,
}

impl CalendarTime {
    /// Time with no sub-second part and default quality flags.
    #[must_use]
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            ..Self::default()
        }
    }

    /// Wall-clock value as a chrono date-time, holding a leap second at `:59`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the fields do not form a calendar time.
    pub fn to_naive(&self) -> Result<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(i32::from(self.year), u32::from(self.month), u32::from(self.day))
            .ok_or_else(|| IrigbError::validation("date", self, "not a calendar date"))?;
        let time = NaiveTime::from_hms_nano_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second.min(59)),
            self.nanosecond,
        )
        .ok_or_else(|| IrigbError::validation("time", self, "not a time of day"))?;
        Ok(date.and_time(time))
    }

    /// Calendar time from a chrono date-time (second 0..=59).
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the year is outside 0..=9999.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_naive(dt: &NaiveDateTime) -> Result<Self> {
        let year = u16::try_from(dt.year())
            .ok()
            .filter(|y| *y <= 9999)
            .ok_or_else(|| IrigbError::validation("year", dt.year(), "must be 0..=9999"))?;
        // chrono reports a leap second as nanosecond >= 1e9.
        Ok(Self {
            year,
            month: dt.month() as u8,
            day: dt.day() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
            nanosecond: dt.nanosecond() % 1_000_000_000,
            quality: TimeQuality::default(),
        })
    }

    fn with_wall_clock(mut self, dt: &NaiveDateTime) -> Result<Self> {
        let moved = Self::from_naive(dt)?;
        self.year = moved.year;
        self.month = moved.month;
        self.day = moved.day;
        self.hour = moved.hour;
        self.minute = moved.minute;
        self.second = moved.second;
        Ok(self)
    }
}

impl fmt::Display for CalendarTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:09}",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.nanosecond
        )
    }
}

/// True for Gregorian leap years.
#[must_use]
pub const fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Days in `month` of `year`, or 0 for a month outside 1..=12.
#[must_use]
pub const fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

// ── BCD ──────────────────────────────────────────────────────────────────────

/// Decode `digits` BCD nibbles starting at bit `shift`.
fn bcd_field(word: u32, shift: u32, digits: u32, field: &'static str) -> Result<u32> {
    let mut value = 0;
    for i in (0..digits).rev() {
        let nibble = (word >> (shift + 4 * i)) & 0xF;
        if nibble > 9 {
            return Err(IrigbError::validation(field, format!("{word:#010x}"), "BCD digit above 9"));
        }
        value = value * 10 + nibble;
    }
    Ok(value)
}

/// Encode `value` as `digits` BCD nibbles.
const fn to_bcd(mut value: u32, digits: u32) -> u32 {
    let mut out = 0;
    let mut i = 0;
    while i < digits {
        out |= (value % 10) << (4 * i);
        value /= 10;
        i += 1;
    }
    out
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32, reason: &'static str) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(IrigbError::validation(field, value, reason))
    }
}

// ── Decode ───────────────────────────────────────────────────────────────────

/// Decode an RTC snapshot (`RTC_DATA0..3`) and correct leap-second artifacts.
///
/// # Errors
///
/// Returns `Validation` for a non-BCD nibble, an out-of-range field, or a
/// correction that would leave years 0..=9999.
#[allow(clippy::cast_possible_truncation)]
pub fn decode(words: [u32; 4]) -> Result<CalendarTime> {
    let second = bcd_field(words[0], rtc_data::SECOND_SHIFT, 2, "second")?;
    let minute = bcd_field(words[0], rtc_data::MINUTE_SHIFT, 2, "minute")?;
    let hour = bcd_field(words[0], rtc_data::HOUR_SHIFT, 2, "hour")?;
    let day = bcd_field(words[0], rtc_data::DAY_SHIFT, 2, "day")?;
    let month = bcd_field(words[1], rtc_data::MONTH_SHIFT, 2, "month")?;
    let year = bcd_field(words[1], rtc_data::YEAR_SHIFT, 4, "year")?;

    check_range("second", second, 0, 61, "must be 0..=61")?;
    check_range("minute", minute, 0, 59, "must be 0..=59")?;
    check_range("hour", hour, 0, 23, "must be 0..=23")?;
    check_range("month", month, 1, 12, "must be 1..=12")?;
    let month_len = u32::from(days_in_month(year as u16, month as u8));
    check_range("day", day, 1, month_len, "outside the month")?;
    check_range("nanosecond", words[2], 0, 999_999_999, "must be below one second")?;

    let raw = CalendarTime {
        year: year as u16,
        month: month as u8,
        day: day as u8,
        hour: hour as u8,
        minute: minute as u8,
        second: second as u8,
        nanosecond: words[2],
        quality: TimeQuality::from_register(words[3]),
    };
    normalize_leap(raw)
}

/// Correct the transient values the FPGA shows around a pending leap second.
///
/// | flags | second | result |
/// |-|-|-|
/// | pending, delete | 59 | one second later, pending cleared |
/// | pending, insert | 0 | one second earlier reported as `:60`, still pending |
/// | pending, insert | 61 | `:59` plus one second, pending cleared |
///
/// Anything else passes through unchanged.
///
/// # Errors
///
/// Returns `Validation` if the corrected time leaves years 0..=9999.
pub fn normalize_leap(time: CalendarTime) -> Result<CalendarTime> {
    if !time.quality.leap_pending {
        return Ok(time);
    }
    let one = TimeDelta::seconds(1);
    match (time.quality.leap_sign, time.second) {
        (LeapSign::Delete, 59) => {
            let next = step(time.to_naive()?.checked_add_signed(one))?;
            let mut out = time.with_wall_clock(&next)?;
            out.quality.leap_pending = false;
            out.quality.leap_sign = LeapSign::Insert;
            Ok(out)
        }
        (LeapSign::Insert, 0) => {
            let prev = step(time.to_naive()?.checked_sub_signed(one))?;
            let mut out = time.with_wall_clock(&prev)?;
            out.second = 60;
            Ok(out)
        }
        (LeapSign::Insert, 61) => {
            let next = step(time.to_naive()?.checked_add_signed(one))?;
            let mut out = time.with_wall_clock(&next)?;
            out.quality.leap_pending = false;
            Ok(out)
        }
        _ => Ok(time),
    }
}

fn step(dt: Option<NaiveDateTime>) -> Result<NaiveDateTime> {
    dt.ok_or_else(|| IrigbError::validation("leap second", "correction", "calendar overflow"))
}

// ── Encode ───────────────────────────────────────────────────────────────────

/// Encode a time for `RTC_DATA0` / `RTC_DATA1`, with the commit flag set.
///
/// Only whole seconds 0..=59 can be written; the sub-second part and the
/// quality flags are owned by the card.
///
/// # Errors
///
/// Returns `Validation` naming the first field out of range.
pub fn encode(time: &CalendarTime) -> Result<[u32; 2]> {
    check_range("second", u32::from(time.second), 0, 59, "must be 0..=59")?;
    check_range("minute", u32::from(time.minute), 0, 59, "must be 0..=59")?;
    check_range("hour", u32::from(time.hour), 0, 23, "must be 0..=23")?;
    check_range("month", u32::from(time.month), 1, 12, "must be 1..=12")?;
    check_range("year", u32::from(time.year), 0, 9999, "must be 0..=9999")?;
    let month_len = u32::from(days_in_month(time.year, time.month));
    check_range("day", u32::from(time.day), 1, month_len, "outside the month")?;

    let word0 = (to_bcd(u32::from(time.second), 2) << rtc_data::SECOND_SHIFT)
        | (to_bcd(u32::from(time.minute), 2) << rtc_data::MINUTE_SHIFT)
        | (to_bcd(u32::from(time.hour), 2) << rtc_data::HOUR_SHIFT)
        | (to_bcd(u32::from(time.day), 2) << rtc_data::DAY_SHIFT);
    let word1 = rtc_data::COMMIT_TIME
        | (to_bcd(u32::from(time.month), 2) << rtc_data::MONTH_SHIFT)
        | (to_bcd(u32::from(time.year), 4) << rtc_data::YEAR_SHIFT);
    Ok([word0, word1])
}

// ── Firmware date ────────────────────────────────────────────────────────────

/// FPGA build date, packed BCD `yyyyMMdd` (`0x2014_0101`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FirmwareDate(pub u32);

impl FirmwareDate {
    /// Raw register value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Decode to a calendar date.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the value is not BCD or not a real date.
    #[allow(clippy::cast_possible_wrap)]
    pub fn date(self) -> Result<NaiveDate> {
        let year = bcd_field(self.0, 16, 4, "firmware year")?;
        let month = bcd_field(self.0, 8, 2, "firmware month")?;
        let day = bcd_field(self.0, 0, 2, "firmware day")?;
        NaiveDate::from_ymd_opt(year as i32, month, day)
            .ok_or_else(|| IrigbError::validation("firmware date", format!("{:#010x}", self.0), "not a calendar date"))
    }
}

impl fmt::Display for FirmwareDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.date() {
            Ok(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Err(_) => write!(f, "{:#010x}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(t: &CalendarTime, control: u32) -> [u32; 4] {
        let [w0, w1] = encode(&CalendarTime { second: t.second.min(59), ..*t }).unwrap();
        let w0 = (w0 & !0xFF) | to_bcd(u32::from(t.second), 2);
        [w0, w1 & !rtc_data::COMMIT_TIME, t.nanosecond, control]
    }

    #[test]
    fn encode_known_value() {
        let t = CalendarTime::new(2024, 3, 9, 13, 45, 7);
        let [w0, w1] = encode(&t).unwrap();
        assert_eq!(w0, 0x0913_4507);
        assert_eq!(w1, 0x8020_2403);
    }

    #[test]
    fn decode_known_value() {
        let t = decode([0x3123_5958, 0x0020_2412, 123, 0]).unwrap();
        assert_eq!((t.year, t.month, t.day), (2024, 12, 31));
        assert_eq!((t.hour, t.minute, t.second), (23, 59, 58));
        assert_eq!(t.nanosecond, 123);
    }

    #[test]
    fn decode_rejects_bad_nibble() {
        assert!(matches!(
            decode([0x0101_000A, 0x0020_2401, 0, 0]),
            Err(IrigbError::Validation { field: "second", .. })
        ));
    }

    #[test]
    fn decode_rejects_bad_day() {
        assert!(decode([0x3000_0000, 0x0020_2402, 0, 0]).is_err());
    }

    #[test]
    fn leap_day_rules() {
        assert!(encode(&CalendarTime::new(2000, 2, 29, 0, 0, 0)).is_ok());
        assert!(encode(&CalendarTime::new(2024, 2, 29, 0, 0, 0)).is_ok());
        assert!(matches!(
            encode(&CalendarTime::new(2100, 2, 29, 0, 0, 0)),
            Err(IrigbError::Validation { field: "day", .. })
        ));
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2023, 13), 0);
    }

    #[test]
    fn encode_rejects_leap_second() {
        assert!(encode(&CalendarTime::new(2024, 1, 1, 23, 59, 60)).is_err());
    }

    #[test]
    fn negative_leap_second_rolls_to_next_day() {
        let t = CalendarTime::new(2024, 1, 1, 23, 59, 59);
        let control = rtc_data::LEAP_PENDING | rtc_data::LEAP_DELETE;
        let out = decode(words(&t, control)).unwrap();
        assert_eq!(out, CalendarTime::new(2024, 1, 2, 0, 0, 0));
        assert!(!out.quality.leap_pending);
    }

    #[test]
    fn positive_leap_second_reports_sixty() {
        let t = CalendarTime::new(2024, 1, 2, 0, 0, 0);
        let out = decode(words(&t, rtc_data::LEAP_PENDING)).unwrap();
        assert_eq!((out.year, out.month, out.day), (2024, 1, 1));
        assert_eq!((out.hour, out.minute, out.second), (23, 59, 60));
        assert!(out.quality.leap_pending);
        assert_eq!(out.quality.leap_sign, LeapSign::Insert);
    }

    #[test]
    fn positive_leap_tail_moves_to_next_minute() {
        let t = CalendarTime::new(2016, 12, 31, 23, 59, 61);
        let out = decode(words(&t, rtc_data::LEAP_PENDING)).unwrap();
        assert_eq!(out, CalendarTime::new(2017, 1, 1, 0, 0, 0));
    }

    #[test]
    fn pending_insert_mid_minute_passes_through() {
        let t = CalendarTime::new(2016, 12, 31, 23, 59, 30);
        let out = decode(words(&t, rtc_data::LEAP_PENDING)).unwrap();
        assert_eq!((out.second, out.quality.leap_pending), (30, true));
    }

    #[test]
    fn nanoseconds_survive_normalization() {
        let t = CalendarTime {
            nanosecond: 250_000_000,
            ..CalendarTime::new(2024, 6, 30, 23, 59, 59)
        };
        let out = decode(words(&t, rtc_data::LEAP_PENDING | rtc_data::LEAP_DELETE)).unwrap();
        assert_eq!(out.nanosecond, 250_000_000);
        assert_eq!((out.month, out.day, out.second), (7, 1, 0));
    }

    #[test]
    fn quality_word() {
        let q = TimeQuality::from_register(
            rtc_data::DST_ACTIVE | rtc_data::TZ_NEGATIVE | rtc_data::TZ_HALF_HOUR | (5 << 6) | (0xB << 10),
        );
        assert!(q.dst_active && !q.dst_pending);
        assert_eq!(q.tz_offset, 5);
        assert_eq!(q.quality, 0xB);
        assert_eq!(q.tz_offset_minutes(), -330);
    }

    #[test]
    fn firmware_date() {
        let d = FirmwareDate(0x2014_0101);
        assert_eq!(d.date().unwrap(), NaiveDate::from_ymd_opt(2014, 1, 1).unwrap());
        assert_eq!(d.to_string(), "2014-01-01");
        assert!(FirmwareDate(0x2014_1301).date().is_err());
        assert_eq!(FirmwareDate(0xFFFF_FFFF).to_string(), "0xffffffff");
    }
}
