//! Host clock access
//!
//! The RTC keeps local wall-clock time, so the host side is read and set
//! as local time too. [`SystemClock`] talks to the OS; tests substitute
//! their own [`HostClock`].

use std::fmt::Debug;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, TimeDelta, TimeZone, Timelike};
use rustix::time::{clock_settime, ClockId, Timespec};

use crate::error::{IrigbError, Result};

/// Host wall clock, in local time.
pub trait HostClock: Debug {
    /// Block until the next whole second and return it.
    ///
    /// # Errors
    ///
    /// Returns `HostClock` if the time cannot be read.
    fn next_second(&mut self) -> Result<NaiveDateTime>;

    /// Set the host clock to `local`.
    ///
    /// # Errors
    ///
    /// Returns `HostClock` if the value does not exist in the local zone or
    /// the OS refuses the change.
    fn set(&mut self, local: NaiveDateTime) -> Result<()>;
}

/// The OS realtime clock. Setting it needs `CAP_SYS_TIME`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl HostClock for SystemClock {
    fn next_second(&mut self) -> Result<NaiveDateTime> {
        let (next, wait) = next_whole_second(Local::now().naive_local())?;
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        Ok(next)
    }

    fn set(&mut self, local: NaiveDateTime) -> Result<()> {
        // A repeated hour (DST fall-back) resolves to its first occurrence.
        let instant = Local
            .from_local_datetime(&local)
            .earliest()
            .ok_or_else(|| IrigbError::host_clock(format!("{local} does not exist in the local time zone")))?;
        let ts = Timespec {
            tv_sec: instant.timestamp(),
            tv_nsec: i64::from(instant.timestamp_subsec_nanos()),
        };
        clock_settime(ClockId::Realtime, ts)
            .map_err(|e| IrigbError::host_clock(format!("clock_settime: {e}")))?;
        tracing::debug!("Host clock set to {local}");
        Ok(())
    }
}

/// The first whole second at or after `now`, and how long until it.
///
/// chrono carries a leap second as `:59` with a nanosecond field of
/// 1e9 or more; that case waits out the rest of the leap second and lands
/// on `:00` of the next minute.
fn next_whole_second(now: NaiveDateTime) -> Result<(NaiveDateTime, Duration)> {
    const NANOS_PER_SEC: u32 = 1_000_000_000;

    let nanos = now.nanosecond();
    let floor = now
        .with_nanosecond(0)
        .ok_or_else(|| IrigbError::host_clock("cannot truncate local time"))?;
    if nanos == 0 {
        return Ok((floor, Duration::ZERO));
    }
    let next = floor
        .checked_add_signed(TimeDelta::seconds(1))
        .ok_or_else(|| IrigbError::host_clock(format!("no second after {floor}")))?;
    let wait = if nanos >= NANOS_PER_SEC {
        2 * NANOS_PER_SEC - nanos
    } else {
        NANOS_PER_SEC - nanos
    };
    Ok((next, Duration::from_nanos(u64::from(wait))))
}
