//! Injectable time source.

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;

  /// Calendar date used for expiry and validation dates.
  fn today(&self) -> NaiveDate { self.now().date_naive() }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// A clock that only moves when told to. Used by tests and by one-shot
/// sweeps run "as of" a given date.
#[derive(Debug)]
pub struct FixedClock {
  now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
  pub fn new(now: DateTime<Utc>) -> Self { Self { now: Mutex::new(now) } }

  /// Midnight UTC at the start of `date`.
  pub fn at_date(date: NaiveDate) -> Self {
    Self::new(date.and_time(chrono::NaiveTime::MIN).and_utc())
  }

  pub fn set(&self, now: DateTime<Utc>) {
    *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
  }

  pub fn set_date(&self, date: NaiveDate) {
    self.set(date.and_time(chrono::NaiveTime::MIN).and_utc());
  }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> { *self.now.lock().unwrap_or_else(|e| e.into_inner()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fixed_clock_moves_only_when_set() {
    let d1 = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    let d2 = NaiveDate::from_ymd_opt(2024, 7, 2).unwrap();
    let clock = FixedClock::at_date(d1);
    assert_eq!(clock.today(), d1);
    assert_eq!(clock.today(), d1);
    clock.set_date(d2);
    assert_eq!(clock.today(), d2);
  }
}
