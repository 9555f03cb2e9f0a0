use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;

/// source of the current timestamp
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

impl Clock for SafeTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        SafeTimeProvider::now(self)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use hourglass_rs::TimeSource;

    #[test]
    fn test_controlled_time() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let time = SafeTimeProvider::new(TimeSource::Test(start));
        assert_eq!(Clock::now(&time), start);

        time.test_control().unwrap().advance(Duration::days(7));
        assert_eq!(Clock::now(&time), start + Duration::days(7));
    }
}
