use time::{OffsetDateTime, Time, UtcOffset};

use crate::error::PostError;
use crate::{ISO8601_DATETIME, LONG_DATETIME, SHORT_DATE};

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Source of the signing instant, read once per envelope.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in UTC.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        now_utc()
    }
}

/// Always returns the same instant, normalized to UTC.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FixedClock(OffsetDateTime);

impl FixedClock {
    pub fn new(at: OffsetDateTime) -> Self {
        Self(at.to_offset(UtcOffset::UTC))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> OffsetDateTime {
        (**self).now()
    }
}

/// The three date renderings that end up in a POST policy and its form fields.
///
/// Override it to pin the strings in tests or to match a storage service with
/// different expectations, [`AmzDateFormatter`] is what S3 accepts.
pub trait DateFormatter {
    /// `x-amz-date` value.
    fn amz_date(&self, now: &OffsetDateTime) -> Result<String, PostError>;
    /// Date component of the credential scope.
    fn amz_date_short(&self, now: &OffsetDateTime) -> Result<String, PostError>;
    /// `expiration` member of the policy document.
    fn expiration(&self, at: &OffsetDateTime) -> Result<String, PostError>;
}

/// `x-amz-date` is the signing day at midnight (`20170101T000000Z`), the
/// credential scope date is `20170101` and the expiration keeps its time of
/// day at second precision (`2017-01-01T01:00:00Z`). All in UTC.
#[derive(Clone, Copy, Debug, Default)]
pub struct AmzDateFormatter;

impl DateFormatter for AmzDateFormatter {
    fn amz_date(&self, now: &OffsetDateTime) -> Result<String, PostError> {
        let midnight = now.to_offset(UtcOffset::UTC).replace_time(Time::MIDNIGHT);
        Ok(midnight.format(LONG_DATETIME)?)
    }

    fn amz_date_short(&self, now: &OffsetDateTime) -> Result<String, PostError> {
        Ok(now.to_offset(UtcOffset::UTC).format(SHORT_DATE)?)
    }

    fn expiration(&self, at: &OffsetDateTime) -> Result<String, PostError> {
        Ok(at.to_offset(UtcOffset::UTC).format(ISO8601_DATETIME)?)
    }
}
