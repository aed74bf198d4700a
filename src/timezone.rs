use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current date and time in `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// Returns `None` if the timezone name is not recognised.
pub fn local_now(canonical_timezone: &str) -> Option<OffsetDateTime> {
    get_local_offset(canonical_timezone)
        .map(|offset| OffsetDateTime::now_utc().to_offset(offset))
}

/// Today's date in `canonical_timezone`.
pub fn local_today(canonical_timezone: &str) -> Option<Date> {
    local_now(canonical_timezone).map(|now| now.date())
}

#[cfg(test)]
mod timezone_tests {
    use time::{OffsetDateTime, UtcOffset};

    use super::{get_local_offset, local_now, local_today};

    #[test]
    fn utc_has_zero_offset() {
        assert_eq!(get_local_offset("Etc/UTC"), Some(UtcOffset::UTC));
    }

    #[test]
    fn unknown_timezone_is_none() {
        assert_eq!(get_local_offset("Middle/Earth"), None);
        assert_eq!(local_today("Middle/Earth"), None);
    }

    #[test]
    fn local_today_matches_utc_date() {
        let want = OffsetDateTime::now_utc().date();
        let got = local_today("Etc/UTC").unwrap();

        // The date may roll over between the two calls.
        assert!(got == want || got == want.next_day().unwrap());
    }

    #[test]
    fn local_now_uses_timezone_offset() {
        let now = local_now("Etc/GMT-13").unwrap();

        assert_eq!(now.offset(), UtcOffset::from_hms(13, 0, 0).unwrap());
    }
}
