use thiserror::Error;
use types::ScheduledSession;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeError {
    #[error("invalid time format: {0:?} (expected HH:MM)")]
    InvalidTimeFormat(String),
    #[error("interval {start}-{end} does not end after it starts")]
    EmptyInterval { start: String, end: String },
}

/// Parses `"HH:MM"` (24h) into minutes since midnight.
pub fn time_to_minutes(time: &str) -> Result<u32, TimeError> {
    let bad = || TimeError::InvalidTimeFormat(time.to_string());
    let (h, m) = time.trim().split_once(':').ok_or_else(bad)?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return Err(bad());
    }
    if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let hours: u32 = h.parse().map_err(|_| bad())?;
    let minutes: u32 = m.parse().map_err(|_| bad())?;
    if hours > 23 || minutes > 59 {
        return Err(bad());
    }
    Ok(hours * 60 + minutes)
}

pub fn minutes_to_time(minutes: u32) -> String {
    format!("{:02}:{:02}", (minutes / 60) % 24, minutes % 60)
}

/// Half-open `[start, end)` span of a day, in minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    pub start: u32,
    pub end: u32,
}

impl Interval {
    pub fn parse(start: &str, end: &str) -> Result<Self, TimeError> {
        let s = time_to_minutes(start)?;
        let e = time_to_minutes(end)?;
        if s >= e {
            return Err(TimeError::EmptyInterval {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start: s, end: e })
    }

    pub fn of(session: &ScheduledSession) -> Result<Self, TimeError> {
        Self::parse(&session.start_time, &session.end_time)
    }

    pub fn duration(&self) -> u32 {
        self.end - self.start
    }

    pub fn intersects(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Same day and intersecting intervals; touching boundaries do not count.
pub fn is_overlapping(a: &ScheduledSession, b: &ScheduledSession) -> Result<bool, TimeError> {
    if a.day != b.day {
        return Ok(false);
    }
    Ok(Interval::of(a)?.intersects(&Interval::of(b)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use types::Day;

    fn at(day: Day, start: &str, end: &str) -> ScheduledSession {
        ScheduledSession {
            subject: "s".into(),
            teacher: "t".into(),
            group: "g".into(),
            group_size: None,
            day,
            start_time: start.into(),
            end_time: end.into(),
            room: "r".into(),
        }
    }

    #[test]
    fn parses_clock_times() {
        assert_eq!(time_to_minutes("08:15"), Ok(495));
        assert_eq!(time_to_minutes("00:00"), Ok(0));
        assert_eq!(time_to_minutes("23:59"), Ok(1439));
        assert_eq!(time_to_minutes("8:15"), Ok(495));
    }

    #[test]
    fn rejects_malformed_times() {
        for bad in ["", "0815", "ab:cd", "08:5", "24:00", "12:60", "-1:30", "08:15:00", " :15"] {
            assert!(
                matches!(time_to_minutes(bad), Err(TimeError::InvalidTimeFormat(_))),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn back_to_back_is_not_overlap() {
        let a = at(Day::Monday, "08:15", "09:45");
        let b = at(Day::Monday, "09:45", "11:00");
        assert_eq!(is_overlapping(&a, &b), Ok(false));
        assert_eq!(is_overlapping(&b, &a), Ok(false));
    }

    #[test]
    fn different_days_never_overlap() {
        let a = at(Day::Monday, "08:15", "09:45");
        let b = at(Day::Tuesday, "08:15", "09:45");
        assert_eq!(is_overlapping(&a, &b), Ok(false));
    }

    #[test]
    fn identical_slots_overlap() {
        let a = at(Day::Friday, "10:00", "11:30");
        assert_eq!(is_overlapping(&a, &a.clone()), Ok(true));
    }

    #[test]
    fn inverted_interval_is_an_error() {
        assert!(matches!(
            Interval::parse("10:00", "09:00"),
            Err(TimeError::EmptyInterval { .. })
        ));
        assert!(Interval::parse("10:00", "10:00").is_err());
    }

    #[test]
    fn formats_minutes() {
        assert_eq!(minutes_to_time(495), "08:15");
        assert_eq!(minutes_to_time(0), "00:00");
    }

    proptest! {
        #[test]
        fn prop_minutes_roundtrip(m in 0u32..1440) {
            prop_assert_eq!(time_to_minutes(&minutes_to_time(m)), Ok(m));
        }

        #[test]
        fn prop_overlap_matches_interval_arithmetic(
            s1 in 0u32..1380, l1 in 1u32..60,
            s2 in 0u32..1380, l2 in 1u32..60,
            same_day in any::<bool>(),
        ) {
            let a = at(Day::Monday, &minutes_to_time(s1), &minutes_to_time(s1 + l1));
            let day = if same_day { Day::Monday } else { Day::Wednesday };
            let b = at(day, &minutes_to_time(s2), &minutes_to_time(s2 + l2));
            let disjoint = s1 + l1 <= s2 || s2 + l2 <= s1;
            let got = is_overlapping(&a, &b).unwrap();
            prop_assert_eq!(got, same_day && !disjoint);
            prop_assert_eq!(got, is_overlapping(&b, &a).unwrap());
        }
    }
}
