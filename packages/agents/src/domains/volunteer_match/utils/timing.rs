use chrono::{DateTime, Days, Duration, NaiveTime, Utc};

/// Start hour (UTC) and duration for a help session of the given match type.
pub fn session_slot(match_type: &str) -> (u32, Duration) {
    match match_type {
        "tutoring" => (16, Duration::hours(1)),
        "transportation" => (9, Duration::minutes(30)),
        "manual_labor" => (10, Duration::hours(3)),
        "cooking" => (11, Duration::hours(2)),
        "cleaning" => (10, Duration::hours(2)),
        "technology" => (14, Duration::minutes(90)),
        "language" => (16, Duration::hours(1)),
        "childcare" => (9, Duration::hours(4)),
        _ => (10, Duration::hours(1)),
    }
}

/// Suggested session window: tomorrow (UTC) at the type's start hour.
pub fn session_window(match_type: &str, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let (hour, duration) = session_slot(match_type);
    let day = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or_else(|| now.date_naive());
    let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let start = day.and_time(time).and_utc();
    (start, start + duration)
}
