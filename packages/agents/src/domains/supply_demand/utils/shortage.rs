//! Pure shortage math for request/offer balance per category.
//!
//! Requests are open posts with `is_free = false`, offers are open posts with
//! `is_free = true`. Denominators are floored at one so empty categories
//! never divide by zero.

/// Categories with fewer requests than this are never shortages
pub const MIN_REQUESTS_FOR_SHORTAGE: usize = 3;

/// Shortage ratio must exceed this
pub const SHORTAGE_RATIO_THRESHOLD: f64 = 0.3;

pub const SHORTAGE_WINDOW_HOURS: i64 = 48;

pub const MAX_NOTIFIED_PROVIDERS: usize = 5;
pub const MAX_NOTIFIED_ORGANIZATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortageThresholds {
    pub min_requests: usize,
    pub threshold: f64,
}

impl Default for ShortageThresholds {
    fn default() -> Self {
        Self {
            min_requests: MIN_REQUESTS_FOR_SHORTAGE,
            threshold: SHORTAGE_RATIO_THRESHOLD,
        }
    }
}

/// (requests - offers) / max(offers, 1). Unbounded above, negative on surplus.
pub fn shortage_ratio(requests: usize, offers: usize) -> f64 {
    (requests as f64 - offers as f64) / offers.max(1) as f64
}

/// (requests - offers) / max(requests, 1). At most 1.
pub fn severity_score(requests: usize, offers: usize) -> f64 {
    (requests as f64 - offers as f64) / requests.max(1) as f64
}

pub fn is_shortage(requests: usize, offers: usize, thresholds: &ShortageThresholds) -> bool {
    requests >= thresholds.min_requests && shortage_ratio(requests, offers) > thresholds.threshold
}

/// Most frequent location; ties go to the one seen first.
pub fn most_frequent<'a, I>(locations: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for location in locations {
        match counts.iter_mut().find(|(seen, _)| *seen == location) {
            Some((_, count)) => *count += 1,
            None => counts.push((location, 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (location, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((location, count));
        }
    }
    best.map(|(location, _)| location.to_string())
}
