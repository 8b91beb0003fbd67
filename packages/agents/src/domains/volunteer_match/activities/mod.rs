mod matching;

pub use matching::{
    available_volunteers, event_description, find_matches, match_suggestions, schedule_help,
    score_pair, seeker_requests, Scheduled,
};
