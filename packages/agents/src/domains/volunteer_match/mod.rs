//! Volunteer matching: offers and help sessions for seeker requests.

pub mod activities;
pub mod models;
pub mod stage;
pub mod utils;

pub use models::{
    HelpEvent, HelpOffer, Match, MatchSuggestion, SuggestionKind, VolunteerMatchReport,
};
pub use stage::{VolunteerMatchConfig, VolunteerMatchStage};
