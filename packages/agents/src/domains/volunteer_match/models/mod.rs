mod help_event;
mod help_offer;
mod matching;
mod report;

pub use help_event::{
    add_participant, EventOutcome, HelpEvent, HelpEventDraft, ParticipantRole,
    EVENT_STATUS_SCHEDULED,
};
pub use help_offer::{HelpOffer, HelpOfferDraft, OfferOutcome, OFFER_STATUS_PENDING};
pub use matching::{Match, MatchSuggestion, SuggestionKind};
pub use report::VolunteerMatchReport;
