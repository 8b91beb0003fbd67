mod category;
mod event;
mod organization;
mod post;
mod profile;

pub use category::{resolve_category_id, Category, FALLBACK_CATEGORY_ID};
pub use event::{Event, EVENT_TYPE_VOLUNTEER_HELP};
pub use organization::Organization;
pub use post::{Post, STATUS_OPEN};
pub use profile::{Profile, DEFAULT_RADIUS_METERS, ROLE_PROVIDER, ROLE_SEEKER};
