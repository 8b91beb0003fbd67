pub mod confidence;
pub mod timing;

pub use confidence::*;
pub use timing::*;
