pub mod shortage;

pub use shortage::*;
