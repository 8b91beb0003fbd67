// Community Needs Agents - Pipeline Core
//
// Runs the need-detection and volunteer-matching agents against the shared
// community database. Each agent is a pipeline stage; the orchestrator runs
// them in dependency order and aggregates what they found.
//
// Stage logic is organized per-domain in domains/*/

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod pipeline;

pub use config::*;
