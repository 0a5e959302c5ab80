//! Policy evaluation: condition matching and multi-policy resolution.

pub mod engine;
pub mod pattern;

pub use engine::{
    applicable_actions, applies, first_match, matches, ConditionMatcher, PolicyMatcher,
};
pub use pattern::glob_matches;
