//! What a player can infer about hidden cards.
//!
//! - `enumerator`: every assignment of closed opponent slots consistent with
//!   what the viewer knows, plus a counting variant that skips materializing.
//! - `probability`: per-slot marginals over those assignments.

pub mod enumerator;
pub mod probability;

pub use enumerator::{
    BeliefState, SlotRef, count_worlds, enumerate_with_exclusions, enumerate_worlds,
    global_exclusions,
};
pub use probability::{AttackCandidate, TIE_TOLERANCE, estimate_probabilities, is_certain};
