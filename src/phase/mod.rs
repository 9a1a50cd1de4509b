pub mod commands;
pub mod controller;
pub mod countdown;
pub mod state;

pub use controller::{PhaseController, PhaseSnapshot};
pub use countdown::TimeLeft;
pub use state::{GoalSession, Phase, TransitionError, VerificationOutcome};
