use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::CapturedFrame;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    SetupGoal,
    CaptureLock,
    Countdown,
    Verifying,
    Result,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::SetupGoal
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VerificationOutcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Please enter a goal.")]
    EmptyGoal,
    #[error("Please select a future date and time for the deadline.")]
    DeadlineNotInFuture,
    #[error("Verification is already in progress.")]
    VerificationInFlight,
    #[error("{action} is not available in the current phase")]
    WrongPhase { action: &'static str },
}

fn wrong_phase(action: &'static str) -> TransitionError {
    TransitionError::WrongPhase { action }
}

/// The single session record the phase controller owns. Transitions are
/// synchronous functions of `(state, event, now)` so the whole machine can be
/// exercised without a webview.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSession {
    pub phase: Phase,
    pub session_id: Option<String>,
    pub goal_text: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub lock_image: Option<CapturedFrame>,
    pub outcome: Option<VerificationOutcome>,
}

impl GoalSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// SetupGoal -> CaptureLock. The deadline must be strictly in the future
    /// and the goal text non-empty after trimming.
    pub fn submit_goal(
        &mut self,
        session_id: String,
        text: &str,
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if self.phase != Phase::SetupGoal {
            return Err(wrong_phase("submitting a goal"));
        }
        if text.trim().is_empty() {
            return Err(TransitionError::EmptyGoal);
        }
        if deadline <= now {
            return Err(TransitionError::DeadlineNotInFuture);
        }

        self.phase = Phase::CaptureLock;
        self.session_id = Some(session_id);
        self.goal_text = Some(text.to_string());
        self.deadline = Some(deadline);
        Ok(())
    }

    /// CaptureLock -> Countdown. Stores the reward image; its content is
    /// deliberately not inspected.
    pub fn lock_captured(&mut self, frame: CapturedFrame) -> Result<(), TransitionError> {
        if self.phase != Phase::CaptureLock {
            return Err(wrong_phase("capturing the lock image"));
        }
        self.lock_image = Some(frame);
        self.phase = Phase::Countdown;
        Ok(())
    }

    /// CaptureLock -> SetupGoal. Closing the capture modal before a lock image
    /// exists abandons the pending goal.
    pub fn cancel_lock_capture(&mut self) -> Result<(), TransitionError> {
        if self.phase != Phase::CaptureLock {
            return Err(wrong_phase("cancelling the lock capture"));
        }
        *self = Self::default();
        Ok(())
    }

    /// Countdown -> Verifying. At most one verifying episode may be in flight;
    /// a second request while one is pending is rejected.
    pub fn begin_verifying(&mut self) -> Result<(), TransitionError> {
        match self.phase {
            Phase::Countdown => {
                self.phase = Phase::Verifying;
                Ok(())
            }
            Phase::Verifying => Err(TransitionError::VerificationInFlight),
            _ => Err(wrong_phase("starting verification")),
        }
    }

    /// Verifying -> Result. A failed call and a negative verdict land here
    /// identically; the distinction only exists in the verifier's logs.
    pub fn record_verdict(&mut self, verdict: bool) -> Result<(), TransitionError> {
        if self.phase != Phase::Verifying {
            return Err(wrong_phase("recording a verdict"));
        }
        self.outcome = Some(if verdict {
            VerificationOutcome::Succeeded
        } else {
            VerificationOutcome::Failed
        });
        self.phase = Phase::Result;
        Ok(())
    }

    /// Result{Failed} -> Countdown. Goal, deadline and lock image survive; the
    /// outcome is cleared so the next attempt starts fresh.
    pub fn retry(&mut self) -> Result<(), TransitionError> {
        if self.phase != Phase::Result || self.outcome != Some(VerificationOutcome::Failed) {
            return Err(wrong_phase("retrying verification"));
        }
        self.outcome = None;
        self.phase = Phase::Countdown;
        Ok(())
    }

    /// Result -> SetupGoal. Clears goal, deadline, images and outcome in one
    /// step.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        if self.phase != Phase::Result {
            return Err(wrong_phase("resetting the session"));
        }
        *self = Self::default();
        Ok(())
    }

    pub fn deadline_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline.map(|deadline| deadline < now).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn frame() -> CapturedFrame {
        CapturedFrame::from_bytes("image/jpeg", &[0xff, 0xd8, 0xff, 0xe0])
    }

    fn session_in_countdown(now: DateTime<Utc>) -> GoalSession {
        let mut session = GoalSession::new();
        session
            .submit_goal("s1".into(), "Run a 5k", now + Duration::hours(1), now)
            .unwrap();
        session.lock_captured(frame()).unwrap();
        session
    }

    #[test]
    fn submit_goal_moves_to_capture_lock() {
        let now = Utc::now();
        let mut session = GoalSession::new();
        session
            .submit_goal("s1".into(), "Run a 5k", now + Duration::hours(1), now)
            .unwrap();

        assert_eq!(session.phase, Phase::CaptureLock);
        assert_eq!(session.goal_text.as_deref(), Some("Run a 5k"));
        assert!(session.lock_image.is_none());
    }

    #[test]
    fn submit_goal_rejects_blank_text() {
        let now = Utc::now();
        let mut session = GoalSession::new();
        let err = session
            .submit_goal("s1".into(), "   ", now + Duration::hours(1), now)
            .unwrap_err();

        assert_eq!(err, TransitionError::EmptyGoal);
        assert_eq!(session.phase, Phase::SetupGoal);
    }

    #[test]
    fn submit_goal_rejects_past_and_present_deadlines() {
        let now = Utc::now();
        let mut session = GoalSession::new();

        let err = session
            .submit_goal("s1".into(), "Run a 5k", now - Duration::seconds(1), now)
            .unwrap_err();
        assert_eq!(err, TransitionError::DeadlineNotInFuture);

        // Exactly "now" is not strictly in the future either.
        let err = session
            .submit_goal("s1".into(), "Run a 5k", now, now)
            .unwrap_err();
        assert_eq!(err, TransitionError::DeadlineNotInFuture);
        assert_eq!(session.phase, Phase::SetupGoal);
    }

    #[test]
    fn lock_capture_stores_image_and_starts_countdown() {
        let now = Utc::now();
        let session = session_in_countdown(now);

        assert_eq!(session.phase, Phase::Countdown);
        assert!(session.lock_image.is_some());
    }

    #[test]
    fn cancel_lock_capture_abandons_pending_goal() {
        let now = Utc::now();
        let mut session = GoalSession::new();
        session
            .submit_goal("s1".into(), "Run a 5k", now + Duration::hours(1), now)
            .unwrap();
        session.cancel_lock_capture().unwrap();

        assert_eq!(session.phase, Phase::SetupGoal);
        assert!(session.goal_text.is_none());
        assert!(session.deadline.is_none());
    }

    #[test]
    fn second_verify_request_is_rejected_while_one_is_pending() {
        let now = Utc::now();
        let mut session = session_in_countdown(now);
        session.begin_verifying().unwrap();

        let err = session.begin_verifying().unwrap_err();
        assert_eq!(err, TransitionError::VerificationInFlight);
        assert_eq!(session.phase, Phase::Verifying);
    }

    #[test]
    fn verdict_requires_verifying_phase() {
        let now = Utc::now();
        let mut session = session_in_countdown(now);

        assert!(session.record_verdict(true).is_err());
        session.begin_verifying().unwrap();
        session.record_verdict(true).unwrap();

        assert_eq!(session.phase, Phase::Result);
        assert_eq!(session.outcome, Some(VerificationOutcome::Succeeded));
    }

    #[test]
    fn retry_keeps_goal_and_lock_image() {
        let now = Utc::now();
        let mut session = session_in_countdown(now);
        let lock_image = session.lock_image.clone();
        session.begin_verifying().unwrap();
        session.record_verdict(false).unwrap();

        session.retry().unwrap();

        assert_eq!(session.phase, Phase::Countdown);
        assert!(session.outcome.is_none());
        assert_eq!(session.lock_image, lock_image);
        assert_eq!(session.goal_text.as_deref(), Some("Run a 5k"));
    }

    #[test]
    fn retry_is_not_available_after_success() {
        let now = Utc::now();
        let mut session = session_in_countdown(now);
        session.begin_verifying().unwrap();
        session.record_verdict(true).unwrap();

        assert!(session.retry().is_err());
        assert_eq!(session.phase, Phase::Result);
    }

    #[test]
    fn reset_clears_everything_atomically() {
        let now = Utc::now();
        let mut session = session_in_countdown(now);
        session.begin_verifying().unwrap();
        session.record_verdict(true).unwrap();

        session.reset().unwrap();

        assert_eq!(session.phase, Phase::SetupGoal);
        assert!(session.session_id.is_none());
        assert!(session.goal_text.is_none());
        assert!(session.deadline.is_none());
        assert!(session.lock_image.is_none());
        assert!(session.outcome.is_none());
    }

    #[test]
    fn deadline_expiry_is_advisory_only() {
        let now = Utc::now();
        let mut session = GoalSession::new();
        session
            .submit_goal("s1".into(), "Run a 5k", now + Duration::seconds(1), now)
            .unwrap();
        session.lock_captured(frame()).unwrap();

        let later = now + Duration::hours(2);
        assert!(session.deadline_expired(later));
        // Verification remains possible after the deadline passes.
        assert_eq!(session.phase, Phase::Countdown);
        session.begin_verifying().unwrap();
    }
}
