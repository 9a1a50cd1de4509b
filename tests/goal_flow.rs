//! End-to-end scenarios over the goal session state machine.

use chrono::{Duration, Utc};

use goallock_lib::capture::{CaptureController, CapturePurpose, CapturedFrame};
use goallock_lib::phase::{GoalSession, Phase, TimeLeft, TransitionError, VerificationOutcome};
use goallock_lib::verifier::affirmative;

fn lock_frame() -> CapturedFrame {
    CapturedFrame::from_data_url("data:image/jpeg;base64,/9j/4AAQSkZJRg==").unwrap()
}

#[test]
fn happy_path_reveals_the_lock_image_and_resets() {
    let now = Utc::now();
    let mut session = GoalSession::new();

    session
        .submit_goal("s1".into(), "Run a 5k", now + Duration::hours(1), now)
        .unwrap();
    assert_eq!(session.phase, Phase::CaptureLock);

    session.lock_captured(lock_frame()).unwrap();
    assert_eq!(session.phase, Phase::Countdown);

    // The lock image stays put through countdown, verification and result.
    session.begin_verifying().unwrap();
    assert_eq!(session.lock_image, Some(lock_frame()));

    session.record_verdict(true).unwrap();
    assert_eq!(session.phase, Phase::Result);
    assert_eq!(session.outcome, Some(VerificationOutcome::Succeeded));
    assert_eq!(session.lock_image, Some(lock_frame()));

    session.reset().unwrap();
    assert_eq!(session.phase, Phase::SetupGoal);
    assert!(session.lock_image.is_none());
    assert!(session.goal_text.is_none());
}

#[test]
fn failed_verification_offers_retry_with_everything_intact() {
    let now = Utc::now();
    let deadline = now + Duration::hours(1);
    let mut session = GoalSession::new();

    session
        .submit_goal("s1".into(), "Clean the garage", deadline, now)
        .unwrap();
    session.lock_captured(lock_frame()).unwrap();
    session.begin_verifying().unwrap();
    session.record_verdict(false).unwrap();
    assert_eq!(session.outcome, Some(VerificationOutcome::Failed));

    session.retry().unwrap();

    assert_eq!(session.phase, Phase::Countdown);
    assert!(session.outcome.is_none());
    assert_eq!(session.goal_text.as_deref(), Some("Clean the garage"));
    assert_eq!(session.deadline, Some(deadline));
    assert_eq!(session.lock_image, Some(lock_frame()));

    // A second attempt can run to completion without recapturing the lock.
    session.begin_verifying().unwrap();
    session.record_verdict(true).unwrap();
    assert_eq!(session.outcome, Some(VerificationOutcome::Succeeded));
}

#[test]
fn verification_episodes_never_overlap() {
    let now = Utc::now();
    let mut session = GoalSession::new();
    session
        .submit_goal("s1".into(), "Run a 5k", now + Duration::hours(1), now)
        .unwrap();
    session.lock_captured(lock_frame()).unwrap();

    session.begin_verifying().unwrap();
    assert_eq!(
        session.begin_verifying().unwrap_err(),
        TransitionError::VerificationInFlight
    );
}

#[test]
fn countdown_scenario_one_hour_goal() {
    let now = Utc::now();
    let deadline = now + Duration::hours(1);
    let mut session = GoalSession::new();
    session
        .submit_goal("s1".into(), "Run a 5k", deadline, now)
        .unwrap();
    session.lock_captured(lock_frame()).unwrap();

    assert_eq!(TimeLeft::until(deadline, now).to_string(), "00:01:00:00");
    assert_eq!(
        TimeLeft::until(deadline, deadline - Duration::seconds(1)).to_string(),
        "00:00:00:01"
    );

    // Expiry is advisory only; the session still verifies afterwards.
    let after = deadline + Duration::minutes(5);
    assert!(session.deadline_expired(after));
    session.begin_verifying().unwrap();
}

#[test]
fn verdict_parsing_matches_the_remote_contract() {
    assert!(affirmative("YES"));
    assert!(affirmative(" yes\n"));

    // Anything other than the bare word is a failure, including a simulated
    // network error surfacing as an empty body.
    assert!(!affirmative("Yes."));
    assert!(!affirmative("no"));
    assert!(!affirmative(""));
}

#[test]
fn capture_sessions_route_by_purpose() {
    let mut capture = CaptureController::new();

    // Lock capture first.
    capture.open(CapturePurpose::Lock).unwrap();
    capture.freeze(lock_frame()).unwrap();
    let (purpose, frame) = capture.confirm().unwrap();
    assert_eq!(purpose, CapturePurpose::Lock);

    // The frame that comes back decodes to the bytes that went in.
    assert_eq!(frame.bytes().unwrap(), lock_frame().bytes().unwrap());

    // Proof capture afterwards reuses the controller; streams never overlap.
    capture.open(CapturePurpose::Proof).unwrap();
    assert!(capture.open(CapturePurpose::Proof).is_err());
    capture.close();
}
