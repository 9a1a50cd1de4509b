use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use chrono::Utc;
use log::{error, info};
use serde::Serialize;
use tokio::{
    sync::Mutex,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use tauri::{AppHandle, Emitter};

use crate::{
    capture::{CaptureController, CapturePurpose, CapturedFrame},
    verifier::GeminiVerifier,
};

use super::{countdown::TimeLeft, GoalSession, Phase, TransitionError};

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSnapshot {
    pub state: GoalSession,
    pub time_left: Option<TimeLeft>,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct PhaseChangedEvent {
    state: GoalSession,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct CountdownTickEvent {
    time_left: TimeLeft,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct VerificationCompletedEvent {
    session_id: String,
    verdict: bool,
}

#[derive(Clone)]
pub struct PhaseController {
    state: Arc<Mutex<GoalSession>>,
    capture: Arc<Mutex<CaptureController>>,
    verifier: Arc<GeminiVerifier>,
    app_handle: AppHandle,
    ticker: Arc<Mutex<Option<CancellationToken>>>,
    tick_interval: Duration,
}

impl PhaseController {
    pub fn new(app_handle: AppHandle, verifier: GeminiVerifier) -> Self {
        Self {
            state: Arc::new(Mutex::new(GoalSession::new())),
            capture: Arc::new(Mutex::new(CaptureController::new())),
            verifier: Arc::new(verifier),
            app_handle,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
        }
    }

    pub async fn get_state(&self) -> GoalSession {
        self.state.lock().await.clone()
    }

    pub async fn get_snapshot(&self) -> PhaseSnapshot {
        let state = self.state.lock().await.clone();
        let time_left = match (state.phase, state.deadline) {
            (Phase::Countdown, Some(deadline)) => Some(TimeLeft::until(deadline, Utc::now())),
            _ => None,
        };
        PhaseSnapshot { state, time_left }
    }

    /// SetupGoal -> CaptureLock. Validates the goal, then opens the camera for
    /// the lock image. Any stale capture session is released first; the stream
    /// must never outlive the phase that needed it.
    pub async fn submit_goal(
        &self,
        goal_text: String,
        deadline: chrono::DateTime<Utc>,
    ) -> Result<GoalSession> {
        let session_id = Uuid::new_v4().to_string();

        {
            let mut state = self.state.lock().await;
            state
                .submit_goal(session_id.clone(), &goal_text, deadline, Utc::now())
                .map_err(|err| anyhow!(err))?;
        }

        {
            let mut capture = self.capture.lock().await;
            capture.close();
            capture.open(CapturePurpose::Lock)?;
        }

        info!("goal session {session_id} started; waiting for lock image");
        self.emit_state_changed().await;
        Ok(self.get_state().await)
    }

    pub async fn freeze_frame(&self, frame_data_url: String) -> Result<()> {
        let frame = CapturedFrame::from_data_url(&frame_data_url).map_err(|err| anyhow!(err))?;
        self.capture.lock().await.freeze(frame)
    }

    pub async fn retake_frame(&self) -> Result<()> {
        self.capture.lock().await.retake()
    }

    /// Routes the confirmed frame by purpose: a lock image starts the
    /// countdown, a proof image starts verification.
    pub async fn confirm_capture(&self) -> Result<GoalSession> {
        let (purpose, frame) = self.capture.lock().await.confirm()?;

        match purpose {
            CapturePurpose::Lock => {
                {
                    let mut state = self.state.lock().await;
                    state.lock_captured(frame).map_err(|err| anyhow!(err))?;
                }
                self.spawn_countdown_ticker().await;
                info!("lock image stored; countdown running");
                self.emit_state_changed().await;
            }
            CapturePurpose::Proof => {
                {
                    let mut state = self.state.lock().await;
                    state.begin_verifying().map_err(|err| anyhow!(err))?;
                }
                self.cancel_ticker().await;
                self.emit_state_changed().await;
                self.spawn_verification(frame).await?;
            }
        }

        Ok(self.get_state().await)
    }

    /// Releases the device stream unconditionally. Abandoning the lock capture
    /// also abandons the pending goal; abandoning a proof capture leaves the
    /// countdown running.
    pub async fn cancel_capture(&self) -> Result<GoalSession> {
        let released = self.capture.lock().await.close();

        if released == Some(CapturePurpose::Lock) {
            let mut state = self.state.lock().await;
            if let Err(err) = state.cancel_lock_capture() {
                error!("lock capture cancelled in unexpected phase: {err}");
            }
        }

        self.emit_state_changed().await;
        Ok(self.get_state().await)
    }

    /// Countdown -> (implicit proof capture). Opens the camera for proof; the
    /// phase only moves to Verifying once a frame is confirmed.
    pub async fn request_verification(&self) -> Result<()> {
        {
            let state = self.state.lock().await;
            match state.phase {
                Phase::Countdown => {}
                Phase::Verifying => {
                    return Err(anyhow!(TransitionError::VerificationInFlight));
                }
                _ => return Err(anyhow!("no goal is waiting for verification")),
            }
        }

        self.capture.lock().await.open(CapturePurpose::Proof)
    }

    pub async fn retry(&self) -> Result<GoalSession> {
        {
            let mut state = self.state.lock().await;
            state.retry().map_err(|err| anyhow!(err))?;
        }
        self.spawn_countdown_ticker().await;
        info!("verification retry; back to countdown");
        self.emit_state_changed().await;
        Ok(self.get_state().await)
    }

    pub async fn reset(&self) -> Result<GoalSession> {
        {
            let mut state = self.state.lock().await;
            state.reset().map_err(|err| anyhow!(err))?;
        }
        self.cancel_ticker().await;
        self.capture.lock().await.close();
        info!("session reset");
        self.emit_state_changed().await;
        Ok(self.get_state().await)
    }

    async fn spawn_verification(&self, frame: CapturedFrame) -> Result<()> {
        let (session_id, goal_text) = {
            let state = self.state.lock().await;
            let session_id = state
                .session_id
                .clone()
                .ok_or_else(|| anyhow!("missing session id"))?;
            let goal_text = state
                .goal_text
                .clone()
                .ok_or_else(|| anyhow!("missing goal text"))?;
            (session_id, goal_text)
        };

        let state = self.state.clone();
        let verifier = self.verifier.clone();
        let app_handle = self.app_handle.clone();

        tokio::spawn(async move {
            let verdict = verifier.verify(&goal_text, &frame).await;

            let snapshot = {
                let mut guard = state.lock().await;
                if let Err(err) = guard.record_verdict(verdict) {
                    error!("failed to record verdict for session {session_id}: {err}");
                    return;
                }
                guard.clone()
            };

            info!("session {session_id} verification complete: verdict={verdict}");
            let _ = app_handle.emit(
                "verification-completed",
                VerificationCompletedEvent {
                    session_id,
                    verdict,
                },
            );
            emit_phase_changed(&app_handle, snapshot);
        });

        Ok(())
    }

    async fn spawn_countdown_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(token) = ticker_guard.take() {
            token.cancel();
        }

        let token = CancellationToken::new();
        let loop_token = token.clone();
        let state = self.state.clone();
        let app_handle = self.app_handle.clone();
        let tick_interval = self.tick_interval;

        tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let deadline = {
                            let guard = state.lock().await;
                            if guard.phase != Phase::Countdown {
                                break;
                            }
                            guard.deadline
                        };
                        let Some(deadline) = deadline else {
                            break;
                        };

                        // Expiry is advisory; the tick keeps flowing and no
                        // transition happens when the deadline passes.
                        let time_left = TimeLeft::until(deadline, Utc::now());
                        let _ = app_handle.emit("countdown-tick", CountdownTickEvent { time_left });
                    }
                    _ = loop_token.cancelled() => {
                        info!("countdown ticker shutting down");
                        break;
                    }
                }
            }
        });

        *ticker_guard = Some(token);
    }

    async fn cancel_ticker(&self) {
        if let Some(token) = self.ticker.lock().await.take() {
            token.cancel();
        }
    }

    async fn emit_state_changed(&self) {
        let state = self.state.lock().await.clone();
        emit_phase_changed(&self.app_handle, state);
    }
}

fn emit_phase_changed(app_handle: &AppHandle, state: GoalSession) {
    let _ = app_handle.emit("phase-changed", PhaseChangedEvent { state });
}
