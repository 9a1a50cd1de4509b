use std::time::Duration;

use log::{error, info};
use reqwest::Client;
use tokio::time::timeout;

use crate::capture::CapturedFrame;
use crate::credentials::CredentialStore;

use super::{affirmative, request_body, response_text, GenerateContentResponse, VerifyError};

const GEMINI_MODEL: &str = "gemini-2.5-flash";
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const VERIFY_TIMEOUT_SECS: u64 = 30;

/// Remote judge for proof photos. `verify` always resolves to a verdict;
/// every failure mode degrades to `false` after being logged.
pub struct GeminiVerifier {
    http: Client,
    credentials: CredentialStore,
    model: String,
}

impl GeminiVerifier {
    pub fn new(credentials: CredentialStore) -> Self {
        Self {
            http: Client::new(),
            credentials,
            model: GEMINI_MODEL.to_string(),
        }
    }

    pub async fn verify(&self, goal_text: &str, frame: &CapturedFrame) -> bool {
        let judged = timeout(
            Duration::from_secs(VERIFY_TIMEOUT_SECS),
            self.judge(goal_text, frame),
        )
        .await;

        match judged {
            Ok(Ok(verdict)) => {
                info!("verification verdict: {verdict}");
                verdict
            }
            Ok(Err(err)) => {
                error!("goal verification failed: {err}");
                false
            }
            Err(_) => {
                error!("{}", VerifyError::TimedOut(VERIFY_TIMEOUT_SECS));
                false
            }
        }
    }

    async fn judge(&self, goal_text: &str, frame: &CapturedFrame) -> Result<bool, VerifyError> {
        let api_key = self
            .credentials
            .get()
            .ok_or(VerifyError::MissingCredential)?;

        let url = format!("{API_BASE_URL}/models/{}:generateContent", self.model);
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request_body(goal_text, frame))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::Status(status));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|_| VerifyError::MalformedResponse)?;
        let text = response_text(&body).ok_or(VerifyError::MalformedResponse)?;

        Ok(affirmative(&text))
    }
}
