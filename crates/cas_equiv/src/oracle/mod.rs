//! Language-model fallback for pairs the deterministic stages cannot decide.
//!
//! [`LanguageModel`] is the raw capability (one request, one response).
//! [`Oracle`] is what the cascade consumes: it owns timeout, retry and
//! response acceptance, and resolves to `None` when every attempt failed.

pub mod http;

use crate::config::OracleConfig;
use crate::error::OracleError;
use async_trait::async_trait;
use std::time::Duration;

pub use http::OpenAiCompatibleModel;

/// System instruction sent with every equivalence question.
pub const EQUIVALENCE_SYSTEM: &str = "You are an examinator and need to decide if 2 answers \
are equivalent in value. Show your steps and at the end reply with exactly 'Decision: yes' \
or 'Decision: no'";

/// Acceptance predicate applied to oracle responses.
pub type Accept = dyn Fn(&str) -> bool + Send + Sync;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, OracleError>;
}

#[async_trait]
pub trait Oracle: Send + Sync {
    /// First accepted response, or `None` once retries are exhausted.
    async fn call(&self, prompt: &str, system: &str, accept: &Accept) -> Option<String>;
}

/// Offline oracle; never answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOracle;

#[async_trait]
impl Oracle for NoOracle {
    async fn call(&self, _prompt: &str, _system: &str, _accept: &Accept) -> Option<String> {
        None
    }
}

/// Wraps a [`LanguageModel`] with per-attempt timeout, bounded retries and
/// linear backoff.
pub struct OracleAdapter<M> {
    model: M,
    timeout: Duration,
    max_retries: u32,
    backoff: Duration,
}

impl<M: LanguageModel> OracleAdapter<M> {
    pub fn new(model: M, timeout: Duration, max_retries: u32, backoff: Duration) -> Self {
        Self {
            model,
            timeout,
            max_retries,
            backoff,
        }
    }

    pub fn from_config(model: M, config: &OracleConfig) -> Self {
        Self::new(model, config.timeout(), config.max_retries, config.backoff())
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

#[async_trait]
impl<M: LanguageModel> Oracle for OracleAdapter<M> {
    async fn call(&self, prompt: &str, system: &str, accept: &Accept) -> Option<String> {
        let attempts = self.max_retries + 1;
        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.backoff * attempt).await;
            }
            let result = match tokio::time::timeout(self.timeout, self.model.complete(prompt, system))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(OracleError::Timeout(self.timeout)),
            };
            match result {
                Ok(response) if accept(&response) => return Some(response),
                Ok(response) => tracing::debug!(
                    target: "oracle",
                    attempt,
                    response = %truncate(&response, 200),
                    "response_rejected"
                ),
                Err(e) => tracing::debug!(target: "oracle", attempt, error = %e, "attempt_failed"),
            }
        }
        tracing::warn!(target: "oracle", attempts, "oracle retries exhausted");
        None
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Question asked about a pair of raw answers.
pub fn equivalence_prompt(a: &str, b: &str) -> String {
    format!(
        "Evaluate the values within expression 1: <{}> and expression 2: <{}>. Show your steps. \
         It does not matter if the format is different, just tell me if the final value is \
         numerically equal.",
        a, b
    )
}

/// Text after the last `decision:` marker, case-insensitive.
fn decision_text(response: &str) -> Option<String> {
    let lower = response.to_lowercase();
    let idx = lower.rfind("decision:")?;
    Some(lower[idx + "decision:".len()..].trim().to_string())
}

/// `yes` wins when both words appear after the marker.
pub fn parse_decision(response: &str) -> Option<bool> {
    let text = decision_text(response)?;
    if text.contains("yes") {
        Some(true)
    } else if text.contains("no") {
        Some(false)
    } else {
        None
    }
}

pub fn accepts_decision(response: &str) -> bool {
    parse_decision(response).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct Scripted {
        responses: Mutex<Vec<Result<String, OracleError>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(responses: Vec<Result<String, OracleError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for Scripted {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(OracleError::Transport("script exhausted".to_string()));
            }
            responses.remove(0)
        }
    }

    struct Slow;

    #[async_trait]
    impl LanguageModel for Slow {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, OracleError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("Decision: yes".to_string())
        }
    }

    fn adapter<M: LanguageModel>(model: M, retries: u32) -> OracleAdapter<M> {
        OracleAdapter::new(model, Duration::from_millis(50), retries, Duration::from_millis(1))
    }

    #[test]
    fn decisions() {
        assert_eq!(parse_decision("steps... Decision: yes"), Some(true));
        assert_eq!(parse_decision("DECISION: No."), Some(false));
        assert_eq!(parse_decision("Decision: no, wait, yes"), Some(true));
        assert_eq!(parse_decision("decision: no\nDecision: yes"), Some(true));
        assert_eq!(parse_decision("Decision: maybe"), None);
        assert_eq!(parse_decision("yes"), None);
        assert!(accepts_decision("Decision: yes"));
        assert!(!accepts_decision("I think so"));
    }

    #[test]
    fn prompt_mentions_both_answers() {
        let prompt = equivalence_prompt("1/2", "0.5");
        assert!(prompt.contains("<1/2>"));
        assert!(prompt.contains("<0.5>"));
    }

    #[tokio::test]
    async fn retries_until_accepted() {
        let model = Scripted::new(vec![
            Err(OracleError::Transport("reset".to_string())),
            Ok("no marker here".to_string()),
            Ok("Decision: yes".to_string()),
        ]);
        let oracle = adapter(model, 2);
        let response = oracle.call("p", EQUIVALENCE_SYSTEM, &accepts_decision).await;
        assert_eq!(response.as_deref(), Some("Decision: yes"));
        assert_eq!(oracle.model().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_returns_none() {
        let model = Scripted::new((0..5).map(|_| Ok("nothing".to_string())).collect());
        let oracle = adapter(model, 1);
        assert_eq!(oracle.call("p", "s", &accepts_decision).await, None);
        assert_eq!(oracle.model().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn slow_model_times_out() {
        let oracle = adapter(Slow, 0);
        assert_eq!(oracle.call("p", "s", &accepts_decision).await, None);
    }

    #[tokio::test]
    async fn no_oracle_is_silent() {
        assert_eq!(NoOracle.call("p", "s", &accepts_decision).await, None);
    }
}
