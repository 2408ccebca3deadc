//! Cascade orchestration.
//!
//! Runs the deterministic stages in [`Stage::DETERMINISTIC`] order, letting
//! [`STAGE_POLICIES`](crate::stage::STAGE_POLICIES) decide after each one
//! whether to stop, continue or escalate to the oracle.

use crate::brackets::{compare_bracketed, rewrite_interval};
use crate::config::EquivConfig;
use crate::extract::extract_answer;
use crate::matrices::compare_matrices;
use crate::normalize::normalize;
use crate::numeric::compare_decimals;
use crate::oracle::{accepts_decision, equivalence_prompt, parse_decision, NoOracle, Oracle, EQUIVALENCE_SYSTEM};
use crate::stage::{Action, ComparisonResult, Stage, StageOutcome, StageVerdict, Verdict};
use crate::symbolic::compare_symbolic;
use std::sync::Arc;

/// Answer-equivalence engine. Cheap to share behind an `Arc`.
pub struct EquivalenceEngine {
    config: EquivConfig,
    oracle: Arc<dyn Oracle>,
}

impl EquivalenceEngine {
    pub fn new(config: EquivConfig, oracle: Arc<dyn Oracle>) -> Self {
        Self { config, oracle }
    }

    /// Engine whose oracle never answers.
    pub fn offline(config: EquivConfig) -> Self {
        Self::new(config, Arc::new(NoOracle))
    }

    pub fn config(&self) -> &EquivConfig {
        &self.config
    }

    /// Full cascade, oracle included.
    pub async fn compare(&self, a: &str, b: &str) -> ComparisonResult {
        let mut trail = match run_deterministic(a, b, self.config.tolerance) {
            Cascade::Decided(result) => return result,
            Cascade::Escalated(trail) => trail,
        };

        let outcome = self.ask_oracle(a, b).await;
        let verdict = match Stage::Llm.policy().action(outcome.verdict) {
            Action::Decide(verdict) => verdict,
            Action::Continue | Action::Escalate => Verdict::Inconclusive,
        };
        tracing::debug!(target: "equiv", stage = %Stage::Llm, verdict = %outcome.verdict, "stage_outcome");
        trail.push(outcome);
        ComparisonResult::new(verdict, trail)
    }

    /// [`compare`](Self::compare) that tolerates absent answers.
    pub async fn compare_optional(&self, a: Option<&str>, b: Option<&str>) -> ComparisonResult {
        match (a, b) {
            (Some(a), Some(b)) => self.compare(a, b).await,
            _ => ComparisonResult::new(
                Verdict::Inconclusive,
                vec![StageOutcome::new(Stage::String, StageVerdict::Failed).with_detail("missing answer")],
            ),
        }
    }

    /// Deterministic stages only. A provisional symbolic `NotEqual` is
    /// reported as `Unequal`; a pair no stage could handle is `Inconclusive`.
    pub fn compare_deterministic(&self, a: &str, b: &str) -> ComparisonResult {
        match run_deterministic(a, b, self.config.tolerance) {
            Cascade::Decided(result) => result,
            Cascade::Escalated(trail) => {
                let verdict = match trail.last() {
                    Some(last) if last.verdict == StageVerdict::NotEqual => Verdict::Unequal,
                    _ => Verdict::Inconclusive,
                };
                ComparisonResult::new(verdict, trail)
            }
        }
    }

    async fn ask_oracle(&self, a: &str, b: &str) -> StageOutcome {
        let prompt = equivalence_prompt(a, b);
        let response = self
            .oracle
            .call(&prompt, EQUIVALENCE_SYSTEM, &accepts_decision)
            .await;
        let verdict = match response.as_deref().and_then(parse_decision) {
            Some(true) => StageVerdict::Success,
            Some(false) => StageVerdict::NotEqual,
            None => StageVerdict::Failed,
        };
        StageOutcome::new(Stage::Llm, verdict)
    }
}

enum Cascade {
    Decided(ComparisonResult),
    /// Trail so far; the oracle decides
    Escalated(Vec<StageOutcome>),
}

/// Working copy of both answers; later stages see earlier rewrites.
struct Pair {
    a: String,
    b: String,
}

fn run_deterministic(a: &str, b: &str, tolerance: f64) -> Cascade {
    let mut pair = Pair {
        a: normalize(&extract_answer(a)),
        b: normalize(&extract_answer(b)),
    };
    let mut trail = Vec::with_capacity(Stage::ALL.len());

    for stage in Stage::DETERMINISTIC {
        let outcome = run_stage(stage, &mut pair, tolerance);
        tracing::debug!(
            target: "equiv",
            stage = %stage,
            verdict = %outcome.verdict,
            a = %pair.a,
            b = %pair.b,
            "stage_outcome"
        );
        let action = stage.policy().action(outcome.verdict);
        trail.push(outcome);
        match action {
            Action::Decide(verdict) => return Cascade::Decided(ComparisonResult::new(verdict, trail)),
            Action::Continue => {}
            Action::Escalate => return Cascade::Escalated(trail),
        }
    }
    Cascade::Escalated(trail)
}

fn run_stage(stage: Stage, pair: &mut Pair, tolerance: f64) -> StageOutcome {
    match stage {
        Stage::String => {
            let equal = pair.a.trim().to_lowercase() == pair.b.trim().to_lowercase();
            let verdict = if equal {
                StageVerdict::Success
            } else {
                StageVerdict::NotEqual
            };
            StageOutcome::new(stage, verdict)
        }
        Stage::Math => StageOutcome::new(stage, compare_decimals(&pair.a, &pair.b, tolerance)),
        Stage::Brackets => {
            pair.a = rewrite_interval(&pair.a);
            pair.b = rewrite_interval(&pair.b);
            let verdict = compare_bracketed(&pair.a, &pair.b, |x, y| {
                elements_equal(x, y, tolerance)
            });
            StageOutcome::new(stage, verdict)
        }
        Stage::Matrices => StageOutcome::new(stage, compare_matrices(&pair.a, &pair.b, tolerance)),
        Stage::Symbolic => {
            let symbolic = compare_symbolic(&pair.a, &pair.b, tolerance);
            let outcome = StageOutcome::new(stage, symbolic.verdict);
            match symbolic.detail {
                Some(detail) => outcome.with_detail(detail),
                None => outcome,
            }
        }
        // never consulted without the oracle
        Stage::Llm => StageOutcome::new(stage, StageVerdict::Failed),
    }
}

/// Element comparison inside brackets: deterministic stages only.
fn elements_equal(a: &str, b: &str, tolerance: f64) -> bool {
    matches!(
        run_deterministic(a, b, tolerance),
        Cascade::Decided(ComparisonResult {
            verdict: Verdict::Equal,
            ..
        })
    )
}
