//! End-to-end cascade behaviour with a scripted oracle.

use async_trait::async_trait;
use cas_equiv::oracle::{Accept, EQUIVALENCE_SYSTEM};
use cas_equiv::{
    ComparisonResult, EquivConfig, EquivalenceEngine, LanguageModel, Oracle, OracleAdapter,
    OracleError, Stage, StageVerdict, Verdict,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Oracle that always gives the same response and records its prompts.
struct CountingOracle {
    response: Option<&'static str>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<(String, String)>>,
}

impl CountingOracle {
    fn new(response: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for CountingOracle {
    async fn call(&self, prompt: &str, system: &str, accept: &Accept) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), system.to_string()));
        self.response.filter(|r| accept(r)).map(str::to_string)
    }
}

fn engine_with(oracle: Arc<CountingOracle>) -> EquivalenceEngine {
    EquivalenceEngine::new(EquivConfig::default(), oracle)
}

fn stages(result: &ComparisonResult) -> Vec<(Stage, StageVerdict)> {
    result.stages()
}

#[tokio::test]
async fn identical_answers_stop_at_string_stage() {
    let oracle = CountingOracle::new(Some("Decision: no"));
    let engine = engine_with(oracle.clone());
    for s in ["42", "x^2+1", "\\frac{a}{b}", "Monday", "(1, 2]"] {
        let result = engine.compare(s, s).await;
        assert_eq!(result.verdict, Verdict::Equal, "{}", s);
        assert_eq!(stages(&result), vec![(Stage::String, StageVerdict::Success)]);
    }
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn empty_answers_are_equal() {
    let engine = EquivalenceEngine::offline(EquivConfig::default());
    let result = engine.compare("", "").await;
    assert_eq!(result.verdict, Verdict::Equal);
    assert_eq!(result.trail.len(), 1);
}

#[tokio::test]
async fn math_stage_tolerance() {
    let engine = EquivalenceEngine::offline(EquivConfig::default());

    let result = engine.compare("2.000001", "2.0").await;
    assert_eq!(result.verdict, Verdict::Equal);
    assert_eq!(result.decided_by(), Some(Stage::Math));

    let result = engine.compare("3", "3.01").await;
    assert_eq!(result.verdict, Verdict::Unequal);
    assert_eq!(
        stages(&result),
        vec![
            (Stage::String, StageVerdict::NotEqual),
            (Stage::Math, StageVerdict::NotEqual),
        ]
    );
}

#[tokio::test]
async fn latex_fraction_reaches_symbolic() {
    let engine = EquivalenceEngine::offline(EquivConfig::default());
    let result = engine.compare("\\frac{10}{2}", "5").await;
    assert_eq!(result.verdict, Verdict::Equal);
    assert_eq!(
        stages(&result),
        vec![
            (Stage::String, StageVerdict::NotEqual),
            (Stage::Math, StageVerdict::Failed),
            (Stage::Brackets, StageVerdict::Failed),
            (Stage::Matrices, StageVerdict::Failed),
            (Stage::Symbolic, StageVerdict::Success),
        ]
    );
}

#[tokio::test]
async fn mixed_fraction_is_a_sum() {
    let engine = EquivalenceEngine::offline(EquivConfig::default());
    let result = engine.compare("7 \\frac{3}{4}", "7.75").await;
    assert_eq!(result.verdict, Verdict::Equal);
    assert_eq!(result.decided_by(), Some(Stage::Symbolic));
}

#[tokio::test]
async fn intervals_and_tuples_use_brackets() {
    let engine = EquivalenceEngine::offline(EquivConfig::default());

    let result = engine.compare("Interval.open(1, 2)", "(1,2)").await;
    assert_eq!(result.verdict, Verdict::Equal);
    assert_eq!(result.decided_by(), Some(Stage::Brackets));

    let result = engine.compare("{  10, 20 }", "[10,20]").await;
    assert_eq!(result.verdict, Verdict::Equal);
    assert_eq!(result.decided_by(), Some(Stage::Brackets));

    let result = engine.compare("Interval.Ropen(0, 1/2)", "[0, 0.5)").await;
    assert_eq!(result.decided_by(), Some(Stage::Brackets));
}

#[tokio::test]
async fn latex_matrix_matches_cas_matrix() {
    let engine = EquivalenceEngine::offline(EquivConfig::default());
    let result = engine
        .compare(
            "\\begin{pmatrix}1&2\\\\3&4\\end{pmatrix}",
            "Matrix([[1,2],[3,4]])",
        )
        .await;
    assert_eq!(result.verdict, Verdict::Equal);
    assert_eq!(result.decided_by(), Some(Stage::Matrices));
}

#[tokio::test]
async fn symbolic_identities_never_reach_the_oracle() {
    let oracle = CountingOracle::new(Some("Decision: no"));
    let engine = engine_with(oracle.clone());

    for (a, b) in [("x + x", "2*x"), ("sqrt(25)", "5"), ("(x+1)^2", "x^2 + 2x + 1")] {
        let result = engine.compare(a, b).await;
        assert_eq!(result.verdict, Verdict::Equal, "{} vs {}", a, b);
        assert_eq!(result.decided_by(), Some(Stage::Symbolic));
    }
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn prose_is_left_to_the_oracle() {
    let oracle = CountingOracle::new(Some("4.3 = 2 + 2.3 so... Decision: yes"));
    let engine = engine_with(oracle.clone());

    let result = engine
        .compare("The expression is 4.3", "The expression is 2 + 2.3")
        .await;
    assert_eq!(result.verdict, Verdict::Equal);
    assert_eq!(oracle.calls(), 1);
    assert!(stages(&result).contains(&(Stage::Symbolic, StageVerdict::Failed)));
    assert_eq!(result.decided_by(), Some(Stage::Llm));

    // prompt carries the raw answers
    let prompts = oracle.prompts.lock().unwrap();
    assert!(prompts[0].0.contains("<The expression is 4.3>"));
    assert_eq!(prompts[0].1, EQUIVALENCE_SYSTEM);
}

#[tokio::test]
async fn oracle_no_is_terminal() {
    let oracle = CountingOracle::new(Some("Decision: no"));
    let engine = engine_with(oracle.clone());
    let result = engine.compare("x^2", "x^3").await;
    assert_eq!(result.verdict, Verdict::Unequal);
    assert_eq!(
        &stages(&result)[4..],
        &[
            (Stage::Symbolic, StageVerdict::NotEqual),
            (Stage::Llm, StageVerdict::NotEqual),
        ]
    );
    assert_eq!(oracle.calls(), 1);
}

#[tokio::test]
async fn oracle_exhaustion_is_inconclusive() {
    let oracle = CountingOracle::new(None);
    let engine = engine_with(oracle.clone());
    let result = engine.compare("apples", "oranges?").await;
    assert_eq!(result.verdict, Verdict::Inconclusive);
    assert_eq!(
        result.trail.last().map(|o| (o.stage, o.verdict)),
        Some((Stage::Llm, StageVerdict::Failed))
    );
    assert_eq!(result.decided_by(), None);
}

#[tokio::test]
async fn unaccepted_response_counts_as_no_answer() {
    let oracle = CountingOracle::new(Some("they look the same to me"));
    let engine = engine_with(oracle);
    let result = engine.compare("apples", "oranges?").await;
    assert_eq!(result.verdict, Verdict::Inconclusive);
}

#[tokio::test]
async fn absent_answers() {
    let engine = EquivalenceEngine::offline(EquivConfig::default());
    let result = engine.compare_optional(None, Some("1")).await;
    assert_eq!(result.verdict, Verdict::Inconclusive);
    assert_eq!(stages(&result), vec![(Stage::String, StageVerdict::Failed)]);

    let result = engine.compare_optional(Some("1"), Some("1.0")).await;
    assert_eq!(result.verdict, Verdict::Equal);
}

#[tokio::test]
async fn boxed_answers_are_extracted_first() {
    let engine = EquivalenceEngine::offline(EquivConfig::default());
    let result = engine
        .compare("so the total is \\boxed{\\$1,000}", "The final answer is 1000")
        .await;
    assert_eq!(result.verdict, Verdict::Equal);
    assert_eq!(result.decided_by(), Some(Stage::String));
}

struct FlakyModel {
    calls: AtomicUsize,
}

#[async_trait]
impl LanguageModel for FlakyModel {
    async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, OracleError> {
        match self.calls.fetch_add(1, Ordering::SeqCst) {
            0 => Err(OracleError::Status {
                status: 503,
                body: "overloaded".to_string(),
            }),
            _ => Ok("Both equal 4.3. Decision: yes".to_string()),
        }
    }
}

#[tokio::test]
async fn adapter_retries_inside_the_cascade() {
    let adapter = OracleAdapter::new(
        FlakyModel {
            calls: AtomicUsize::new(0),
        },
        Duration::from_secs(1),
        2,
        Duration::from_millis(1),
    );
    let engine = EquivalenceEngine::new(EquivConfig::default(), Arc::new(adapter));
    let result = engine.compare("four point three", "2 + 2.3").await;
    assert_eq!(result.verdict, Verdict::Equal);
    assert_eq!(result.decided_by(), Some(Stage::Llm));
}

#[test]
fn deterministic_comparison_skips_the_oracle() {
    let engine = EquivalenceEngine::offline(EquivConfig::default());
    assert_eq!(engine.compare_deterministic("x^2", "x^3").verdict, Verdict::Unequal);
    assert_eq!(engine.compare_deterministic("1/3", "0.333333").verdict, Verdict::Equal);
    assert_eq!(
        engine.compare_deterministic("apples", "oranges?").verdict,
        Verdict::Inconclusive
    );
}

#[test]
fn towering_powers_do_not_stall_the_cascade() {
    let engine = EquivalenceEngine::offline(EquivConfig::default());
    let start = std::time::Instant::now();
    assert_eq!(
        engine.compare_deterministic("(9^4096)^4096", "1").verdict,
        Verdict::Unequal
    );
    assert!(start.elapsed() < std::time::Duration::from_secs(5));
}

#[test]
fn engine_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<EquivalenceEngine>();
}
