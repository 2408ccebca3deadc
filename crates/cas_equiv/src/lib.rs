//! Answer-equivalence engine.
//!
//! Two free-form answer strings are extracted, normalized and pushed through a
//! cascade of comparison stages (string, math, brackets, matrices, symbolic),
//! falling back to an injected language-model oracle only when every
//! deterministic stage is inconclusive.

pub mod batch;
pub mod brackets;
pub mod cascade;
pub mod config;
pub mod error;
pub mod extract;
pub mod matrices;
pub mod normalize;
pub mod numeric;
pub mod oracle;
pub mod stage;
pub mod symbolic;

pub use batch::{equivalence_matrix, EquivalenceMatrix};
pub use cascade::EquivalenceEngine;
pub use config::{EquivConfig, OracleConfig};
pub use error::{ConfigError, OracleError};
pub use extract::{extract_answer, extract_answer_with};
pub use normalize::{normalize, normalize_optional};
pub use oracle::{LanguageModel, NoOracle, Oracle, OracleAdapter};
pub use stage::{ComparisonResult, Stage, StageOutcome, StageVerdict, Verdict};
