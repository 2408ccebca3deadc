//! Comparison stages, their trust policies and the decision trail.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison stages in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    String,
    Math,
    Brackets,
    Matrices,
    Symbolic,
    Llm,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::String,
        Stage::Math,
        Stage::Brackets,
        Stage::Matrices,
        Stage::Symbolic,
        Stage::Llm,
    ];

    /// Stages that never leave the process.
    pub const DETERMINISTIC: [Stage; 5] = [
        Stage::String,
        Stage::Math,
        Stage::Brackets,
        Stage::Matrices,
        Stage::Symbolic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::String => "string",
            Stage::Math => "math",
            Stage::Brackets => "brackets",
            Stage::Matrices => "matrices",
            Stage::Symbolic => "symbolic",
            Stage::Llm => "llm",
        }
    }

    pub fn policy(self) -> &'static StagePolicy {
        &STAGE_POLICIES[self as usize]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a single stage concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageVerdict {
    Success,
    NotEqual,
    /// The stage could not apply to this pair
    Failed,
}

impl fmt::Display for StageVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StageVerdict::Success => "success",
            StageVerdict::NotEqual => "not_equal",
            StageVerdict::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Equal,
    Unequal,
    Inconclusive,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Equal => "EQUAL",
            Verdict::Unequal => "UNEQUAL",
            Verdict::Inconclusive => "INCONCLUSIVE",
        })
    }
}

/// Control-flow consequence of a stage verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the cascade with this verdict
    Decide(Verdict),
    /// Move on to the next stage
    Continue,
    /// Skip remaining deterministic stages and ask the oracle
    Escalate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePolicy {
    pub stage: Stage,
    pub on_success: Action,
    pub on_not_equal: Action,
    pub on_failed: Action,
}

impl StagePolicy {
    pub fn action(&self, verdict: StageVerdict) -> Action {
        match verdict {
            StageVerdict::Success => self.on_success,
            StageVerdict::NotEqual => self.on_not_equal,
            StageVerdict::Failed => self.on_failed,
        }
    }
}

/// Trust policy per stage, indexed by `Stage as usize`.
///
/// Brackets and matrices never report `NotEqual`; a mismatch there is `Failed`.
pub const STAGE_POLICIES: [StagePolicy; 6] = [
    StagePolicy {
        stage: Stage::String,
        on_success: Action::Decide(Verdict::Equal),
        on_not_equal: Action::Continue,
        on_failed: Action::Continue,
    },
    StagePolicy {
        stage: Stage::Math,
        on_success: Action::Decide(Verdict::Equal),
        on_not_equal: Action::Decide(Verdict::Unequal),
        on_failed: Action::Continue,
    },
    StagePolicy {
        stage: Stage::Brackets,
        on_success: Action::Decide(Verdict::Equal),
        on_not_equal: Action::Continue,
        on_failed: Action::Continue,
    },
    StagePolicy {
        stage: Stage::Matrices,
        on_success: Action::Decide(Verdict::Equal),
        on_not_equal: Action::Continue,
        on_failed: Action::Continue,
    },
    StagePolicy {
        stage: Stage::Symbolic,
        on_success: Action::Decide(Verdict::Equal),
        on_not_equal: Action::Escalate,
        on_failed: Action::Escalate,
    },
    StagePolicy {
        stage: Stage::Llm,
        on_success: Action::Decide(Verdict::Equal),
        on_not_equal: Action::Decide(Verdict::Unequal),
        on_failed: Action::Decide(Verdict::Inconclusive),
    },
];

/// One entry of the decision trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub verdict: StageVerdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StageOutcome {
    pub fn new(stage: Stage, verdict: StageVerdict) -> Self {
        Self {
            stage,
            verdict,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.verdict)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}

/// Final verdict plus the trail of stages that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub verdict: Verdict,
    pub trail: Vec<StageOutcome>,
}

impl ComparisonResult {
    pub fn new(verdict: Verdict, trail: Vec<StageOutcome>) -> Self {
        Self { verdict, trail }
    }

    pub fn is_equal(&self) -> bool {
        self.verdict == Verdict::Equal
    }

    /// Stage whose outcome fixed the verdict; `None` when inconclusive.
    pub fn decided_by(&self) -> Option<Stage> {
        if self.verdict == Verdict::Inconclusive {
            return None;
        }
        self.trail.last().map(|outcome| outcome.stage)
    }

    pub fn stages(&self) -> Vec<(Stage, StageVerdict)> {
        self.trail
            .iter()
            .map(|outcome| (outcome.stage, outcome.verdict))
            .collect()
    }
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.verdict)?;
        for outcome in &self.trail {
            write!(f, "\n  {}", outcome)?;
        }
        Ok(())
    }
}
