//! Pairwise equivalence over a set of answers.

use crate::cascade::EquivalenceEngine;
use crate::stage::Verdict;
use futures::stream::{self, StreamExt};
use serde::Serialize;

/// Symmetric N x N verdict matrix, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquivalenceMatrix {
    size: usize,
    verdicts: Vec<Verdict>,
}

impl EquivalenceMatrix {
    fn new(size: usize) -> Self {
        let mut verdicts = vec![Verdict::Inconclusive; size * size];
        for i in 0..size {
            verdicts[i * size + i] = Verdict::Equal;
        }
        Self { size, verdicts }
    }

    fn set(&mut self, i: usize, j: usize, verdict: Verdict) {
        self.verdicts[i * self.size + j] = verdict;
        self.verdicts[j * self.size + i] = verdict;
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> Option<Verdict> {
        if i >= self.size || j >= self.size {
            return None;
        }
        Some(self.verdicts[i * self.size + j])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Verdict]> {
        self.verdicts.chunks(self.size.max(1))
    }
}

/// Compare every unordered pair of `answers`, at most `max_concurrency`
/// comparisons in flight. The diagonal is `Equal` without comparison.
pub async fn equivalence_matrix<S: AsRef<str>>(
    engine: &EquivalenceEngine,
    answers: &[S],
    max_concurrency: usize,
) -> EquivalenceMatrix {
    let n = answers.len();
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect();
    tracing::debug!(target: "equiv", answers = n, pairs = pairs.len(), "equivalence_matrix");

    let results: Vec<(usize, usize, Verdict)> = stream::iter(pairs)
        .map(|(i, j)| async move {
            let result = engine
                .compare(answers[i].as_ref(), answers[j].as_ref())
                .await;
            (i, j, result.verdict)
        })
        .buffer_unordered(max_concurrency.max(1))
        .collect()
        .await;

    let mut matrix = EquivalenceMatrix::new(n);
    for (i, j, verdict) in results {
        matrix.set(i, j, verdict);
    }
    matrix
}
