//! Majority vote, also the starting point of Dawid-Skene.

use std::collections::{BTreeMap, HashMap};

use super::{argmax, AggregationResult, Encoded, Observation};

/// Majority vote with optional per-worker weights.
#[derive(Debug, Clone, Default)]
pub struct MajorityVote {
    /// Vote weight per worker; unlisted workers weigh 1.
    pub weights: HashMap<String, f64>,
}

impl MajorityVote {
    /// Unweighted majority vote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set a worker's vote weight.
    pub fn with_weight(mut self, worker: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(worker.into(), weight);
        self
    }

    /// Share of (weighted) votes per label, per task.
    pub fn fit_predict_proba(
        &self,
        observations: &[Observation],
    ) -> BTreeMap<String, BTreeMap<String, f64>> {
        let encoded = Encoded::new(observations);
        let probas = self.vote_shares(&encoded);

        encoded
            .tasks
            .iter()
            .zip(probas)
            .map(|(task, row)| {
                let row: BTreeMap<String, f64> = encoded.labels.iter().cloned().zip(row).collect();
                (task.clone(), row)
            })
            .collect()
    }

    /// The most voted label per task; ties go to the smallest label.
    pub fn fit_predict(&self, observations: &[Observation]) -> AggregationResult {
        let encoded = Encoded::new(observations);
        let probas = self.vote_shares(&encoded);

        encoded
            .tasks
            .iter()
            .zip(probas)
            .map(|(task, row)| (task.clone(), encoded.labels[argmax(&row)].clone()))
            .collect()
    }

    /// Row-normalised vote shares, indexed `[task][label]`.
    pub(super) fn vote_shares(&self, encoded: &Encoded) -> Vec<Vec<f64>> {
        let mut votes = vec![vec![0.0; encoded.labels.len()]; encoded.tasks.len()];
        for &(task, worker, label) in &encoded.triples {
            let weight = self
                .weights
                .get(&encoded.workers[worker])
                .copied()
                .unwrap_or(1.0);
            votes[task][label] += weight;
        }

        for row in &mut votes {
            let total: f64 = row.iter().sum();
            if total > 0.0 {
                row.iter_mut().for_each(|v| *v /= total);
            }
        }
        votes
    }
}
