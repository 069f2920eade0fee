//! Dawid-Skene expectation-maximisation.
//!
//! Every worker gets a confusion matrix: the probability of answering label
//! `l` when the true label is `k`. Starting from majority vote, each round
//! re-estimates task posteriors from the matrices (E-step) and the matrices
//! from the posteriors (M-step). The number of rounds is fixed; there is no
//! convergence check.

use std::collections::BTreeMap;

use super::majority::MajorityVote;
use super::{argmax, AggregationResult, Encoded, Observation};

/// Confusion probabilities keyed by true label, then answered label.
///
/// Only labels the worker actually answered appear in the inner maps.
pub type ConfusionMatrix = BTreeMap<String, BTreeMap<String, f64>>;

/// Floor for confusion entries before normalisation.
const EPS: f64 = f64::EPSILON;

/// Dawid-Skene aggregation with a fixed number of EM rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DawidSkene {
    pub rounds: usize,
}

/// Everything estimated by a [`DawidSkene`] fit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DawidSkeneModel {
    /// Most probable label per task.
    pub labels: AggregationResult,
    /// Posterior label distribution per task.
    pub posteriors: BTreeMap<String, BTreeMap<String, f64>>,
    /// Overall label distribution.
    pub priors: BTreeMap<String, f64>,
    /// Confusion matrix per worker.
    pub confusion: BTreeMap<String, ConfusionMatrix>,
}

impl Default for DawidSkene {
    fn default() -> Self {
        Self { rounds: 20 }
    }
}

impl DawidSkene {
    pub fn new(rounds: usize) -> Self {
        Self { rounds }
    }

    /// Consensus label per task.
    pub fn fit_predict(&self, observations: &[Observation]) -> AggregationResult {
        self.fit(observations).labels
    }

    /// Run the EM rounds and return all estimates.
    pub fn fit(&self, observations: &[Observation]) -> DawidSkeneModel {
        if observations.is_empty() {
            return DawidSkeneModel::default();
        }

        let encoded = Encoded::new(observations);
        let mut probas = MajorityVote::new().vote_shares(&encoded);
        let mut priors = label_priors(&probas);
        let mut errors = m_step(&encoded, &probas);

        for _ in 0..self.rounds {
            probas = e_step(&encoded, &priors, &errors);
            priors = label_priors(&probas);
            errors = m_step(&encoded, &probas);
        }

        into_model(&encoded, probas, priors, &errors)
    }
}

/// Confusion entries indexed `[worker][answered][true]`; `None` for labels
/// the worker never answered.
type Errors = Vec<Vec<Option<Vec<f64>>>>;

fn label_priors(probas: &[Vec<f64>]) -> Vec<f64> {
    let n_labels = probas.first().map_or(0, Vec::len);
    let mut priors = vec![0.0; n_labels];
    for row in probas {
        for (prior, p) in priors.iter_mut().zip(row) {
            *prior += p;
        }
    }
    let n_tasks = probas.len() as f64;
    priors.iter_mut().for_each(|p| *p /= n_tasks);
    priors
}

fn m_step(encoded: &Encoded, probas: &[Vec<f64>]) -> Errors {
    let n_labels = encoded.labels.len();
    let mut errors: Errors = vec![vec![None; n_labels]; encoded.workers.len()];

    for &(task, worker, label) in &encoded.triples {
        let row = errors[worker][label].get_or_insert_with(|| vec![0.0; n_labels]);
        for (entry, p) in row.iter_mut().zip(&probas[task]) {
            *entry += p;
        }
    }

    for worker in &mut errors {
        let mut totals = vec![0.0; n_labels];
        for row in worker.iter_mut().flatten() {
            for (entry, total) in row.iter_mut().zip(totals.iter_mut()) {
                *entry = entry.max(EPS);
                *total += *entry;
            }
        }
        for row in worker.iter_mut().flatten() {
            for (entry, total) in row.iter_mut().zip(&totals) {
                *entry /= total;
            }
        }
    }
    errors
}

fn e_step(encoded: &Encoded, priors: &[f64], errors: &Errors) -> Vec<Vec<f64>> {
    let log_priors: Vec<f64> = priors.iter().map(|p| p.ln()).collect();
    let mut log_likelihoods = vec![log_priors; encoded.tasks.len()];

    for &(task, worker, label) in &encoded.triples {
        if let Some(row) = &errors[worker][label] {
            for (ll, e) in log_likelihoods[task].iter_mut().zip(row) {
                *ll += e.ln();
            }
        }
    }

    // Shift by the row maximum before exponentiating so long products of
    // small probabilities do not underflow to zero.
    for row in &mut log_likelihoods {
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        row.iter_mut().for_each(|ll| *ll = (*ll - max).exp());
        let total: f64 = row.iter().sum();
        row.iter_mut().for_each(|p| *p /= total);
    }
    log_likelihoods
}

fn into_model(
    encoded: &Encoded,
    probas: Vec<Vec<f64>>,
    priors: Vec<f64>,
    errors: &Errors,
) -> DawidSkeneModel {
    let label_map = |row: &[f64]| -> BTreeMap<String, f64> {
        encoded.labels.iter().cloned().zip(row.iter().copied()).collect()
    };

    let labels = encoded
        .tasks
        .iter()
        .zip(&probas)
        .map(|(task, row)| (task.clone(), encoded.labels[argmax(row)].clone()))
        .collect();
    let posteriors = encoded
        .tasks
        .iter()
        .zip(&probas)
        .map(|(task, row)| (task.clone(), label_map(row.as_slice())))
        .collect();

    let confusion = encoded
        .workers
        .iter()
        .zip(errors)
        .map(|(worker, rows)| {
            let mut matrix = ConfusionMatrix::new();
            for (answered, row) in rows.iter().enumerate() {
                let Some(row) = row else { continue };
                for (truth, p) in row.iter().enumerate() {
                    matrix
                        .entry(encoded.labels[truth].clone())
                        .or_default()
                        .insert(encoded.labels[answered].clone(), *p);
                }
            }
            (worker.clone(), matrix)
        })
        .collect();

    DawidSkeneModel {
        labels,
        posteriors,
        priors: label_map(priors.as_slice()),
        confusion,
    }
}
