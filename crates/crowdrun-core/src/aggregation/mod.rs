//! Aggregation of multi-worker categorical answers.
//!
//! Raw assignment rows are reduced to (task, worker, label) observations,
//! which [`DawidSkene`] turns into one consensus label per task.

mod dawid_skene;
mod majority;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::table::{cell_text, is_missing, INPUT_PREFIX, OUTPUT_PREFIX, WORKER_ID_COLUMN};
use crate::{CoreError, Table};

pub use dawid_skene::{ConfusionMatrix, DawidSkene, DawidSkeneModel};
pub use majority::MajorityVote;

/// Consensus label per task.
pub type AggregationResult = BTreeMap<String, String>;

/// Separator between values of multi-column task keys and labels.
const FIELD_SEPARATOR: &str = "|";

/// One worker's answer to one task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Observation {
    pub task: String,
    pub worker: String,
    pub label: String,
}

impl Observation {
    pub fn new(
        task: impl Into<String>,
        worker: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            task: task.into(),
            worker: worker.into(),
            label: label.into(),
        }
    }
}

/// Reduce assignment rows to observations.
///
/// The task key is the row's `INPUT:` values and the label its `OUTPUT:`
/// values, each joined with `|` when there is more than one column and empty
/// when there is none. Rows whose `OUTPUT:` cells are all missing carry no
/// answer and are skipped. Repeated (task, worker) pairs are kept.
pub fn observations_from_table(table: &Table) -> Result<Vec<Observation>, CoreError> {
    let worker_column = table
        .column_index(WORKER_ID_COLUMN)
        .ok_or_else(|| CoreError::MissingColumn(WORKER_ID_COLUMN.to_string()))?;
    let inputs: Vec<usize> = table
        .prefixed_columns(INPUT_PREFIX)
        .into_iter()
        .map(|(i, _)| i)
        .collect();
    let outputs: Vec<usize> = table
        .prefixed_columns(OUTPUT_PREFIX)
        .into_iter()
        .map(|(i, _)| i)
        .collect();

    let observations = table
        .rows()
        .iter()
        .filter(|row| outputs.is_empty() || outputs.iter().any(|i| !is_missing(&row[*i])))
        .map(|row| Observation {
            task: join_fields(row, &inputs),
            worker: cell_text(&row[worker_column]),
            label: join_fields(row, &outputs),
        })
        .collect();
    Ok(observations)
}

fn join_fields(row: &[Value], columns: &[usize]) -> String {
    columns
        .iter()
        .map(|i| cell_text(&row[*i]))
        .collect::<Vec<_>>()
        .join(FIELD_SEPARATOR)
}

/// Aggregate raw assignment rows with `rounds` Dawid-Skene EM rounds.
pub fn aggregate_dawid_skene(table: &Table, rounds: usize) -> Result<AggregationResult, CoreError> {
    let observations = observations_from_table(table)?;
    Ok(DawidSkene::new(rounds).fit_predict(&observations))
}

/// Observations re-keyed by dense indices; labels are sorted so ties
/// resolve the same way on every run.
struct Encoded {
    tasks: Vec<String>,
    workers: Vec<String>,
    labels: Vec<String>,
    /// (task, worker, label) indices, one per observation.
    triples: Vec<(usize, usize, usize)>,
}

impl Encoded {
    fn new(observations: &[Observation]) -> Self {
        let tasks = index_of(observations.iter().map(|o| o.task.as_str()));
        let workers = index_of(observations.iter().map(|o| o.worker.as_str()));
        let labels = index_of(observations.iter().map(|o| o.label.as_str()));

        let triples = observations
            .iter()
            .map(|o| (tasks[o.task.as_str()], workers[o.worker.as_str()], labels[o.label.as_str()]))
            .collect();

        Self {
            tasks: tasks.keys().map(|k| k.to_string()).collect(),
            workers: workers.keys().map(|k| k.to_string()).collect(),
            labels: labels.keys().map(|k| k.to_string()).collect(),
            triples,
        }
    }
}

fn index_of<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<&'a str, usize> {
    let mut index: BTreeMap<&str, usize> = values.map(|v| (v, 0)).collect();
    for (i, slot) in index.values_mut().enumerate() {
        *slot = i;
    }
    index
}

/// Position of the largest value; the first one wins a tie.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
