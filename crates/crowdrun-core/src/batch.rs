//! Task batch builder.
//!
//! Turns task datasets into [`Task`]s using the column convention of
//! [`crate::table`]: `INPUT:` columns become input values, `GOLDEN:` columns
//! the known solution and `HINT:` columns the training hint. Missing cells
//! are left out of the produced mappings. No row is rejected here; the
//! platform validates task contents.

use serde_json::{Map, Value};

use crate::table::{cell_text, is_missing, GOLDEN_PREFIX, HINT_PREFIX, INPUT_PREFIX};
use crate::{CoreError, PoolId, Table, Task};

const HINT_LEAD: &str = "Correct solution: ";

/// Datasets submitted together as one batch.
#[derive(Debug, Clone, Default)]
pub struct TaskSources {
    /// Regular tasks.
    pub pool_tasks: Option<Table>,
    /// Control tasks with `GOLDEN:` columns.
    pub control_tasks: Option<Table>,
    /// Training tasks with `GOLDEN:` and optional `HINT:` columns.
    pub training_tasks: Option<Table>,
}

impl TaskSources {
    /// Builder method to set regular tasks.
    pub fn with_pool_tasks(mut self, table: Table) -> Self {
        self.pool_tasks = Some(table);
        self
    }

    /// Builder method to set control tasks.
    pub fn with_control_tasks(mut self, table: Table) -> Self {
        self.control_tasks = Some(table);
        self
    }

    /// Builder method to set training tasks.
    pub fn with_training_tasks(mut self, table: Table) -> Self {
        self.training_tasks = Some(table);
        self
    }
}

/// Build the whole batch: pool tasks, then control tasks, then training
/// tasks, each in row order.
///
/// Fails with [`CoreError::EmptyBatch`] if no dataset produced a task.
pub fn build_batch(sources: &TaskSources, pool_id: &PoolId) -> Result<Vec<Task>, CoreError> {
    let mut tasks = Vec::new();
    if let Some(table) = &sources.pool_tasks {
        tasks.extend(build_plain_tasks(table, pool_id));
    }
    if let Some(table) = &sources.control_tasks {
        tasks.extend(build_control_tasks(table, pool_id));
    }
    if let Some(table) = &sources.training_tasks {
        tasks.extend(build_training_tasks(table, pool_id));
    }

    if tasks.is_empty() {
        return Err(CoreError::EmptyBatch);
    }
    Ok(tasks)
}

/// One task per row with input values only.
pub fn build_plain_tasks(table: &Table, pool_id: &PoolId) -> Vec<Task> {
    let inputs = table.prefixed_columns(INPUT_PREFIX);
    table
        .rows()
        .iter()
        .map(|row| Task::new(pool_id.clone(), collect_fields(row, &inputs)))
        .collect()
}

/// One task per row with input values and a known solution.
pub fn build_control_tasks(table: &Table, pool_id: &PoolId) -> Vec<Task> {
    let inputs = table.prefixed_columns(INPUT_PREFIX);
    let golden = table.prefixed_columns(GOLDEN_PREFIX);
    table
        .rows()
        .iter()
        .map(|row| {
            Task::new(pool_id.clone(), collect_fields(row, &inputs))
                .with_known_solution(collect_fields(row, &golden))
        })
        .collect()
}

/// Control tasks plus a hint shown on a wrong answer.
///
/// The hint joins the row's `HINT:` values without a separator; a table
/// without `HINT:` columns uses its `GOLDEN:` values instead.
pub fn build_training_tasks(table: &Table, pool_id: &PoolId) -> Vec<Task> {
    let inputs = table.prefixed_columns(INPUT_PREFIX);
    let golden = table.prefixed_columns(GOLDEN_PREFIX);
    let hints = table.prefixed_columns(HINT_PREFIX);
    let hint_source = if hints.is_empty() { &golden } else { &hints };

    table
        .rows()
        .iter()
        .map(|row| {
            Task::new(pool_id.clone(), collect_fields(row, &inputs))
                .with_known_solution(collect_fields(row, &golden))
                .with_hint(hint_text(row, hint_source))
        })
        .collect()
}

fn collect_fields(row: &[Value], columns: &[(usize, &str)]) -> Map<String, Value> {
    columns
        .iter()
        .filter(|(i, _)| !is_missing(&row[*i]))
        .map(|(i, field)| (field.to_string(), row[*i].clone()))
        .collect()
}

fn hint_text(row: &[Value], columns: &[(usize, &str)]) -> String {
    let mut hint = String::from(HINT_LEAD);
    for (i, _) in columns {
        if !is_missing(&row[*i]) {
            hint.push_str(&cell_text(&row[*i]));
        }
    }
    hint
}
