use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::app::{ProgressEvent, ProgressSink};
use crate::catalog::PropertyMeta;
use crate::dataset::{Chunk, Measurement};
use crate::domain::Structure;
use crate::error::KimQueryError;
use crate::openkim::{KimClient, RawRecord};
use crate::query::{self, MODEL_FIELD, QuerySpec, SPECIES_FIELD};

pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

/// Work item for one (property, structure) pair.
#[derive(Debug, Clone)]
pub struct FetchTask {
    pub property: String,
    pub structure: Structure,
    pub meta: PropertyMeta,
    pub query: QuerySpec,
    pub retries_remaining: u32,
}

impl FetchTask {
    pub fn new(
        meta: &PropertyMeta,
        structure: Structure,
        retries: u32,
    ) -> Result<Self, KimQueryError> {
        let query = query::build(&meta.code, structure, meta)?;
        Ok(Self {
            property: meta.code.clone(),
            structure,
            meta: meta.clone(),
            query,
            retries_remaining: retries,
        })
    }

    pub fn label(&self) -> String {
        format!("{}#{}", self.property, self.structure)
    }
}

pub struct Fetcher<C: KimClient> {
    client: C,
    policy: RetryPolicy,
}

impl<C: KimClient> Fetcher<C> {
    pub fn new(client: C, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Runs the task's query until it succeeds or its retries run out.
    /// Every failed attempt consumes one retry from the task.
    pub fn fetch(
        &self,
        task: &mut FetchTask,
        sink: &dyn ProgressSink,
    ) -> Result<Chunk, KimQueryError> {
        let mut attempts = 0u32;
        loop {
            sink.event(ProgressEvent {
                message: format!(
                    "Retrieving {} of {} crystals...",
                    task.property, task.structure
                ),
                elapsed: None,
            });
            let start = Instant::now();
            attempts += 1;
            match self.client.query(&task.query) {
                Ok(records) => {
                    sink.event(ProgressEvent {
                        message: format!("{} records obtained.", records.len()),
                        elapsed: Some(start.elapsed()),
                    });
                    return Ok(parse_records(&records, &task.query));
                }
                Err(err) => {
                    if task.retries_remaining == 0 {
                        return Err(KimQueryError::FetchExhausted {
                            property: task.property.clone(),
                            structure: task.structure.to_string(),
                            attempts,
                            last_error: err.to_string(),
                        });
                    }
                    tracing::warn!(
                        task = %task.label(),
                        retries_remaining = task.retries_remaining,
                        error = %err,
                        "query failed, retrying"
                    );
                    sink.event(ProgressEvent {
                        message: format!(
                            "Warning: failed to get data. Retry after {} s...",
                            self.policy.interval.as_secs_f64()
                        ),
                        elapsed: None,
                    });
                    thread::sleep(self.policy.interval);
                    task.retries_remaining -= 1;
                }
            }
        }
    }
}

/// Folds flat result rows into element -> model -> measurement. A repeated
/// (element, model) pair keeps the last row.
pub fn parse_records(records: &[RawRecord], spec: &QuerySpec) -> Chunk {
    let mut chunk = Chunk::new();
    for record in records {
        let model = record.get(MODEL_FIELD).and_then(Value::as_str);
        let element = record.get(SPECIES_FIELD).and_then(species);
        let (Some(model), Some(element)) = (model, element) else {
            tracing::debug!(?record, "skipping record without model or species");
            continue;
        };
        let measurement = Measurement {
            value: record.get(&spec.value_field).and_then(Value::as_f64),
            uncert: record.get(&spec.uncertainty_field).and_then(Value::as_f64),
        };
        chunk
            .entry(element)
            .or_default()
            .insert(model.to_string(), measurement);
    }
    chunk
}

fn species(value: &Value) -> Option<String> {
    match value {
        Value::String(symbol) => Some(symbol.clone()),
        Value::Array(items) if items.len() == 1 => items[0].as_str().map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::catalog::Catalog;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn duplicate_pairs_keep_last_row() {
        let catalog = Catalog::builtin();
        let meta = catalog.lookup("c11").unwrap();
        let spec = query::build("c11", Structure::Fcc, meta).unwrap();
        let rows = vec![
            record(json!({"meta.model": "MO_A", "meta.runner.species": "Al", "c11.source-value": 100.0})),
            record(json!({"meta.model": "MO_A", "meta.runner.species": "Al", "c11.source-value": 110.0})),
            record(json!({"meta.model": "MO_B", "meta.runner.species": ["Cu"], "c11.source-value": 170.0, "c11.source-std-uncert-value": 1.5})),
            record(json!({"meta.runner.species": "Ni", "c11.source-value": 1.0})),
        ];

        let chunk = parse_records(&rows, &spec);
        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk["Al"]["MO_A"].value, Some(110.0));
        assert_eq!(chunk["Al"]["MO_A"].uncert, None);
        assert_eq!(chunk["Cu"]["MO_B"].uncert, Some(1.5));
    }
}
