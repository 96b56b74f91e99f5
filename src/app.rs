use std::thread;
use std::time::{Duration, Instant};

use crate::catalog::Catalog;
use crate::dataset::Dataset;
use crate::domain::Structure;
use crate::error::KimQueryError;
use crate::fetch::{FetchTask, Fetcher};
use crate::filter;
use crate::openkim::KimClient;
use crate::options::Options;
use crate::store::{CacheStatus, CacheStore};

pub const DEFAULT_TASK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

/// A task whose retries ran out during an update pass.
#[derive(Debug)]
pub struct TaskFailure {
    pub property: String,
    pub structure: Structure,
    pub error: KimQueryError,
}

impl TaskFailure {
    pub fn label(&self) -> String {
        format!("{}#{}", self.property, self.structure)
    }
}

#[derive(Debug)]
pub struct UpdateReport {
    pub dataset: Dataset,
    pub cache_status: CacheStatus,
    pub refreshed: bool,
    pub failures: Vec<TaskFailure>,
    pub persist_error: Option<KimQueryError>,
}

impl UpdateReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Collapses the per-task failures into one error, if there were any.
    pub fn incomplete_error(&self) -> Option<KimQueryError> {
        if self.is_complete() {
            return None;
        }
        Some(KimQueryError::UpdateIncomplete {
            failed: self.failures.iter().map(TaskFailure::label).collect(),
        })
    }
}

/// Owns everything one update-and-filter session needs. Nothing is shared
/// between sessions.
pub struct App<C: KimClient> {
    catalog: Catalog,
    fetcher: Fetcher<C>,
    task_interval: Duration,
}

impl<C: KimClient> App<C> {
    pub fn new(catalog: Catalog, fetcher: Fetcher<C>, task_interval: Duration) -> Self {
        Self {
            catalog,
            fetcher,
            task_interval,
        }
    }

    pub fn fetcher(&self) -> &Fetcher<C> {
        &self.fetcher
    }

    /// Enumerates tasks, properties outer and structures inner. A property
    /// with fixed structures ignores the requested ones.
    pub fn plan(&self, options: &Options) -> Result<Vec<FetchTask>, KimQueryError> {
        let retries = self.fetcher.policy().retries;
        let mut tasks = Vec::new();
        for property in &options.properties {
            let meta = self.catalog.lookup(property)?;
            let structures = meta
                .applicable_structures
                .as_deref()
                .unwrap_or(options.structures.as_slice());
            for structure in structures {
                tasks.push(FetchTask::new(meta, *structure, retries)?);
            }
        }
        Ok(tasks)
    }

    /// Loads the cache and, when a refresh is requested or the cache is
    /// unusable, refetches every planned task and persists the result.
    pub fn run(
        &self,
        options: &Options,
        sink: &dyn ProgressSink,
    ) -> Result<UpdateReport, KimQueryError> {
        let tasks = self.plan(options)?;

        let outcome = CacheStore::load(&options.cache_path);
        match &outcome.error {
            None => sink.event(ProgressEvent {
                message: "Local cache loaded.".to_string(),
                elapsed: None,
            }),
            Some(err) => {
                tracing::debug!(error = %err, status = ?outcome.status, "cache unusable");
                sink.event(ProgressEvent {
                    message: "No cache found.".to_string(),
                    elapsed: None,
                });
            }
        }

        let cache_status = outcome.status;
        if !options.force_refresh && !outcome.needs_refresh() {
            return Ok(UpdateReport {
                dataset: outcome.dataset,
                cache_status,
                refreshed: false,
                failures: Vec::new(),
                persist_error: None,
            });
        }

        let mut dataset = outcome.dataset;
        sink.event(ProgressEvent {
            message: "Fetching newest data from OpenKIM...".to_string(),
            elapsed: None,
        });
        let failures = self.update(&mut dataset, tasks, sink);

        let persist_error = match CacheStore::save(&options.cache_path, &dataset) {
            Ok(()) => {
                tracing::info!(path = %options.cache_path, "cache saved");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "cache not persisted");
                Some(err)
            }
        };

        Ok(UpdateReport {
            dataset,
            cache_status,
            refreshed: true,
            failures,
            persist_error,
        })
    }

    /// Runs the tasks one at a time, pausing between them, and merges each
    /// successful chunk. A failed task does not stop the pass.
    pub fn update(
        &self,
        dataset: &mut Dataset,
        tasks: Vec<FetchTask>,
        sink: &dyn ProgressSink,
    ) -> Vec<TaskFailure> {
        let start = Instant::now();
        let total = tasks.len();
        let mut failures = Vec::new();
        for (index, mut task) in tasks.into_iter().enumerate() {
            tracing::info!(task = %task.label(), index = index + 1, total, "fetching");
            match self.fetcher.fetch(&mut task, sink) {
                Ok(chunk) => {
                    tracing::debug!(task = %task.label(), elements = chunk.len(), "merged");
                    dataset.merge(&task.property, task.structure.as_str(), chunk);
                }
                Err(error) => {
                    tracing::warn!(task = %task.label(), error = %error, "task failed");
                    failures.push(TaskFailure {
                        property: task.property,
                        structure: task.structure,
                        error,
                    });
                }
            }
            if index + 1 < total {
                thread::sleep(self.task_interval);
            }
        }
        sink.event(ProgressEvent {
            message: format!(
                "Update finished: {} of {total} tasks succeeded.",
                total - failures.len()
            ),
            elapsed: Some(start.elapsed()),
        });
        failures
    }

    pub fn filter(&self, dataset: &Dataset, options: &Options) -> Dataset {
        filter::filter(dataset, options)
    }
}
