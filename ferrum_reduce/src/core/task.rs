use crate::api::reduce::Reducer;
use crate::core::collector::{CollectStats, Collector};
use crate::core::emitter::{EmitStats, Emitter};
use crate::core::naming::{IntermediateNaming, MrTmpNaming};
use crate::framework::errors::Result;
use crate::framework::options::ReduceOptions;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, info_span};
use uuid::Uuid;

/// Stages of a reduce task. A task only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum TaskState {
    Start,
    Collecting,
    Emitting,
    Done,
}

#[async_trait]
pub trait Task: Send + Sync {
    type Output: Send + 'static;

    async fn execute(&self) -> Result<Self::Output>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ReduceReport {
    pub task_id: Uuid,
    pub job_name: String,
    pub partition: usize,
    pub output_path: PathBuf,
    pub state: TaskState,
    pub collect: CollectStats,
    pub emit: EmitStats,
}

/// One reduce partition of a job.
#[derive(Clone)]
pub struct ReduceTask {
    pub task_id: Uuid,
    pub job_name: String,
    pub partition: usize,
    pub output_path: PathBuf,
    pub num_mappers: usize,
    pub options: ReduceOptions,
    pub naming: Arc<dyn IntermediateNaming + Send + Sync>,
    pub reducer: Arc<dyn Reducer + Send + Sync>,
}

impl ReduceTask {
    pub fn new(
        job_name: &str,
        partition: usize,
        output_path: impl AsRef<Path>,
        num_mappers: usize,
        reducer: Arc<dyn Reducer + Send + Sync>,
    ) -> Self {
        ReduceTask {
            task_id: Uuid::new_v4(),
            job_name: job_name.to_string(),
            partition,
            output_path: output_path.as_ref().to_path_buf(),
            num_mappers,
            options: ReduceOptions::default(),
            naming: Arc::new(MrTmpNaming::default()),
            reducer,
        }
    }

    pub fn with_options(mut self, options: ReduceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_naming(mut self, naming: Arc<dyn IntermediateNaming + Send + Sync>) -> Self {
        self.naming = naming;
        self
    }

    fn advance(&self, state: &mut TaskState, next: TaskState) {
        debug_assert!(next > *state);
        debug!(from = ?state, to = ?next, "reduce task transition");
        *state = next;
    }

    /// Runs the task to completion on the current thread.
    ///
    /// Only an unopenable output file is reported as an error, unless the
    /// task runs in strict mode.
    pub fn run(&self) -> Result<ReduceReport> {
        let span = info_span!(
            "reduce_task",
            task_id = %self.task_id,
            job = %self.job_name,
            partition = self.partition
        );
        let _guard = span.enter();

        let mut state = TaskState::Start;

        self.advance(&mut state, TaskState::Collecting);
        let collector = Collector::new(
            &self.job_name,
            self.partition,
            self.num_mappers,
            self.naming.as_ref(),
            self.options.strictness,
        );
        let (table, collect) = collector.collect()?;
        info!(
            keys = table.len(),
            records = collect.records,
            missing = collect.files_missing,
            malformed = collect.malformed,
            "collected intermediate records"
        );

        self.advance(&mut state, TaskState::Emitting);
        let emitter = Emitter::new(&self.output_path, self.options.strictness);
        let emit = emitter.emit(&table, self.reducer.as_ref())?;
        drop(table);

        self.advance(&mut state, TaskState::Done);
        info!(
            output = %self.output_path.display(),
            written = emit.records_written,
            terminated_early = emit.terminated_early,
            "reduce task done"
        );

        Ok(ReduceReport {
            task_id: self.task_id,
            job_name: self.job_name.clone(),
            partition: self.partition,
            output_path: self.output_path.clone(),
            state,
            collect,
            emit,
        })
    }
}

#[async_trait]
impl Task for ReduceTask {
    type Output = ReduceReport;

    async fn execute(&self) -> Result<ReduceReport> {
        let task = self.clone();
        tokio::task::spawn_blocking(move || task.run()).await?
    }
}

/// Reduces one partition using `mrtmp.*` files in the working directory,
/// degrading on missing or malformed input.
pub fn do_reduce<R>(
    job_name: &str,
    partition: usize,
    output_path: impl AsRef<Path>,
    num_mappers: usize,
    reducer: R,
) -> Result<ReduceReport>
where
    R: Reducer + Send + Sync + 'static,
{
    ReduceTask::new(job_name, partition, output_path, num_mappers, Arc::new(reducer)).run()
}
