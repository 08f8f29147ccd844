use super::events::{EventSink, WorkflowEvent, WorkflowStep};
use super::types::{GeneratedPage, ImplementationPlan, QualityReport, Task, TechDesign};
use super::{architect, coder, planner, reviewer};
use crate::config::{RetryGate, WorkflowConfig};
use crate::error::{InputError, PipelineError, StoreError};
use crate::provider::Model;
use crate::store::{CanvasPageMeta, CanvasStore, VersionId};
use crate::vcs::VersionControl;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives architect, planner, coder and reviewer for one canvas version
pub struct Pipeline {
    model: Arc<dyn Model>,
    store: Arc<dyn CanvasStore>,
    vcs: Arc<dyn VersionControl>,
    settings: WorkflowConfig,
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunSummary),
    /// Stopped at a checkpoint; nothing was committed and no `done` was sent
    Cancelled,
}

#[derive(Debug)]
pub struct RunSummary {
    pub canvas_id: String,
    /// Pages that ended the run with stored HTML
    pub page_count: usize,
    /// Tasks in the plan, one storage slot each
    pub planned: usize,
    /// Page ids sent through the second coder pass
    pub retried: Vec<String>,
    pub report: QualityReport,
    pub pages: Vec<GeneratedPage>,
}

struct FailedTask {
    page_id: String,
    error: String,
}

/// Settled result of one coder fan-out, successes in task order
struct FanOut {
    generated: Vec<GeneratedPage>,
    failed: Vec<FailedTask>,
}

impl Pipeline {
    pub fn new(
        model: Arc<dyn Model>,
        store: Arc<dyn CanvasStore>,
        vcs: Arc<dyn VersionControl>,
        settings: WorkflowConfig,
    ) -> Self {
        Self {
            model,
            store,
            vcs,
            settings,
        }
    }

    /// Run on a background task; events arrive on the returned receiver and
    /// the channel closes when the run ends
    pub fn spawn(
        self: Arc<Self>,
        version: VersionId,
        cancel: CancellationToken,
    ) -> (
        UnboundedReceiver<WorkflowEvent>,
        JoinHandle<Result<RunOutcome, PipelineError>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move { self.run(&version, &cancel, tx).await });
        (rx, handle)
    }

    pub async fn run(
        &self,
        version: &VersionId,
        cancel: &CancellationToken,
        events: UnboundedSender<WorkflowEvent>,
    ) -> Result<RunOutcome, PipelineError> {
        let sink = EventSink::new(events);
        let mut run = Run {
            pipeline: self,
            version,
            cancel,
            sink: &sink,
            step: WorkflowStep::Architect,
        };

        let start = Instant::now();
        let result = run.execute().await;

        match &result {
            Ok(RunOutcome::Completed(summary)) => info!(
                "Run for {} finished in {:.1}s: {}/{} pages",
                version,
                start.elapsed().as_secs_f64(),
                summary.page_count,
                summary.planned
            ),
            Ok(RunOutcome::Cancelled) => info!("Run for {} cancelled", version),
            Err(e) => {
                warn!("Run for {} failed at {}: {}", version, run.step, e);
                sink.failed(run.step, e.to_string());
            }
        }
        result
    }
}

/// State of a single run. `step` is the stage any error is attributed to.
struct Run<'a> {
    pipeline: &'a Pipeline,
    version: &'a VersionId,
    cancel: &'a CancellationToken,
    sink: &'a EventSink,
    step: WorkflowStep,
}

impl Run<'_> {
    async fn execute(&mut self) -> Result<RunOutcome, PipelineError> {
        let p = self.pipeline;
        let settings = &p.settings;

        // Setup
        let spec = p.store.read_spec(self.version).await?.unwrap_or_default();
        if spec.trim().is_empty() {
            return Err(InputError::EmptySpec.into());
        }
        let canvas = p
            .store
            .load_or_create_canvas(self.version, &settings.canvas_name)
            .await?;
        p.vcs.ensure_repo(&p.store.version_dir(self.version)).await?;
        if self.cancelled("setup") {
            return Ok(RunOutcome::Cancelled);
        }

        // Architect
        self.enter(WorkflowStep::Architect);
        let design = match self
            .guarded(architect::run(p.model.as_ref(), &spec, settings.max_pages))
            .await
        {
            Some(design) => design.map_err(|e| PipelineError::from_stage(self.step, e))?,
            None => return Ok(RunOutcome::Cancelled),
        };
        self.sink.complete(
            self.step,
            json!({ "pageCount": design.pages.len() }),
        );
        if self.cancelled("architect") {
            return Ok(RunOutcome::Cancelled);
        }

        // Planner
        self.enter(WorkflowStep::Planner);
        let plan = match self.guarded(planner::run(p.model.as_ref(), &design)).await {
            Some(plan) => plan.map_err(|e| PipelineError::from_stage(self.step, e))?,
            None => return Ok(RunOutcome::Cancelled),
        };
        plan.check_against(&design)?;
        self.sink
            .complete(self.step, json!({ "taskCount": plan.tasks.len() }));
        if self.cancelled("planner") {
            return Ok(RunOutcome::Cancelled);
        }

        let slots = self.allocate_slots(&plan).await?;
        if self.cancelled("slot allocation") {
            return Ok(RunOutcome::Cancelled);
        }

        // Coder
        self.enter(WorkflowStep::Coder);
        let design = Arc::new(design);
        let shared = Arc::new(plan.shared_components.clone());
        let first = match self.fan_out(&plan.tasks, &design, &shared).await {
            Some(first) => first,
            None => return Ok(RunOutcome::Cancelled),
        };
        for page in &first.generated {
            self.store_html(&slots, page).await?;
        }
        for failed in &first.failed {
            debug!("No HTML stored for {}: {}", failed.page_id, failed.error);
        }
        self.sink.complete(
            self.step,
            json!({ "generated": first.generated.len(), "total": plan.tasks.len() }),
        );
        let mut pages = first.generated;
        if self.cancelled("coder") {
            return Ok(RunOutcome::Cancelled);
        }

        // Reviewer, with at most one retry pass
        self.enter(WorkflowStep::Reviewer);
        let mut retried = Vec::new();
        let report = if pages.is_empty() {
            self.sink
                .detail(self.step, "No pages generated, skipping review".to_string());
            QualityReport::empty()
        } else {
            let report = match self.review(&pages, &design).await? {
                Some(report) => report,
                None => return Ok(RunOutcome::Cancelled),
            };

            let retry_tasks = self.select_retries(&report, &plan.tasks, &pages);
            if retry_tasks.is_empty() {
                report
            } else {
                if self.cancelled("first review") {
                    return Ok(RunOutcome::Cancelled);
                }

                self.step = WorkflowStep::Coder;
                self.sink.detail(
                    self.step,
                    format!("Retrying {} failing page(s)", retry_tasks.len()),
                );
                retried = retry_tasks.iter().map(|t| t.page_id.clone()).collect();

                let second = match self.fan_out(&retry_tasks, &design, &shared).await {
                    Some(second) => second,
                    None => return Ok(RunOutcome::Cancelled),
                };
                for page in second.generated {
                    self.store_html(&slots, &page).await?;
                    if let Some(slot) = pages.iter_mut().find(|p| p.page_id == page.page_id) {
                        *slot = page;
                    }
                }
                for failed in &second.failed {
                    info!(
                        "Keeping first attempt for {} after retry failure: {}",
                        failed.page_id, failed.error
                    );
                }

                self.step = WorkflowStep::Reviewer;
                self.sink
                    .detail(self.step, format!("Re-reviewing {} page(s)", pages.len()));
                match self.review(&pages, &design).await? {
                    Some(report) => report,
                    None => return Ok(RunOutcome::Cancelled),
                }
            }
        };
        self.sink.complete(
            self.step,
            json!({
                "overallScore": report.overall_score,
                "passesThreshold": report.passes_threshold,
            }),
        );
        if self.cancelled("review") {
            return Ok(RunOutcome::Cancelled);
        }

        // Finalize
        self.touch_pages().await?;
        p.vcs
            .commit(&p.store.version_dir(self.version), &settings.commit_message)
            .await?;
        self.sink.done(canvas.id.clone(), pages.len());

        Ok(RunOutcome::Completed(RunSummary {
            canvas_id: canvas.id,
            page_count: pages.len(),
            planned: plan.tasks.len(),
            retried,
            report,
            pages,
        }))
    }

    fn enter(&mut self, step: WorkflowStep) {
        self.step = step;
        self.sink.running(step);
    }

    fn cancelled(&self, checkpoint: &str) -> bool {
        if self.cancel.is_cancelled() {
            info!("Cancellation observed after {}", checkpoint);
            return true;
        }
        false
    }

    /// `None` when cancellation wins the race
    async fn guarded<T>(&self, fut: impl Future<Output = T>) -> Option<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            out = fut => Some(out),
        }
    }

    async fn review(
        &self,
        pages: &[GeneratedPage],
        design: &TechDesign,
    ) -> Result<Option<QualityReport>, PipelineError> {
        let model = self.pipeline.model.as_ref();
        let threshold = self.pipeline.settings.quality_threshold;
        match self
            .guarded(reviewer::run(model, pages, design, threshold))
            .await
        {
            Some(report) => report
                .map(Some)
                .map_err(|e| PipelineError::from_stage(self.step, e)),
            None => Ok(None),
        }
    }

    /// Tasks whose generated page scored below the threshold
    fn select_retries(
        &self,
        report: &QualityReport,
        tasks: &[Task],
        pages: &[GeneratedPage],
    ) -> Vec<Task> {
        let settings = &self.pipeline.settings;
        let gated = match settings.retry_gate {
            RetryGate::PerPage => true,
            RetryGate::OverallScore => !report.passes_threshold,
        };
        if !gated {
            return Vec::new();
        }

        let below: HashSet<String> = report
            .pages_below(settings.quality_threshold)
            .into_iter()
            .collect();
        let generated: HashSet<&str> = pages.iter().map(|p| p.page_id.as_str()).collect();

        tasks
            .iter()
            .filter(|t| below.contains(&t.page_id) && generated.contains(t.page_id.as_str()))
            .cloned()
            .collect()
    }

    /// Replace the canvas pages with one fresh slot per task, in task order.
    /// Returns page id -> slot id.
    async fn allocate_slots(
        &self,
        plan: &ImplementationPlan,
    ) -> Result<HashMap<String, String>, PipelineError> {
        let store = &self.pipeline.store;
        let mut meta = store
            .read_meta(self.version)
            .await?
            .ok_or_else(|| StoreError::CanvasMissing(self.version.to_string()))?;

        for old in &meta.pages {
            store.remove_page_html(self.version, &old.id).await?;
        }

        let now = Utc::now();
        meta.pages = plan
            .tasks
            .iter()
            .map(|t| CanvasPageMeta::new_slot(&t.page_name, &t.description, now))
            .collect();
        meta.updated_at = now;
        store.write_meta(self.version, &meta).await?;

        debug!("Allocated {} page slots", meta.pages.len());
        Ok(plan
            .tasks
            .iter()
            .zip(&meta.pages)
            .map(|(task, slot)| (task.page_id.clone(), slot.id.clone()))
            .collect())
    }

    async fn store_html(
        &self,
        slots: &HashMap<String, String>,
        page: &GeneratedPage,
    ) -> Result<(), PipelineError> {
        match slots.get(&page.page_id) {
            Some(slot) => {
                self.pipeline
                    .store
                    .write_page_html(self.version, slot, &page.html_content)
                    .await?
            }
            None => warn!("No slot for generated page {}", page.page_id),
        }
        Ok(())
    }

    /// Run the coder for every task concurrently and wait for all of them.
    /// One task failing never stops the others. `None` if cancelled, in
    /// which case outstanding tasks are aborted.
    async fn fan_out(
        &self,
        tasks: &[Task],
        design: &Arc<TechDesign>,
        shared: &Arc<Vec<String>>,
    ) -> Option<FanOut> {
        let total = tasks.len();
        let mut futures = FuturesUnordered::new();
        let mut aborts = Vec::with_capacity(total);

        for (idx, task) in tasks.iter().enumerate() {
            let model = Arc::clone(&self.pipeline.model);
            let design = Arc::clone(design);
            let shared = Arc::clone(shared);
            let task = task.clone();

            let handle = tokio::spawn(async move {
                coder::run(model.as_ref(), &task, &design, &shared).await
            });
            aborts.push(handle.abort_handle());
            futures.push(async move { (idx, handle.await) });
        }

        let mut settled: Vec<Option<GeneratedPage>> = vec![None; total];
        let mut failed = Vec::new();
        let mut finished = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    for abort in &aborts {
                        abort.abort();
                    }
                    return None;
                }
                next = futures.next() => next,
            };
            let Some((idx, joined)) = next else { break };

            finished += 1;
            let task = &tasks[idx];
            let error = match joined {
                Ok(Ok(page)) => {
                    info!("Generated {} ({}/{})", task.page_id, finished, total);
                    self.sink.detail(
                        WorkflowStep::Coder,
                        format!("Generated page: {} ({}/{})", task.page_name, finished, total),
                    );
                    settled[idx] = Some(page);
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(e) => format!("task panicked: {}", e),
            };

            warn!("Coder failed for {}: {}", task.page_id, error);
            self.sink.detail(
                WorkflowStep::Coder,
                format!("Failed page: {} ({}/{})", task.page_name, finished, total),
            );
            failed.push(FailedTask {
                page_id: task.page_id.clone(),
                error,
            });
        }

        Some(FanOut {
            generated: settled.into_iter().flatten().collect(),
            failed,
        })
    }

    /// Stamp every page, and the canvas, with one shared finish time
    async fn touch_pages(&self) -> Result<(), PipelineError> {
        let store = &self.pipeline.store;
        let mut meta = store
            .read_meta(self.version)
            .await?
            .ok_or_else(|| StoreError::CanvasMissing(self.version.to_string()))?;

        let now = Utc::now();
        for page in &mut meta.pages {
            page.updated_at = now;
        }
        meta.updated_at = now;
        store.write_meta(self.version, &meta).await?;
        Ok(())
    }
}
