use crate::cli::GenerateArgs;
use crate::config::Config;
use crate::output::{render_event, write_quality_report};
use crate::provider::create_model;
use crate::store::{FsStore, VersionId};
use crate::vcs::GitRepo;
use crate::workflow::{Pipeline, RunOutcome};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn execute(args: GenerateArgs) -> anyhow::Result<()> {
    let version: VersionId = args.version.parse()?;

    // Load and validate config
    info!("Loading config from {:?}", args.config);
    let mut config = Config::load_or_default(&args.config)?;
    if let Some(threshold) = args.threshold {
        config.workflow.quality_threshold = threshold;
    }
    config.validate()?;

    let model = create_model(&config.model, &config.providers)?;
    info!(
        "Generating {} with {} ({})",
        version,
        model.name(),
        config.model.model
    );

    let pipeline = Arc::new(Pipeline::new(
        model,
        Arc::new(FsStore::new(&config.projects_root)),
        Arc::new(GitRepo::new(&config.git)),
        config.workflow.clone(),
    ));

    let cancel = CancellationToken::new();
    watch_interrupt(cancel.clone());
    if let Some(secs) = args.deadline {
        watch_deadline(cancel.clone(), Duration::from_secs(secs));
    }

    let (mut events, handle) = pipeline.spawn(version.clone(), cancel);
    while let Some(event) = events.recv().await {
        let chunk = render_event(&event, args.format)?;
        let mut stdout = std::io::stdout();
        stdout.write_all(chunk.as_bytes())?;
        stdout.flush()?;
    }

    match handle.await? {
        Ok(RunOutcome::Completed(summary)) => {
            info!(
                "Completed {}: {}/{} pages, overall score {:.2}",
                version, summary.page_count, summary.planned, summary.report.overall_score
            );
            if let Some(path) = &args.report {
                write_quality_report(path, &summary)?;
                info!("Wrote report: {}", path.display());
            }
            Ok(())
        }
        Ok(RunOutcome::Cancelled) => {
            anyhow::bail!("Run for {} was cancelled; nothing was committed", version)
        }
        Err(e) => Err(e.into()),
    }
}

fn watch_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            cancel.cancel();
        }
    });
}

fn watch_deadline(cancel: CancellationToken, deadline: Duration) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(deadline) => {
                warn!("Deadline of {}s reached, cancelling run", deadline.as_secs());
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }
    });
}
