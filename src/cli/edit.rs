use crate::cli::{AddPageArgs, IterateArgs};
use crate::config::Config;
use crate::provider::create_model;
use crate::store::{FsStore, VersionId};
use crate::vcs::GitRepo;
use crate::workflow;
use tracing::info;

pub async fn iterate(args: IterateArgs) -> anyhow::Result<()> {
    let version: VersionId = args.version.parse()?;
    let config = Config::load_or_default(&args.config)?;
    config.validate()?;

    let model = create_model(&config.model, &config.providers)?;
    info!("Revising {} of {} with {}", args.page, version, model.name());

    let page = workflow::iterate_page(
        model.as_ref(),
        &FsStore::new(&config.projects_root),
        &GitRepo::new(&config.git),
        &version,
        &args.page,
        &args.prompt,
    )
    .await?;

    println!("Updated {} ({})", page.id, page.name);
    Ok(())
}

pub async fn add_page(args: AddPageArgs) -> anyhow::Result<()> {
    let version: VersionId = args.version.parse()?;
    let config = Config::load_or_default(&args.config)?;
    config.validate()?;

    let model = create_model(&config.model, &config.providers)?;
    info!("Adding page {} to {} with {}", args.name, version, model.name());

    let page = workflow::add_page(
        model.as_ref(),
        &FsStore::new(&config.projects_root),
        &GitRepo::new(&config.git),
        &version,
        &config.workflow.canvas_name,
        &args.name,
        args.prompt.as_deref(),
    )
    .await?;

    println!("Added {} ({})", page.id, page.name);
    Ok(())
}
