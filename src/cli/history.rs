use crate::cli::{HistoryArgs, RevertArgs};
use crate::config::Config;
use crate::store::{CanvasStore, FsStore, VersionId};
use crate::vcs::{GitRepo, VersionControl};
use tracing::info;

pub async fn execute(args: HistoryArgs) -> anyhow::Result<()> {
    let version: VersionId = args.version.parse()?;
    let config = Config::load_or_default(&args.config)?;
    let store = FsStore::new(&config.projects_root);
    let dir = store.version_dir(&version);

    if !GitRepo::is_repo(&dir) {
        info!("{} is not a repository yet", dir.display());
        return Ok(());
    }

    let repo = GitRepo::new(&config.git);
    for commit in repo.log(&dir, args.limit).await? {
        println!(
            "{} {} {} ({})",
            short_hash(&commit.hash),
            commit.date,
            commit.message,
            commit.author
        );
    }
    Ok(())
}

pub async fn revert(args: RevertArgs) -> anyhow::Result<()> {
    let version: VersionId = args.version.parse()?;
    let config = Config::load_or_default(&args.config)?;
    let store = FsStore::new(&config.projects_root);
    let dir = store.version_dir(&version);
    let repo = GitRepo::new(&config.git);

    let file = format!("canvas/pages/{}.html", args.page);
    repo.checkout(&dir, &file, &args.rev).await?;

    let message = format!("Revert page {} to {}", args.page, short_hash(&args.rev));
    repo.commit(&dir, &message).await?;
    println!("{}", message);
    Ok(())
}

fn short_hash(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}
