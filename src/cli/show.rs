use crate::cli::ShowArgs;
use crate::config::Config;
use crate::store::{CanvasStore, FsStore, VersionId};

pub async fn execute(args: ShowArgs) -> anyhow::Result<()> {
    let version: VersionId = args.version.parse()?;
    let config = Config::load_or_default(&args.config)?;
    let store = FsStore::new(&config.projects_root);

    let Some(meta) = store.read_meta(&version).await? else {
        println!("No canvas for {}", version);
        return Ok(());
    };

    println!("\n=== {} ===\n", meta.name);
    println!("Canvas: {}", meta.id);
    println!("Updated: {}", meta.updated_at.to_rfc3339());
    println!("\nPages:");
    for page in &meta.pages {
        let html = store.read_page_html(&version, &page.id).await?;
        let size = if html.is_empty() {
            "empty".to_string()
        } else {
            format!("{} bytes", html.len())
        };
        println!("  - {} {} ({})", page.id, page.name, size);
    }
    println!();
    Ok(())
}
