use anatlas::loader::{FileProbeLoader, PathResolver};
use anatlas::meta::MetaCatalog;
use anatlas::settings::CliArgs;
use anatlas::Viewer;
use anyhow::bail;
use clap::Parser;
use log::info;
use std::sync::Arc;

/// Walks the catalog with the file-probe loader and reports every referenced
/// asset that is missing or misdescribed, group by group.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let args = CliArgs::parse();
    log::trace!("Starting with args: {:?}", args);

    let catalog = Arc::new(MetaCatalog::from_path(&args.meta)?);
    let loader = Arc::new(FileProbeLoader::new(&args.asset_root));
    let viewer = Viewer::new(catalog.clone(), loader, PathResolver::new(args.base_path));

    let groups: Vec<String> = match &args.group {
        Some(group) => vec![group.clone()],
        None => catalog.groups().into_iter().map(str::to_string).collect(),
    };

    let mut missing = 0usize;
    for group in &groups {
        let summary = viewer
            .load_group(group, args.subgroup.as_deref(), false)
            .await;
        info!(
            "{group}: {}/{} present",
            summary.loaded.len() + summary.skipped.len(),
            summary.requested
        );
        for (id, err) in &summary.failed {
            println!("{group}\t{id}\t{err}");
            missing += 1;
        }
    }

    viewer.visibility().check_invariants()?;

    if missing > 0 {
        bail!("{missing} of the referenced assets failed the check");
    }
    println!("all referenced assets present ({} groups)", groups.len());
    Ok(())
}
