use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "anatlas")]
#[command(about = "Catalog and asset consistency check for the anatomy atlas viewer")]
pub struct CliArgs {
    /// Metadata document to index.
    #[arg(long, env = "ANATLAS_META", default_value = "data/meta.json")]
    pub meta: PathBuf,

    /// Directory the relative asset URLs resolve against.
    #[arg(long, env = "ANATLAS_ASSET_ROOT", default_value_t = default_asset_root())]
    pub asset_root: String,

    /// Deployment base path prefixed to every asset URL (empty locally).
    #[arg(long, env = "ANATLAS_BASE_PATH", default_value = "")]
    pub base_path: String,

    /// Check a single group instead of the whole catalog.
    #[arg(long)]
    pub group: Option<String>,

    /// Narrow the check to one subgroup (requires --group).
    #[arg(long, requires = "group")]
    pub subgroup: Option<String>,
}

pub fn default_asset_root() -> String {
    std::env::current_dir()
        .expect("Can't read current working directory!")
        .to_string_lossy()
        .to_string()
}
