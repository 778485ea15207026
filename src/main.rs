use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use stele::build::{build_site, BuildOptions};
use stele::settings::Settings;

/// Builds a static site from a directory of markdown sources.
#[derive(Parser)]
#[command(name = "stele", version, about)]
struct Args {
    /// The site directory; it and its ancestors are searched for a
    /// `stele.yaml` project file.
    #[arg(default_value = ".")]
    site_dir: PathBuf,

    /// Use this project file instead of searching for one.
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Write all content even when its output is up to date.
    #[arg(long)]
    force_write: bool,

    /// Don't render posts.
    #[arg(long)]
    skip_posts: bool,

    /// Don't render pages.
    #[arg(long)]
    skip_pages: bool,

    /// Don't render the paginated front index.
    #[arg(long)]
    skip_index: bool,

    /// Don't render the archives page.
    #[arg(long)]
    skip_archives: bool,

    /// Don't render the RSS feed.
    #[arg(long)]
    skip_rss: bool,

    /// Don't render the JSON feed.
    #[arg(long)]
    skip_json_feed: bool,

    /// Don't render the sitemap.
    #[arg(long)]
    skip_sitemap: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("loading project file {}", path.display()))?,
        None => Settings::from_directory(&args.site_dir)
            .with_context(|| format!("loading project from {}", args.site_dir.display()))?,
    };

    let options = BuildOptions {
        force_write: args.force_write,
        skip_posts: args.skip_posts,
        skip_pages: args.skip_pages,
        skip_index: args.skip_index,
        skip_archives: args.skip_archives,
        skip_rss: args.skip_rss,
        skip_json_feed: args.skip_json_feed,
        skip_sitemap: args.skip_sitemap,
    };

    build_site(&settings, &[], &options)?;
    Ok(())
}
