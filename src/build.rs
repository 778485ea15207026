//! The one-pass build driver: enumerate and parse sources, run the
//! content-stage extensions, assemble the collections, run the target-stage
//! extensions, render everything to disk, and finish with the sitemap
//! (which reads the just-written output files' mtimes).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use gtmpl::Value;
use log::{debug, info, warn};
use thiserror::Error;

use crate::collections::{Archives, Index, JsonFeed, RssFeed, Sitemap};
use crate::content::{self, Page, Post};
use crate::extensions::{self, apply_content_stage, apply_target_stage, Extension};
use crate::markdown::MarkdownRenderer;
use crate::settings::Settings;
use crate::target::{self, RenderContext, Target};
use crate::templates::{self, GtmplRenderer};

/// The file extensions recognized as markdown sources.
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "mkd", "mdown", "mkdown", "markdown"];

/// Per-invocation switches, mirroring the CLI flags. Skips drop whole steps
/// from the build; `force_write` renders content even when its output is up
/// to date.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildOptions {
    pub force_write: bool,
    pub skip_posts: bool,
    pub skip_pages: bool,
    pub skip_index: bool,
    pub skip_archives: bool,
    pub skip_rss: bool,
    pub skip_json_feed: bool,
    pub skip_sitemap: bool,
}

/// All markdown source files under `root`, in sorted order. A missing
/// directory yields no files rather than an error.
pub fn markdown_files(root: &Path) -> Result<Vec<PathBuf>, Error> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| MARKDOWN_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false);
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Whether a parse failure should skip the file (with a warning) instead of
/// aborting the build. Drafts and malformed headers are skips; everything
/// else propagates.
fn skippable(err: &content::Error) -> bool {
    matches!(
        err,
        content::Error::Draft(_)
            | content::Error::Header(_)
            | content::Error::MissingField(_)
            | content::Error::DateParse { .. }
    )
}

fn load_posts(settings: &Settings) -> Result<Vec<Post>, Error> {
    let dir = settings
        .paths
        .content_root
        .join(&settings.paths.posts_subdir);
    let mut posts = Vec::new();
    for path in markdown_files(&dir)? {
        match Post::from_file(&path, settings) {
            Ok(post) => posts.push(post),
            Err(err) if skippable(&err) => warn!("skipping {}: {}", path.display(), err),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(posts)
}

fn load_pages(settings: &Settings) -> Result<Vec<Page>, Error> {
    let dir = settings
        .paths
        .content_root
        .join(&settings.paths.pages_subdir);
    let mut pages = Vec::new();
    for path in markdown_files(&dir)? {
        match Page::from_file(&path, settings) {
            Ok(page) => pages.push(page),
            Err(err) if skippable(&err) => warn!("skipping {}: {}", path.display(), err),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(pages)
}

/// The per-build context every template render receives alongside the
/// target's own fields: the site identity, the build timestamp, and
/// summaries of every post and page.
fn extra_context(
    settings: &Settings,
    posts: &mut [Post],
    pages: &mut [Page],
) -> Result<HashMap<String, Value>, Error> {
    let mut extra = HashMap::new();

    let mut site: HashMap<String, Value> = HashMap::new();
    site.insert("title".to_owned(), Value::String(settings.site.title.clone()));
    site.insert(
        "url".to_owned(),
        Value::String(settings.site.url.to_string()),
    );
    site.insert(
        "description".to_owned(),
        Value::String(settings.site.description.clone()),
    );
    extra.insert("site".to_owned(), Value::Object(site));

    let build_date = Utc::now()
        .with_timezone(&settings.dates.timezone)
        .to_rfc3339_opts(SecondsFormat::Secs, false);
    extra.insert("build_date".to_owned(), Value::String(build_date));

    let mut all_posts = Vec::with_capacity(posts.len());
    for post in posts.iter_mut() {
        let url = post.url(settings)?;
        let mut object: HashMap<String, Value> = HashMap::new();
        object.insert("title".to_owned(), Value::String(post.content.title.clone()));
        object.insert("slug".to_owned(), Value::String(post.content.slug.clone()));
        object.insert("url".to_owned(), Value::String(url.to_string()));
        object.insert(
            "date".to_owned(),
            Value::String(post.date.to_rfc3339_opts(SecondsFormat::Secs, false)),
        );
        all_posts.push(Value::Object(object));
    }
    extra.insert("all_posts".to_owned(), Value::Array(all_posts));

    let mut all_pages = Vec::with_capacity(pages.len());
    for page in pages.iter_mut() {
        let url = page.url(settings)?;
        let mut object: HashMap<String, Value> = HashMap::new();
        object.insert("title".to_owned(), Value::String(page.content.title.clone()));
        object.insert("slug".to_owned(), Value::String(page.content.slug.clone()));
        object.insert("url".to_owned(), Value::String(url.to_string()));
        all_pages.push(Value::Object(object));
    }
    extra.insert("all_pages".to_owned(), Value::Array(all_pages));

    Ok(extra)
}

/// Ensures a file exists at `path` so its mtime can be read.
fn touch(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs::write(path, "")?;
    }
    Ok(())
}

/// Builds the whole site.
pub fn build_site(
    settings: &Settings,
    extensions: &[Box<dyn Extension>],
    options: &BuildOptions,
) -> Result<(), Error> {
    let markdown = MarkdownRenderer::new(&settings.markdown);
    let renderer = GtmplRenderer::from_directory(&settings.paths.templates_root)?;

    let mut posts = load_posts(settings)?;
    let mut pages = load_pages(settings)?;
    info!("parsed {} posts and {} pages", posts.len(), pages.len());

    let mut extra_targets: Vec<Box<dyn Target>> = Vec::new();
    apply_content_stage(extensions, &mut posts, &mut pages, &mut extra_targets, settings)?;

    crate::collections::sort_newest_first(&mut posts);
    pages.sort_by(|a, b| a.cmp_order(b));

    // Convert every body once; the memoized HTML travels with the clones
    // pushed into the write set below.
    for post in &mut posts {
        post.content.html(&markdown);
    }
    for page in &mut pages {
        page.content.html(&markdown);
    }

    let extra = extra_context(settings, &mut posts, &mut pages)?;
    let ctx = RenderContext {
        settings,
        renderer: &renderer,
        markdown: &markdown,
        extra,
    };

    let mut targets: Vec<Box<dyn Target>> = Vec::new();
    if !options.skip_posts {
        for post in &mut posts {
            if options.force_write || post.is_new(settings)? {
                targets.push(Box::new(post.clone()));
            } else {
                debug!("{} is up to date", post.content.slug);
            }
        }
    }
    if !options.skip_pages {
        for page in &mut pages {
            if options.force_write || page.is_new(settings)? {
                targets.push(Box::new(page.clone()));
            } else {
                debug!("{} is up to date", page.content.slug);
            }
        }
    }

    let mut indexes = Vec::new();
    if !options.skip_index {
        indexes = Index::paginate(posts.clone(), settings)?;
        for index in &indexes {
            targets.push(Box::new(index.clone()));
        }
    }
    if !options.skip_archives {
        targets.push(Box::new(Archives::new(posts.clone(), settings)));
    }
    if !options.skip_rss {
        targets.push(Box::new(RssFeed::new(posts.clone(), settings)));
    }
    if !options.skip_json_feed {
        targets.push(Box::new(JsonFeed::new(posts.clone(), settings)));
    }
    targets.extend(extra_targets);

    apply_target_stage(extensions, &mut targets, settings)?;

    info!("writing {} targets", targets.len());
    for target in &mut targets {
        target.write(&ctx)?;
    }

    if !options.skip_sitemap {
        // The front page must exist on disk for the sitemap; when pagination
        // produced none (skipped, or zero posts) an empty placeholder is
        // touched instead.
        let mut front_page = match indexes.first() {
            Some(front) => front.clone(),
            None => {
                let mut placeholder = Index::new(1, Vec::new(), settings);
                touch(&placeholder.output_path(settings)?)?;
                placeholder
            }
        };

        let mut sitemap_targets: Vec<&mut dyn Target> = Vec::new();
        for page in &mut pages {
            sitemap_targets.push(page);
        }
        for post in &mut posts {
            sitemap_targets.push(post);
        }
        sitemap_targets.push(&mut front_page);

        let mut sitemap = Sitemap::new(sitemap_targets, settings)?;
        sitemap.write(&ctx)?;
    }

    info!("build complete");
    Ok(())
}

/// Represents an error during a site build.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Content(#[from] content::Error),

    #[error(transparent)]
    Target(#[from] target::Error),

    #[error(transparent)]
    Extension(#[from] extensions::Error),

    #[error(transparent)]
    Templates(#[from] templates::Error),

    #[error("enumerating source files: {0}")]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
