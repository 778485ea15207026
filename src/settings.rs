//! Typed site settings, loaded from a `stele.yaml` project file.
//!
//! Every section and field carries a serde default so a partial settings file
//! works; an empty file yields a usable configuration pointed at
//! `content/`, `templates/` and `output/` under the project root.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// The site's settings, grouped into the sections the rest of the crate
/// reads: output paths and path templates, site identity, date handling,
/// index pagination, feed limits, markdown options and template file names.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub paths: Paths,
    pub site: Site,
    pub dates: Dates,
    pub index: IndexSettings,
    pub feeds: Feeds,
    pub markdown: MarkdownSettings,
    pub templates: Templates,
}

impl Settings {
    /// Loads settings from a YAML project file. An empty file yields the
    /// defaults. Relative filesystem roots are anchored to the file's
    /// directory, so a build works the same from anywhere in the project.
    pub fn from_file(path: &Path) -> Result<Settings, Error> {
        let text = std::fs::read_to_string(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let mut settings = if text.trim().is_empty() {
            Settings::default()
        } else {
            serde_yaml::from_str(&text)?
        };
        if let Some(project_root) = path.parent() {
            settings.paths.anchor(project_root);
        }
        Ok(settings)
    }

    /// Searches `dir` and its ancestors for a `stele.yaml` file and loads it.
    pub fn from_directory(dir: &Path) -> Result<Settings, Error> {
        let path = dir.join(PROJECT_FILE_NAME);
        if path.exists() {
            Settings::from_file(&path)
        } else {
            match dir.parent() {
                Some(parent) => Settings::from_directory(parent),
                None => Err(Error::ProjectFileNotFound),
            }
        }
    }
}

const PROJECT_FILE_NAME: &str = "stele.yaml";

/// Filesystem roots plus the path templates that [`crate::target::Target`]s
/// format their path part from. Path templates may reference `{slug}`,
/// `{page_number}` and `{date:...}` (a chrono format string) depending on the
/// target.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Paths {
    pub content_root: PathBuf,
    pub posts_subdir: PathBuf,
    pub pages_subdir: PathBuf,
    pub templates_root: PathBuf,
    pub output_root: PathBuf,

    pub post_path_template: String,
    pub page_path_template: String,
    pub index_path_template: String,
    pub archives_path_template: String,
    pub rss_path_template: String,
    pub json_feed_path_template: String,
    pub sitemap_path_template: String,
}

impl Paths {
    /// Joins the relative filesystem roots onto `base`; absolute roots are
    /// left alone.
    fn anchor(&mut self, base: &Path) {
        for root in [
            &mut self.content_root,
            &mut self.templates_root,
            &mut self.output_root,
        ] {
            if root.is_relative() {
                *root = base.join(&*root);
            }
        }
    }
}

impl Default for Paths {
    fn default() -> Paths {
        Paths {
            content_root: PathBuf::from("content"),
            posts_subdir: PathBuf::from("posts"),
            pages_subdir: PathBuf::from("pages"),
            templates_root: PathBuf::from("templates"),
            output_root: PathBuf::from("output"),
            post_path_template: String::from("posts/{date:%Y/%m}/{slug}.html"),
            page_path_template: String::from("{slug}.html"),
            index_path_template: String::from("page-{page_number}.html"),
            archives_path_template: String::from("archives/index.html"),
            rss_path_template: String::from("rss.xml"),
            json_feed_path_template: String::from("feed.json"),
            sitemap_path_template: String::from("sitemap.xml"),
        }
    }
}

/// The site's identity: title, base URL and description. The base URL is the
/// prefix every target URL is joined onto and should end with a slash.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Site {
    pub title: String,
    pub url: Url,
    pub description: String,
}

impl Default for Site {
    fn default() -> Site {
        Site {
            title: String::from("A stele site"),
            // Infallible: parsing a known-good literal.
            url: Url::parse("http://example.com/").expect("default site url"),
            description: String::new(),
        }
    }
}

/// How post dates in source headers are parsed and which timezone naive
/// dates are localized to.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Dates {
    /// A chrono format string applied to the `date` header value.
    pub format: String,

    /// IANA timezone name, e.g. `Europe/London`.
    pub timezone: Tz,
}

impl Default for Dates {
    fn default() -> Dates {
        Dates {
            format: String::from("%Y-%m-%d %H:%M"),
            timezone: Tz::UTC,
        }
    }
}

/// Pagination settings for index pages. The page size is non-zero by
/// construction: a `posts_per_page: 0` in the settings file is rejected at
/// deserialization.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexSettings {
    pub posts_per_page: NonZeroUsize,
}

impl Default for IndexSettings {
    fn default() -> IndexSettings {
        IndexSettings {
            // Infallible: a non-zero literal.
            posts_per_page: NonZeroUsize::new(10).expect("default page size"),
        }
    }
}

/// Feed settings. `extra` collects any further keys in the section; the JSON
/// feed writes them verbatim into its root object (`author`, `icon`,
/// `favicon` and so on).
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Feeds {
    pub number_of_posts: usize,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for Feeds {
    fn default() -> Feeds {
        Feeds {
            number_of_posts: 20,
            extra: BTreeMap::new(),
        }
    }
}

/// Which pulldown-cmark extensions the markdown converter enables.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownSettings {
    pub footnotes: bool,
    pub smart_punctuation: bool,
    pub strikethrough: bool,
    pub tables: bool,
    pub tasklists: bool,
}

impl Default for MarkdownSettings {
    fn default() -> MarkdownSettings {
        MarkdownSettings {
            footnotes: true,
            smart_punctuation: true,
            strikethrough: true,
            tables: true,
            tasklists: true,
        }
    }
}

/// Template file names, looked up in the directory the renderer was loaded
/// from. The JSON feed has no entry here: it writes JSON directly rather
/// than rendering a template.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Templates {
    pub post: String,
    pub page: String,
    pub index: String,
    pub archives: String,
    pub rss: String,
    pub sitemap: String,
}

impl Default for Templates {
    fn default() -> Templates {
        Templates {
            post: String::from("post.html"),
            page: String::from("page.html"),
            index: String::from("index.html"),
            archives: String::from("archives.html"),
            rss: String::from("rss.xml"),
            sitemap: String::from("sitemap.xml"),
        }
    }
}

/// Represents an error loading settings.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the project file cannot be opened.
    #[error("opening settings file `{path}`: {err}")]
    Open {
        path: PathBuf,
        err: std::io::Error,
    },

    /// Returned when no `stele.yaml` exists in the directory or any ancestor.
    #[error("could not find `stele.yaml` in any parent directory")]
    ProjectFileNotFound,

    /// Returned when the YAML fails to deserialize.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
