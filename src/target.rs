//! The output-target contract shared by everything that is written to one
//! output file: content pages, index pages, archives, feeds and the sitemap.
//!
//! A [`Target`] supplies its path template (a settings lookup) and the
//! variables that template may reference; the provided methods derive the
//! path part, output path and URL from those, memoizing each in a
//! [`TargetPaths`] cache. Each derived field is an explicit tri-state
//! [`Memo`]: unset, computed, or overridden, where a direct set always wins
//! over computation.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::DateTime;
use chrono_tz::Tz;
use gtmpl::Value;
use thiserror::Error;
use url::Url;

use crate::markdown::MarkdownRenderer;
use crate::settings::Settings;
use crate::templates::{self, Renderer};

/// A single memoized derived field: unset until first read, computed and
/// cached on that read, or overridden by a direct set (which always wins and
/// short-circuits computation).
#[derive(Clone, Debug, Default)]
pub enum Memo<T> {
    #[default]
    Unset,
    Computed(T),
    Overridden(T),
}

impl<T> Memo<T> {
    /// Returns the cached value, if any.
    pub fn get(&self) -> Option<&T> {
        match self {
            Memo::Unset => None,
            Memo::Computed(value) | Memo::Overridden(value) => Some(value),
        }
    }

    /// Caches a computed value. Does not displace an override.
    pub fn fill(&mut self, value: T) {
        if !matches!(self, Memo::Overridden(_)) {
            *self = Memo::Computed(value);
        }
    }

    /// Overrides the field directly. Future reads return this value without
    /// computing.
    pub fn set(&mut self, value: T) {
        *self = Memo::Overridden(value);
    }

    /// Returns the value only if it was set directly rather than computed.
    pub fn overridden(&self) -> Option<&T> {
        match self {
            Memo::Overridden(value) => Some(value),
            Memo::Unset | Memo::Computed(_) => None,
        }
    }
}

impl<T: PartialEq> PartialEq for Memo<T> {
    /// Two memos are equal when their cached values are; computed and
    /// overridden are not distinguished.
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

/// The memoized path-derivation cache every [`Target`] carries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetPaths {
    pub path_part: Memo<String>,
    pub output_path: Memo<PathBuf>,
    pub url: Memo<Url>,
}

impl TargetPaths {
    /// Whether the explicit overrides in two caches agree. Computed and
    /// unset fields are treated alike: both derive from the target's own
    /// attributes, so only a direct set can make two targets' paths differ.
    pub fn overrides_match(&self, other: &TargetPaths) -> bool {
        self.path_part.overridden() == other.path_part.overridden()
            && self.output_path.overridden() == other.output_path.overridden()
            && self.url.overridden() == other.url.overridden()
    }
}

/// The variables a target exposes to its path template. Targets leave the
/// fields they have no value for as `None`; referencing such a field in the
/// template is an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct PathVars<'a> {
    pub slug: Option<&'a str>,
    pub date: Option<&'a DateTime<Tz>>,
    pub page_number: Option<usize>,
}

/// Formats a path template against a set of variables. Templates reference
/// variables as `{slug}`, `{page_number}` or `{date:%Y/%m}` (the text after
/// the colon is a chrono format string).
pub fn fill_path_template(template: &str, vars: &PathVars) -> Result<String, Error> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| Error::UnclosedPlaceholder {
            template: template.to_owned(),
        })?;
        let placeholder = &after[..end];

        let (name, format) = match placeholder.split_once(':') {
            Some((name, format)) => (name, Some(format)),
            None => (placeholder, None),
        };
        match (name, format) {
            ("slug", None) => out.push_str(vars.slug.ok_or_else(|| Error::MissingVariable {
                name: "slug".to_owned(),
            })?),
            ("page_number", None) => {
                let n = vars.page_number.ok_or_else(|| Error::MissingVariable {
                    name: "page_number".to_owned(),
                })?;
                out.push_str(&n.to_string());
            }
            ("date", format) => {
                let date = vars.date.ok_or_else(|| Error::MissingVariable {
                    name: "date".to_owned(),
                })?;
                out.push_str(&date.format(format.unwrap_or("%Y-%m-%d")).to_string());
            }
            _ => {
                return Err(Error::UnknownPlaceholder {
                    name: placeholder.to_owned(),
                })
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Everything a target needs at render time: the settings, the template
/// renderer, the markdown converter, and extra context values merged into
/// every template render (`site`, `build_date`, `all_posts`, `all_pages`).
pub struct RenderContext<'a> {
    pub settings: &'a Settings,
    pub renderer: &'a dyn Renderer,
    pub markdown: &'a MarkdownRenderer,
    pub extra: HashMap<String, Value>,
}

/// Anything written to one output file. Implementations supply their path
/// template, the variables that template may use, their memo cache, and a
/// `write` that renders them to disk; the path-part/output-path/URL
/// derivations are provided.
pub trait Target {
    /// Fetches this target's path template from the settings.
    fn path_template<'s>(&self, settings: &'s Settings) -> &'s str;

    /// The variables this target's path template may reference.
    fn path_vars(&self) -> PathVars<'_>;

    /// The target's memoized derived-path cache.
    fn paths(&mut self) -> &mut TargetPaths;

    /// Renders this target and writes it to its output path, fully
    /// overwriting any existing file.
    fn write(&mut self, ctx: &RenderContext) -> Result<(), Error>;

    /// The path fragment shared by [`Target::output_path`] and
    /// [`Target::url`], e.g. `posts/2015/01/a-slug.html`.
    fn path_part(&mut self, settings: &Settings) -> Result<String, Error> {
        if let Some(part) = self.paths().path_part.get() {
            return Ok(part.clone());
        }
        let part = fill_path_template(self.path_template(settings), &self.path_vars())?;
        self.paths().path_part.fill(part.clone());
        Ok(part)
    }

    /// The path this target will be written to: the output root joined with
    /// the path part.
    fn output_path(&mut self, settings: &Settings) -> Result<PathBuf, Error> {
        if let Some(path) = self.paths().output_path.get() {
            return Ok(path.clone());
        }
        let path = settings.paths.output_root.join(self.path_part(settings)?);
        self.paths().output_path.fill(path.clone());
        Ok(path)
    }

    /// The URL this target will be served at: the site URL joined with the
    /// path part, with a trailing `index.html` trimmed for clean URLs.
    fn url(&mut self, settings: &Settings) -> Result<Url, Error> {
        if let Some(url) = self.paths().url.get() {
            return Ok(url.clone());
        }
        let part = self.path_part(settings)?;
        let joined = settings.site.url.join(&part)?;
        let url = match joined.as_str().strip_suffix("index.html") {
            Some(trimmed) => Url::parse(trimmed)?,
            None => joined,
        };
        self.paths().url.fill(url.clone());
        Ok(url)
    }
}

/// Renders a target through the template renderer and writes the result to
/// its output path, creating parent directories as needed. The context
/// object is the target's own value with the per-build extras merged in.
pub fn render_with_template(
    target: &mut dyn Target,
    template_name: &str,
    mut value: Value,
    ctx: &RenderContext,
) -> Result<(), Error> {
    if let Value::Object(object) = &mut value {
        for (key, extra) in &ctx.extra {
            object.insert(key.clone(), extra.clone());
        }
    }
    let rendered = ctx.renderer.render(template_name, value)?;
    let output_path = target.output_path(ctx.settings)?;
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output_path, rendered)?;
    Ok(())
}

/// Represents an error deriving a target's paths or writing it to disk.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a path template's `{` has no matching `}`.
    #[error("unclosed placeholder in path template `{template}`")]
    UnclosedPlaceholder { template: String },

    /// Returned when a path template references a name no target defines.
    #[error("unknown placeholder `{{{name}}}` in path template")]
    UnknownPlaceholder { name: String },

    /// Returned when a path template references a variable the target has no
    /// value for (e.g. `{date}` on a page).
    #[error("path template references `{{{name}}}` but the target defines no {name}")]
    MissingVariable { name: String },

    /// Returned when joining the path part onto the site URL fails.
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// Returned when template rendering fails.
    #[error(transparent)]
    Template(#[from] templates::Error),

    /// Returned when serializing the JSON feed fails.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Returned for I/O problems writing output files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
