//! The template-rendering collaborator and the two helpers every renderer
//! must offer its templates: RFC-822-style dates for RSS and rewriting
//! site-relative URLs to absolute ones.
//!
//! [`Renderer`] is the seam the rest of the crate talks to; the concrete
//! implementation is [`GtmplRenderer`], which loads every file in the
//! templates directory and renders by file name.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, TimeZone};
use gtmpl::{Context, Template, Value};
use regex::Regex;
use thiserror::Error;
use url::Url;

/// Renders a named template against a context value.
pub trait Renderer {
    fn render(&self, template_name: &str, context: Value) -> Result<String, Error>;
}

/// A [`Renderer`] backed by gtmpl templates loaded from a directory. Each
/// regular file in the directory becomes one template, keyed by its file
/// name.
pub struct GtmplRenderer {
    templates: HashMap<String, Template>,
}

impl GtmplRenderer {
    /// Loads and parses every regular file directly under `dir`.
    pub fn from_directory(dir: &Path) -> Result<GtmplRenderer, Error> {
        let mut templates = HashMap::new();
        for result in std::fs::read_dir(dir).map_err(|err| Error::Io {
            path: dir.to_owned(),
            err,
        })? {
            let entry = result.map_err(|err| Error::Io {
                path: dir.to_owned(),
                err,
            })?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();

            let mut contents = String::new();
            File::open(entry.path())
                .and_then(|mut file| file.read_to_string(&mut contents))
                .map_err(|err| Error::Io {
                    path: entry.path(),
                    err,
                })?;

            let mut template = Template::default();
            template.parse(&contents).map_err(|err| Error::Parse {
                name: name.clone(),
                err,
            })?;
            templates.insert(name, template);
        }
        Ok(GtmplRenderer { templates })
    }
}

impl Renderer for GtmplRenderer {
    fn render(&self, template_name: &str, context: Value) -> Result<String, Error> {
        let template = self
            .templates
            .get(template_name)
            .ok_or_else(|| Error::MissingTemplate(template_name.to_owned()))?;
        let context = Context::from(context).map_err(Error::Context)?;
        let mut buf = Vec::new();
        template.execute(&mut buf, &context).map_err(Error::Render)?;
        String::from_utf8(buf).map_err(|_| Error::Render(String::from("template output is not UTF-8")))
    }
}

/// Rewrites site-relative `href` and `src` attribute values (those beginning
/// with `/`) to absolute URLs under `base_url`. Values that are already
/// absolute, or relative without a leading slash, are left untouched.
pub fn absolute_urls(html: &str, base_url: &Url) -> String {
    static ATTR: OnceLock<Regex> = OnceLock::new();
    let attr = ATTR.get_or_init(|| {
        // Infallible: the pattern is a known-good literal.
        Regex::new(r#"(href|src)="(/[^"]*)""#).expect("attribute pattern")
    });

    let base = base_url.as_str().trim_end_matches('/');
    attr.replace_all(html, |captures: &regex::Captures| {
        format!(r#"{}="{}{}""#, &captures[1], base, &captures[2])
    })
    .into_owned()
}

/// Formats a date in the RFC-822 style RSS expects:
/// `Sat, 19 Sep 2015 14:53:07 +0100`. chrono's `%a`/`%b` names are always
/// English, which is what the format calls for regardless of locale.
pub fn rfc822_date<Tz>(date: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    date.format("%a, %d %b %Y %H:%M:%S %z").to_string()
}

/// Represents an error loading or rendering templates.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned for I/O problems reading template files.
    #[error("reading template `{path}`: {err}")]
    Io {
        path: PathBuf,
        err: std::io::Error,
    },

    /// Returned when a template file fails to parse.
    #[error("parsing template `{name}`: {err}")]
    Parse { name: String, err: String },

    /// Returned when a render names a template that was never loaded.
    #[error("no such template: `{0}`")]
    MissingTemplate(String),

    /// Returned when a context value cannot back a template context.
    #[error("building template context: {0}")]
    Context(String),

    /// Returned when template execution fails.
    #[error("rendering template: {0}")]
    Render(String),
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_absolute_urls_href() {
        let base = Url::parse("http://example.com").unwrap();
        assert_eq!(
            absolute_urls(r#"<a href="/x">"#, &base),
            r#"<a href="http://example.com/x">"#
        );
    }

    #[test]
    fn test_absolute_urls_src() {
        let base = Url::parse("http://example.com/").unwrap();
        assert_eq!(
            absolute_urls(r#"<img src="/images/a.jpg">"#, &base),
            r#"<img src="http://example.com/images/a.jpg">"#
        );
    }

    #[test]
    fn test_absolute_urls_leaves_other_urls_alone() {
        let base = Url::parse("http://example.com").unwrap();
        for html in [
            r#"<a href="relative.html">"#,
            r#"<a href="https://elsewhere.org/x">"#,
            r#"<p>no attributes at all</p>"#,
        ] {
            assert_eq!(absolute_urls(html, &base), html);
        }
    }

    #[test]
    fn test_absolute_urls_rewrites_multiple_attributes() {
        let base = Url::parse("http://example.com").unwrap();
        assert_eq!(
            absolute_urls(r#"<a href="/a"><img src="/b"></a>"#, &base),
            r#"<a href="http://example.com/a"><img src="http://example.com/b"></a>"#
        );
    }

    #[test]
    fn test_rfc822_date() {
        use chrono::FixedOffset;
        let offset = FixedOffset::east_opt(3600).unwrap();
        let date = offset.with_ymd_and_hms(2015, 9, 19, 14, 53, 7).unwrap();
        assert_eq!(rfc822_date(&date), "Sat, 19 Sep 2015 14:53:07 +0100");
    }

    #[test]
    fn test_gtmpl_renderer_renders_by_file_name() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut file = File::create(dir.path().join("greeting.html"))?;
        write!(file, "Hello, {{{{.name}}}}!")?;

        let renderer = GtmplRenderer::from_directory(dir.path())?;
        let mut object: HashMap<String, Value> = HashMap::new();
        object.insert("name".to_owned(), Value::String("world".to_owned()));
        let rendered = renderer.render("greeting.html", Value::Object(object))?;
        assert_eq!(rendered, "Hello, world!");
        Ok(())
    }

    #[test]
    fn test_gtmpl_renderer_missing_template() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let renderer = GtmplRenderer::from_directory(dir.path())?;
        assert!(matches!(
            renderer.render("nope.html", Value::Nil),
            Err(Error::MissingTemplate(_))
        ));
        Ok(())
    }
}
