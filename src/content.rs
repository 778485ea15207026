//! The content model: a [`Content`] is one source document, and [`Page`] and
//! [`Post`] are its two concrete kinds. Content knows how to parse itself
//! from a source file (a simple `key: value` header, a blank line, then a
//! markdown body), derive a slug from its title, convert its body to HTML,
//! and decide whether it is newer than its rendered output ([`Content::is_new_at`]).
//!
//! A source is a draft — and refuses to construct — when its header contains
//! a bare `draft` line or, for posts, when its date is in the future.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use gtmpl::Value;
use log::debug;
use thiserror::Error;

use crate::markdown::MarkdownRenderer;
use crate::settings::Settings;
use crate::slug;
use crate::target::{
    self, render_with_template, Memo, PathVars, RenderContext, Target, TargetPaths,
};
use crate::templates::rfc822_date;

/// One source document: the fields shared by pages and posts.
///
/// Immutable in practice after construction, aside from the lazily memoized
/// derived fields (HTML, paths, staleness) and their explicit overrides.
#[derive(Clone, Debug)]
pub struct Content {
    pub title: String,
    pub body: String,
    pub slug: String,
    pub source_path: Option<PathBuf>,

    /// When the source was last modified, as a naive local timestamp; only
    /// used for same-machine mtime comparisons.
    pub modification_date: Option<NaiveDateTime>,

    /// Header fields that don't map to a typed field, kept verbatim.
    pub meta: BTreeMap<String, String>,

    pub(crate) paths: TargetPaths,
    html: Memo<String>,
    is_new: Memo<bool>,
}

/// The optional arguments to [`Content::new`]; the untyped remainder of a
/// parsed header lands in `meta`.
#[derive(Clone, Debug, Default)]
pub struct ContentInit {
    pub slug: Option<String>,
    pub source_path: Option<PathBuf>,

    /// Overrides the computed path part (and with it the output path and
    /// URL) directly.
    pub save_as: Option<String>,

    pub modification_date: Option<NaiveDateTime>,
    pub meta: BTreeMap<String, String>,
}

impl Content {
    /// Constructs a [`Content`] from a title, body and the optional fields.
    ///
    /// A missing slug is derived from the title; a given-but-invalid slug is
    /// normalised. A missing modification date is taken from the source
    /// file's mtime when a source path is given.
    pub fn new(title: &str, body: &str, init: ContentInit) -> Result<Content, Error> {
        let slug = match init.slug {
            None => slug::normalise(title)?,
            Some(given) => {
                if slug::validate(&given) {
                    given
                } else {
                    slug::normalise(&given)?
                }
            }
        };

        let mut paths = TargetPaths::default();
        if let Some(save_as) = init.save_as {
            paths.path_part.set(save_as);
        }

        let modification_date = match (init.modification_date, &init.source_path) {
            (Some(date), _) => Some(date),
            (None, Some(source)) => Some(file_modification_date(source)?),
            (None, None) => None,
        };

        Ok(Content {
            title: title.to_owned(),
            body: body.to_owned(),
            slug,
            source_path: init.source_path,
            modification_date,
            meta: init.meta,
            paths,
            html: Memo::Unset,
            is_new: Memo::Unset,
        })
    }

    /// Converts the body to HTML through the given converter, memoizing the
    /// result per instance.
    pub fn html(&mut self, markdown: &MarkdownRenderer) -> &str {
        if self.html.get().is_none() {
            let rendered = markdown.convert(&self.body);
            self.html.fill(rendered);
        }
        self.html.get().map(String::as_str).unwrap_or_default()
    }

    /// The memoized HTML, if it has been rendered.
    pub fn cached_html(&self) -> Option<&str> {
        self.html.get().map(String::as_str)
    }

    /// Whether the source is newer than the output file at `output_path`.
    ///
    /// True when no output file exists; otherwise the source's modification
    /// date is compared against the output file's on-disk mtime. Fails with
    /// [`Error::ModificationDate`] when the output exists but no
    /// modification date is known (programmatic construction with neither a
    /// source path nor an explicit date).
    pub fn is_new_at(&mut self, output_path: &Path) -> Result<bool, Error> {
        if let Some(cached) = self.is_new.get() {
            return Ok(*cached);
        }
        if !output_path.exists() {
            return Ok(true);
        }
        let modification_date = self.modification_date.ok_or(Error::ModificationDate)?;
        let output_date = file_modification_date(output_path)?;
        let is_new = modification_date > output_date;
        self.is_new.fill(is_new);
        Ok(is_new)
    }

    /// Overrides the staleness check directly.
    pub fn set_is_new(&mut self, value: bool) {
        self.is_new.set(value);
    }

    /// Case-insensitive (title, slug) ordering key.
    fn order_key(&self) -> (String, String) {
        (self.title.to_lowercase(), self.slug.to_lowercase())
    }

    /// Compares by case-insensitive title, then case-insensitive slug.
    pub fn cmp_order(&self, other: &Content) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }

    /// The shared template context fields: title, slug, body HTML and meta.
    fn base_value(&mut self, ctx: &RenderContext) -> Value {
        let mut object: std::collections::HashMap<String, Value> = std::collections::HashMap::new();
        object.insert("title".to_owned(), Value::String(self.title.clone()));
        object.insert("slug".to_owned(), Value::String(self.slug.clone()));
        object.insert(
            "html".to_owned(),
            Value::String(self.html(ctx.markdown).to_owned()),
        );
        object.insert(
            "meta".to_owned(),
            Value::Map(
                self.meta
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        );
        Value::Object(object)
    }
}

impl PartialEq for Content {
    /// Compares the content attributes: title, slug, body, source path,
    /// meta, and any explicit path overrides (`save_as` or a direct set).
    /// Lazily computed caches don't participate: paths derived from the
    /// compared attributes, the memoized HTML and the staleness check are
    /// all ignored, so merely reading a derived field never changes
    /// equality.
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
            && self.slug == other.slug
            && self.body == other.body
            && self.source_path == other.source_path
            && self.meta == other.meta
            && self.paths.overrides_match(&other.paths)
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source_path {
            Some(path) => write!(f, "{}: {}", self.title, path.display()),
            None => write!(f, "{}: no source path", self.title),
        }
    }
}

/// A static page.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub content: Content,
}

impl Page {
    pub fn new(title: &str, body: &str, init: ContentInit) -> Result<Page, Error> {
        Ok(Page {
            content: Content::new(title, body, init)?,
        })
    }

    /// Parses a page from a source file. See [`split_source`] for the file
    /// format.
    pub fn from_file(path: &Path, _settings: &Settings) -> Result<Page, Error> {
        let text = read_source(path)?;
        let (mut meta, body) = split_source(&text)?;
        let title = meta.remove("title").ok_or(Error::MissingField("title"))?;
        let init = ContentInit {
            slug: meta.remove("slug"),
            save_as: meta.remove("save_as"),
            source_path: Some(path.to_owned()),
            modification_date: None,
            meta,
        };
        debug!("parsed page `{}` from {}", title, path.display());
        Page::new(&title, body, init)
    }

    pub fn is_new(&mut self, settings: &Settings) -> Result<bool, Error> {
        let output_path = self.output_path(settings)?;
        self.content.is_new_at(&output_path)
    }

    pub fn cmp_order(&self, other: &Page) -> Ordering {
        self.content.cmp_order(&other.content)
    }

    /// The page's template context: the shared content fields plus its URL.
    pub fn value(&mut self, ctx: &RenderContext) -> Result<Value, target::Error> {
        let url = self.url(ctx.settings)?;
        let mut value = self.content.base_value(ctx);
        if let Value::Object(object) = &mut value {
            object.insert("url".to_owned(), Value::String(url.to_string()));
        }
        Ok(value)
    }
}

impl Target for Page {
    fn path_template<'s>(&self, settings: &'s Settings) -> &'s str {
        &settings.paths.page_path_template
    }

    fn path_vars(&self) -> PathVars<'_> {
        PathVars {
            slug: Some(&self.content.slug),
            ..PathVars::default()
        }
    }

    fn paths(&mut self) -> &mut TargetPaths {
        &mut self.content.paths
    }

    fn write(&mut self, ctx: &RenderContext) -> Result<(), target::Error> {
        let value = self.value(ctx)?;
        let template = ctx.settings.templates.page.clone();
        render_with_template(self, &template, value, ctx)
    }
}

/// A dated blog post. Construction fails with a draft error when the date is
/// in the future.
#[derive(Clone, Debug)]
pub struct Post {
    pub content: Content,
    pub date: DateTime<Tz>,
}

/// The date argument to [`Post::new`]: either text to be parsed with the
/// configured format, a naive timestamp to be localized to the configured
/// timezone, or an already-aware timestamp.
#[derive(Clone, Debug)]
pub enum PostDate {
    Text(String),
    Naive(NaiveDateTime),
    Aware(DateTime<Tz>),
}

impl From<&str> for PostDate {
    fn from(text: &str) -> PostDate {
        PostDate::Text(text.to_owned())
    }
}

impl From<NaiveDateTime> for PostDate {
    fn from(date: NaiveDateTime) -> PostDate {
        PostDate::Naive(date)
    }
}

impl From<DateTime<Tz>> for PostDate {
    fn from(date: DateTime<Tz>) -> PostDate {
        PostDate::Aware(date)
    }
}

impl Post {
    /// Constructs a [`Post`]. Text dates are parsed with `dates.format` and
    /// localized to `dates.timezone`; a date after the current moment is a
    /// draft and fails construction.
    pub fn new(
        title: &str,
        body: &str,
        date: impl Into<PostDate>,
        settings: &Settings,
        init: ContentInit,
    ) -> Result<Post, Error> {
        let date = resolve_date(date.into(), settings)?;
        if date.with_timezone(&Utc) > Utc::now() {
            return Err(Error::Draft(DraftReason::FutureDate));
        }
        Ok(Post {
            content: Content::new(title, body, init)?,
            date,
        })
    }

    /// Parses a post from a source file. The header must carry `title` and
    /// `date` fields.
    pub fn from_file(path: &Path, settings: &Settings) -> Result<Post, Error> {
        let text = read_source(path)?;
        let (mut meta, body) = split_source(&text)?;
        let title = meta.remove("title").ok_or(Error::MissingField("title"))?;
        let date = meta.remove("date").ok_or(Error::MissingField("date"))?;
        let init = ContentInit {
            slug: meta.remove("slug"),
            save_as: meta.remove("save_as"),
            source_path: Some(path.to_owned()),
            modification_date: None,
            meta,
        };
        debug!("parsed post `{}` from {}", title, path.display());
        Post::new(&title, body, PostDate::Text(date), settings, init)
    }

    pub fn is_new(&mut self, settings: &Settings) -> Result<bool, Error> {
        let output_path = self.output_path(settings)?;
        self.content.is_new_at(&output_path)
    }

    /// Compares by date, falling back to the content ordering for equal
    /// dates.
    pub fn cmp_order(&self, other: &Post) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.content.cmp_order(&other.content))
    }

    /// The post's template context: the shared content fields plus its URL
    /// and date (ISO-8601 and RFC-822 renderings).
    pub fn value(&mut self, ctx: &RenderContext) -> Result<Value, target::Error> {
        let url = self.url(ctx.settings)?;
        let mut value = self.content.base_value(ctx);
        if let Value::Object(object) = &mut value {
            object.insert("url".to_owned(), Value::String(url.to_string()));
            object.insert(
                "date".to_owned(),
                Value::String(
                    self.date
                        .to_rfc3339_opts(chrono::SecondsFormat::Secs, false),
                ),
            );
            object.insert(
                "date_rfc822".to_owned(),
                Value::String(rfc822_date(&self.date)),
            );
        }
        Ok(value)
    }
}

impl PartialEq for Post {
    /// Posts additionally require equal dates.
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date && self.content == other.content
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.content)
    }
}

impl Target for Post {
    fn path_template<'s>(&self, settings: &'s Settings) -> &'s str {
        &settings.paths.post_path_template
    }

    fn path_vars(&self) -> PathVars<'_> {
        PathVars {
            slug: Some(&self.content.slug),
            date: Some(&self.date),
            ..PathVars::default()
        }
    }

    fn paths(&mut self) -> &mut TargetPaths {
        &mut self.content.paths
    }

    fn write(&mut self, ctx: &RenderContext) -> Result<(), target::Error> {
        let value = self.value(ctx)?;
        let template = ctx.settings.templates.post.clone();
        render_with_template(self, &template, value, ctx)
    }
}

/// Splits a source file into its header map and body.
///
/// The header ends at the first blank line. Each header line is split once
/// on the first colon; keys are lowercased and trimmed, values trimmed.
/// Later duplicates of a key win. The body only has leading and trailing
/// newlines stripped. A header line that is exactly `draft` (no colon)
/// marks the source as a draft.
pub(crate) fn split_source(text: &str) -> Result<(BTreeMap<String, String>, &str), Error> {
    let (header, body) = text.split_once("\n\n").ok_or_else(|| {
        Error::Header(String::from("no blank line separating header from body"))
    })?;
    let body = body.trim_matches('\n');

    let mut meta = BTreeMap::new();
    for line in header.lines() {
        match line.split_once(':') {
            Some((key, value)) => {
                meta.insert(key.trim().to_lowercase(), value.trim().to_owned());
            }
            None => {
                if line.trim().to_lowercase() == "draft" {
                    return Err(Error::Draft(DraftReason::Marker));
                }
                return Err(Error::Header(format!("header line without colon: {line:?}")));
            }
        }
    }
    Ok((meta, body))
}

fn read_source(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })
}

/// A file's mtime as a naive local timestamp.
fn file_modification_date(path: &Path) -> Result<NaiveDateTime, Error> {
    let modified = std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|err| Error::Io {
            path: path.to_owned(),
            err,
        })?;
    let local: DateTime<Local> = modified.into();
    Ok(local.naive_local())
}

fn resolve_date(date: PostDate, settings: &Settings) -> Result<DateTime<Tz>, Error> {
    let naive = match date {
        PostDate::Aware(aware) => return Ok(aware),
        PostDate::Naive(naive) => naive,
        PostDate::Text(text) => parse_date_text(&text, &settings.dates.format)?,
    };
    settings
        .dates
        .timezone
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| Error::LocalDate(naive.to_string()))
}

/// Parses date text with the configured format. A format without
/// time-of-day fields parses as midnight.
fn parse_date_text(text: &str, format: &str) -> Result<NaiveDateTime, Error> {
    NaiveDateTime::parse_from_str(text, format)
        .or_else(|_| {
            NaiveDate::parse_from_str(text, format)
                .map(|date| date.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|err| Error::DateParse {
            text: text.to_owned(),
            format: format.to_owned(),
            err,
        })
}

/// Why a source was rejected as a draft.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftReason {
    /// `draft` appeared on a line by itself in the metadata header.
    Marker,

    /// The post's date is after the current moment.
    FutureDate,
}

impl fmt::Display for DraftReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DraftReason::Marker => write!(f, "marked draft in metadata header"),
            DraftReason::FutureDate => write!(f, "date is in the future"),
        }
    }
}

/// Represents an error constructing or parsing content.
#[derive(Debug, Error)]
pub enum Error {
    /// The source is a draft; the file is skipped, not failed, during a
    /// build.
    #[error("{0}")]
    Draft(DraftReason),

    /// `is_new` was queried with no known modification date while the
    /// output file exists.
    #[error("modification date is unknown but the output file exists")]
    ModificationDate,

    /// The source header is malformed.
    #[error("parsing source header: {0}")]
    Header(String),

    /// A required header field is absent.
    #[error("missing required header field `{0}`")]
    MissingField(&'static str),

    /// A date header value does not match the configured format.
    #[error("parsing date `{text}` with format `{format}`: {err}")]
    DateParse {
        text: String,
        format: String,
        err: chrono::ParseError,
    },

    /// A naive date does not exist in the configured timezone.
    #[error("date `{0}` is invalid in the configured timezone")]
    LocalDate(String),

    /// Slug normalisation failed.
    #[error(transparent)]
    Slug(#[from] slug::Error),

    /// Deriving the output path failed.
    #[error(transparent)]
    Target(#[from] target::Error),

    /// Reading a source file failed.
    #[error("reading `{path}`: {err}")]
    Io {
        path: PathBuf,
        err: std::io::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use std::io::Write;

    fn settings() -> Settings {
        Settings::default()
    }

    fn post(title: &str, day: u32) -> Post {
        Post::new(
            title,
            "body",
            PostDate::Aware(Tz::UTC.with_ymd_and_hms(2015, 1, day, 12, 0, 0).unwrap()),
            &settings(),
            ContentInit::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_slug_derived_from_title() -> Result<(), Error> {
        let content = Content::new("Hello, World!", "body", ContentInit::default())?;
        assert_eq!(content.slug, "hello-world");
        assert!(content.slug.chars().all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-')));
        Ok(())
    }

    #[test]
    fn test_invalid_slug_is_normalised() -> Result<(), Error> {
        let content = Content::new(
            "Title",
            "body",
            ContentInit {
                slug: Some(String::from("Bad Slug!")),
                ..ContentInit::default()
            },
        )?;
        assert_eq!(content.slug, "bad-slug");
        Ok(())
    }

    #[test]
    fn test_valid_slug_kept_verbatim() -> Result<(), Error> {
        let content = Content::new(
            "Title",
            "body",
            ContentInit {
                slug: Some(String::from("Kept_As.Is~")),
                ..ContentInit::default()
            },
        )?;
        assert_eq!(content.slug, "Kept_As.Is~");
        Ok(())
    }

    #[test]
    fn test_save_as_overrides_path_part() -> Result<(), Error> {
        let mut page = Page::new(
            "About",
            "body",
            ContentInit {
                save_as: Some(String::from("special/about.html")),
                ..ContentInit::default()
            },
        )?;
        assert_eq!(page.path_part(&settings())?, "special/about.html");
        Ok(())
    }

    #[test]
    fn test_unknown_header_keys_go_to_meta() -> Result<(), Error> {
        let (meta, body) = split_source("title: T\ncustom: value\nanother: x: y\n\nBody\n")?;
        assert_eq!(meta["custom"], "value");
        // Split happens at the first colon only.
        assert_eq!(meta["another"], "x: y");
        assert_eq!(body, "Body");
        Ok(())
    }

    #[test]
    fn test_split_source_draft_marker() {
        for text in ["draft\n\nBody", "title: T\ndraft\n\nBody", "Draft \n\nBody"] {
            assert!(matches!(
                split_source(text),
                Err(Error::Draft(DraftReason::Marker))
            ));
        }
    }

    #[test]
    fn test_split_source_requires_blank_line() {
        assert!(matches!(
            split_source("title: T\nbody with no separator"),
            Err(Error::Header(_))
        ));
    }

    #[test]
    fn test_parse_file_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("post.md");
        let mut file = fs::File::create(&path)?;
        write!(
            file,
            "title: A Round Trip\ndate: 2015-01-01 09:30\nslug: round-trip\nseries: testing\n\nThe body.\n"
        )?;

        let post = Post::from_file(&path, &settings())?;
        assert_eq!(post.content.title, "A Round Trip");
        assert_eq!(post.content.slug, "round-trip");
        assert_eq!(post.content.body, "The body.");
        assert_eq!(post.content.meta["series"], "testing");
        assert_eq!(
            post.date,
            Tz::UTC.with_ymd_and_hms(2015, 1, 1, 9, 30, 0).unwrap()
        );
        assert!(post.content.modification_date.is_some());
        Ok(())
    }

    #[test]
    fn test_future_dated_post_is_a_draft() {
        let future = Utc::now().with_timezone(&Tz::UTC) + chrono::Duration::days(2);
        let result = Post::new(
            "From The Future",
            "body",
            PostDate::Aware(future),
            &settings(),
            ContentInit::default(),
        );
        assert!(matches!(
            result,
            Err(Error::Draft(DraftReason::FutureDate))
        ));
    }

    #[test]
    fn test_date_only_format_parses_at_midnight() -> Result<(), Error> {
        let mut s = settings();
        s.dates.format = String::from("%Y-%m-%d");
        let post = Post::new(
            "Dated",
            "body",
            PostDate::Text(String::from("2015-06-01")),
            &s,
            ContentInit::default(),
        )?;
        assert_eq!(
            post.date,
            Tz::UTC.with_ymd_and_hms(2015, 6, 1, 0, 0, 0).unwrap()
        );
        Ok(())
    }

    #[test]
    fn test_naive_date_is_localized() -> Result<(), Error> {
        let mut s = settings();
        s.dates.timezone = chrono_tz::Europe::London;
        let naive = NaiveDate::from_ymd_opt(2015, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let post = Post::new("Localized", "body", naive, &s, ContentInit::default())?;
        // June in London is BST, one hour ahead of UTC.
        assert_eq!(post.date.with_timezone(&Utc).to_rfc3339(), "2015-06-01T11:00:00+00:00");
        Ok(())
    }

    #[test]
    fn test_content_ordering_title_then_slug() -> Result<(), Error> {
        let a = Content::new("Alpha", "body", ContentInit::default())?;
        let b = Content::new("beta", "body", ContentInit::default())?;
        assert_eq!(a.cmp_order(&b), Ordering::Less);

        let c1 = Content::new(
            "Same",
            "body",
            ContentInit {
                slug: Some(String::from("aa")),
                ..ContentInit::default()
            },
        )?;
        let c2 = Content::new(
            "same",
            "body",
            ContentInit {
                slug: Some(String::from("bb")),
                ..ContentInit::default()
            },
        )?;
        assert_eq!(c1.cmp_order(&c2), Ordering::Less);
        Ok(())
    }

    #[test]
    fn test_post_ordering_date_first() {
        let older = post("Zebra", 1);
        let newer = post("Aardvark", 2);
        assert_eq!(older.cmp_order(&newer), Ordering::Less);

        // Same date falls back to title.
        let a = post("Aardvark", 3);
        let z = post("Zebra", 3);
        assert_eq!(a.cmp_order(&z), Ordering::Less);
    }

    #[test]
    fn test_is_new_without_output_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut s = settings();
        s.paths.output_root = dir.path().join("out");
        let mut page = Page::new("About", "body", ContentInit::default())?;
        assert!(page.is_new(&s)?);
        Ok(())
    }

    #[test]
    fn test_is_new_compares_mtimes() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut s = settings();
        s.paths.output_root = dir.path().to_owned();
        fs::write(dir.path().join("about.html"), "old output")?;

        let newer = Local::now().naive_local() + chrono::Duration::hours(1);
        let mut page = Page::new(
            "About",
            "body",
            ContentInit {
                modification_date: Some(newer),
                ..ContentInit::default()
            },
        )?;
        assert!(page.is_new(&s)?);

        let older = Local::now().naive_local() - chrono::Duration::hours(1);
        let mut stale = Page::new(
            "About",
            "body",
            ContentInit {
                modification_date: Some(older),
                ..ContentInit::default()
            },
        )?;
        assert!(!stale.is_new(&s)?);
        Ok(())
    }

    #[test]
    fn test_is_new_without_modification_date_errors() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut s = settings();
        s.paths.output_root = dir.path().to_owned();
        fs::write(dir.path().join("about.html"), "output")?;

        let mut page = Page::new("About", "body", ContentInit::default())?;
        assert!(matches!(page.is_new(&s), Err(Error::ModificationDate)));
        Ok(())
    }

    #[test]
    fn test_is_new_override_wins() -> Result<(), Error> {
        let mut page = Page::new("About", "body", ContentInit::default())?;
        page.content.set_is_new(false);
        assert!(!page.is_new(&settings())?);
        Ok(())
    }

    #[test]
    fn test_html_is_memoized() -> Result<(), Error> {
        let markdown = MarkdownRenderer::new(&settings().markdown);
        let mut content = Content::new("T", "*emphasis*", ContentInit::default())?;
        assert!(content.cached_html().is_none());
        let first = content.html(&markdown).to_owned();
        assert!(first.contains("<em>"));
        assert_eq!(content.cached_html(), Some(first.as_str()));
        Ok(())
    }

    #[test]
    fn test_equality() -> Result<(), Error> {
        let a = Content::new("Title", "body", ContentInit::default())?;
        let b = Content::new("Title", "body", ContentInit::default())?;
        assert_eq!(a, b);

        let c = Content::new("Title", "different body", ContentInit::default())?;
        assert_ne!(a, c);

        let p1 = post("Title", 1);
        let p2 = post("Title", 2);
        assert_ne!(p1, p2);
        Ok(())
    }

    #[test]
    fn test_equality_survives_derived_path_access() -> Result<(), Error> {
        let s = settings();
        let mut a = Page::new("About", "body", ContentInit::default())?;
        let b = Page::new("About", "body", ContentInit::default())?;

        // Reading the derived paths fills a's caches; b stays unset.
        a.path_part(&s)?;
        a.url(&s)?;
        assert_eq!(a, b);

        // An explicit override is a real difference.
        let overridden = Page::new(
            "About",
            "body",
            ContentInit {
                save_as: Some(String::from("elsewhere.html")),
                ..ContentInit::default()
            },
        )?;
        assert_ne!(b, overridden);
        Ok(())
    }

    #[test]
    fn test_missing_title_errors() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("page.md");
        fs::write(&path, "custom: value\n\nBody\n")?;
        assert!(matches!(
            Page::from_file(&path, &settings()),
            Err(Error::MissingField("title"))
        ));
        Ok(())
    }
}
