//! The post collections: every output file built from a set of posts rather
//! than a single source document. [`Index`] paginates the front page,
//! [`Archives`] lists everything on one page, [`RssFeed`] and [`JsonFeed`]
//! carry the most recent posts, and [`Sitemap`] lists the URL and last
//! modification time of every rendered target.

use std::collections::HashMap;
use std::fs;

use chrono::{DateTime, SecondsFormat, Utc};
use gtmpl::Value;
use serde_json::json;
use url::Url;

use crate::content::Post;
use crate::settings::Settings;
use crate::target::{
    self, render_with_template, PathVars, RenderContext, Target, TargetPaths,
};
use crate::templates::absolute_urls;

/// Sorts posts newest-first. Equal dates keep the content ordering, and the
/// sort is stable past that.
pub(crate) fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.cmp_order(a));
}

/// An ordered, read-only collection of posts, newest first.
#[derive(Clone, Debug, PartialEq)]
pub struct PostsCollection {
    posts: Vec<Post>,
}

impl PostsCollection {
    pub fn new(mut posts: Vec<Post>, _settings: &Settings) -> PostsCollection {
        sort_newest_first(&mut posts);
        PostsCollection { posts }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Post> {
        self.posts.iter()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

impl<'a> IntoIterator for &'a PostsCollection {
    type Item = &'a Post;
    type IntoIter = std::slice::Iter<'a, Post>;

    fn into_iter(self) -> Self::IntoIter {
        self.posts.iter()
    }
}

/// One page of the paginated front index. Page 1 is the site front page:
/// its path part is forced to `index.html` so its URL is the site root.
#[derive(Clone, Debug)]
pub struct Index {
    pub page_number: usize,
    pub posts: Vec<Post>,
    pub newer_index_url: Option<Url>,
    pub older_index_url: Option<Url>,
    paths: TargetPaths,
}

impl Index {
    pub fn new(page_number: usize, mut posts: Vec<Post>, _settings: &Settings) -> Index {
        sort_newest_first(&mut posts);
        let mut paths = TargetPaths::default();
        if page_number == 1 {
            paths.path_part.set(String::from("index.html"));
        }
        Index {
            page_number,
            posts,
            newer_index_url: None,
            older_index_url: None,
            paths,
        }
    }

    /// Splits posts into front-page indexes of `index.posts_per_page` posts
    /// each, newest first, numbered from 1. Only the last page may be short,
    /// and zero posts produce zero pages. Adjacent pages are linked through
    /// `newer_index_url` and `older_index_url`; the first page has no newer
    /// neighbor and the last no older one.
    pub fn paginate(
        mut posts: Vec<Post>,
        settings: &Settings,
    ) -> Result<Vec<Index>, target::Error> {
        sort_newest_first(&mut posts);
        let mut indexes: Vec<Index> = posts
            .chunks(settings.index.posts_per_page.get())
            .enumerate()
            .map(|(i, chunk)| Index::new(i + 1, chunk.to_vec(), settings))
            .collect();

        let urls = indexes
            .iter_mut()
            .map(|index| index.url(settings))
            .collect::<Result<Vec<_>, _>>()?;
        for i in 0..indexes.len() {
            if i > 0 {
                indexes[i].newer_index_url = Some(urls[i - 1].clone());
            }
            if i + 1 < indexes.len() {
                indexes[i].older_index_url = Some(urls[i + 1].clone());
            }
        }
        Ok(indexes)
    }

    fn value(&mut self, ctx: &RenderContext) -> Result<Value, target::Error> {
        let mut object: HashMap<String, Value> = HashMap::new();
        object.insert(
            "page_number".to_owned(),
            Value::from(self.page_number as u64),
        );
        object.insert(
            "newer_index_url".to_owned(),
            optional_url(&self.newer_index_url),
        );
        object.insert(
            "older_index_url".to_owned(),
            optional_url(&self.older_index_url),
        );
        object.insert("posts".to_owned(), post_values(&mut self.posts, ctx)?);
        Ok(Value::Object(object))
    }
}

impl Target for Index {
    fn path_template<'s>(&self, settings: &'s Settings) -> &'s str {
        &settings.paths.index_path_template
    }

    fn path_vars(&self) -> PathVars<'_> {
        PathVars {
            page_number: Some(self.page_number),
            ..PathVars::default()
        }
    }

    fn paths(&mut self) -> &mut TargetPaths {
        &mut self.paths
    }

    fn write(&mut self, ctx: &RenderContext) -> Result<(), target::Error> {
        let value = self.value(ctx)?;
        let template = ctx.settings.templates.index.clone();
        render_with_template(self, &template, value, ctx)
    }
}

/// The single-page archive of every post, newest first.
#[derive(Clone, Debug)]
pub struct Archives {
    pub posts: Vec<Post>,
    paths: TargetPaths,
}

impl Archives {
    pub fn new(mut posts: Vec<Post>, _settings: &Settings) -> Archives {
        sort_newest_first(&mut posts);
        Archives {
            posts,
            paths: TargetPaths::default(),
        }
    }
}

impl Target for Archives {
    fn path_template<'s>(&self, settings: &'s Settings) -> &'s str {
        &settings.paths.archives_path_template
    }

    fn path_vars(&self) -> PathVars<'_> {
        PathVars::default()
    }

    fn paths(&mut self) -> &mut TargetPaths {
        &mut self.paths
    }

    fn write(&mut self, ctx: &RenderContext) -> Result<(), target::Error> {
        let mut object: HashMap<String, Value> = HashMap::new();
        object.insert("posts".to_owned(), post_values(&mut self.posts, ctx)?);
        let template = ctx.settings.templates.archives.clone();
        render_with_template(self, &template, Value::Object(object), ctx)
    }
}

/// Sorts newest-first and keeps only the `feeds.number_of_posts` most
/// recent.
fn most_recent(mut posts: Vec<Post>, settings: &Settings) -> Vec<Post> {
    sort_newest_first(&mut posts);
    posts.truncate(settings.feeds.number_of_posts);
    posts
}

/// The RSS feed, rendered through the site's RSS template. Each post's
/// context carries a precomputed RFC-822 `date_rfc822` field for the
/// `pubDate` element.
#[derive(Clone, Debug)]
pub struct RssFeed {
    pub posts: Vec<Post>,
    paths: TargetPaths,
}

impl RssFeed {
    pub fn new(posts: Vec<Post>, settings: &Settings) -> RssFeed {
        RssFeed {
            posts: most_recent(posts, settings),
            paths: TargetPaths::default(),
        }
    }
}

impl Target for RssFeed {
    fn path_template<'s>(&self, settings: &'s Settings) -> &'s str {
        &settings.paths.rss_path_template
    }

    fn path_vars(&self) -> PathVars<'_> {
        PathVars::default()
    }

    fn paths(&mut self) -> &mut TargetPaths {
        &mut self.paths
    }

    fn write(&mut self, ctx: &RenderContext) -> Result<(), target::Error> {
        let url = self.url(ctx.settings)?;
        let mut object: HashMap<String, Value> = HashMap::new();
        object.insert("url".to_owned(), Value::String(url.to_string()));
        object.insert("posts".to_owned(), post_values(&mut self.posts, ctx)?);
        let template = ctx.settings.templates.rss.clone();
        render_with_template(self, &template, Value::Object(object), ctx)
    }
}

/// The [JSON Feed](https://jsonfeed.org) rendition of the recent posts.
///
/// Unlike every other target this one bypasses the template renderer and
/// serializes a fixed structure straight to disk as pretty-printed JSON.
/// Any extra keys under the `feeds` settings section (`author`, `icon`,
/// and so on) are copied verbatim into the feed's top-level object.
#[derive(Clone, Debug)]
pub struct JsonFeed {
    pub posts: Vec<Post>,
    paths: TargetPaths,
}

impl JsonFeed {
    pub fn new(posts: Vec<Post>, settings: &Settings) -> JsonFeed {
        JsonFeed {
            posts: most_recent(posts, settings),
            paths: TargetPaths::default(),
        }
    }

    fn feed_object(&mut self, ctx: &RenderContext) -> Result<serde_json::Value, target::Error> {
        let site = &ctx.settings.site;
        let feed_url = self.url(ctx.settings)?;

        let mut items = Vec::with_capacity(self.posts.len());
        for post in &mut self.posts {
            let url = post.url(ctx.settings)?;
            let html = absolute_urls(post.content.html(ctx.markdown), &site.url);
            items.push(json!({
                "id": url.to_string(),
                "url": url.to_string(),
                "title": post.content.title,
                "content_html": html,
                "date_published": post.date.to_rfc3339_opts(SecondsFormat::Secs, false),
            }));
        }

        let mut feed = serde_json::Map::new();
        feed.insert(
            "version".to_owned(),
            json!("https://jsonfeed.org/version/1"),
        );
        feed.insert("title".to_owned(), json!(site.title));
        feed.insert("home_page_url".to_owned(), json!(site.url.to_string()));
        feed.insert("feed_url".to_owned(), json!(feed_url.to_string()));
        feed.insert("description".to_owned(), json!(site.description));
        for (key, value) in &ctx.settings.feeds.extra {
            feed.insert(key.clone(), value.clone());
        }
        feed.insert("items".to_owned(), serde_json::Value::Array(items));
        Ok(serde_json::Value::Object(feed))
    }
}

impl Target for JsonFeed {
    fn path_template<'s>(&self, settings: &'s Settings) -> &'s str {
        &settings.paths.json_feed_path_template
    }

    fn path_vars(&self) -> PathVars<'_> {
        PathVars::default()
    }

    fn paths(&mut self) -> &mut TargetPaths {
        &mut self.paths
    }

    fn write(&mut self, ctx: &RenderContext) -> Result<(), target::Error> {
        let feed = self.feed_object(ctx)?;
        let output_path = self.output_path(ctx.settings)?;
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(target::Error::Io)?;
        }
        let text = serde_json::to_string_pretty(&feed).map_err(target::Error::Json)?;
        fs::write(&output_path, text).map_err(target::Error::Io)?;
        Ok(())
    }
}

/// The sitemap input: each already-rendered target's URL paired with its
/// output file's modification time, in the order the targets were given.
///
/// Construction reads every target's output file from disk, so the sitemap
/// must be built after everything else has been written; a missing output
/// file is an error.
#[derive(Clone, Debug)]
pub struct Sitemap {
    pub entries: Vec<(Url, DateTime<Utc>)>,
    paths: TargetPaths,
}

impl Sitemap {
    pub fn new(
        targets: Vec<&mut dyn Target>,
        settings: &Settings,
    ) -> Result<Sitemap, target::Error> {
        let mut entries = Vec::with_capacity(targets.len());
        for target in targets {
            let url = target.url(settings)?;
            let output_path = target.output_path(settings)?;
            let modified = fs::metadata(&output_path)
                .and_then(|meta| meta.modified())
                .map_err(target::Error::Io)?;
            entries.push((url, DateTime::<Utc>::from(modified)));
        }
        Ok(Sitemap {
            entries,
            paths: TargetPaths::default(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (Url, DateTime<Utc>)> {
        self.entries.iter()
    }
}

impl Target for Sitemap {
    fn path_template<'s>(&self, settings: &'s Settings) -> &'s str {
        &settings.paths.sitemap_path_template
    }

    fn path_vars(&self) -> PathVars<'_> {
        PathVars::default()
    }

    fn paths(&mut self) -> &mut TargetPaths {
        &mut self.paths
    }

    fn write(&mut self, ctx: &RenderContext) -> Result<(), target::Error> {
        let entries = self
            .entries
            .iter()
            .map(|(url, lastmod)| {
                let mut object: HashMap<String, Value> = HashMap::new();
                object.insert("url".to_owned(), Value::String(url.to_string()));
                object.insert(
                    "lastmod".to_owned(),
                    Value::String(lastmod.to_rfc3339_opts(SecondsFormat::Secs, true)),
                );
                Value::Object(object)
            })
            .collect();

        let mut object: HashMap<String, Value> = HashMap::new();
        object.insert("entries".to_owned(), Value::Array(entries));
        let template = ctx.settings.templates.sitemap.clone();
        render_with_template(self, &template, Value::Object(object), ctx)
    }
}

fn optional_url(url: &Option<Url>) -> Value {
    match url {
        Some(url) => Value::String(url.to_string()),
        None => Value::Nil,
    }
}

fn post_values(posts: &mut [Post], ctx: &RenderContext) -> Result<Value, target::Error> {
    let values = posts
        .iter_mut()
        .map(|post| post.value(ctx))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(values))
}
