//! The markdown-to-HTML converter collaborator.
//!
//! A [`MarkdownRenderer`] is constructed once per build from the settings and
//! passed by reference into every HTML conversion; there is no hidden global
//! instance. Conversion is deterministic for a fixed configuration, so
//! content can memoize its HTML safely.

use pulldown_cmark::{html, Options, Parser};

use crate::settings::MarkdownSettings;

/// Converts markdown text to HTML with a fixed set of pulldown-cmark
/// options.
pub struct MarkdownRenderer {
    options: Options,
}

impl MarkdownRenderer {
    /// Builds a renderer whose extension set is driven by the markdown
    /// section of the settings.
    pub fn new(settings: &MarkdownSettings) -> MarkdownRenderer {
        let mut options = Options::empty();
        if settings.footnotes {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        if settings.smart_punctuation {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        if settings.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if settings.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if settings.tasklists {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        MarkdownRenderer { options }
    }

    /// Converts `text` to HTML.
    pub fn convert(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut out, Parser::new_ext(text, self.options));
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn renderer() -> MarkdownRenderer {
        MarkdownRenderer::new(&MarkdownSettings::default())
    }

    #[test]
    fn test_convert_paragraph() {
        assert_eq!(renderer().convert("Hello, world"), "<p>Hello, world</p>\n");
    }

    #[test]
    fn test_convert_is_deterministic() {
        let md = renderer();
        let text = "# Title\n\nSome *emphasis* and a [link](/x).";
        assert_eq!(md.convert(text), md.convert(text));
    }

    #[test]
    fn test_options_follow_settings() {
        let plain = MarkdownRenderer::new(&MarkdownSettings {
            strikethrough: false,
            ..MarkdownSettings::default()
        });
        // Without the extension the tildes pass through literally.
        assert!(plain.convert("~~gone~~").contains("~~"));
        assert!(renderer().convert("~~gone~~").contains("<del>"));
    }
}
