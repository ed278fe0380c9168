//! Rendering collaborators applied to the accumulated round text.

use pulldown_cmark::{Options, Parser, html};

pub trait Renderer: Send + Sync {
    fn render(&self, raw: &str) -> String;
}

/// CommonMark to HTML with tables, strikethrough and task lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, raw: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let parser = Parser::new_ext(raw, options);
        let mut output = String::with_capacity(raw.len() + raw.len() / 2);
        html::push_html(&mut output, parser);
        output
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRenderer;

impl Renderer for PlainTextRenderer {
    fn render(&self, raw: &str) -> String {
        raw.to_string()
    }
}
