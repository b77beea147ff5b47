//! Markdown to Confluence storage format renderer.

use std::path::Path;

use pulldown_cmark::{CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd};

use crate::links::{RelativeLink, has_authority, local_path, relative_target};
use crate::state::{CodeBlockState, HeadingState, ImageState, PendingImage, TableState};
use crate::tag::ConfluenceTag;
use crate::util::{escape_attr, escape_text, escape_url, fence_language, heading_level_to_num};

/// Result of rendering markdown.
#[derive(Clone, Debug, Default)]
pub struct RenderResult {
    /// Rendered storage format markup.
    pub body: String,
    /// Text of the first level-1 heading, if any.
    pub title: Option<String>,
    /// Local image paths referenced by the document, percent-decoded, in
    /// order of first appearance.
    pub attachments: Vec<String>,
    /// Relative links replaced by placeholders (empty unless enabled).
    pub relative_links: Vec<RelativeLink>,
}

/// Renders markdown into Confluence storage format.
///
/// The renderer itself only holds options; every [`render`](Self::render)
/// call starts from fresh state, so one instance can render a document and
/// its preface without the two affecting each other.
///
/// # Example
///
/// ```
/// use cfpub_renderer::StorageRenderer;
///
/// let result = StorageRenderer::new()
///     .strip_header(true)
///     .render("# Title\n\nSome ![diagram](img/arch.png) text");
///
/// assert_eq!(result.title.as_deref(), Some("Title"));
/// assert_eq!(result.attachments, vec!["img/arch.png".to_owned()]);
/// assert!(!result.body.contains("<h1>"));
/// ```
#[derive(Clone, Copy, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct StorageRenderer {
    strip_header: bool,
    remove_text_newlines: bool,
    relative_links: bool,
}

impl StorageRenderer {
    /// Create a renderer with all options disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Omit the first level-1 heading from the output (it is still used as
    /// the title).
    #[must_use]
    pub fn strip_header(mut self, enabled: bool) -> Self {
        self.strip_header = enabled;
        self
    }

    /// Join lines of a paragraph with spaces instead of newlines.
    #[must_use]
    pub fn remove_text_newlines(mut self, enabled: bool) -> Self {
        self.remove_text_newlines = enabled;
        self
    }

    /// Replace relative link targets with placeholder tokens.
    #[must_use]
    pub fn relative_links(mut self, enabled: bool) -> Self {
        self.relative_links = enabled;
        self
    }

    /// Render a markdown document.
    pub fn render(&self, markdown: &str) -> RenderResult {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;
        let parser = Parser::new_ext(markdown, options);

        let mut writer = StorageWriter::new(*self);
        for event in parser {
            writer.process_event(event);
        }
        writer.finish()
    }
}

/// Single-use event sink holding the state of one render call.
struct StorageWriter {
    options: StorageRenderer,
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    /// Attachment and relative link counts when the current heading started.
    heading_marks: (usize, usize),
    attachments: Vec<String>,
    relative_links: Vec<RelativeLink>,
}

impl StorageWriter {
    fn new(options: StorageRenderer) -> Self {
        Self {
            options,
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::default(),
            heading_marks: (0, 0),
            attachments: Vec::new(),
            relative_links: Vec::new(),
        }
    }

    fn finish(mut self) -> RenderResult {
        RenderResult {
            body: self.output,
            title: self.heading.take_title(),
            attachments: self.attachments,
            relative_links: self.relative_links,
        }
    }

    /// Push inline markup unless alt text is being captured.
    fn push_inline(&mut self, markup: &str) {
        if !self.image.is_active() {
            self.output.push_str(markup);
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.push_inline(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.push_inline("<br />\n"),
            Event::Rule => self.output.push_str("<hr />\n"),
            Event::TaskListMarker(checked) => {
                self.push_inline(if checked { "[x] " } else { "[ ] " });
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not enabled in parser options
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => {
                let level = heading_level_to_num(level);
                self.heading.start(level, self.output.len());
                self.heading_marks = (self.attachments.len(), self.relative_links.len());
                self.output.push_str(&format!("<h{level}>"));
            }
            Tag::BlockQuote(_) => self.output.push_str("<blockquote>\n"),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(ref info) => fence_language(info).map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code.start(language);
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>\n"),
                Some(n) => self.output.push_str(&format!("<ol start=\"{n}\">\n")),
                None => self.output.push_str("<ul>\n"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>\n");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead>\n<tr>\n");
            }
            Tag::TableRow => {
                if self.table.start_row() {
                    self.output.push_str("<tbody>\n");
                }
                self.output.push_str("<tr>\n");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let cell = if self.table.is_in_head() { "th" } else { "td" };
                self.output.push_str(&format!("<{cell}{align}>"));
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => self.start_link(link_type, &dest_url, &title),
            Tag::Image {
                dest_url, title, ..
            } => self.image.start(&dest_url, &title),
            Tag::FootnoteDefinition(_)
            | Tag::HtmlBlock
            | Tag::MetadataBlock(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>\n"),
            TagEnd::Heading(_) => self.end_heading(),
            TagEnd::BlockQuote(_) => self.output.push_str("</blockquote>\n"),
            TagEnd::CodeBlock => {
                let (language, content) = self.code.end();
                self.output
                    .push_str(&code_macro(language.as_deref(), &content).render());
            }
            TagEnd::List(ordered) => {
                self.output
                    .push_str(if ordered { "</ol>\n" } else { "</ul>\n" });
            }
            TagEnd::Item => self.output.push_str("</li>\n"),
            TagEnd::Table => {
                if self.table.end() {
                    self.output.push_str("</tbody>\n");
                }
                self.output.push_str("</table>\n");
            }
            TagEnd::TableHead => {
                self.output.push_str("</tr>\n</thead>\n");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>\n"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>\n"
                } else {
                    "</td>\n"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Image => {
                if let Some(image) = self.image.end() {
                    let markup = self.image_markup(image);
                    self.push_inline(&markup);
                }
            }
            TagEnd::FootnoteDefinition
            | TagEnd::HtmlBlock
            | TagEnd::MetadataBlock(_)
            | TagEnd::DefinitionList
            | TagEnd::DefinitionListTitle
            | TagEnd::DefinitionListDefinition => {}
        }
    }

    fn end_heading(&mut self) {
        let Some((level, offset, is_title)) = self.heading.end() else {
            return;
        };
        if is_title && self.options.strip_header {
            // Images and links of a stripped heading never reach the body.
            let (attachments, links) = self.heading_marks;
            self.output.truncate(offset);
            self.attachments.truncate(attachments);
            self.relative_links.truncate(links);
        } else {
            self.output.push_str(&format!("</h{level}>\n"));
        }
    }

    fn start_link(&mut self, link_type: LinkType, dest_url: &str, title: &str) {
        let href = match link_type {
            LinkType::Email => escape_url(&format!("mailto:{dest_url}")),
            _ => self.link_target(dest_url),
        };

        let mut markup = format!("<a href=\"{href}\"");
        if !title.is_empty() {
            markup.push_str(&format!(" title=\"{}\"", escape_attr(title)));
        }
        markup.push('>');
        self.push_inline(&markup);
    }

    /// Escaped href for a link, substituting a placeholder for relative
    /// document links when enabled.
    fn link_target(&mut self, dest_url: &str) -> String {
        if self.options.relative_links
            && let Some((path, fragment)) = relative_target(dest_url)
        {
            let link = RelativeLink::new(path, fragment, dest_url);
            let placeholder = link.placeholder.clone();
            self.relative_links.push(link);
            return placeholder;
        }
        escape_url(dest_url)
    }

    fn image_markup(&mut self, image: PendingImage) -> String {
        let mut tag = ConfluenceTag::new("image").attr("alt", image.alt);
        if !image.title.is_empty() {
            tag = tag.attr("title", image.title);
        }

        if has_authority(&image.src) {
            tag.push(ConfluenceTag::resource("url").attr("value", image.src));
        } else {
            let path = local_path(&image.src);
            let filename = Path::new(&path)
                .file_name()
                .map_or_else(|| path.clone(), |name| name.to_string_lossy().into_owned());
            tag.push(ConfluenceTag::resource("attachment").attr("filename", filename));
            if !self.attachments.contains(&path) {
                self.attachments.push(path);
            }
        }

        tag.render()
    }

    fn text(&mut self, text: &str) {
        // Priority: code > image alt > heading > normal text
        if self.code.is_active() {
            self.code.push_str(text);
            return;
        }

        if self.image.is_active() {
            self.image.push_str(text);
            return;
        }

        if self.heading.is_active() {
            self.heading.push_text(text);
        }

        if self.options.remove_text_newlines {
            let joined = text.replace('\n', " ");
            self.output.push_str(&escape_text(&joined));
        } else {
            self.output.push_str(&escape_text(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        self.output
            .push_str(&format!("<code>{}</code>", escape_text(code)));
    }

    fn soft_break(&mut self) {
        if self.code.is_active() {
            self.code.push_str("\n");
        } else if self.image.is_active() {
            self.image.push_str(" ");
        } else if self.options.remove_text_newlines {
            self.output.push(' ');
        } else {
            self.output.push('\n');
        }
    }
}

/// Build the `code` macro for a fenced or indented code block.
fn code_macro(language: Option<&str>, content: &str) -> ConfluenceTag {
    let parameter = |name: &str, value: &str| {
        ConfluenceTag::new("parameter")
            .attr("name", name)
            .text(value)
    };

    let mut tag = ConfluenceTag::new("structured-macro").attr("name", "code");
    if let Some(language) = language {
        tag.push(parameter("language", language));
    }
    tag.push(parameter("linenumbers", "true"));
    tag.push(ConfluenceTag::new("plain-text-body").cdata(content));
    tag
}
