//! State structs for tracking context during event processing.

use pulldown_cmark::Alignment;

/// State for tracking code block rendering.
#[derive(Default)]
pub(crate) struct CodeBlockState {
    /// Whether we're inside a code block.
    active: bool,
    /// Language of current code block (e.g., "rust", "python").
    language: Option<String>,
    /// Buffer for code block content.
    buffer: String,
}

impl CodeBlockState {
    /// Start a new code block with optional language.
    pub fn start(&mut self, language: Option<String>) {
        self.active = true;
        self.language = language;
        self.buffer.clear();
    }

    /// End the current code block and return (language, content).
    ///
    /// The content always ends with a newline.
    pub fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        let mut content = std::mem::take(&mut self.buffer);
        if !content.ends_with('\n') {
            content.push('\n');
        }
        (self.language.take(), content)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }
}

/// State for tracking table rendering.
#[derive(Default)]
pub(crate) struct TableState {
    /// Whether we're inside the table header row.
    in_head: bool,
    /// Whether `<tbody>` has been opened for the current table.
    body_open: bool,
    /// Column alignments for current table.
    alignments: Vec<Alignment>,
    /// Current column index in table row.
    cell_index: usize,
}

impl TableState {
    /// Start a new table with column alignments.
    pub fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.body_open = false;
        self.cell_index = 0;
    }

    pub fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub fn end_head(&mut self) {
        self.in_head = false;
    }

    /// Start a body row. Returns `true` if `<tbody>` must be opened first.
    pub fn start_row(&mut self) -> bool {
        self.cell_index = 0;
        !std::mem::replace(&mut self.body_open, true)
    }

    pub fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// End the table. Returns `true` if `<tbody>` must be closed.
    pub fn end(&mut self) -> bool {
        std::mem::take(&mut self.body_open)
    }

    /// Get the alignment style for the current cell.
    pub fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// Image waiting for its alt text.
pub(crate) struct PendingImage {
    pub src: String,
    pub title: String,
    pub alt: String,
}

/// State for tracking image alt text capture.
///
/// Images can nest (an image inside another image's alt text), so only the
/// outermost one is captured.
#[derive(Default)]
pub(crate) struct ImageState {
    pending: Option<PendingImage>,
    depth: usize,
}

impl ImageState {
    pub fn start(&mut self, src: &str, title: &str) {
        self.depth += 1;
        if self.depth == 1 {
            self.pending = Some(PendingImage {
                src: src.to_owned(),
                title: title.to_owned(),
                alt: String::new(),
            });
        }
    }

    /// End an image. Returns the outermost image once it is complete.
    pub fn end(&mut self) -> Option<PendingImage> {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.pending.take()
        } else {
            None
        }
    }

    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    pub fn push_str(&mut self, text: &str) {
        if let Some(image) = &mut self.pending {
            image.alt.push_str(text);
        }
    }
}

/// State for tracking the heading being rendered and the page title.
#[derive(Default)]
pub(crate) struct HeadingState {
    /// Level and output offset of the heading being rendered.
    current: Option<(u8, usize)>,
    /// Plain text of the heading being rendered.
    text: String,
    /// Title taken from the first level-1 heading.
    title: Option<String>,
}

impl HeadingState {
    /// Start a heading whose markup begins at `offset` in the output.
    pub fn start(&mut self, level: u8, offset: usize) {
        self.current = Some((level, offset));
        self.text.clear();
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Finish the heading.
    ///
    /// Returns `(level, offset, is_title)` where `is_title` marks the first
    /// level-1 heading of the document.
    pub fn end(&mut self) -> Option<(u8, usize, bool)> {
        let (level, offset) = self.current.take()?;
        let text = std::mem::take(&mut self.text);
        let is_title = level == 1 && self.title.is_none();
        if is_title {
            self.title = Some(text.trim().to_owned());
        }
        Some((level, offset, is_title))
    }

    pub fn take_title(&mut self) -> Option<String> {
        self.title.take()
    }
}
