//! Colored terminal output.

use cfpub_confluence::UpsertAction;
use console::{Style, Term};

/// Styled writer for stderr.
pub(crate) struct Output {
    term: Term,
    created: Style,
    updated: Style,
    skipped: Style,
    warning: Style,
    error: Style,
    heading: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            created: Style::new().green(),
            updated: Style::new().cyan(),
            skipped: Style::new().dim(),
            warning: Style::new().yellow(),
            error: Style::new().red(),
            heading: Style::new().cyan().bold(),
        }
    }

    fn line(&self, style: Option<&Style>, msg: &str) {
        let _ = match style {
            Some(style) => self.term.write_line(&style.apply_to(msg).to_string()),
            None => self.term.write_line(msg),
        };
    }

    /// Print a plain message.
    pub(crate) fn info(&self, msg: &str) {
        self.line(None, msg);
    }

    /// Print a message styled by what an upsert did: green for created,
    /// cyan for updated, dimmed for skipped.
    pub(crate) fn action(&self, action: UpsertAction, msg: &str) {
        let style = match action {
            UpsertAction::Created => &self.created,
            UpsertAction::Updated => &self.updated,
            UpsertAction::Skipped => &self.skipped,
        };
        self.line(Some(style), msg);
    }

    /// Print a de-emphasized message.
    pub(crate) fn muted(&self, msg: &str) {
        self.line(Some(&self.skipped), msg);
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.line(Some(&self.warning), msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(Some(&self.error), msg);
    }

    /// Print a heading or summary line.
    pub(crate) fn highlight(&self, msg: &str) {
        self.line(Some(&self.heading), msg);
    }
}
