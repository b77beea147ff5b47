//! `cfpub publish` command implementation.

use std::io::Read;
use std::path::PathBuf;

use cfpub_config::{Auth, CliSettings, Config};
use cfpub_confluence::{
    ConfluenceClient, Credentials, PublishOptions, PublishReport, Publisher, UpsertAction,
    UpsertOptions, prepare_batch,
};
use cfpub_document::{
    Collector, ContentType, DEFAULT_NOTICE, Page, PageDefaults, WalkOptions, is_multi_document,
    render_fragment, render_fragment_file,
};
use cfpub_renderer::StorageRenderer;
use clap::Args;

use crate::error::CliError;
use crate::output::Output;

/// Number of body characters shown by a dry run.
const PREVIEW_CHARS: usize = 40;

/// Arguments for the publish command.
#[derive(Args)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct PublishArgs {
    /// Markdown files or directories to publish (default: read standard input).
    paths: Vec<PathBuf>,

    /// Path to configuration file (default: auto-discover cfpub.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Confluence REST API root, e.g. <https://wiki.example.com/rest/api/>.
    #[arg(short = 'o', long, env = "CONFLUENCE_HOST")]
    host: Option<String>,

    /// User name for basic authentication.
    #[arg(short, long, env = "CONFLUENCE_USERNAME")]
    username: Option<String>,

    /// Password for basic authentication.
    #[arg(short, long, env = "CONFLUENCE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Bearer token (wins over username and password).
    #[arg(long, env = "CONFLUENCE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Skip TLS certificate verification.
    #[arg(long)]
    insecure: bool,

    /// Space key to publish to.
    #[arg(short, long, env = "CONFLUENCE_SPACE")]
    space: Option<String>,

    /// Title of the parent page.
    #[arg(short = 'a', long, conflicts_with = "parent_id")]
    parent_title: Option<String>,

    /// ID of the parent page.
    #[arg(short = 'A', long)]
    parent_id: Option<String>,

    /// Page title (single document only).
    #[arg(short, long)]
    title: Option<String>,

    /// ID of the page to update (single document only).
    #[arg(short = 'i', long)]
    page_id: Option<String>,

    /// Content type of the pages ("page" or "blogpost").
    #[arg(long, default_value = "page")]
    content_type: ContentType,

    /// Version message for the change.
    #[arg(short, long)]
    message: Option<String>,

    /// Do not notify watchers of the change.
    #[arg(long)]
    minor_edit: bool,

    /// Prefix prepended to every title as "PREFIX - TITLE".
    #[arg(long)]
    prefix: Option<String>,

    /// Drop the first top-level heading and use it as the title.
    #[arg(long)]
    strip_top_header: bool,

    /// Join the lines of each paragraph.
    #[arg(long)]
    remove_text_newlines: bool,

    /// Replace remote labels with the document labels instead of adding them.
    #[arg(long)]
    replace_all_labels: bool,

    /// Markdown inserted before each page (default: an auto-generated notice).
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_NOTICE, conflicts_with = "preface_file")]
    preface_markdown: Option<String>,

    /// Markdown file inserted before each page.
    #[arg(long)]
    preface_file: Option<PathBuf>,

    /// Markdown appended after each page (default: an auto-generated notice).
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_NOTICE, conflicts_with = "postface_file")]
    postface_markdown: Option<String>,

    /// Markdown file appended after each page.
    #[arg(long)]
    postface_file: Option<PathBuf>,

    /// Publish a folder holding a single document as that document.
    #[arg(long)]
    collapse_single_pages: bool,

    /// Include files ignored by .gitignore.
    #[arg(long)]
    no_gitignore: bool,

    /// Turn folder names into readable titles.
    #[arg(long, conflicts_with = "use_pages_file")]
    beautify_folders: bool,

    /// Read folder titles from .pages files.
    #[arg(long)]
    use_pages_file: bool,

    /// Merge chains of folders without documents into one page.
    #[arg(long, conflicts_with = "skip_empty")]
    collapse_empty: bool,

    /// Leave out folders without documents.
    #[arg(long)]
    skip_empty: bool,

    /// Replace links between documents with page URLs.
    #[arg(long)]
    enable_relative_links: bool,

    /// Keep links to documents outside the batch instead of failing.
    #[arg(long)]
    ignore_relative_link_errors: bool,

    /// Skip pages and attachments whose content did not change.
    #[arg(long)]
    only_changed: bool,

    /// Print the pages instead of publishing them.
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl PublishArgs {
    /// Execute the publish command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, input collection or publishing
    /// fails.
    pub(crate) fn execute(&self, output: &Output) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }
        let space = config.require_space()?.to_owned();

        if (self.title.is_some() || self.page_id.is_some()) && is_multi_document(&self.paths) {
            return Err(CliError::Validation(
                "Title and page ID cannot be specified on the command line \
                 if uploading more than one file or whole directories"
                    .to_owned(),
            ));
        }

        let mut pages = self.collect_pages(&config, output)?;
        if pages.is_empty() {
            output.warning("No documents to publish");
            return Ok(());
        }

        let defaults = PageDefaults {
            space,
            page_id: self.page_id.clone(),
            content_type: self.content_type,
            parent_title: self.parent_title.clone(),
            parent_id: self.parent_id.clone(),
            prefix: self.prefix.clone(),
            preface: fragment(self.preface_markdown.as_deref(), self.preface_file.as_ref())?,
            postface: fragment(self.postface_markdown.as_deref(), self.postface_file.as_ref())?,
        };
        let options = publish_options(&config);

        if self.dry_run {
            prepare_batch(&mut pages, &defaults, &options)?;
            print_dry_run(output, &pages, options.enable_relative_links);
            return Ok(());
        }

        let connection = config.require_connection()?;
        let credentials = match connection.auth {
            Auth::Token(token) => Credentials::Token(token),
            Auth::Basic { username, password } => Credentials::Basic { username, password },
        };
        let client = ConfluenceClient::new(&connection.host, &credentials, connection.insecure);
        output.info(&format!("Publishing {} page(s) to {}", pages.len(), client.site_url()));

        let publisher = Publisher::new(&client, options);
        let index = publisher.prepare(&mut pages, &defaults)?;
        let report = publisher.publish(&mut pages, index)?;
        print_report(output, &report);

        Ok(())
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            host: self.host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            token: self.token.clone(),
            space: self.space.clone(),
            insecure: self.insecure.then_some(true),
            message: self.message.clone(),
            minor_edit: self.minor_edit.then_some(true),
            only_changed: self.only_changed.then_some(true),
            replace_all_labels: self.replace_all_labels.then_some(true),
            strip_top_header: self.strip_top_header.then_some(true),
            remove_text_newlines: self.remove_text_newlines.then_some(true),
            enable_relative_links: self.enable_relative_links.then_some(true),
            ignore_relative_link_errors: self.ignore_relative_link_errors.then_some(true),
            collapse_single_pages: self.collapse_single_pages.then_some(true),
            collapse_empty: self.collapse_empty.then_some(true),
            skip_empty: self.skip_empty.then_some(true),
            beautify_folders: self.beautify_folders.then_some(true),
            use_pages_file: self.use_pages_file.then_some(true),
            use_gitignore: self.no_gitignore.then_some(false),
        }
    }

    /// Load pages from the input paths, or from standard input when none
    /// are given.
    fn collect_pages(&self, config: &Config, output: &Output) -> Result<Vec<Page>, CliError> {
        let directory = &config.directory;
        let walk = WalkOptions {
            collapse_single_pages: directory.collapse_single_pages,
            skip_empty: directory.skip_empty,
            collapse_empty: directory.collapse_empty,
            beautify_folders: directory.beautify_folders,
            use_pages_file: directory.use_pages_file,
            use_gitignore: directory.use_gitignore,
        };
        let renderer = StorageRenderer::new()
            .strip_header(config.publish.strip_top_header)
            .remove_text_newlines(config.publish.remove_text_newlines);
        let collector = Collector::new(walk, renderer, config.publish.enable_relative_links);

        if self.paths.is_empty() {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            return Ok(vec![collector.collect_text(&text, self.title.as_deref())?]);
        }

        let collection = collector.collect(&self.paths, self.title.as_deref())?;
        for missing in &collection.missing {
            output.warning(&format!("File {} does not exist", missing.display()));
        }
        if collection.relative_links_ignored {
            output.warning("Relative links are ignored when there's a single page");
        }
        Ok(collection.pages)
    }
}

/// Rendered preface or postface from inline markdown or a file.
fn fragment(markdown: Option<&str>, file: Option<&PathBuf>) -> Result<String, CliError> {
    match (markdown, file) {
        (Some(markdown), _) => Ok(render_fragment(markdown)),
        (None, Some(file)) => Ok(render_fragment_file(file)?),
        (None, None) => Ok(String::new()),
    }
}

fn publish_options(config: &Config) -> PublishOptions {
    let publish = &config.publish;
    PublishOptions {
        upsert: UpsertOptions {
            message: publish.message.clone(),
            only_changed: publish.only_changed,
            replace_all_labels: publish.replace_all_labels,
            minor_edit: publish.minor_edit,
        },
        enable_relative_links: publish.enable_relative_links,
        ignore_relative_link_errors: publish.ignore_relative_link_errors,
    }
}

/// Start of a body for display, marked with "..." when non-empty.
fn body_preview(body: &str) -> String {
    if body.is_empty() {
        return String::new();
    }
    let preview: String = body.chars().take(PREVIEW_CHARS).collect();
    format!("{preview}...")
}

fn print_dry_run(output: &Output, pages: &[Page], relative_links: bool) {
    output.highlight("[DRY RUN] No changes made.");

    for page in pages {
        output.info("");
        output.info(&format!("Title:        {}", page.title_str()));
        if let Some(path) = &page.file_path {
            output.info(&format!("File:         {}", path.display()));
        }
        output.info(&format!("Space:        {}", page.space));
        output.info(&format!("Content type: {}", page.content_type));
        if let Some(parent) = &page.parent_title {
            output.info(&format!("Parent title: {parent}"));
        }
        if let Some(parent) = &page.parent_id {
            output.info(&format!("Parent ID:    {parent}"));
        }
        if let Some(id) = &page.page_id {
            output.info(&format!("Page ID:      {id}"));
        }
        if let Some(labels) = &page.labels {
            output.info(&format!("Labels:       {}", labels.join(", ")));
        }
        for attachment in &page.attachments {
            output.info(&format!("Attachment:   {}", attachment.display()));
        }
        output.info(&format!("Body:         {}", body_preview(&page.body)));

        if relative_links
            && !page.relative_links.is_empty()
            && let Some(path) = &page.file_path
        {
            output.warning(&format!(
                "Dry run: skipping relative link replacement for {}",
                path.display()
            ));
        }
    }
}

fn print_report(output: &Output, report: &PublishReport) {
    for page in &report.pages {
        output.action(
            page.action,
            &format!("{:<8} {} ({})", page.action, page.title, page.url),
        );
        for attachment in &page.attachments {
            output.muted(&format!("  {} attachment {}", attachment.action, attachment.filename));
        }
    }
    for path in &report.relinked {
        output.info(&format!("Updated relative links in {}", path.display()));
    }

    output.highlight(&format!(
        "\n{} created, {} updated, {} skipped",
        report.count(UpsertAction::Created),
        report.count(UpsertAction::Updated),
        report.count(UpsertAction::Skipped)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: PublishArgs,
    }

    fn parse(args: &[&str]) -> PublishArgs {
        TestCli::try_parse_from(std::iter::once("cfpub").chain(args.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_flags_map_to_settings() {
        let args = parse(&["--only-changed", "--no-gitignore", "-s", "DOCS", "docs"]);
        let settings = args.cli_settings();

        assert_eq!(settings.only_changed, Some(true));
        assert_eq!(settings.use_gitignore, Some(false));
        assert_eq!(settings.space.as_deref(), Some("DOCS"));
        assert_eq!(settings.skip_empty, None);
        assert_eq!(args.paths, vec![PathBuf::from("docs")]);
    }

    #[test]
    fn test_preface_default_notice() {
        let args = parse(&["--preface-markdown", "--", "doc.md"]);
        assert_eq!(args.preface_markdown.as_deref(), Some(DEFAULT_NOTICE));
        assert_eq!(args.paths, vec![PathBuf::from("doc.md")]);
    }

    #[test]
    fn test_content_type_parsed() {
        let args = parse(&["--content-type", "blogpost", "doc.md"]);
        assert_eq!(args.content_type, ContentType::Blogpost);
        assert!(TestCli::try_parse_from(["cfpub", "--content-type", "wiki"]).is_err());
    }

    #[test]
    fn test_exclusive_flags_rejected() {
        assert!(TestCli::try_parse_from(["cfpub", "--skip-empty", "--collapse-empty"]).is_err());
        assert!(TestCli::try_parse_from(["cfpub", "--parent-title", "A", "--parent-id", "1"]).is_err());
    }

    #[test]
    fn test_fragment_from_markdown() {
        assert_eq!(
            fragment(Some("**note**"), None).unwrap(),
            "<p><strong>note</strong></p>\n"
        );
        assert_eq!(fragment(None, None).unwrap(), "");
    }

    #[test]
    fn test_body_preview() {
        assert_eq!(body_preview(""), "");
        assert_eq!(body_preview("<p>short</p>"), "<p>short</p>...");
        assert_eq!(body_preview(&"x".repeat(100)).len(), PREVIEW_CHARS + 3);
    }
}
