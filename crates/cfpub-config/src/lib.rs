//! Configuration management for cfpub.
//!
//! Parses `cfpub.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `confluence.host`
//! - `confluence.username`
//! - `confluence.password`
//! - `confluence.token`
//! - `confluence.space`
//! - `publish.message`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "cfpub.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override REST API host.
    pub host: Option<String>,
    /// Override user name.
    pub username: Option<String>,
    /// Override password.
    pub password: Option<String>,
    /// Override bearer token.
    pub token: Option<String>,
    /// Override space key.
    pub space: Option<String>,
    /// Override TLS verification.
    pub insecure: Option<bool>,
    /// Override version message.
    pub message: Option<String>,
    /// Override minor edit flag.
    pub minor_edit: Option<bool>,
    /// Override only-changed flag.
    pub only_changed: Option<bool>,
    /// Override label replacement.
    pub replace_all_labels: Option<bool>,
    /// Override top header stripping.
    pub strip_top_header: Option<bool>,
    /// Override newline removal in paragraphs.
    pub remove_text_newlines: Option<bool>,
    /// Override relative link processing.
    pub enable_relative_links: Option<bool>,
    /// Override tolerance of broken relative links.
    pub ignore_relative_link_errors: Option<bool>,
    /// Override single page collapsing.
    pub collapse_single_pages: Option<bool>,
    /// Override empty folder collapsing.
    pub collapse_empty: Option<bool>,
    /// Override empty folder skipping.
    pub skip_empty: Option<bool>,
    /// Override folder title beautification.
    pub beautify_folders: Option<bool>,
    /// Override `.pages` title files.
    pub use_pages_file: Option<bool>,
    /// Override `.gitignore` handling.
    pub use_gitignore: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection settings.
    pub confluence: ConfluenceConfig,
    /// Publishing behaviour.
    pub publish: PublishConfig,
    /// Directory walking.
    pub directory: DirectoryConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Confluence connection settings.
///
/// Every field may be left out of the file and supplied on the command line,
/// so nothing is required until [`Config::require_connection`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfluenceConfig {
    /// REST API root, e.g. `https://wiki.example.com/rest/api/`.
    pub host: Option<String>,
    /// User name for basic authentication.
    pub username: Option<String>,
    /// Password for basic authentication.
    pub password: Option<String>,
    /// Bearer token; wins over username and password.
    pub token: Option<String>,
    /// Space key.
    pub space: Option<String>,
    /// Skip TLS certificate verification.
    pub insecure: bool,
}

/// Publishing behaviour.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Version message.
    pub message: Option<String>,
    /// Do not notify watchers of changes.
    pub minor_edit: bool,
    /// Skip pages and attachments whose content did not change.
    pub only_changed: bool,
    /// Replace remote labels instead of adding to them.
    pub replace_all_labels: bool,
    /// Drop the first top-level heading and use it as the title.
    pub strip_top_header: bool,
    /// Join lines of paragraphs.
    pub remove_text_newlines: bool,
    /// Replace links between documents with page URLs.
    pub enable_relative_links: bool,
    /// Keep links that cannot be resolved instead of failing.
    pub ignore_relative_link_errors: bool,
}

/// Directory walking.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Publish a folder holding a single document as that document.
    pub collapse_single_pages: bool,
    /// Merge chains of folders without documents into one page.
    pub collapse_empty: bool,
    /// Leave out folders without documents.
    pub skip_empty: bool,
    /// Turn folder names into readable titles.
    pub beautify_folders: bool,
    /// Read folder titles from `.pages` files.
    pub use_pages_file: bool,
    /// Honour `.gitignore` files.
    pub use_gitignore: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            collapse_single_pages: false,
            collapse_empty: false,
            skip_empty: false,
            beautify_folders: false,
            use_pages_file: false,
            use_gitignore: true,
        }
    }
}

/// How to authenticate against Confluence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// Bearer token.
    Token(String),
    /// HTTP basic authentication.
    Basic {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
}

/// Validated connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// REST API root.
    pub host: String,
    /// Credentials.
    pub auth: Auth,
    /// Skip TLS certificate verification.
    pub insecure: bool,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`confluence.token`").
        field: String,
        /// Error message (e.g., "${`CONFLUENCE_TOKEN`} not set").
        message: String,
    },
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Value of an optional field that must be present and non-empty.
fn require<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ConfigError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Validation(format!("{field} is required"))),
    }
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `cfpub.toml` in current directory and parents,
    /// falling back to defaults when none exists.
    ///
    /// CLI settings are applied after loading and take precedence over file
    /// values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing or
    /// expansion fails, or the merged settings are contradictory.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        fn set<T: Clone>(target: &mut T, value: Option<&T>) {
            if let Some(value) = value {
                target.clone_from(value);
            }
        }
        fn set_opt(target: &mut Option<String>, value: Option<&String>) {
            if let Some(value) = value {
                *target = Some(value.clone());
            }
        }

        let confluence = &mut self.confluence;
        set_opt(&mut confluence.host, settings.host.as_ref());
        set_opt(&mut confluence.username, settings.username.as_ref());
        set_opt(&mut confluence.password, settings.password.as_ref());
        set_opt(&mut confluence.token, settings.token.as_ref());
        set_opt(&mut confluence.space, settings.space.as_ref());
        set(&mut confluence.insecure, settings.insecure.as_ref());

        let publish = &mut self.publish;
        set_opt(&mut publish.message, settings.message.as_ref());
        set(&mut publish.minor_edit, settings.minor_edit.as_ref());
        set(&mut publish.only_changed, settings.only_changed.as_ref());
        set(&mut publish.replace_all_labels, settings.replace_all_labels.as_ref());
        set(&mut publish.strip_top_header, settings.strip_top_header.as_ref());
        set(&mut publish.remove_text_newlines, settings.remove_text_newlines.as_ref());
        set(&mut publish.enable_relative_links, settings.enable_relative_links.as_ref());
        set(
            &mut publish.ignore_relative_link_errors,
            settings.ignore_relative_link_errors.as_ref(),
        );

        let directory = &mut self.directory;
        set(&mut directory.collapse_single_pages, settings.collapse_single_pages.as_ref());
        set(&mut directory.collapse_empty, settings.collapse_empty.as_ref());
        set(&mut directory.skip_empty, settings.skip_empty.as_ref());
        set(&mut directory.beautify_folders, settings.beautify_folders.as_ref());
        set(&mut directory.use_pages_file, settings.use_pages_file.as_ref());
        set(&mut directory.use_gitignore, settings.use_gitignore.as_ref());
    }

    /// Space key to publish to.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if no space is configured.
    pub fn require_space(&self) -> Result<&str, ConfigError> {
        require(self.confluence.space.as_deref(), "confluence.space")
    }

    /// Get validated connection settings.
    ///
    /// A token is used when present; otherwise both username and password
    /// are required.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the host is missing or not an
    /// http(s) URL, or if no usable credentials are configured.
    pub fn require_connection(&self) -> Result<Connection, ConfigError> {
        let confluence = &self.confluence;
        let host = require(confluence.host.as_deref(), "confluence.host")?;
        require_http_url(host, "confluence.host")?;

        let auth = match confluence.token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => Auth::Token(token.to_owned()),
            None => {
                let username = require(
                    confluence.username.as_deref(),
                    "confluence.username or confluence.token",
                )?;
                let password = require(confluence.password.as_deref(), "confluence.password")?;
                Auth::Basic {
                    username: username.to_owned(),
                    password: password.to_owned(),
                }
            }
        };

        Ok(Connection {
            host: host.to_owned(),
            auth,
            insecure: confluence.insecure,
        })
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically by [`Config::load`] after CLI settings are applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if mutually exclusive options are
    /// both enabled or the host is not an http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let directory = &self.directory;
        if directory.collapse_empty && directory.skip_empty {
            return Err(ConfigError::Validation(
                "directory.collapse_empty and directory.skip_empty cannot both be enabled".to_owned(),
            ));
        }
        if directory.beautify_folders && directory.use_pages_file {
            return Err(ConfigError::Validation(
                "directory.beautify_folders and directory.use_pages_file cannot both be enabled"
                    .to_owned(),
            ));
        }
        if let Some(host) = &self.confluence.host {
            require_http_url(host, "confluence.host")?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let confluence = &mut self.confluence;
        expand::expand_opt(&mut confluence.host, "confluence.host")?;
        expand::expand_opt(&mut confluence.username, "confluence.username")?;
        expand::expand_opt(&mut confluence.password, "confluence.password")?;
        expand::expand_opt(&mut confluence.token, "confluence.token")?;
        expand::expand_opt(&mut confluence.space, "confluence.space")?;
        expand::expand_opt(&mut self.publish.message, "publish.message")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.confluence.host, None);
        assert!(!config.publish.only_changed);
        assert!(config.directory.use_gitignore);
        assert!(!config.directory.collapse_single_pages);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[confluence]
host = "https://wiki.example.com/rest/api/"
token = "abc"
space = "DOCS"
insecure = true

[publish]
message = "Published by cfpub"
only_changed = true
enable_relative_links = true

[directory]
collapse_single_pages = true
use_gitignore = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.confluence.space.as_deref(), Some("DOCS"));
        assert!(config.confluence.insecure);
        assert_eq!(config.publish.message.as_deref(), Some("Published by cfpub"));
        assert!(config.publish.only_changed);
        assert!(config.publish.enable_relative_links);
        assert!(!config.publish.replace_all_labels);
        assert!(config.directory.collapse_single_pages);
        assert!(!config.directory.use_gitignore);
    }

    #[test]
    fn test_load_explicit_path() {
        let (_dir, path) = write_config("[confluence]\nspace = \"DOCS\"\n");
        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.require_space().unwrap(), "DOCS");
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let err = Config::load(Some(Path::new("/nonexistent/cfpub.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let (_dir, path) = write_config("[confluence\n");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_expands_env_vars() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("CFPUB_TEST_CONFIG_TOKEN", "secret");
        }
        let (_dir, path) = write_config(
            "[confluence]\nhost = \"https://wiki.example.com\"\ntoken = \"${CFPUB_TEST_CONFIG_TOKEN}\"\n",
        );
        let config = Config::load(Some(&path), None).unwrap();
        unsafe {
            std::env::remove_var("CFPUB_TEST_CONFIG_TOKEN");
        }

        assert_eq!(
            config.require_connection().unwrap().auth,
            Auth::Token("secret".to_owned())
        );
    }

    #[test]
    fn test_load_missing_env_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("CFPUB_TEST_CONFIG_MISSING");
        }
        let (_dir, path) = write_config("[confluence]\npassword = \"${CFPUB_TEST_CONFIG_MISSING}\"\n");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { ref field, .. } if field == "confluence.password"));
    }

    #[test]
    fn test_cli_settings_override_file() {
        let (_dir, path) = write_config(
            "[confluence]\nspace = \"DOCS\"\n\n[publish]\nonly_changed = true\n\n[directory]\nuse_gitignore = false\n",
        );
        let settings = CliSettings {
            space: Some("TEAM".to_owned()),
            only_changed: Some(false),
            skip_empty: Some(true),
            ..Default::default()
        };

        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(config.require_space().unwrap(), "TEAM");
        assert!(!config.publish.only_changed);
        assert!(config.directory.skip_empty);
        assert!(!config.directory.use_gitignore); // Unchanged
    }

    #[test]
    fn test_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.confluence.space, None);
        assert!(config.directory.use_gitignore);
    }

    #[test]
    fn test_validate_empty_policies_exclusive() {
        let settings = CliSettings {
            collapse_empty: Some(true),
            skip_empty: Some(true),
            ..Default::default()
        };
        let mut config = Config::default();
        config.apply_cli_settings(&settings);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("collapse_empty"));
    }

    #[test]
    fn test_validate_title_policies_exclusive() {
        let mut config = Config::default();
        config.directory.beautify_folders = true;
        config.directory.use_pages_file = true;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_host_scheme() {
        let mut config = Config::default();
        config.confluence.host = Some("wiki.example.com".to_owned());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_require_space_missing() {
        let mut config = Config::default();
        config.confluence.space = Some(String::new());
        let err = config.require_space().unwrap_err();
        assert!(err.to_string().contains("confluence.space"));
    }

    #[test]
    fn test_require_connection_token_wins() {
        let mut config = Config::default();
        config.confluence.host = Some("https://wiki.example.com".to_owned());
        config.confluence.username = Some("user".to_owned());
        config.confluence.token = Some("abc".to_owned());

        let connection = config.require_connection().unwrap();

        assert_eq!(connection.auth, Auth::Token("abc".to_owned()));
        assert!(!connection.insecure);
    }

    #[test]
    fn test_require_connection_basic() {
        let mut config = Config::default();
        config.confluence.host = Some("https://wiki.example.com".to_owned());
        config.confluence.username = Some("user".to_owned());
        config.confluence.password = Some("pass".to_owned());

        assert_eq!(
            config.require_connection().unwrap().auth,
            Auth::Basic {
                username: "user".to_owned(),
                password: "pass".to_owned(),
            }
        );
    }

    #[test]
    fn test_require_connection_missing_password() {
        let mut config = Config::default();
        config.confluence.host = Some("https://wiki.example.com".to_owned());
        config.confluence.username = Some("user".to_owned());

        let err = config.require_connection().unwrap_err();
        assert!(err.to_string().contains("confluence.password"));
    }

    #[test]
    fn test_require_connection_missing_host() {
        let config = Config::default();
        let err = config.require_connection().unwrap_err();
        assert!(err.to_string().contains("confluence.host"));
    }
}
