use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_EDIT_DELAY_MS: u64 = 1000;
const DEFAULT_WATCH_INTERVAL_SECS: u64 = 15;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// On-disk shape of `relink.toml`. Every field is optional here so the CLI
/// can fill gaps before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub domain: Option<String>,
    pub token: Option<String>,
    #[serde(default)]
    pub namespaces: Vec<String>,
    pub log_template: Option<String>,
    pub watch_document: Option<String>,
    pub edit_delay_ms: Option<u64>,
    pub watch_interval_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Connection and pacing settings, fixed for the whole run.
#[derive(Clone, Debug)]
pub struct Settings {
    pub domain: String,
    pub token: String,
    pub namespaces: Vec<String>,
    pub log_template: String,
    /// Document whose discussion status the watchdog polls.
    pub watch_document: String,
    /// Pause after each successful submission.
    pub edit_delay: Duration,
    pub watch_interval: Duration,
    pub request_timeout: Duration,
}

impl Settings {
    /// Validate a merged [`FileConfig`].
    pub fn from_file_config(config: FileConfig) -> Result<Self, ConfigError> {
        let namespaces: Vec<String> = config
            .namespaces
            .iter()
            .map(|ns| ns.trim())
            .filter(|ns| !ns.is_empty())
            .map(str::to_string)
            .collect();
        if namespaces.is_empty() {
            return Err(ConfigError::Missing("namespaces"));
        }

        Ok(Self {
            domain: required(config.domain, "domain")?,
            token: required(config.token, "token")?,
            namespaces,
            log_template: config.log_template.unwrap_or_default(),
            watch_document: required(config.watch_document, "watch_document")?,
            edit_delay: Duration::from_millis(config.edit_delay_ms.unwrap_or(DEFAULT_EDIT_DELAY_MS)),
            watch_interval: Duration::from_secs(
                config.watch_interval_secs.unwrap_or(DEFAULT_WATCH_INTERVAL_SECS),
            ),
            request_timeout: Duration::from_secs(
                config.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Characters that delimit wikilink markup and so cannot appear in a title.
const LINK_DELIMITERS: [char; 3] = ['[', ']', '|'];

fn validate_title<'a>(title: &'a str, field: &'static str) -> Result<&'a str, ConfigError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ConfigError::Missing(field));
    }
    if let Some(c) = title.chars().find(|c| LINK_DELIMITERS.contains(c)) {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("'{}' contains link delimiter '{}'", title, c),
        });
    }
    Ok(title)
}

/// One rename: which title becomes which, and how the edits are described.
#[derive(Clone, Debug)]
pub struct RenameJob {
    pub old_title: String,
    pub new_title: String,
    pub keep_alias_for_bare_links: bool,
    pub log_template: String,
    /// Namespaces searched for backlinks, in query order.
    pub namespaces: Vec<String>,
}

impl RenameJob {
    pub fn new(
        settings: &Settings,
        old_title: &str,
        new_title: &str,
        keep_alias_for_bare_links: bool,
    ) -> Result<Self, ConfigError> {
        let old_title = validate_title(old_title, "old title")?;
        let new_title = validate_title(new_title, "new title")?;
        Ok(Self {
            old_title: old_title.to_string(),
            new_title: new_title.to_string(),
            keep_alias_for_bare_links,
            log_template: settings.log_template.clone(),
            namespaces: settings.namespaces.clone(),
        })
    }

    /// Edit summary: the template with `{old}` and `{new}` filled in.
    pub fn log_message(&self) -> String {
        self.log_template
            .replace("{old}", &self.old_title)
            .replace("{new}", &self.new_title)
    }
}
