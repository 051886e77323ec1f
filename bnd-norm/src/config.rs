//! Configuration types for `bnd-norm.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Root configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub input: InputConfig,
    /// Additional directories to search when resolving input paths.  Each
    /// entry is tried in order after `base_dir` (the TOML file's parent
    /// directory).
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
    #[serde(default)]
    pub naming: NamingConfig,
    /// Extra base-table entries (C type → binding type).  Applied over the
    /// built-in table, so they can also replace a built-in mapping.
    #[serde(default)]
    pub types: BTreeMap<String, String>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Input documents.  Only the header dump is mandatory.
#[derive(Debug, Deserialize)]
pub struct InputConfig {
    /// Declaration dump produced by the extraction step.
    pub header: PathBuf,
    /// Explicit overlay (user overrides).
    #[serde(default)]
    pub overlay: Option<PathBuf>,
    /// Scraped documentation table (URLs + deprecated names).
    #[serde(default)]
    pub docs: Option<PathBuf>,
    /// Enrichment from the auxiliary bindings: a TOML document, or a `.rs`
    /// source file that is scanned directly.
    #[serde(default)]
    pub enrichment: Option<PathBuf>,
}

/// Names of the native API's well-known types and prefixes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Namespace prefix shared by every declaration (`MSK` strips both
    /// `MSK_` and `MSK`).
    pub prefix: String,
    /// Environment handle type; a first parameter of this type is an env receiver.
    pub env_type: String,
    /// Task handle type; a first parameter of this type is a task receiver.
    pub task_type: String,
    /// The library's boolean type.
    pub bool_type: String,
    /// The library's status-code type.
    pub status_type: String,
    /// Canonical name of the enum backing the status-code type.
    pub status_enum: String,
    /// Binding name of the status-code type.
    pub status_binding: String,
    /// Doc URL used when neither the overlay nor the scraped table has one.
    pub default_doc_url: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            prefix: "MSK".to_string(),
            env_type: "MSKenv_t".to_string(),
            task_type: "MSKtask_t".to_string(),
            bool_type: "MSKbooleant".to_string(),
            status_type: "MSKrescodee".to_string(),
            status_enum: "MSKrescode_enum".to_string(),
            status_binding: "ResCode".to_string(),
            default_doc_url: "https://docs.mosek.com/latest/capi/alphabetic-functionalities.html"
                .to_string(),
        }
    }
}

impl NamingConfig {
    /// Strip the namespace prefix, preferring the `PREFIX_` spelling.
    pub fn strip_prefix<'a>(&self, name: &'a str) -> &'a str {
        crate::segment::strip_namespace(name, &self.prefix)
    }
}

/// Output settings.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Directory the emission units are written to.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Where to write the filled-in overlay store for the next run.
    #[serde(default)]
    pub overlay: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            overlay: None,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

/// Resolve an input path by searching `base_dir` first, then each
/// `search_paths` entry.  Absolute paths are returned as-is.  If the file is
/// not found anywhere, falls back to `base_dir.join(path)` so that the caller
/// gets a meaningful error when reading it.
pub fn resolve_input(path: &Path, base_dir: &Path, search_paths: &[PathBuf]) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let candidate = base_dir.join(path);
    if candidate.exists() {
        return candidate;
    }
    for dir in search_paths {
        let candidate = dir.join(path);
        if candidate.exists() {
            return candidate;
        }
    }
    base_dir.join(path)
}

/// Load and parse a `bnd-norm.toml` configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
    parse_config(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {}", path.display(), e))
}

fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}
