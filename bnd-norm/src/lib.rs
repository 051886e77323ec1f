//! bnd-norm — C API surface → normalized binding descriptors.
//!
//! Takes the declarations extracted from a C header (enums, typedefs,
//! functions), merges them with an explicit overlay, a scraped documentation
//! table and enrichment from an independent set of bindings, and produces one
//! consistently named descriptor per declaration.  The descriptors are
//! grouped into output units and handed to an [`emit::Emitter`].
//!
//! # Quick start
//!
//! Normalize and write one manifest per output unit (suitable for `build.rs`):
//!
//! ```no_run
//! use std::path::Path;
//!
//! // Reads config TOML, normalizes the header dump, writes the manifests.
//! bnd_norm::run(Path::new("bnd-norm.toml"), None).unwrap();
//! ```
//!
//! Or get the descriptors without writing to disk:
//!
//! ```no_run
//! use std::path::Path;
//!
//! let generated = bnd_norm::generate(Path::new("bnd-norm.toml")).unwrap();
//! for f in &generated.api.functions {
//!     println!("{} -> {}", f.c_name, f.binding_name);
//! }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

pub mod classify;
pub mod config;
pub mod emit;
pub mod enrich;
pub mod error;
pub mod model;
pub mod normalize;
pub mod overlay;
pub mod segment;
pub mod types;

pub use error::NormalizeError;

/// Output of one normalization pass.
#[derive(Debug, Clone)]
pub struct Generated {
    pub api: model::NormalizedApi,
    /// The overlay store after derived values were filled in.  Feeding it
    /// back as the explicit overlay reproduces the same descriptors.
    pub overlay: overlay::OverlayStore,
}

/// Run the full pipeline: load config, normalize, emit the manifests, and
/// optionally write the filled overlay.
///
/// `output` optionally overrides the output directory from the config.
///
/// Returns the directory the manifests were written to.
pub fn run(config_path: &Path, output: Option<&Path>) -> Result<PathBuf> {
    run_with_overlay(config_path, output, None)
}

/// [`run`], with an explicit destination for the filled overlay store that
/// takes precedence over `output.overlay`.
pub fn run_with_overlay(
    config_path: &Path,
    output: Option<&Path>,
    write_overlay: Option<&Path>,
) -> Result<PathBuf> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let generated = generate_from_config(&cfg, base_dir)?;

    let output_dir = match output {
        Some(p) => p.to_path_buf(),
        None => base_dir.join(&cfg.output.dir),
    };
    let plan = emit::EmissionPlan::build(&generated.api, &cfg.naming)?;
    let mut emitter = emit::ManifestEmitter::new(&output_dir)?;
    let units = plan.emit_all(&mut emitter)?;
    info!(dir = %output_dir.display(), units, "wrote manifests");

    let overlay_path = match write_overlay {
        Some(p) => Some(p.to_path_buf()),
        None => cfg.output.overlay.as_ref().map(|p| base_dir.join(p)),
    };
    if let Some(path) = overlay_path {
        let text = generated.overlay.to_toml()?;
        std::fs::write(&path, &text)
            .with_context(|| format!("writing overlay to {}", path.display()))?;
        info!(
            path = %path.display(),
            enums = generated.overlay.enums.len(),
            functions = generated.overlay.functions.len(),
            "wrote overlay"
        );
    }

    Ok(output_dir)
}

/// Parse a `bnd-norm.toml` config file and normalize the referenced header
/// dump without writing anything to disk.
pub fn generate(config_path: &Path) -> Result<Generated> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    generate_from_config(&cfg, base_dir)
}

/// Normalize from an already-loaded [`config::Config`].
///
/// `base_dir` is the directory relative to which input paths in the config
/// are resolved (typically the parent directory of the TOML file).
pub fn generate_from_config(cfg: &config::Config, base_dir: &Path) -> Result<Generated> {
    let resolve = |p: &Path| config::resolve_input(p, base_dir, &cfg.search_paths);

    let header = model::load_header(&resolve(&cfg.input.header))?;
    info!(
        enums = header.enums.len(),
        typedefs = header.typedefs.len(),
        functions = header.functions.len(),
        "loaded header dump"
    );

    let mut overlay = match &cfg.input.overlay {
        Some(p) => overlay::OverlayStore::load(&resolve(p))?,
        None => overlay::OverlayStore::default(),
    };
    let docs = match &cfg.input.docs {
        Some(p) => overlay::DocIndex::load(&resolve(p))?,
        None => overlay::DocIndex::default(),
    };
    let enrichment = match &cfg.input.enrichment {
        Some(p) => enrich::Enrichment::load(&resolve(p))?,
        None => enrich::Enrichment::default(),
    };

    let rules = segment::RuleSet::current();
    let mut types = types::TypeMapper::with_base_table(&cfg.naming, &cfg.types);
    let normalizer = normalize::Normalizer::new(
        &cfg.naming,
        &rules,
        &docs,
        enrichment.index(&cfg.naming.prefix),
    );
    let api = normalizer
        .run(&header, &mut overlay, &mut types)
        .context("normalization failed")?;

    info!(
        rules_version = rules.version,
        enums = api.enums.len(),
        functions = api.functions.len(),
        "normalized"
    );

    Ok(Generated { api, overlay })
}
