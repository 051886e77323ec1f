//! Emission driver: groups descriptors into output units and hands each
//! unit to an [`Emitter`].
//!
//! Template rendering for a concrete host language lives behind the trait.
//! [`ManifestEmitter`] is the built-in implementation: it writes every unit
//! as a TOML manifest that a template engine (or a reviewer) can consume.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::NamingConfig;
use crate::model::{EnumDescriptor, FuncCategory, FuncDescriptor, NormalizedApi};

/// Stem of the unit holding the status-code enum.
pub const STATUS_CODES_STEM: &str = "status_codes";

/// One output unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmissionUnit<'a> {
    Enum {
        stem: String,
        descriptor: &'a EnumDescriptor,
    },
    /// The status-code enum, which is rendered as a table of result codes
    /// rather than as an ordinary enum.
    StatusCodes(&'a EnumDescriptor),
    /// Every function of one category, in declaration order.  May be empty.
    Functions {
        category: FuncCategory,
        functions: Vec<&'a FuncDescriptor>,
    },
}

impl EmissionUnit<'_> {
    /// File stem the unit is written under.
    pub fn stem(&self) -> String {
        match self {
            EmissionUnit::Enum { stem, .. } => stem.clone(),
            EmissionUnit::StatusCodes(_) => STATUS_CODES_STEM.to_string(),
            EmissionUnit::Functions { category, .. } => category.stem().to_string(),
        }
    }
}

/// `MSKobjsense_enum` → `enum_objsense`.  Derived from the canonical name,
/// which is unique per header, rather than from the (renamable) binding name.
pub fn enum_stem(c_name: &str, naming: &NamingConfig) -> String {
    let bare = naming.strip_prefix(c_name);
    format!("enum_{}", bare.strip_suffix("_enum").unwrap_or(bare))
}

/// Consumer of output units.
pub trait Emitter {
    fn emit(&mut self, unit: &EmissionUnit<'_>) -> Result<()>;
}

/// Ordered list of output units for one normalized API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionPlan<'a> {
    pub units: Vec<EmissionUnit<'a>>,
}

impl<'a> EmissionPlan<'a> {
    /// Enums first (declaration order, status enum as its own unit), then
    /// one function group per category in [`FuncCategory::ALL`] order.
    /// Skipped enums are left out.
    ///
    /// Fails when two units would be written under the same stem.
    pub fn build(api: &'a NormalizedApi, naming: &NamingConfig) -> Result<Self> {
        let mut units: Vec<EmissionUnit<'a>> = api
            .enums
            .iter()
            .filter(|e| !e.skip)
            .map(|e| {
                if e.c_name == naming.status_enum {
                    EmissionUnit::StatusCodes(e)
                } else {
                    EmissionUnit::Enum {
                        stem: enum_stem(&e.c_name, naming),
                        descriptor: e,
                    }
                }
            })
            .collect();

        for category in FuncCategory::ALL {
            let functions: Vec<&FuncDescriptor> = api
                .functions
                .iter()
                .filter(|f| f.category == category)
                .collect();
            debug!(?category, count = functions.len(), "function group");
            units.push(EmissionUnit::Functions {
                category,
                functions,
            });
        }

        let mut stems = HashSet::new();
        for unit in &units {
            let stem = unit.stem();
            if !stems.insert(stem.clone()) {
                bail!("two output units share the file stem `{stem}`");
            }
        }

        Ok(Self { units })
    }

    /// Feed every unit to `emitter`, stopping at the first failure.
    pub fn emit_all(&self, emitter: &mut dyn Emitter) -> Result<usize> {
        for unit in &self.units {
            emitter
                .emit(unit)
                .with_context(|| format!("emitting {}", unit.stem()))?;
        }
        Ok(self.units.len())
    }
}

#[derive(Serialize)]
struct EnumManifest<'a> {
    kind: &'static str,
    #[serde(rename = "enum")]
    descriptor: &'a EnumDescriptor,
}

#[derive(Serialize)]
struct FunctionManifest<'a> {
    kind: &'static str,
    category: FuncCategory,
    #[serde(rename = "function")]
    functions: &'a [&'a FuncDescriptor],
}

/// Render a unit as a TOML manifest.
pub fn render_manifest(unit: &EmissionUnit<'_>) -> Result<String> {
    let text = match unit {
        EmissionUnit::Enum { descriptor, .. } => toml::to_string(&EnumManifest {
            kind: "enum",
            descriptor,
        })?,
        EmissionUnit::StatusCodes(e) => toml::to_string(&EnumManifest {
            kind: "status_codes",
            descriptor: e,
        })?,
        EmissionUnit::Functions {
            category,
            functions,
        } => toml::to_string(&FunctionManifest {
            kind: "functions",
            category: *category,
            functions,
        })?,
    };
    Ok(text)
}

/// Writes each unit to `<dir>/<stem>.toml`.
#[derive(Debug)]
pub struct ManifestEmitter {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl ManifestEmitter {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            written: Vec::new(),
        })
    }

    /// Files written so far, in emission order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl Emitter for ManifestEmitter {
    fn emit(&mut self, unit: &EmissionUnit<'_>) -> Result<()> {
        let text = render_manifest(unit)?;
        let path = self.dir.join(format!("{}.toml", unit.stem()));
        std::fs::write(&path, &text)
            .with_context(|| format!("writing output to {}", path.display()))?;
        info!(path = %path.display(), size = text.len(), "wrote unit");
        self.written.push(path);
        Ok(())
    }
}
