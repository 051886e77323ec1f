//! Metadata overlay store: per-declaration overrides keyed by canonical C
//! name, plus the scraped documentation table.
//!
//! The store is read at the start of a run and filled in during
//! normalization: every field the normalizer derives is written back into an
//! empty slot, never over a value that was already there.  Serializing the
//! filled store and feeding it to the next run reproduces the same decisions.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Overrides for one function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FuncOverlay {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub binding_name: String,
    #[serde(skip_serializing_if = "is_false")]
    pub skip: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(skip_serializing_if = "is_false")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Number of trailing output parameters, overriding the implied count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_count: Option<usize>,
}

/// Overrides for one enum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnumOverlay {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub binding_name: String,
    #[serde(skip_serializing_if = "is_false")]
    pub skip: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(skip_serializing_if = "is_false")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub integer_type: String,
    /// Emit the enum as an alias of its integer type instead of a distinct
    /// named type.
    #[serde(skip_serializing_if = "is_false")]
    pub is_equal_type: bool,
    /// C constant name → comment.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub constant_comments: BTreeMap<String, String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// All overlay entries, ordered by name so serialization is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OverlayStore {
    #[serde(default, rename = "enum")]
    pub enums: BTreeMap<String, EnumOverlay>,
    #[serde(default, rename = "function")]
    pub functions: BTreeMap<String, FuncOverlay>,
}

impl OverlayStore {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read overlay {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse overlay {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// The slot for `c_name`, created empty on first use.
    pub fn function_entry(&mut self, c_name: &str) -> &mut FuncOverlay {
        self.functions.entry(c_name.to_string()).or_default()
    }

    pub fn enum_entry(&mut self, c_name: &str) -> &mut EnumOverlay {
        self.enums.entry(c_name.to_string()).or_default()
    }
}

/// Fill `slot` from `value` only if the slot is still empty.
pub fn fill_empty(slot: &mut String, value: impl FnOnce() -> Option<String>) {
    if slot.is_empty()
        && let Some(v) = value()
    {
        *slot = v;
    }
}

/// Scraped documentation: function name → doc URL, plus deprecated names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DocIndex {
    #[serde(default)]
    pub urls: BTreeMap<String, String>,
    #[serde(default)]
    pub deprecated: BTreeSet<String>,
}

impl DocIndex {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read doc table {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse doc table {}", path.display()))
    }

    pub fn url(&self, c_name: &str) -> Option<&str> {
        self.urls.get(c_name).map(String::as_str)
    }

    pub fn is_deprecated(&self, c_name: &str) -> bool {
        self.deprecated.contains(c_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overlay_document() {
        let store = OverlayStore::from_toml_str(
            r#"
            [function.MSK_getnumvar]
            binding_name = "NumVariables"
            output_count = 1

            [function.MSK_linkfiletotaskstream]
            skip = true

            [enum.MSKsense_enum]
            comment = "objective sense"
            is_equal_type = true
            constant_comments = { MSK_SENSE_MIN = "minimize" }
            "#,
        )
        .unwrap();

        let f = &store.functions["MSK_getnumvar"];
        assert_eq!(f.binding_name, "NumVariables");
        assert_eq!(f.output_count, Some(1));
        assert!(store.functions["MSK_linkfiletotaskstream"].skip);
        assert!(store.enums["MSKsense_enum"].is_equal_type);
        assert_eq!(
            store.enums["MSKsense_enum"].constant_comments["MSK_SENSE_MIN"],
            "minimize"
        );
    }

    #[test]
    fn serialization_skips_empty_fields() {
        let mut store = OverlayStore::default();
        store.function_entry("MSK_optimize").binding_name = "Optimize".into();
        store.enum_entry("MSKsense_enum");

        let text = store.to_toml().unwrap();
        assert!(text.contains("binding_name = \"Optimize\""), "{text}");
        assert!(!text.contains("skip"), "{text}");
        assert!(!text.contains("output_count"), "{text}");
        assert!(!text.contains("is_equal_type"), "{text}");

        let back = OverlayStore::from_toml_str(&text).unwrap();
        assert_eq!(back, store);
    }

    #[test]
    fn fill_empty_never_overwrites() {
        let mut slot = String::from("explicit");
        fill_empty(&mut slot, || Some("derived".into()));
        assert_eq!(slot, "explicit");

        let mut slot = String::new();
        fill_empty(&mut slot, || None);
        assert!(slot.is_empty());
        fill_empty(&mut slot, || Some("derived".into()));
        assert_eq!(slot, "derived");
    }

    #[test]
    fn doc_index_lookups() {
        let docs: DocIndex = toml::from_str(
            r#"
            deprecated = ["MSK_putnadouparam"]

            [urls]
            MSK_optimize = "https://example.invalid/capi#optimize"
            "#,
        )
        .unwrap();
        assert_eq!(
            docs.url("MSK_optimize"),
            Some("https://example.invalid/capi#optimize")
        );
        assert!(docs.url("MSK_other").is_none());
        assert!(docs.is_deprecated("MSK_putnadouparam"));
        assert!(!docs.is_deprecated("MSK_optimize"));
    }
}
