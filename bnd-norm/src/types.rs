//! Type mapping: raw C type spelling → binding type name.
//!
//! The table starts from a fixed base (fixed-width integers, floating point,
//! `char`, the library boolean and status-code types), then grows during a
//! normalization pass: every enum registers itself, then typedef aliases are
//! resolved against whatever is already known.  Entries are never replaced
//! once written.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::config::NamingConfig;
use crate::model::TypedefEdge;

/// Primitive mappings every run starts from.
const BASE_TABLE: &[(&str, &str)] = &[
    ("int8_t", "int8"),
    ("int16_t", "int16"),
    ("int32_t", "int32"),
    ("int64_t", "int64"),
    ("uint8_t", "uint8"),
    ("uint16_t", "uint16"),
    ("uint32_t", "uint32"),
    ("uint64_t", "uint64"),
    ("int", "int32"),
    ("unsigned int", "uint32"),
    ("long long", "int64"),
    ("size_t", "uint64"),
    ("float", "float32"),
    ("double", "float64"),
    ("char", "byte"),
];

/// A raw C type split into its base name and qualifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedType {
    /// Bare type name with pointer, `const`, and `enum`/`struct` removed.
    pub base: String,
    pub is_pointer: bool,
    pub is_const: bool,
}

impl ParsedType {
    /// A `T *` that the callee may write through.
    pub fn is_mutable_pointer(&self) -> bool {
        self.is_pointer && !self.is_const
    }
}

/// Split a raw type such as `const struct foo *`.  Only one trailing pointer
/// level is removed; `char **` keeps `char *` as its base.
pub fn parse_c_type(raw: &str) -> ParsedType {
    let mut ty = raw.trim();
    let is_pointer = match ty.strip_suffix('*') {
        Some(rest) => {
            ty = rest.trim_end();
            true
        }
        None => false,
    };
    let is_const = match ty.strip_prefix("const ") {
        Some(rest) => {
            ty = rest.trim_start();
            true
        }
        None => false,
    };
    ParsedType {
        base: strip_type_keyword(ty).to_string(),
        is_pointer,
        is_const,
    }
}

/// Remove a leading `enum ` or `struct ` keyword.
pub fn strip_type_keyword(ty: &str) -> &str {
    ty.strip_prefix("enum ")
        .or_else(|| ty.strip_prefix("struct "))
        .unwrap_or(ty)
}

/// C type name → binding type name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMapper {
    types: HashMap<String, String>,
}

impl TypeMapper {
    /// Seed a mapper with the base table, the library's own boolean and
    /// status types, and any extra entries from the config.
    pub fn with_base_table(naming: &NamingConfig, extra: &BTreeMap<String, String>) -> Self {
        let mut types: HashMap<String, String> = BASE_TABLE
            .iter()
            .map(|(c, b)| (c.to_string(), b.to_string()))
            .collect();
        types.insert(naming.bool_type.clone(), "bool".to_string());
        types.insert(naming.status_type.clone(), naming.status_binding.clone());
        for (c, b) in extra {
            types.insert(c.clone(), b.clone());
        }
        Self { types }
    }

    /// Register `c_name`.  An existing entry is kept; a conflicting one is
    /// reported and `false` returned.
    pub fn register(&mut self, c_name: &str, binding: &str) -> bool {
        match self.types.get(c_name) {
            Some(existing) if existing == binding => true,
            Some(existing) => {
                warn!(
                    name = c_name,
                    existing = existing.as_str(),
                    rejected = binding,
                    "type mapping collision, keeping the first entry"
                );
                false
            }
            None => {
                self.types.insert(c_name.to_string(), binding.to_string());
                true
            }
        }
    }

    pub fn contains(&self, c_name: &str) -> bool {
        self.types.contains_key(c_name)
    }

    pub fn get(&self, c_name: &str) -> Option<&str> {
        self.types.get(c_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Map a raw type after stripping qualifiers.
    pub fn resolve(&self, raw: &str) -> (ParsedType, Option<&str>) {
        let parsed = parse_c_type(raw);
        let mapped = self.get(&parsed.base);
        (parsed, mapped)
    }

    /// Resolve typedef aliases against the table, repeating until a pass
    /// makes no progress so that alias-of-alias chains settle regardless of
    /// declaration order.  Aliases that are already keys are left alone.
    ///
    /// Returns the aliases that could not be resolved; each one is logged.
    pub fn resolve_typedefs(&mut self, edges: &[TypedefEdge]) -> Vec<String> {
        let mut pending: Vec<&TypedefEdge> =
            edges.iter().filter(|e| !self.contains(&e.alias)).collect();
        let mut passes = 0usize;
        loop {
            passes += 1;
            let before = pending.len();
            pending.retain(|edge| {
                if self.types.contains_key(&edge.alias) {
                    return false;
                }
                let target = strip_type_keyword(edge.underlying.trim());
                match self.types.get(target).cloned() {
                    Some(mapped) => {
                        debug!(
                            alias = %edge.alias,
                            underlying = target,
                            mapped = %mapped,
                            "resolved typedef"
                        );
                        self.types.insert(edge.alias.clone(), mapped);
                        false
                    }
                    None => true,
                }
            });
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }
        debug!(passes, unresolved = pending.len(), "typedef resolution settled");
        for edge in &pending {
            warn!(
                alias = %edge.alias,
                underlying = %edge.underlying,
                "cannot find mapping for typedef"
            );
        }
        pending.into_iter().map(|e| e.alias.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(alias: &str, underlying: &str) -> TypedefEdge {
        TypedefEdge {
            alias: alias.to_string(),
            underlying: underlying.to_string(),
        }
    }

    fn mapper() -> TypeMapper {
        TypeMapper::with_base_table(&NamingConfig::default(), &BTreeMap::new())
    }

    #[test]
    fn parse_strips_pointer_const_and_keywords() {
        assert_eq!(
            parse_c_type("const char *"),
            ParsedType {
                base: "char".into(),
                is_pointer: true,
                is_const: true
            }
        );
        let p = parse_c_type("enum MSKsense_enum");
        assert_eq!(p.base, "MSKsense_enum");
        assert!(!p.is_pointer && !p.is_const);

        let p = parse_c_type("struct foo*");
        assert_eq!(p.base, "foo");
        assert!(p.is_mutable_pointer());

        assert_eq!(parse_c_type("char **").base, "char *");
        assert_eq!(parse_c_type("unsigned int").base, "unsigned int");
    }

    #[test]
    fn base_table_includes_library_types() {
        let m = mapper();
        assert_eq!(m.get("int32_t"), Some("int32"));
        assert_eq!(m.get("MSKbooleant"), Some("bool"));
        assert_eq!(m.get("MSKrescodee"), Some("ResCode"));
        assert_eq!(m.resolve("const double *").1, Some("float64"));
        assert!(!m.is_empty());
        assert!(TypeMapper::default().is_empty());
    }

    #[test]
    fn extra_entries_override_base() {
        let mut extra = BTreeMap::new();
        extra.insert("char".to_string(), "uint8".to_string());
        let m = TypeMapper::with_base_table(&NamingConfig::default(), &extra);
        assert_eq!(m.get("char"), Some("uint8"));
    }

    #[test]
    fn register_keeps_first_entry() {
        let mut m = mapper();
        assert!(m.register("MSKsense_enum", "Sense"));
        assert!(m.register("MSKsense_enum", "Sense"));
        assert!(!m.register("MSKsense_enum", "Other"));
        assert_eq!(m.get("MSKsense_enum"), Some("Sense"));
    }

    #[test]
    fn typedef_chain_resolves_in_any_order() {
        let mut m = mapper();
        // A → B is listed before B → int, so it needs a second pass.
        let unresolved = m.resolve_typedefs(&[edge("A", "B"), edge("B", "int")]);
        assert!(unresolved.is_empty());
        assert_eq!(m.get("A"), m.get("int"));
        assert_eq!(m.get("B"), Some("int32"));
    }

    #[test]
    fn typedef_through_enum_keyword() {
        let mut m = mapper();
        m.register("MSKsense_enum", "Sense");
        m.resolve_typedefs(&[edge("MSKsensee", "enum MSKsense_enum")]);
        assert_eq!(m.get("MSKsensee"), Some("Sense"));
    }

    #[test]
    fn existing_keys_are_not_overwritten() {
        let mut m = mapper();
        // The status type is in the base table; its typedef must not win.
        m.register("MSKrescode_enum", "Other");
        m.resolve_typedefs(&[edge("MSKrescodee", "enum MSKrescode_enum")]);
        assert_eq!(m.get("MSKrescodee"), Some("ResCode"));
    }

    #[test]
    fn unresolved_aliases_are_reported() {
        let mut m = mapper();
        let unresolved = m.resolve_typedefs(&[
            edge("MSKtask_t", "struct msktaskt *"),
            edge("X", "Y"),
            edge("Y", "MSKtask_t"),
        ]);
        assert_eq!(unresolved, vec!["MSKtask_t", "X", "Y"]);
        assert!(!m.contains("X"));
    }
}
