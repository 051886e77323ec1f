//! Enrichment import: doc comments and names taken from an independent set
//! of Rust bindings for the same native API.
//!
//! The data can come from a TOML document or straight from the Rust source,
//! which is scanned with `syn`: inherent-impl methods on the handle types
//! become function records, every other struct is treated as an enum whose
//! associated integer `const`s are its constants.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use syn::{Attribute, Expr, ImplItem, Item, Lit, Meta, Type, UnOp};
use tracing::{debug, info};

use crate::segment::{strip_namespace, upper_first};

/// Structs in the Rust bindings that are handles, not enums.
const HANDLE_TYPES: &[&str] = &["Env", "Task", "TaskCB"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Enrichment {
    #[serde(default, rename = "function")]
    pub functions: Vec<EnrichedFunction>,
    #[serde(default, rename = "enum")]
    pub enums: Vec<EnrichedEnum>,
}

/// A method of the auxiliary bindings, e.g. `Task::get_num_var`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnrichedFunction {
    /// snake_case method name.
    pub name: String,
    #[serde(default)]
    pub comment: String,
    /// The type the method is attached to (`Task`, `Env`).
    #[serde(default)]
    pub struct_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnrichedEnum {
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default, rename = "constant")]
    pub constants: Vec<EnrichedConstant>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnrichedConstant {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub comment: String,
}

impl EnrichedEnum {
    /// Comment of the first constant whose value equals `value`.
    pub fn comment_for_value(&self, value: &str) -> Option<&str> {
        self.constants
            .iter()
            .find(|c| values_match(&c.value, value))
            .map(|c| c.comment.as_str())
            .filter(|c| !c.is_empty())
    }
}

impl Enrichment {
    /// Load from a `.rs` source file or a TOML document, by extension.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read enrichment {}", path.display()))?;
        let enrichment = if path.extension().is_some_and(|e| e == "rs") {
            Self::from_rust_source(&content)
        } else {
            Self::from_toml_str(&content)
        }
        .with_context(|| format!("failed to parse enrichment {}", path.display()))?;
        info!(
            path = %path.display(),
            functions = enrichment.functions.len(),
            enums = enrichment.enums.len(),
            "loaded enrichment"
        );
        Ok(enrichment)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Scan Rust binding source for doc comments.
    pub fn from_rust_source(code: &str) -> anyhow::Result<Self> {
        let file = syn::parse_file(code).context("invalid Rust source")?;

        let mut enrichment = Enrichment::default();
        let mut enum_slots: HashMap<String, usize> = HashMap::new();

        for item in file.items {
            match item {
                Item::Struct(s) => {
                    let name = s.ident.to_string();
                    if is_handle(&name) || enum_slots.contains_key(&name) {
                        continue;
                    }
                    enum_slots.insert(name.clone(), enrichment.enums.len());
                    enrichment.enums.push(EnrichedEnum {
                        name,
                        comment: doc_comment(&s.attrs),
                        constants: Vec::new(),
                    });
                }
                Item::Impl(block) => {
                    if block.trait_.is_some() {
                        continue;
                    }
                    let Type::Path(path) = block.self_ty.as_ref() else {
                        continue;
                    };
                    let Some(ident) = path.path.get_ident() else {
                        continue;
                    };
                    let name = ident.to_string();
                    if is_handle(&name) {
                        for it in block.items {
                            if let ImplItem::Fn(f) = it {
                                enrichment.functions.push(EnrichedFunction {
                                    name: f.sig.ident.to_string(),
                                    comment: doc_comment(&f.attrs),
                                    struct_name: name.clone(),
                                });
                            }
                        }
                        continue;
                    }
                    let slot = *enum_slots.entry(name.clone()).or_insert_with(|| {
                        enrichment.enums.push(EnrichedEnum {
                            name: name.clone(),
                            ..Default::default()
                        });
                        enrichment.enums.len() - 1
                    });
                    for it in block.items {
                        if let ImplItem::Const(c) = it {
                            enrichment.enums[slot].constants.push(EnrichedConstant {
                                name: c.ident.to_string(),
                                value: integer_literal(&c.expr).unwrap_or_default(),
                                comment: doc_comment(&c.attrs),
                            });
                        }
                    }
                }
                _ => continue,
            }
        }

        Ok(enrichment)
    }

    /// Index the records by the canonical C names they describe.
    pub fn index(&self, prefix: &str) -> EnrichmentIndex<'_> {
        let mut functions: HashMap<String, &EnrichedFunction> = HashMap::new();
        for f in &self.functions {
            let c_name = native_function_name(&f.name, prefix);
            if functions.contains_key(&c_name) {
                debug!(
                    name = %f.name,
                    c_name = %c_name,
                    owner = %f.struct_name,
                    "duplicate enrichment function, keeping first"
                );
                continue;
            }
            functions.insert(c_name, f);
        }
        let mut enums: HashMap<String, &EnrichedEnum> = HashMap::new();
        for e in &self.enums {
            enums.entry(enum_key(&e.name)).or_insert(e);
        }
        EnrichmentIndex {
            prefix: prefix.to_string(),
            functions,
            enums,
        }
    }
}

/// Lookup view over an [`Enrichment`].
#[derive(Debug, Clone, Default)]
pub struct EnrichmentIndex<'a> {
    prefix: String,
    functions: HashMap<String, &'a EnrichedFunction>,
    enums: HashMap<String, &'a EnrichedEnum>,
}

impl<'a> EnrichmentIndex<'a> {
    pub fn function(&self, c_name: &str) -> Option<&'a EnrichedFunction> {
        self.functions.get(c_name).copied()
    }

    /// Enum record for a canonical C enum name such as `MSKsense_enum`.
    pub fn enum_for(&self, c_name: &str) -> Option<&'a EnrichedEnum> {
        let bare = strip_namespace(c_name, &self.prefix);
        let bare = bare.strip_suffix("_enum").unwrap_or(bare);
        self.enums.get(&enum_key(bare)).copied()
    }
}

fn is_handle(name: &str) -> bool {
    HANDLE_TYPES.contains(&name)
}

/// `get_num_var` → `MSK_getnumvar`.
pub fn native_function_name(snake: &str, prefix: &str) -> String {
    let bare = snake.replace('_', "");
    if prefix.is_empty() {
        bare
    } else {
        format!("{prefix}_{bare}")
    }
}

/// `get_num_var` → `GetNumVar`.
pub fn snake_to_camel(snake: &str) -> String {
    snake.split('_').map(upper_first).collect()
}

/// Case- and underscore-insensitive enum key.
fn enum_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Integer literals compare numerically, anything else as trimmed text.
fn values_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    match (integer_value(a), integer_value(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Value of a C or Rust integer literal: optional sign, `0x`/`0o`/`0b` or
/// leading-zero octal, digit separators, and `u`/`l` suffixes.
fn integer_value(text: &str) -> Option<i128> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let body = body.trim_end_matches(['u', 'U', 'l', 'L']);
    let lower = body.to_ascii_lowercase();
    let (radix, digits) = if let Some(d) = lower.strip_prefix("0x") {
        (16, d)
    } else if let Some(d) = lower.strip_prefix("0b") {
        (2, d)
    } else if let Some(d) = lower.strip_prefix("0o") {
        (8, d)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    let digits = digits.replace('_', "");
    if digits.is_empty() {
        return None;
    }
    let value = i128::from_str_radix(&digits, radix).ok()?;
    Some(if negative { -value } else { value })
}

/// Rewrite a rustdoc comment into the plain layout used by the generated
/// bindings: section headings become labels, argument bullets are indented,
/// cross-reference lines are dropped.
pub fn clean_comment(raw: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in raw.split('\n') {
        if line.contains("# Argument") {
            out.push("\nArguments: ".to_string());
        } else if line.starts_with("- `") {
            out.push(format!("  {}", line.replace("_`", "`")));
        } else if line.contains("# Returns") {
            out.push("\nReturns:".to_string());
        } else if line.starts_with("See [") {
            if out.last().is_some_and(|l| l.is_empty()) {
                out.pop();
            }
        } else if line.contains("Full documentation") {
            continue;
        } else {
            out.push(line.to_string());
        }
    }
    out.join("\n")
}

fn doc_comment(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(doc_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn doc_line(attr: &Attribute) -> Option<String> {
    if !attr.path().is_ident("doc") {
        return None;
    }
    let Meta::NameValue(nv) = &attr.meta else {
        return None;
    };
    match &nv.value {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(s) => Some(s.value().trim().to_string()),
            _ => None,
        },
        _ => None,
    }
}

fn integer_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Int(i) => Some(i.base10_digits().to_string()),
            _ => None,
        },
        Expr::Unary(u) if matches!(u.op, UnOp::Neg(_)) => {
            integer_literal(&u.expr).map(|v| format!("-{v}"))
        }
        Expr::Group(g) => integer_literal(&g.expr),
        Expr::Paren(p) => integer_literal(&p.expr),
        _ => None,
    }
}
