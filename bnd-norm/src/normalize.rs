//! The normalization pass: declarations + overlays → binding descriptors.
//!
//! Enums go first so their names are in the type table before typedefs are
//! resolved and before any parameter type is looked up.  Every field of the
//! overlay store is merged independently and written back once:
//!
//! 1. explicit overlay value,
//! 2. enrichment from the auxiliary bindings,
//! 3. the scraped documentation table,
//! 4. heuristic derivation or the configured default.
//!
//! Because the derived values end up in the store, a second pass over the
//! same header with the filled store produces identical descriptors.

use tracing::{debug, info, trace, warn};

use crate::classify::{
    FuncShape, Receiver, assign_role, categorize, check_output_window, implied_output_count,
    receiver_of,
};
use crate::config::NamingConfig;
use crate::enrich::{EnrichmentIndex, clean_comment, snake_to_camel};
use crate::error::NormalizeError;
use crate::model::{
    EnumDecl, EnumDescriptor, FuncDescriptor, FunctionDecl, Header, NormalizedApi, ParamDecl,
    ParamDescriptor, ParamRole, comment_lines,
};
use crate::overlay::{DocIndex, OverlayStore, fill_empty};
use crate::segment::{RuleSet, segment, upper_first};
use crate::types::{TypeMapper, parse_c_type};

/// Read-only inputs of a normalization pass.  The mutable tables (overlay
/// store, type mapper) are passed to [`Normalizer::run`] so that callers
/// own them and can inspect them afterwards.
pub struct Normalizer<'a> {
    naming: &'a NamingConfig,
    rules: &'a RuleSet,
    docs: &'a DocIndex,
    enrichment: EnrichmentIndex<'a>,
}

impl<'a> Normalizer<'a> {
    pub fn new(
        naming: &'a NamingConfig,
        rules: &'a RuleSet,
        docs: &'a DocIndex,
        enrichment: EnrichmentIndex<'a>,
    ) -> Self {
        Self {
            naming,
            rules,
            docs,
            enrichment,
        }
    }

    /// Normalize every declaration of `header`.
    ///
    /// Skipped functions produce no descriptor; skipped enums keep theirs
    /// (with `skip` set) because their type name is still referenced.
    pub fn run(
        &self,
        header: &Header,
        overlay: &mut OverlayStore,
        types: &mut TypeMapper,
    ) -> Result<NormalizedApi, NormalizeError> {
        check_overlay_enums(header, overlay)?;
        for name in overlay.functions.keys() {
            if !header.functions.iter().any(|f| &f.name == name) {
                warn!(name = %name, "overlay configures a function the header does not declare");
            }
        }

        let enums: Vec<EnumDescriptor> = header
            .enums
            .iter()
            .map(|e| self.normalize_enum(e, overlay, types))
            .collect();

        let unresolved = types.resolve_typedefs(&header.typedefs);
        info!(
            enums = enums.len(),
            typedefs = header.typedefs.len(),
            unresolved = unresolved.len(),
            types = types.len(),
            "registered types"
        );

        let mut functions = Vec::with_capacity(header.functions.len());
        let mut skipped = 0usize;
        for decl in &header.functions {
            match self.normalize_function(decl, overlay, types)? {
                Some(f) => functions.push(f),
                None => skipped += 1,
            }
        }
        info!(
            functions = functions.len(),
            skipped,
            "normalized functions"
        );

        Ok(NormalizedApi { enums, functions })
    }

    fn normalize_enum(
        &self,
        decl: &EnumDecl,
        overlay: &mut OverlayStore,
        types: &mut TypeMapper,
    ) -> EnumDescriptor {
        let enriched = self.enrichment.enum_for(&decl.name);
        let entry = overlay.enum_entry(&decl.name);

        fill_empty(&mut entry.binding_name, || {
            Some(self.default_enum_name(&decl.name))
        });
        fill_empty(&mut entry.comment, || {
            enriched
                .map(|e| e.comment.clone())
                .filter(|c| !c.is_empty())
        });
        fill_empty(&mut entry.integer_type, || {
            Some(enum_integer_type(&decl.integer_type).to_string())
        });
        if let Some(enriched) = enriched {
            for constant in &decl.constants {
                if entry.constant_comments.contains_key(&constant.name) {
                    continue;
                }
                if let Some(comment) = enriched.comment_for_value(&constant.value) {
                    entry
                        .constant_comments
                        .insert(constant.name.clone(), comment.to_string());
                }
            }
        }

        types.register(&decl.name, &entry.binding_name);
        debug!(
            name = %decl.name,
            binding = %entry.binding_name,
            constants = decl.constants.len(),
            skip = entry.skip,
            "normalized enum"
        );

        EnumDescriptor {
            c_name: decl.name.clone(),
            binding_name: entry.binding_name.clone(),
            integer_type: entry.integer_type.clone(),
            skip: entry.skip,
            deprecated: entry.deprecated,
            is_equal_type: entry.is_equal_type,
            url: entry.url.clone(),
            comment: comment_lines(&entry.comment),
            constant_comments: entry.constant_comments.clone(),
            constants: decl.constants.clone(),
        }
    }

    /// `MSKsense_enum` → `Sense`; the status enum gets the status binding.
    fn default_enum_name(&self, c_name: &str) -> String {
        if c_name == self.naming.status_enum {
            return self.naming.status_binding.clone();
        }
        let bare = self.naming.strip_prefix(c_name);
        upper_first(bare.strip_suffix("_enum").unwrap_or(bare))
    }

    fn normalize_function(
        &self,
        decl: &FunctionDecl,
        overlay: &mut OverlayStore,
        types: &TypeMapper,
    ) -> Result<Option<FuncDescriptor>, NormalizeError> {
        let entry = overlay.function_entry(&decl.name);
        if entry.skip {
            debug!(name = %decl.name, "skipping function");
            return Ok(None);
        }

        let segments = segment(self.naming.strip_prefix(&decl.name), self.rules);
        let enriched = self.enrichment.function(&decl.name);

        fill_empty(&mut entry.binding_name, || {
            enriched
                .map(|e| snake_to_camel(&e.name))
                .filter(|n| !n.is_empty())
        });
        fill_empty(&mut entry.binding_name, || Some(segments.binding_name()));
        fill_empty(&mut entry.comment, || {
            enriched
                .map(|e| clean_comment(&e.comment))
                .filter(|c| !c.is_empty())
        });
        entry.deprecated |= self.docs.is_deprecated(&decl.name);
        fill_empty(&mut entry.url, || self.docs.url(&decl.name).map(str::to_string));
        fill_empty(&mut entry.url, || Some(self.naming.default_doc_url.clone()));

        let receiver = receiver_of(&decl.params, self.naming);
        let shape = FuncShape {
            segments: &segments,
            receiver,
            params: &decl.params,
        };
        let category = categorize(&shape);
        let output_count = match entry.output_count {
            Some(n) => n,
            None => {
                let implied = implied_output_count(&shape);
                if implied > 0 {
                    entry.output_count = Some(implied);
                }
                implied
            }
        };
        check_output_window(&decl.name, &decl.params, receiver, output_count)?;

        let params = decl
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let role = assign_role(
                    &decl.name,
                    i,
                    &decl.params,
                    receiver,
                    output_count,
                    self.naming,
                )?;
                Ok(param_descriptor(&decl.name, p, role, types))
            })
            .collect::<Result<Vec<_>, NormalizeError>>()?;

        let return_type = return_type(decl, types);
        debug!(
            name = %decl.name,
            binding = %entry.binding_name,
            ?category,
            output_count,
            receiver = ?receiver.map(receiver_label),
            "normalized function"
        );

        Ok(Some(FuncDescriptor {
            c_name: decl.name.clone(),
            binding_name: entry.binding_name.clone(),
            comment: comment_lines(&entry.comment),
            deprecated: entry.deprecated,
            url: entry.url.clone(),
            category,
            output_count,
            return_type,
            params,
        }))
    }
}

/// Every enum the overlay configures must still exist in the header.
fn check_overlay_enums(header: &Header, overlay: &OverlayStore) -> Result<(), NormalizeError> {
    match overlay
        .enums
        .keys()
        .find(|name| header.find_enum(name).is_none())
    {
        Some(name) => Err(NormalizeError::MissingEnum { name: name.clone() }),
        None => Ok(()),
    }
}

/// Binding width of an enum: signed when the C type is plain `int`.
fn enum_integer_type(c_type: &str) -> &'static str {
    if c_type.trim() == "int" {
        "int32"
    } else {
        "uint32"
    }
}

fn receiver_label(r: Receiver) -> &'static str {
    match r {
        Receiver::Env => "env",
        Receiver::Task => "task",
    }
}

fn param_descriptor(
    function: &str,
    param: &ParamDecl,
    role: ParamRole,
    types: &TypeMapper,
) -> ParamDescriptor {
    let parsed = parse_c_type(&param.ty);
    let binding_type = if role.is_receiver() {
        String::new()
    } else {
        match types.get(&parsed.base) {
            Some(b) => b.to_string(),
            None => {
                warn!(
                    function,
                    param = %param.name,
                    ty = %param.ty,
                    "cannot find type mapping for parameter"
                );
                String::new()
            }
        }
    };
    trace!(
        function,
        param = %param.name,
        ty = %param.ty,
        binding = %binding_type,
        ?role,
        "classified parameter"
    );
    ParamDescriptor {
        name: param.name.clone(),
        c_type: param.ty.clone(),
        binding_type,
        is_pointer: parsed.is_pointer,
        is_const: parsed.is_const,
        role,
    }
}

fn return_type(decl: &FunctionDecl, types: &TypeMapper) -> String {
    let raw = decl.return_type.trim();
    if raw == "void" || raw.is_empty() {
        return String::new();
    }
    match types.resolve(raw) {
        (_, Some(b)) => b.to_string(),
        (_, None) => {
            warn!(function = %decl.name, ty = raw, "cannot find type mapping for return type");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::enrich::{EnrichedConstant, EnrichedEnum, EnrichedFunction, Enrichment};
    use crate::model::{EnumConstant, FuncCategory, TypedefEdge};

    fn ns_naming() -> NamingConfig {
        NamingConfig {
            prefix: "NS".into(),
            env_type: "NSenv_t".into(),
            task_type: "NStask_t".into(),
            bool_type: "NSbooleant".into(),
            status_type: "NSrescodee".into(),
            status_enum: "NSrescode_enum".into(),
            status_binding: "ResCode".into(),
            default_doc_url: "https://example.invalid/capi".into(),
        }
    }

    fn func(name: &str, ret: &str, params: &[(&str, &str)]) -> FunctionDecl {
        FunctionDecl {
            name: name.into(),
            return_type: ret.into(),
            params: params.iter().map(|(n, t)| ParamDecl::new(n, t)).collect(),
        }
    }

    fn color_enum() -> EnumDecl {
        EnumDecl {
            name: "NS_color_enum".into(),
            integer_type: "int".into(),
            constants: vec![
                EnumConstant {
                    name: "RED".into(),
                    value: "0".into(),
                },
                EnumConstant {
                    name: "GREEN".into(),
                    value: "1".into(),
                },
            ],
        }
    }

    fn header() -> Header {
        Header {
            enums: vec![
                color_enum(),
                EnumDecl {
                    name: "NSrescode_enum".into(),
                    integer_type: "unsigned int".into(),
                    constants: vec![EnumConstant {
                        name: "NS_RES_OK".into(),
                        value: "0".into(),
                    }],
                },
            ],
            typedefs: vec![
                TypedefEdge {
                    alias: "NSint32t".into(),
                    underlying: "int32_t".into(),
                },
                TypedefEdge {
                    alias: "NScolore".into(),
                    underlying: "enum NS_color_enum".into(),
                },
            ],
            functions: vec![
                func(
                    "NS_gettasknamelen",
                    "NSrescodee",
                    &[("task", "NStask_t"), ("len", "NSint32t *")],
                ),
                func(
                    "NS_putcolor",
                    "NSrescodee",
                    &[("task", "NStask_t"), ("color", "NScolore")],
                ),
                func("NS_makeenv", "NSrescodee", &[("env", "NSenv_t *")]),
            ],
        }
    }

    fn enrichment() -> Enrichment {
        Enrichment {
            functions: vec![EnrichedFunction {
                name: "put_color".into(),
                comment: "Sets the color.\n\nSee [`Task::get_color`]".into(),
                struct_name: "Task".into(),
            }],
            enums: vec![EnrichedEnum {
                name: "Color".into(),
                comment: "Colors.".into(),
                constants: vec![
                    EnrichedConstant {
                        name: "Warm".into(),
                        value: "0".into(),
                        comment: "warm".into(),
                    },
                    EnrichedConstant {
                        name: "Cool".into(),
                        value: "1".into(),
                        comment: String::new(),
                    },
                ],
            }],
        }
    }

    struct Fixture {
        naming: NamingConfig,
        rules: RuleSet,
        docs: DocIndex,
        enrichment: Enrichment,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                naming: ns_naming(),
                rules: RuleSet::current(),
                docs: DocIndex::default(),
                enrichment: enrichment(),
            }
        }

        fn run(
            &self,
            header: &Header,
            overlay: &mut OverlayStore,
        ) -> Result<NormalizedApi, NormalizeError> {
            let mut types = TypeMapper::with_base_table(&self.naming, &BTreeMap::new());
            Normalizer::new(
                &self.naming,
                &self.rules,
                &self.docs,
                self.enrichment.index(&self.naming.prefix),
            )
            .run(header, overlay, &mut types)
        }
    }

    #[test]
    fn task_name_length_query() {
        let fx = Fixture::new();
        let api = fx.run(&header(), &mut OverlayStore::default()).unwrap();

        let f = api.function("NS_gettasknamelen").unwrap();
        assert_eq!(f.binding_name, "GetTaskNameLen");
        assert_eq!(f.category, FuncCategory::TaskName);
        assert_eq!(f.output_count, 1);
        assert_eq!(f.params[0].role, ParamRole::ReceiverTask);
        assert_eq!(f.params[1].role, ParamRole::PointerOutput);
        assert_eq!(f.params[1].binding_type, "int32");
        assert_eq!(f.return_type, "ResCode");
        assert_eq!(f.url, "https://example.invalid/capi");
        assert_eq!(f.outputs().len(), 1);
    }

    #[test]
    fn enum_constant_comments_match_by_value() {
        let fx = Fixture::new();
        let api = fx.run(&header(), &mut OverlayStore::default()).unwrap();

        let e = api.enum_descriptor("NS_color_enum").unwrap();
        assert_eq!(e.binding_name, "Color");
        assert_eq!(e.integer_type, "int32");
        assert_eq!(e.comment, vec!["Colors."]);
        assert_eq!(e.constant_comments.get("RED").map(String::as_str), Some("warm"));
        // Empty enrichment comments are not carried over.
        assert!(!e.constant_comments.contains_key("GREEN"));

        let status = api.enum_descriptor("NSrescode_enum").unwrap();
        assert_eq!(status.binding_name, "ResCode");
        assert_eq!(status.integer_type, "uint32");
    }

    #[test]
    fn enum_types_resolve_through_typedefs() {
        let fx = Fixture::new();
        let api = fx.run(&header(), &mut OverlayStore::default()).unwrap();

        let f = api.function("NS_putcolor").unwrap();
        assert_eq!(f.params[1].binding_type, "Color");
        assert_eq!(f.params[1].role, ParamRole::Input);
        assert_eq!(f.binding_name, "PutColor");
        assert_eq!(f.comment, vec!["Sets the color."]);
        assert_eq!(f.category, FuncCategory::TaskPut);
    }

    #[test]
    fn explicit_overlay_dominates_enrichment_and_heuristics() {
        let fx = Fixture::new();
        let mut overlay = OverlayStore::default();
        overlay.function_entry("NS_putcolor").binding_name = "SetColour".into();
        overlay.function_entry("NS_putcolor").url = "https://example.invalid/own".into();
        overlay
            .enum_entry("NS_color_enum")
            .constant_comments
            .insert("RED".into(), "explicit".into());

        let api = fx.run(&header(), &mut overlay).unwrap();
        let f = api.function("NS_putcolor").unwrap();
        assert_eq!(f.binding_name, "SetColour");
        assert_eq!(f.url, "https://example.invalid/own");
        // The comment still comes from enrichment; fields merge independently.
        assert_eq!(f.comment, vec!["Sets the color."]);

        let e = api.enum_descriptor("NS_color_enum").unwrap();
        assert_eq!(e.constant_comments["RED"], "explicit");
    }

    #[test]
    fn docs_supply_url_and_deprecation() {
        let mut fx = Fixture::new();
        fx.docs
            .urls
            .insert("NS_makeenv".into(), "https://example.invalid/makeenv".into());
        fx.docs.deprecated.insert("NS_makeenv".into());

        let api = fx.run(&header(), &mut OverlayStore::default()).unwrap();
        let f = api.function("NS_makeenv").unwrap();
        assert_eq!(f.url, "https://example.invalid/makeenv");
        assert!(f.deprecated);
        // `NSenv_t *` is not the handle type itself, so there is no receiver.
        assert_eq!(f.category, FuncCategory::Other);
        assert_eq!(f.output_count, 0);
    }

    #[test]
    fn rerun_with_filled_overlay_is_identical() {
        let fx = Fixture::new();
        let mut overlay = OverlayStore::default();
        let first = fx.run(&header(), &mut overlay).unwrap();

        assert_eq!(overlay.functions["NS_gettasknamelen"].output_count, Some(1));
        assert_eq!(overlay.functions["NS_putcolor"].output_count, None);
        assert_eq!(overlay.enums["NS_color_enum"].binding_name, "Color");

        let saved = overlay.to_toml().unwrap();
        let mut reloaded = OverlayStore::from_toml_str(&saved).unwrap();
        let second = fx.run(&header(), &mut reloaded).unwrap();
        assert_eq!(first, second);
        assert_eq!(reloaded, overlay);
    }

    #[test]
    fn skipped_declarations() {
        let fx = Fixture::new();
        let mut overlay = OverlayStore::default();
        overlay.function_entry("NS_makeenv").skip = true;
        overlay.enum_entry("NS_color_enum").skip = true;

        let api = fx.run(&header(), &mut overlay).unwrap();
        assert!(api.function("NS_makeenv").is_none());
        assert!(overlay.functions["NS_makeenv"].skip);
        assert!(overlay.functions["NS_makeenv"].binding_name.is_empty());

        let e = api.enum_descriptor("NS_color_enum").unwrap();
        assert!(e.skip);
        // A skipped enum still names its type.
        let f = api.function("NS_putcolor").unwrap();
        assert_eq!(f.params[1].binding_type, "Color");
    }

    #[test]
    fn explicit_output_count_overrides_inference() {
        let fx = Fixture::new();
        let mut h = header();
        h.functions.push(func(
            "NS_getcolorpair",
            "NSrescodee",
            &[
                ("task", "NStask_t"),
                ("index", "NSint32t"),
                ("first", "NScolore *"),
                ("second", "NScolore *"),
            ],
        ));
        let mut overlay = OverlayStore::default();
        overlay.function_entry("NS_getcolorpair").output_count = Some(2);

        let api = fx.run(&h, &mut overlay).unwrap();
        let f = api.function("NS_getcolorpair").unwrap();
        let roles: Vec<_> = f.params.iter().map(|p| p.role).collect();
        assert_eq!(
            roles,
            vec![
                ParamRole::ReceiverTask,
                ParamRole::Input,
                ParamRole::PointerOutput,
                ParamRole::PointerOutput
            ]
        );
        assert_eq!(f.params[2].binding_type, "Color");
    }

    #[test]
    fn overlay_enum_missing_from_header_is_fatal() {
        let fx = Fixture::new();
        let mut overlay = OverlayStore::default();
        overlay.enum_entry("NS_shape_enum").binding_name = "Shape".into();

        let err = fx.run(&header(), &mut overlay).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::MissingEnum {
                name: "NS_shape_enum".into()
            }
        );
    }

    #[test]
    fn const_output_slot_is_fatal() {
        let fx = Fixture::new();
        let mut h = header();
        h.functions.push(func(
            "NS_getnumcolors",
            "NSrescodee",
            &[("task", "NStask_t"), ("num", "const NSint32t *")],
        ));
        let err = fx.run(&h, &mut OverlayStore::default()).unwrap_err();
        assert!(
            err.to_string().contains("NS_getnumcolors"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn unmapped_types_degrade_to_empty() {
        let fx = Fixture::new();
        let mut h = header();
        h.functions.push(func(
            "NS_putcallback",
            "NSopaque",
            &[("task", "NStask_t"), ("cb", "NScallbackfunc")],
        ));
        let api = fx.run(&h, &mut OverlayStore::default()).unwrap();
        let f = api.function("NS_putcallback").unwrap();
        assert_eq!(f.params[1].binding_type, "");
        assert_eq!(f.return_type, "");
    }

    #[test]
    fn receiver_only_count_query_has_no_outputs() {
        let fx = Fixture::new();
        let mut h = header();
        h.functions
            .push(func("NS_getnumthreads", "NSrescodee", &[("task", "NStask_t")]));
        let mut overlay = OverlayStore::default();

        let api = fx.run(&h, &mut overlay).unwrap();
        let f = api.function("NS_getnumthreads").unwrap();
        assert_eq!(f.output_count, 0);
        assert!(f.outputs().is_empty());
        assert_eq!(f.receiver().map(|p| p.role), Some(ParamRole::ReceiverTask));
        assert_eq!(overlay.functions["NS_getnumthreads"].output_count, None);
    }

    #[test]
    fn equal_type_flag_is_carried_through() {
        let fx = Fixture::new();
        let mut overlay = OverlayStore::default();
        overlay.enum_entry("NS_color_enum").is_equal_type = true;

        let api = fx.run(&header(), &mut overlay).unwrap();
        assert!(api.enum_descriptor("NS_color_enum").unwrap().is_equal_type);
        assert!(!api.enum_descriptor("NSrescode_enum").unwrap().is_equal_type);

        let saved = overlay.to_toml().unwrap();
        assert_eq!(saved.matches("is_equal_type = true").count(), 1, "{saved}");
    }
}
