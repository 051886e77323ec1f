//! Declaration model and binding descriptors: the bridge between header
//! extraction and template emission.
//!
//! The declaration types mirror what the extraction step dumps (plain strings,
//! extraction order preserved). The descriptor types are what the normalizer
//! produces for the emission driver. Neither side knows about the other's
//! file formats, which keeps the normalizer testable in isolation.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Declaration model (input)
// ---------------------------------------------------------------------------

/// Everything extracted from one C header.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Header {
    #[serde(default, rename = "enum")]
    pub enums: Vec<EnumDecl>,
    #[serde(default, rename = "typedef")]
    pub typedefs: Vec<TypedefEdge>,
    #[serde(default, rename = "function")]
    pub functions: Vec<FunctionDecl>,
}

impl Header {
    pub fn find_enum(&self, name: &str) -> Option<&EnumDecl> {
        self.enums.iter().find(|e| e.name == name)
    }
}

/// A C enum declaration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    /// Underlying integer type as spelled by clang (e.g. `int`, `unsigned int`).
    #[serde(default)]
    pub integer_type: String,
    #[serde(default, rename = "constant")]
    pub constants: Vec<EnumConstant>,
}

/// A single enum constant. The value is kept as literal text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnumConstant {
    pub name: String,
    pub value: String,
}

/// `typedef <underlying> <alias>;`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TypedefEdge {
    pub alias: String,
    pub underlying: String,
}

/// A C function declaration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default = "default_return_type")]
    pub return_type: String,
    #[serde(default, rename = "param")]
    pub params: Vec<ParamDecl>,
}

fn default_return_type() -> String {
    "void".to_string()
}

/// A function parameter with its raw type spelling (e.g. `const char *`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl ParamDecl {
    pub fn new(name: &str, ty: &str) -> Self {
        Self {
            name: name.to_string(),
            ty: ty.to_string(),
        }
    }
}

/// Load a header dump produced by the extraction step.
pub fn load_header(path: &Path) -> anyhow::Result<Header> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read header dump {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("failed to parse header dump {}", path.display()))
}

// ---------------------------------------------------------------------------
// Binding descriptors (output)
// ---------------------------------------------------------------------------

/// The role a parameter plays in the generated signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamRole {
    /// First parameter is the task (session) handle.
    ReceiverTask,
    /// First parameter is the environment handle.
    ReceiverEnv,
    Input,
    /// Trailing `char *` written by the callee.
    StringOutput,
    /// Trailing pointer to the library boolean type.
    BoolOutput,
    /// Any other trailing pointer written by the callee.
    PointerOutput,
}

impl ParamRole {
    pub fn is_receiver(self) -> bool {
        matches!(self, ParamRole::ReceiverTask | ParamRole::ReceiverEnv)
    }

    pub fn is_output(self) -> bool {
        matches!(
            self,
            ParamRole::StringOutput | ParamRole::BoolOutput | ParamRole::PointerOutput
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamDescriptor {
    pub name: String,
    /// Type exactly as declared in the header.
    pub c_type: String,
    /// Mapped binding type, without pointer/const. Empty when unmapped.
    pub binding_type: String,
    pub is_pointer: bool,
    pub is_const: bool,
    pub role: ParamRole,
}

/// Output grouping for functions. Each category becomes one emission unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FuncCategory {
    Other,
    Env,
    TaskPut,
    TaskGet,
    TaskName,
    TaskGetNum,
    TaskGetNumNz,
    TaskSliceTrip,
    TaskAppend,
    TaskAppendDomain,
    TaskGetListOrSlice,
    TaskPutListOrSlice,
    TaskPutMaxNum,
    TaskOther,
}

impl FuncCategory {
    /// All categories in emission order.
    pub const ALL: [FuncCategory; 14] = [
        FuncCategory::Other,
        FuncCategory::Env,
        FuncCategory::TaskPut,
        FuncCategory::TaskGet,
        FuncCategory::TaskName,
        FuncCategory::TaskGetNum,
        FuncCategory::TaskGetNumNz,
        FuncCategory::TaskSliceTrip,
        FuncCategory::TaskAppend,
        FuncCategory::TaskAppendDomain,
        FuncCategory::TaskGetListOrSlice,
        FuncCategory::TaskPutListOrSlice,
        FuncCategory::TaskPutMaxNum,
        FuncCategory::TaskOther,
    ];

    /// Stable file stem for the category's output unit.
    pub fn stem(self) -> &'static str {
        match self {
            FuncCategory::Other => "other_funcs",
            FuncCategory::Env => "env",
            FuncCategory::TaskPut => "task_put",
            FuncCategory::TaskGet => "task_get",
            FuncCategory::TaskName => "task_name",
            FuncCategory::TaskGetNum => "task_getnum",
            FuncCategory::TaskGetNumNz => "task_getnumnz",
            FuncCategory::TaskSliceTrip => "task_slicetrip",
            FuncCategory::TaskAppend => "task_append",
            FuncCategory::TaskAppendDomain => "task_appenddomain",
            FuncCategory::TaskGetListOrSlice => "task_getlist_or_slice",
            FuncCategory::TaskPutListOrSlice => "task_putlist_or_slice",
            FuncCategory::TaskPutMaxNum => "task_putmaxnum",
            FuncCategory::TaskOther => "task_other",
        }
    }

    pub fn is_task(self) -> bool {
        !matches!(self, FuncCategory::Other | FuncCategory::Env)
    }
}

/// Normalized binding for one C function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FuncDescriptor {
    pub c_name: String,
    pub binding_name: String,
    pub comment: Vec<String>,
    pub deprecated: bool,
    pub url: String,
    pub category: FuncCategory,
    /// Number of trailing parameters written by the callee.
    pub output_count: usize,
    /// Mapped return type. Empty means nothing beyond the status code.
    pub return_type: String,
    #[serde(rename = "param")]
    pub params: Vec<ParamDescriptor>,
}

impl FuncDescriptor {
    pub fn receiver(&self) -> Option<&ParamDescriptor> {
        self.params.first().filter(|p| p.role.is_receiver())
    }

    pub fn outputs(&self) -> &[ParamDescriptor] {
        &self.params[self.params.len() - self.output_count..]
    }
}

/// Normalized binding for one C enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDescriptor {
    pub c_name: String,
    pub binding_name: String,
    /// Binding integer width (`int32` / `uint32` unless overridden).
    pub integer_type: String,
    pub skip: bool,
    pub deprecated: bool,
    /// Alias of the integer type rather than a distinct type.
    pub is_equal_type: bool,
    pub url: String,
    pub comment: Vec<String>,
    /// C constant name → comment.
    pub constant_comments: BTreeMap<String, String>,
    #[serde(rename = "constant")]
    pub constants: Vec<EnumConstant>,
}

/// Result of one normalization pass, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedApi {
    pub enums: Vec<EnumDescriptor>,
    pub functions: Vec<FuncDescriptor>,
}

impl NormalizedApi {
    pub fn function(&self, c_name: &str) -> Option<&FuncDescriptor> {
        self.functions.iter().find(|f| f.c_name == c_name)
    }

    pub fn enum_descriptor(&self, c_name: &str) -> Option<&EnumDescriptor> {
        self.enums.iter().find(|e| e.c_name == c_name)
    }
}

/// Split a multi-line comment into lines; an empty comment has no lines.
pub fn comment_lines(comment: &str) -> Vec<String> {
    if comment.is_empty() {
        return Vec::new();
    }
    comment.split('\n').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_parses_from_toml() {
        let header: Header = toml::from_str(
            r#"
            [[enum]]
            name = "MSKsense_enum"
            integer_type = "int"
            constant = [{ name = "MSK_MIN", value = "0" }, { name = "MSK_MAX", value = "1" }]

            [[typedef]]
            alias = "MSKsensee"
            underlying = "enum MSKsense_enum"

            [[function]]
            name = "MSK_getnumvar"
            return_type = "MSKrescodee"
            param = [
              { name = "task", type = "MSKtask_t" },
              { name = "numvar", type = "MSKint32t *" },
            ]
            "#,
        )
        .unwrap();

        assert_eq!(header.enums[0].constants[1].name, "MSK_MAX");
        assert_eq!(header.typedefs[0].underlying, "enum MSKsense_enum");
        assert_eq!(header.functions[0].params[1].ty, "MSKint32t *");
        assert!(header.find_enum("MSKsense_enum").is_some());
        assert!(header.find_enum("MSKother_enum").is_none());
    }

    #[test]
    fn missing_return_type_defaults_to_void() {
        let header: Header = toml::from_str(
            r#"
            [[function]]
            name = "MSK_noop"
            "#,
        )
        .unwrap();
        assert_eq!(header.functions[0].return_type, "void");
        assert!(header.functions[0].params.is_empty());
    }

    #[test]
    fn comment_lines_split() {
        assert!(comment_lines("").is_empty());
        assert_eq!(comment_lines("a\n\nb"), vec!["a", "", "b"]);
    }

    #[test]
    fn category_stems_are_unique() {
        let mut stems: Vec<_> = FuncCategory::ALL.iter().map(|c| c.stem()).collect();
        stems.sort();
        stems.dedup();
        assert_eq!(stems.len(), FuncCategory::ALL.len());
    }
}
