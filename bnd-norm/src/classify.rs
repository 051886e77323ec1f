//! Function and parameter classification.
//!
//! Three ordered rule tables drive the shape of a generated binding:
//! which output group a function lands in, how many trailing parameters are
//! outputs when the overlay does not say, and the role of every parameter.
//! Each table is first-match-wins; order is part of the configuration.

use crate::config::NamingConfig;
use crate::error::NormalizeError;
use crate::model::{FuncCategory, ParamDecl, ParamRole};
use crate::segment::Segments;
use crate::types::parse_c_type;

/// The handle a function is attached to, detected from its first parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    Env,
    Task,
}

impl Receiver {
    fn role(self) -> ParamRole {
        match self {
            Receiver::Env => ParamRole::ReceiverEnv,
            Receiver::Task => ParamRole::ReceiverTask,
        }
    }
}

/// Receiver of a function: its first parameter, when that parameter is
/// exactly the env or task handle type.
pub fn receiver_of(params: &[ParamDecl], naming: &NamingConfig) -> Option<Receiver> {
    let first = params.first()?.ty.trim();
    if first == naming.env_type {
        Some(Receiver::Env)
    } else if first == naming.task_type {
        Some(Receiver::Task)
    } else {
        None
    }
}

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct FuncShape<'a> {
    pub segments: &'a Segments,
    pub receiver: Option<Receiver>,
    pub params: &'a [ParamDecl],
}

impl FuncShape<'_> {
    fn action(&self) -> &str {
        &self.segments.action
    }

    fn suffix(&self) -> &str {
        &self.segments.suffix
    }

    fn is_task(&self) -> bool {
        self.receiver == Some(Receiver::Task)
    }

    fn suffix_in(&self, options: &[&str]) -> bool {
        options.contains(&self.suffix())
    }
}

const LIST_OR_SLICE: &[&str] = &["List", "List64", "Slice", "SliceConst"];
const NUM_NZ: &[&str] = &["NumNz", "NumNz64"];

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

struct CategoryRule {
    category: FuncCategory,
    matches: fn(&FuncShape<'_>) -> bool,
}

const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: FuncCategory::Env,
        matches: |f| f.receiver == Some(Receiver::Env),
    },
    CategoryRule {
        category: FuncCategory::TaskPutMaxNum,
        matches: |f| f.is_task() && f.action() == "PutMaxNum",
    },
    CategoryRule {
        category: FuncCategory::TaskSliceTrip,
        matches: |f| f.is_task() && f.suffix() == "SliceTrip",
    },
    CategoryRule {
        category: FuncCategory::TaskName,
        matches: |f| f.is_task() && f.suffix_in(&["Name", "NameLen"]),
    },
    CategoryRule {
        category: FuncCategory::TaskGetNumNz,
        matches: |f| f.is_task() && f.action() == "Get" && f.suffix_in(NUM_NZ),
    },
    CategoryRule {
        category: FuncCategory::TaskAppendDomain,
        matches: |f| f.is_task() && f.action() == "Append" && f.suffix() == "Domain",
    },
    CategoryRule {
        category: FuncCategory::TaskAppend,
        matches: |f| f.is_task() && f.action() == "Append",
    },
    CategoryRule {
        category: FuncCategory::TaskGetListOrSlice,
        matches: |f| f.is_task() && f.action() == "Get" && f.suffix_in(LIST_OR_SLICE),
    },
    CategoryRule {
        category: FuncCategory::TaskGet,
        matches: |f| f.is_task() && f.action() == "Get",
    },
    CategoryRule {
        category: FuncCategory::TaskGetNum,
        matches: |f| f.is_task() && f.action() == "GetNum",
    },
    CategoryRule {
        category: FuncCategory::TaskPutListOrSlice,
        matches: |f| f.is_task() && f.action() == "Put" && f.suffix_in(LIST_OR_SLICE),
    },
    CategoryRule {
        category: FuncCategory::TaskPut,
        matches: |f| f.is_task() && f.action() == "Put",
    },
    CategoryRule {
        category: FuncCategory::TaskOther,
        matches: |f| f.is_task(),
    },
];

pub fn categorize(shape: &FuncShape<'_>) -> FuncCategory {
    CATEGORY_RULES
        .iter()
        .find(|r| (r.matches)(shape))
        .map(|r| r.category)
        .unwrap_or(FuncCategory::Other)
}

// ---------------------------------------------------------------------------
// Implied trailing outputs
// ---------------------------------------------------------------------------

struct OutputRule {
    implied: usize,
    matches: fn(&FuncShape<'_>) -> bool,
}

/// Name shapes whose last parameter is an output even without an overlay
/// entry: count queries, name and name-length queries, domain appends.
const OUTPUT_RULES: &[OutputRule] = &[
    OutputRule {
        implied: 1,
        matches: |f| f.action() == "GetNum",
    },
    OutputRule {
        implied: 1,
        matches: |f| f.action() == "GetMaxNum",
    },
    OutputRule {
        implied: 1,
        matches: |f| f.is_task() && f.action() == "Append" && f.suffix() == "Domain",
    },
    OutputRule {
        implied: 1,
        matches: |f| f.action() == "Get" && f.suffix_in(NUM_NZ),
    },
    OutputRule {
        implied: 1,
        matches: |f| f.action() == "Get" && f.suffix() == "NameLen",
    },
    OutputRule {
        implied: 1,
        matches: |f| f.action() == "Get" && f.suffix() == "Name",
    },
    OutputRule {
        implied: 1,
        matches: |f| {
            f.action().is_empty()
                && f.suffix() == "ToStr"
                && f.params.last().is_some_and(|p| is_string_buffer(&p.ty))
        },
    },
];

/// Trailing output count implied by the function's shape.  Nothing is
/// implied for a function whose only parameter is its receiver.
pub fn implied_output_count(shape: &FuncShape<'_>) -> usize {
    if shape.params.len() <= usize::from(shape.receiver.is_some()) {
        return 0;
    }
    OUTPUT_RULES
        .iter()
        .find(|r| (r.matches)(shape))
        .map(|r| r.implied)
        .unwrap_or(0)
}

fn is_string_buffer(raw: &str) -> bool {
    let t = parse_c_type(raw);
    t.is_mutable_pointer() && t.base == "char"
}

// ---------------------------------------------------------------------------
// Parameter roles
// ---------------------------------------------------------------------------

/// Check that `output_count` trailing parameters exist after the receiver.
pub fn check_output_window(
    function: &str,
    params: &[ParamDecl],
    receiver: Option<Receiver>,
    output_count: usize,
) -> Result<(), NormalizeError> {
    let available = params.len() - usize::from(receiver.is_some());
    if output_count > available {
        return Err(NormalizeError::OutputWindow {
            function: function.to_string(),
            count: output_count,
            available,
        });
    }
    Ok(())
}

/// Role of the parameter at `index`.  Depends only on its position, its
/// raw type, the receiver and the output count.
///
/// Fails when an output slot holds something the callee cannot write
/// through (a `const` pointer or a non-pointer).
pub fn assign_role(
    function: &str,
    index: usize,
    params: &[ParamDecl],
    receiver: Option<Receiver>,
    output_count: usize,
    naming: &NamingConfig,
) -> Result<ParamRole, NormalizeError> {
    if index == 0
        && let Some(r) = receiver
    {
        return Ok(r.role());
    }
    let param = &params[index];
    if index < params.len() - output_count {
        return Ok(ParamRole::Input);
    }

    let ty = parse_c_type(&param.ty);
    if !ty.is_mutable_pointer() {
        return Err(NormalizeError::OutputNotPointer {
            function: function.to_string(),
            param: param.name.clone(),
            ty: param.ty.clone(),
        });
    }
    Ok(if ty.base == "char" {
        ParamRole::StringOutput
    } else if ty.base == naming.bool_type {
        ParamRole::BoolOutput
    } else {
        ParamRole::PointerOutput
    })
}
