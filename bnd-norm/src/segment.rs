//! Identifier segmentation: `getnumvar` → (`GetNum`, `var`, ``).
//!
//! A C function name (namespace prefix already stripped) is split into an
//! action verb, a middle segment and a suffix by scanning two ranked tables.
//! Both scans are first-match, not longest-match: table order is the only
//! disambiguation, so more specific literals are listed before the generic
//! ones they start (or end) with.  Reordering an entry changes generated
//! names; re-derive every binding name before touching the tables.

/// Bumped whenever an entry is added, removed or moved in the tables below.
pub const RULES_VERSION: u32 = 2;

/// (C literal, canonical spelling) in match order.
const ACTIONS: &[(&str, &str)] = &[
    ("getmaxnum", "GetMaxNum"),
    ("putmaxnum", "PutMaxNum"),
    ("checkOut", "CheckOut"),
    ("evaluate", "Evaluate"),
    ("checkin", "CheckIn"),
    ("analyze", "Analyze"),
    ("getnum", "GetNum"),
    ("append", "Append"),
    ("unlink", "Unlink"),
    ("delete", "Delete"),
    ("remove", "Remove"),
    ("check", "Check"),
    ("empty", "Empty"),
    ("print", "Print"),
    ("write", "Write"),
    ("read", "Read"),
    ("make", "Make"),
    ("link", "Link"),
    ("get", "Get"),
    ("set", "Set"),
    ("put", "Put"),
];

const SUFFIXES: &[(&str, &str)] = &[
    ("blocktriplets", "BlockTriplets"),
    ("blocktriplet", "BlockTriplet"),
    ("sliceconst", "SliceConst"),
    ("slicetrip", "SliceTrip"),
    ("listconst", "ListConst"),
    ("summary", "Summary"),
    ("namelen", "NameLen"),
    ("numnz64", "NumNz64"),
    ("numnz", "NumNz"),
    ("tostr", "ToStr"),
    ("list64", "List64"),
    ("domain", "Domain"),
    ("slice", "Slice"),
    ("dotys", "DotYs"),
    ("doty", "DotY"),
    ("info", "Info"),
    ("name", "Name"),
    ("list", "List"),
    ("file", "File"),
    ("seq", "Seq"),
    ("new", "New"),
];

/// One table entry: the literal matched in the C name and what it becomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub literal: String,
    pub canonical: String,
}

impl Pattern {
    pub fn new(literal: &str, canonical: &str) -> Self {
        Self {
            literal: literal.to_string(),
            canonical: canonical.to_string(),
        }
    }
}

fn table(entries: &[(&str, &str)]) -> Vec<Pattern> {
    entries.iter().map(|(l, c)| Pattern::new(l, c)).collect()
}

/// Ranked action and suffix tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub version: u32,
    pub actions: Vec<Pattern>,
    pub suffixes: Vec<Pattern>,
}

impl RuleSet {
    /// The tables shipped with this version of the generator.
    pub fn current() -> Self {
        Self {
            version: RULES_VERSION,
            actions: table(ACTIONS),
            suffixes: table(SUFFIXES),
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::current()
    }
}

/// The three components of a function name.  `action` and `suffix` are
/// canonical spellings (empty when nothing matched); `middle` is the raw
/// remainder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segments {
    pub action: String,
    pub middle: String,
    pub suffix: String,
}

impl Segments {
    /// Default binding name: `action + Title(middle) + suffix`.
    pub fn binding_name(&self) -> String {
        format!("{}{}{}", self.action, self.titled_middle(), self.suffix)
    }

    fn titled_middle(&self) -> String {
        if self.action == "Append" && self.suffix == "Domain" {
            domain_middle(&self.middle)
        } else {
            upper_first(&self.middle)
        }
    }
}

/// Split `ident` (namespace prefix already removed) using `rules`.
pub fn segment(ident: &str, rules: &RuleSet) -> Segments {
    let (rest, action) = match first_prefix(ident, &rules.actions) {
        Some((p, rest)) => (rest, p.canonical.clone()),
        None => (ident, String::new()),
    };
    let (middle, suffix) = match first_suffix(rest, &rules.suffixes) {
        Some((p, middle)) => (middle, p.canonical.clone()),
        None => (rest, String::new()),
    };
    Segments {
        action,
        middle: middle.to_string(),
        suffix,
    }
}

fn first_prefix<'a, 'p>(s: &'a str, table: &'p [Pattern]) -> Option<(&'p Pattern, &'a str)> {
    table
        .iter()
        .find_map(|p| s.strip_prefix(p.literal.as_str()).map(|rest| (p, rest)))
}

fn first_suffix<'a, 'p>(s: &'a str, table: &'p [Pattern]) -> Option<(&'p Pattern, &'a str)> {
    table
        .iter()
        .find_map(|p| s.strip_suffix(p.literal.as_str()).map(|rest| (p, rest)))
}

/// Remove the API namespace prefix: `PREFIX_` if present, else `PREFIX`.
pub fn strip_namespace<'a>(name: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return name;
    }
    name.strip_prefix(prefix)
        .map(|rest| rest.strip_prefix('_').unwrap_or(rest))
        .unwrap_or(name)
}

/// Upper-case the first ASCII letter, leave the rest untouched.
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

// Conic domain vocabulary: `rquadraticcone` → `RQuadraticCone`,
// `primalexpcone` → `PrimalExpCone`.  Applied in this order only.
fn domain_middle(mid: &str) -> String {
    let s = replace_prefix(mid, "primal", "Primal");
    let s = replace_prefix(&s, "dual", "Dual");
    let s = replace_suffix(&s, "cone", "Cone");
    let s = replace_prefix(&s, "r", "R");
    upper_first(&s)
}

fn replace_prefix(s: &str, old: &str, new: &str) -> String {
    match s.strip_prefix(old) {
        Some(rest) => format!("{new}{}", upper_first(rest)),
        None => s.to_string(),
    }
}

fn replace_suffix(s: &str, old: &str, new: &str) -> String {
    match s.strip_suffix(old) {
        Some(rest) => format!("{rest}{new}"),
        None => s.to_string(),
    }
}
