//! Fatal normalization errors.
//!
//! Anything listed here stops the run: either the overlay no longer matches
//! the header, or a generated signature would be unsound.  Recoverable gaps
//! (an unmapped type, an unresolved typedef) are logged instead and never
//! reach this type.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error(
        "overlay configures enum `{name}` but the header does not declare it \
         (is the overlay out of sync with this header version?)"
    )]
    MissingEnum { name: String },

    #[error(
        "function `{function}`: output parameter `{param}` has type `{ty}`, \
         which the callee cannot write through"
    )]
    OutputNotPointer {
        function: String,
        param: String,
        ty: String,
    },

    #[error(
        "function `{function}` declares {count} trailing output parameter(s) \
         but has only {available} non-receiver parameter(s)"
    )]
    OutputWindow {
        function: String,
        count: usize,
        available: usize,
    },
}
