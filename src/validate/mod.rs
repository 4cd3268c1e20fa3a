//! Evidence validation.
//!
//! Given the evidence identifiers a compiled probe promises, polls a remote
//! fetch capability until every artifact is confirmed present (and
//! optionally content-matching) or a deadline expires, reporting the
//! residual failing set.

pub mod clock;
pub mod fetch;
pub mod validator;
