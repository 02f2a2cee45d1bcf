//! NamespaceObserver, spec.md §4.7.1. Persistent for the life of a parse run
//! (installed once by [`crate::scanner::observer::Bus::new`]), it is the only
//! observer with a reserved id (`RESERVED_ID`) since nothing ever installs or
//! removes a second copy of it.
//!
//! Grounded on the brace-stack-snapshot discharge rule spec.md §9 calls out
//! explicitly: "do not rely on the specific patterns matched at push time
//! beyond capturing the frame's name." Pop is driven purely by snapshot
//! equality against [`crate::context::NamespaceState::pop_if_matches`]; push
//! additionally recognizes serializable/interface class heads so nested
//! types are qualified correctly, per the same section.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::NamespaceState;
use crate::scanner::ScannerState;

/// Reserved bus id for the single, permanently-installed `NamespaceObserver`.
pub const RESERVED_ID: u64 = u64::MAX;

static NAMESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"namespace\s+([\w:]+)\s*\{\s*$").unwrap());
static TYPE_HEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:struct|class)\s+([A-Za-z_]\w*)\b[^{]*\{\s*$").unwrap());

/// Called on every `BRACKET_START` with the new top `{`. Pushes a frame if
/// `scope_prefix` (the just-opened scope's introducing declaration) matches a
/// `namespace NAME {` or `struct|class NAME ... {` head; a no-op otherwise —
/// plain code blocks (parameter lists, function bodies) never match either
/// pattern and so never get a frame of their own.
pub fn on_bracket_start(namespace: &mut NamespaceState, state: &ScannerState, top: char) {
    if top != '{' {
        return;
    }
    let prefix = state.scope_prefix();
    if let Some(caps) = NAMESPACE_RE.captures(prefix) {
        namespace.push(caps.get(1).unwrap().as_str().to_string(), state.brace_stack.clone());
        return;
    }
    if let Some(caps) = TYPE_HEAD_RE.captures(prefix) {
        namespace.push(caps.get(1).unwrap().as_str().to_string(), state.brace_stack.clone());
    }
}

/// Called on every `BRACKET_END`, fired while `brace_stack` still holds the
/// about-to-close bracket (per the scanner's ordering guarantee) so the
/// snapshot comparison sees exactly what was captured at push time.
pub fn on_bracket_end(namespace: &mut NamespaceState, state: &ScannerState) {
    namespace.pop_if_matches(&state.brace_stack);
}
