//! Type Resolver, spec.md §4.6.
//!
//! Searches built-ins, then serializables, then interfaces, preferring the
//! longest enclosing-namespace suffix first, matching C++ unqualified-name
//! lookup.

use crate::error::TypeErrorKind;
use crate::profile::{builtin_canonical, Profile};

/// Integer types whose width is platform-dependent; always rejected.
pub const UNSUPPORTED_INTS: [&str; 3] = ["char", "long", "short"];

/// STL containers this profile does not (yet) model.
pub const UNIMPLEMENTED_COLLECTIONS: [&str; 9] = [
    "std::array",
    "std::forward_list",
    "std::stack",
    "std::queue",
    "std::priority_queue",
    "std::flat_set",
    "std::flat_map",
    "std::flat_multiset",
    "std::flat_multimap",
];

/// Resolve `name`, written inside namespace `current_ns` (empty for global
/// scope), to its canonical form.
pub fn resolve(name: &str, profile: &Profile, current_ns: &str) -> Result<String, TypeErrorKind> {
    let (search_name, prefixes): (String, Vec<String>) = match name.strip_prefix("::") {
        Some(rest) => (rest.to_string(), vec![String::new()]),
        None => (name.to_string(), candidate_namespaces(current_ns)),
    };

    for prefix in &prefixes {
        let candidate =
            if prefix.is_empty() { search_name.clone() } else { format!("{prefix}::{search_name}") };
        if let Some(canonical) = builtin_canonical(&candidate) {
            return Ok(canonical.to_string());
        }
        if profile.serializable_types.contains_key(&candidate) {
            return Ok(candidate);
        }
        if profile.interfaces.contains_key(&candidate) {
            return Ok(candidate);
        }
    }

    if UNSUPPORTED_INTS.contains(&search_name.as_str()) {
        return Err(TypeErrorKind::PlatformDependentInt(search_name));
    }
    if UNIMPLEMENTED_COLLECTIONS.contains(&search_name.as_str()) {
        return Err(TypeErrorKind::UnimplementedCollection(search_name));
    }
    Err(TypeErrorKind::Unresolved { name: search_name, namespace: current_ns.to_string() })
}

/// Namespace prefixes to try, longest to shortest, ending with the empty
/// (global) namespace. `"a::b::c"` yields `["a::b::c", "a::b", "a", ""]`.
fn candidate_namespaces(current_ns: &str) -> Vec<String> {
    if current_ns.is_empty() {
        return vec![String::new()];
    }
    let segments: Vec<&str> = current_ns.split("::").collect();
    (0..=segments.len()).rev().map(|i| segments[..i].join("::")).collect()
}
