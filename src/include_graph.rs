//! Include Graph & Order, spec.md §4.8. Grounded on the
//! queue-plus-claimed-set fixed-point traversal in `load_all`
//! (`examples/acweathersby-radlr/source/lib/sherpa-core/grammar/load.rs`),
//! adapted to the single-threaded model spec.md §5 mandates: one
//! `VecDeque`/`HashSet` pair instead of `Mutex`-guarded ones, no worker
//! threads.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::{ParseFailure, ParseResult};

static INCLUDE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^\s*#\s*include\s*("[^"]+"|<[^>]+>)"#).unwrap());

/// Abstracts reading a header's contents, per spec.md §1's `read_text`
/// framing (file I/O beyond this is out of scope). A plain filesystem read is
/// the only implementation needed here; tests substitute a temp directory.
pub fn read_text(path: &Path) -> std::io::Result<String> {
    std::fs::read_to_string(path)
}

/// One `#include` token found on a line, still wrapped in its delimiters
/// (`"foo.h"` or `<foo.h>`) exactly as written.
fn strip_delimiters(token: &str) -> &str {
    &token[1..token.len() - 1]
}

fn scan_includes(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| INCLUDE_RE.captures(line))
        .map(|caps| strip_delimiters(caps.get(1).unwrap().as_str()).to_string())
        .collect()
}

fn resolve_include(raw: &str, from_dir: &Path, include_dirs: &[PathBuf]) -> Option<PathBuf> {
    let candidate = from_dir.join(raw);
    if candidate.is_file() {
        return candidate.canonicalize().ok();
    }
    for dir in include_dirs {
        let candidate = dir.join(raw);
        if candidate.is_file() {
            return candidate.canonicalize().ok();
        }
    }
    None
}

/// The result of discovery: every header reachable from the initial set
/// (canonical absolute paths), along with each one's resolved-within-the-set
/// include edges.
struct DiscoveredGraph {
    /// Canonical paths in first-discovered order; index 0..headers.len() are
    /// the Driver's original input headers, in their original order.
    order_seen: Vec<PathBuf>,
    edges: HashMap<PathBuf, Vec<PathBuf>>,
}

fn discover(headers: &[PathBuf], include_dirs: &[PathBuf]) -> std::io::Result<DiscoveredGraph> {
    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    let mut order_seen = Vec::new();
    let mut edges: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();

    for header in headers {
        let canonical = header.canonicalize()?;
        if claimed.insert(canonical.clone()) {
            order_seen.push(canonical.clone());
            queue.push_back(canonical);
        }
    }

    while let Some(path) = queue.pop_front() {
        let text = read_text(&path)?;
        let from_dir = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        let mut resolved = Vec::new();
        for raw in scan_includes(&text) {
            match resolve_include(&raw, &from_dir, include_dirs) {
                Some(resolved_path) => {
                    resolved.push(resolved_path.clone());
                    if claimed.insert(resolved_path.clone()) {
                        order_seen.push(resolved_path.clone());
                        queue.push_back(resolved_path);
                    }
                }
                None => {
                    trace!(include = %raw, from = %path.display(), "include not found in search directories");
                }
            }
        }
        edges.insert(path, resolved);
    }

    Ok(DiscoveredGraph { order_seen, edges })
}

/// Topologically orders `graph` so that every header appears after all of its
/// resolved-within-the-set includes. Stalling with headers remaining is a
/// `CircularInclude` failure listing everything still unplaced.
fn topological_order(graph: DiscoveredGraph) -> ParseResult<Vec<PathBuf>> {
    let mut placed: HashSet<PathBuf> = HashSet::new();
    let mut remaining: Vec<PathBuf> = graph.order_seen.clone();
    let mut ordered: Vec<PathBuf> = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let mut progressed = false;
        let mut still_remaining = Vec::with_capacity(remaining.len());
        for path in remaining {
            let deps_satisfied = graph
                .edges
                .get(&path)
                .map(|deps| deps.iter().all(|d| placed.contains(d)))
                .unwrap_or(true);
            if deps_satisfied {
                placed.insert(path.clone());
                ordered.push(path);
                progressed = true;
            } else {
                still_remaining.push(path);
            }
        }
        remaining = still_remaining;
        if !progressed && !remaining.is_empty() {
            let names = remaining.iter().map(|p| p.display().to_string()).collect();
            return Err(ParseFailure::CircularInclude { remaining: names });
        }
    }
    Ok(ordered)
}

/// Builds the dependency-ordered schedule the Driver runs the scanner over:
/// discovers every header transitively reachable from `headers` through
/// `#include` directives resolvable against `include_dirs`, then orders them
/// so a header always follows the headers it includes.
pub fn build_schedule(headers: &[PathBuf], include_dirs: &[PathBuf]) -> ParseResult<Vec<PathBuf>> {
    let graph = discover(headers, include_dirs).map_err(|err| ParseFailure::IncludeResolution {
        include: headers.first().map(|p| p.display().to_string()).unwrap_or_default(),
        from: err.to_string(),
    })?;
    debug!(discovered = graph.order_seen.len(), "include graph discovery complete");
    topological_order(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn scan_includes_recognizes_quoted_and_angle_forms() {
        let text = "#include \"foo.h\"\n#include <bar.h>\nint x;\n";
        assert_eq!(scan_includes(text), vec!["foo.h".to_string(), "bar.h".to_string()]);
    }

    #[test]
    fn single_header_with_no_includes_schedules_itself() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.h");
        fs::write(&a, "struct Foo {};\n").unwrap();

        let schedule = build_schedule(&[a.clone()], &[]).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0], a.canonicalize().unwrap());
    }

    #[test]
    fn included_header_is_scheduled_before_its_includer() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("base.h");
        let derived = dir.path().join("derived.h");
        fs::write(&base, "struct Base {};\n").unwrap();
        fs::write(&derived, "#include \"base.h\"\nstruct Derived {};\n").unwrap();

        let schedule = build_schedule(&[derived.clone()], &[]).unwrap();
        let base_pos = schedule.iter().position(|p| p == &base.canonicalize().unwrap()).unwrap();
        let derived_pos = schedule.iter().position(|p| p == &derived.canonicalize().unwrap()).unwrap();
        assert!(base_pos < derived_pos);
    }

    #[test]
    fn unresolved_include_is_silently_dropped() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.h");
        fs::write(&a, "#include \"missing.h\"\nstruct Foo {};\n").unwrap();

        let schedule = build_schedule(&[a.clone()], &[]).unwrap();
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn circular_includes_are_rejected() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.h");
        let b = dir.path().join("b.h");
        fs::write(&a, "#include \"b.h\"\nstruct A {};\n").unwrap();
        fs::write(&b, "#include \"a.h\"\nstruct B {};\n").unwrap();

        let err = build_schedule(&[a], &[]).unwrap_err();
        assert!(matches!(err, ParseFailure::CircularInclude { .. }));
    }

    #[test]
    fn search_directory_is_consulted_after_the_including_file_s_own_directory() {
        let dir = tempdir().unwrap();
        let include_dir = dir.path().join("include");
        fs::create_dir(&include_dir).unwrap();
        let shared = include_dir.join("shared.h");
        fs::write(&shared, "struct Shared {};\n").unwrap();
        let a = dir.path().join("a.h");
        fs::write(&a, "#include \"shared.h\"\nstruct Foo {};\n").unwrap();

        let schedule = build_schedule(&[a], &[include_dir]).unwrap();
        assert_eq!(schedule.len(), 2);
    }
}
