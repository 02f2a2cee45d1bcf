//! InterfaceCodeObserver, MethodCodeObserver — spec.md §4.7.5–§4.7.6.
//!
//! `InterfaceCodeObserver` is `SerializableCodeObserver`'s sibling: it rejects
//! `struct`, rejects a name collision against either Profile map, and installs
//! a `MethodCodeObserver` for the class body's lifetime instead of a field
//! observer. `MethodCodeObserver` has no equivalent in
//! `examples/original_source/cipcc/parser.py` (`InterfaceCodeObserver.__call__`
//! there is an unfinished `pass  # TODO`) — its state machine is built
//! directly from spec.md §4.7.6, simplified from a textual-diff bookkeeping
//! scheme into three explicit captures (`head`, `params`, `tail`) that are
//! behaviorally equivalent for the one-parameter-list-per-method grammar this
//! parser accepts; see DESIGN.md.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::annotation::lex_annotation;
use crate::declarations::method::parse_method_declaration;
use crate::error::{ParseFailure, ParseResult};
use crate::profile::{Interface, Profile};
use crate::scanner::observer::{BusOp, EventMask};
use crate::scanner::{Event, ScannerState};

static DECLARATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?P<kind>struct|class)\b[^{]*?(?P<name>[A-Za-z_]\w*)\s*\{\s*$").unwrap());

pub struct InterfaceObserverState {
    /// Captured at `@IPC(Interface)` recognition time (`LINE_END`), not
    /// re-read at `BRACKET_START` — see the identical note on
    /// `SerializableObserverState::namespace`.
    namespace: String,
    scope_snapshot: Option<Vec<char>>,
    method_observer_id: Option<u64>,
}

impl InterfaceObserverState {
    pub fn new(namespace: String) -> Self {
        Self { namespace, scope_snapshot: None, method_observer_id: None }
    }
}

pub fn handle_interface(
    obs: &mut InterfaceObserverState,
    event: Event,
    state: &ScannerState,
    profile: &mut Profile,
    method_observer_id_to_install: u64,
) -> ParseResult<Vec<BusOp>> {
    match event {
        Event::BracketStart(top) if obs.scope_snapshot.is_none() && top == '{' => {
            let prefix = state.scope_prefix();
            let Some(caps) = DECLARATION_RE.captures(prefix) else {
                return Err(ParseFailure::ParsingError {
                    location: state.location(),
                    message: format!("interface declaration was not recognized: `{prefix}`"),
                });
            };
            if caps.name("kind").unwrap().as_str() == "struct" {
                return Err(ParseFailure::ParsingError {
                    location: state.location(),
                    message: "an interface must be declared as `class`, not `struct`".to_string(),
                });
            }
            let local_name = caps.name("name").unwrap().as_str().to_string();
            let fq_name = if obs.namespace.is_empty() {
                local_name.clone()
            } else {
                format!("{}::{local_name}", obs.namespace)
            };
            if profile.contains_name(&fq_name) {
                return Err(ParseFailure::DuplicateName { location: state.location(), name: fq_name });
            }

            obs.scope_snapshot = Some(state.brace_stack.clone());
            profile.interfaces.insert(
                fq_name.clone(),
                Interface { name: fq_name.clone(), methods: Default::default(), callbacks: Default::default() },
            );

            obs.method_observer_id = Some(method_observer_id_to_install);
            Ok(vec![
                BusOp::SetMask(EventMask::BRACKET_END),
                BusOp::Install {
                    id: method_observer_id_to_install,
                    mask: EventMask::LINE_END,
                    observer: super::Observer::Method(MethodObserverState::new(
                        fq_name,
                        obs.scope_snapshot.clone().unwrap(),
                    )),
                },
            ])
        }
        Event::BracketEnd(_) => {
            let snapshot = obs.scope_snapshot.as_ref().expect("scope_snapshot set before mask switches");
            if &state.brace_stack == snapshot {
                let mut ops = vec![BusOp::RemoveSelf];
                if let Some(method_id) = obs.method_observer_id {
                    ops.push(BusOp::RemoveById(method_id));
                }
                Ok(ops)
            } else {
                Ok(Vec::new())
            }
        }
        _ => Ok(Vec::new()),
    }
}

/// One method declaration's assembly-in-progress. `ignored_prefix` is the
/// interface-scope statement text already present when `@IPC(Method)` was
/// seen (leftover from whatever ended the previous statement); `head` is the
/// text between the annotation and the parameter list's opening `(`; `params`
/// is the raw parameter-list text, captured from the nested `(` scope's own
/// buffer since the parent scope never sees what's inside it.
///
/// `paren_open_len` is the byte length of the interface scope's accumulating
/// buffer at the moment the parameter list's `(` was pushed — since that
/// buffer only ever grows, every later read of it shares this exact prefix,
/// so the method's trailing qualifiers (`tail`) can be recovered by slicing
/// past `paren_open_len + 1` (the `+1` skips the `)` appended right after the
/// paren scope pops) rather than by reconstructing and re-matching text.
#[derive(Default)]
struct Active {
    ignored_prefix: String,
    head: String,
    params: String,
    paren_open_len: Option<usize>,
}

/// `MethodCodeObserver`, spec.md §4.7.6. Idle between methods, listening only
/// to `LINE_END` for the next `@IPC(Method)`; active while assembling one
/// declaration, which may span the parameter-list's own nested scope.
pub struct MethodObserverState {
    interface_key: String,
    interface_scope: Vec<char>,
    active: Option<Active>,
}

impl MethodObserverState {
    pub fn new(interface_key: String, interface_scope: Vec<char>) -> Self {
        Self { interface_key, interface_scope, active: None }
    }

    fn paren_scope(&self) -> Vec<char> {
        let mut v = self.interface_scope.clone();
        v.push('(');
        v
    }

    fn body_scope(&self) -> Vec<char> {
        let mut v = self.interface_scope.clone();
        v.push('{');
        v
    }
}

pub fn handle_method(
    obs: &mut MethodObserverState,
    event: Event,
    state: &ScannerState,
    profile: &mut Profile,
) -> ParseResult<Vec<BusOp>> {
    match event {
        Event::LineEnd => {
            if obs.active.is_none() && state.brace_stack != obs.interface_scope {
                return Ok(Vec::new());
            }
            let annotation = lex_annotation(&state.current_line_raw).map_err(|message| {
                ParseFailure::InvalidAnnotation { location: state.location(), message }
            })?;
            let Some(ann) = annotation else { return Ok(Vec::new()) };
            if ann.key != "Method" {
                return Ok(Vec::new());
            }
            if obs.active.is_some() {
                return Err(ParseFailure::ParsingError {
                    location: state.location(),
                    message: "a new @IPC(Method) annotation was encountered before the previous \
                              method declaration finished"
                        .to_string(),
                });
            }
            obs.active =
                Some(Active { ignored_prefix: state.current_statement().to_string(), ..Default::default() });
            Ok(vec![BusOp::SetMask(
                EventMask::LINE_END | EventMask::BRACKET_START | EventMask::BRACKET_END | EventMask::STATEMENT_END,
            )])
        }
        Event::BracketStart(top) => {
            if state.brace_stack == obs.paren_scope() {
                if let Some(active) = obs.active.as_mut() {
                    let prefix = state.scope_prefix();
                    active.paren_open_len = Some(prefix.len());
                    let head_text = prefix
                        .get(active.ignored_prefix.len()..prefix.len().saturating_sub(1))
                        .unwrap_or("");
                    active.head = head_text.trim().to_string();
                }
                return Ok(Vec::new());
            }
            if top == '{' && state.brace_stack == obs.body_scope() {
                let full = state.scope_prefix().to_string();
                return finalize(obs, &full, true, state, profile);
            }
            Ok(Vec::new())
        }
        Event::BracketEnd(_) => {
            if state.brace_stack == obs.paren_scope() {
                if let Some(active) = obs.active.as_mut() {
                    active.params = state.current_statement().to_string();
                }
            }
            Ok(Vec::new())
        }
        Event::StatementEnd => {
            if obs.active.is_none() || state.brace_stack != obs.interface_scope {
                return Ok(Vec::new());
            }
            let full = state.current_statement().to_string();
            finalize(obs, &full, false, state, profile)
        }
        _ => Ok(Vec::new()),
    }
}

fn finalize(
    obs: &mut MethodObserverState,
    full_statement: &str,
    strip_trailing_brace: bool,
    state: &ScannerState,
    profile: &mut Profile,
) -> ParseResult<Vec<BusOp>> {
    let active = obs.active.take().expect("finalize only called while active");
    let paren_open_len = active.paren_open_len.unwrap_or(full_statement.len());
    let mut tail = full_statement.get(paren_open_len + 1..).unwrap_or("").to_string();
    if strip_trailing_brace {
        if let Some(pos) = tail.rfind('{') {
            tail.truncate(pos);
        }
    }

    let declaration = format!("{}({}){}", active.head, active.params, tail);
    let methods = parse_method_declaration(&declaration, profile, &obs.interface_key)
        .map_err(|kind| ParseFailure::InvalidMethodDeclaration { location: state.location(), kind })?;

    let interface = profile
        .interfaces
        .get_mut(&obs.interface_key)
        .expect("interface was inserted before its method observer could run");
    for method in methods {
        let key = method.signature_key();
        if interface.methods.contains_key(&key) {
            return Err(ParseFailure::DuplicateName { location: state.location(), name: key });
        }
        interface.methods.insert(key, method);
    }

    Ok(vec![BusOp::SetMask(EventMask::LINE_END)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_pattern_rejects_struct_kind_elsewhere() {
        assert_eq!(&DECLARATION_RE.captures("class Interface {").unwrap()["kind"], "class");
    }

    #[test]
    fn paren_scope_appends_open_paren() {
        let obs = MethodObserverState::new("Interface".into(), vec!['{']);
        assert_eq!(obs.paren_scope(), vec!['{', '(']);
    }

    #[test]
    fn body_scope_appends_open_brace() {
        let obs = MethodObserverState::new("Interface".into(), vec!['{']);
        assert_eq!(obs.body_scope(), vec!['{', '{']);
    }
}
