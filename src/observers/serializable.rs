//! SerializableCodeObserver, AutoFieldObserver, ExplicitFieldObserver —
//! spec.md §4.7.2–§4.7.4. Grounded on `SerializableCodeObserver`/
//! `FieldCodeObserver` in `examples/original_source/cipcc/parser.py`,
//! generalized per spec.md to: resolve field types through the Type
//! Resolver, support `enum` (no field observer installed at all), and add
//! the explicit-field (`auto=False`) variant the recovered snapshot never
//! implemented.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::annotation::lex_annotation;
use crate::declarations::field::parse_field_statement;
use crate::error::{ParseFailure, ParseResult};
use crate::profile::{Profile, Serializable, SerializableKind};
use crate::scanner::observer::{BusOp, EventMask};
use crate::scanner::{Event, ScannerState};

static DECLARATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?P<kind>struct|class|enum)\b[^{]*?(?P<name>[A-Za-z_]\w*)\s*\{\s*$").unwrap());

/// A `SerializableCodeObserver`, active from the `@IPC(Serializable)`
/// annotation until the declared type's body closes.
pub struct SerializableObserverState {
    pub auto: bool,
    /// The enclosing namespace at the moment the `@IPC(Serializable)`
    /// annotation was recognized (`LINE_END`, one line before the
    /// declaration). Captured here rather than re-read from
    /// `NamespaceState::current()` at `BRACKET_START` time, since
    /// `NamespaceObserver` also matches this very declaration's own head (to
    /// qualify any nested types inside it) and — dispatched ahead of this
    /// observer on the same event — would otherwise have already pushed this
    /// type's own name onto the stack, making it wrongly qualify itself
    /// (`Foo::Foo` instead of `Foo`).
    namespace: String,
    /// Set once the `BRACKET_START` for the type's body has fired.
    scope_snapshot: Option<Vec<char>>,
    field_observer_id: Option<u64>,
}

impl SerializableObserverState {
    pub fn new(auto: bool, namespace: String) -> Self {
        Self { auto, namespace, scope_snapshot: None, field_observer_id: None }
    }
}

pub fn handle_serializable(
    obs: &mut SerializableObserverState,
    event: Event,
    state: &ScannerState,
    profile: &mut Profile,
    field_observer_id_to_install: u64,
) -> ParseResult<Vec<BusOp>> {
    match event {
        Event::BracketStart(top) if obs.scope_snapshot.is_none() && top == '{' => {
            let prefix = state.scope_prefix();
            let Some(caps) = DECLARATION_RE.captures(prefix) else {
                return Err(ParseFailure::ParsingError {
                    location: state.location(),
                    message: format!("serializable type had unrecognized declaration: `{prefix}`"),
                });
            };
            let kind_word = caps.name("kind").unwrap().as_str();
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

            let kind = if kind_word == "enum" { SerializableKind::Enum } else { SerializableKind::Struct };
            profile.serializable_types.insert(
                fq_name.clone(),
                Serializable { name: fq_name.clone(), kind, fields: Default::default() },
            );

            let mut ops = vec![BusOp::SetMask(EventMask::BRACKET_END)];
            if kind == SerializableKind::Struct {
                let field_obs = if obs.auto {
                    super::Observer::AutoField(AutoFieldObserverState::new(
                        fq_name.clone(),
                        obs.scope_snapshot.clone().unwrap(),
                    ))
                } else {
                    super::Observer::ExplicitField(ExplicitFieldObserverState::new(
                        fq_name,
                        obs.scope_snapshot.clone().unwrap(),
                    ))
                };
                let mask = if obs.auto {
                    EventMask::STATEMENT_END
                } else {
                    EventMask::LINE_END | EventMask::STATEMENT_END
                };
                obs.field_observer_id = Some(field_observer_id_to_install);
                ops.push(BusOp::Install { id: field_observer_id_to_install, mask, observer: field_obs });
            }
            Ok(ops)
        }
        Event::BracketEnd(_) => {
            let snapshot = obs.scope_snapshot.as_ref().expect("scope_snapshot set before mask switches");
            if &state.brace_stack == snapshot {
                let mut ops = vec![BusOp::RemoveSelf];
                if let Some(field_id) = obs.field_observer_id {
                    ops.push(BusOp::RemoveById(field_id));
                }
                Ok(ops)
            } else {
                Ok(Vec::new())
            }
        }
        _ => Ok(Vec::new()),
    }
}

/// `AutoFieldObserver`, spec.md §4.7.3: every statement in the struct's body
/// at its own scope depth is a field declaration.
pub struct AutoFieldObserverState {
    serializable_key: String,
    scope_snapshot: Vec<char>,
}

impl AutoFieldObserverState {
    pub fn new(serializable_key: String, scope_snapshot: Vec<char>) -> Self {
        Self { serializable_key, scope_snapshot }
    }
}

pub fn handle_auto_field(
    obs: &AutoFieldObserverState,
    event: Event,
    state: &ScannerState,
    profile: &mut Profile,
) -> ParseResult<Vec<BusOp>> {
    if !matches!(event, Event::StatementEnd) || state.brace_stack != obs.scope_snapshot {
        return Ok(Vec::new());
    }
    insert_fields_from_statement(&obs.serializable_key, state, profile)?;
    Ok(Vec::new())
}

/// `ExplicitFieldObserver`, spec.md §4.7.4: only statements preceded by their
/// own `@IPC(Field)` annotation (within the same scope) are treated as
/// fields. `field_prefix` is the struct-scope statement text accumulated
/// *before* the annotation line, so that at the next matching
/// `STATEMENT_END` only the suffix written after the annotation is parsed.
pub struct ExplicitFieldObserverState {
    serializable_key: String,
    scope_snapshot: Vec<char>,
    field_prefix: Option<String>,
}

impl ExplicitFieldObserverState {
    pub fn new(serializable_key: String, scope_snapshot: Vec<char>) -> Self {
        Self { serializable_key, scope_snapshot, field_prefix: None }
    }
}

pub fn handle_explicit_field(
    obs: &mut ExplicitFieldObserverState,
    event: Event,
    state: &ScannerState,
    profile: &mut Profile,
) -> ParseResult<Vec<BusOp>> {
    if state.brace_stack != obs.scope_snapshot {
        return Ok(Vec::new());
    }
    match event {
        Event::LineEnd => {
            let annotation = lex_annotation(&state.current_line_raw).map_err(|message| {
                ParseFailure::InvalidAnnotation { location: state.location(), message }
            })?;
            if let Some(ann) = annotation {
                if ann.key == "Field" {
                    obs.field_prefix = Some(state.current_statement().to_string());
                }
            }
            Ok(Vec::new())
        }
        Event::StatementEnd => {
            let Some(prefix) = obs.field_prefix.take() else {
                return Ok(Vec::new());
            };
            let full = state.current_statement();
            let suffix = full.strip_prefix(prefix.as_str()).unwrap_or(full);
            insert_fields_from_statement_text(&obs.serializable_key, suffix, state, profile)?;
            Ok(Vec::new())
        }
        _ => Ok(Vec::new()),
    }
}

fn insert_fields_from_statement(
    serializable_key: &str,
    state: &ScannerState,
    profile: &mut Profile,
) -> ParseResult<()> {
    let statement = state.current_statement().to_string();
    insert_fields_from_statement_text(serializable_key, &statement, state, profile)
}

fn insert_fields_from_statement_text(
    serializable_key: &str,
    statement: &str,
    state: &ScannerState,
    profile: &mut Profile,
) -> ParseResult<()> {
    let namespace = inner_namespace(serializable_key);
    let fields = parse_field_statement(statement, profile, &namespace)
        .map_err(|kind| ParseFailure::InvalidFieldDeclaration { location: state.location(), kind })?;
    let serializable = profile
        .serializable_types
        .get_mut(serializable_key)
        .expect("serializable was inserted before its field observer could run");
    for field in fields {
        if serializable.fields.contains_key(&field.name) {
            return Err(ParseFailure::DuplicateName { location: state.location(), name: field.name });
        }
        serializable.fields.insert(field.name.clone(), field);
    }
    Ok(())
}

/// The namespace fields of a struct resolve types in is the struct's own
/// fully-qualified name, per spec.md §4.7.3 ("the serializable's inner
/// namespace (`namespace::type_name`)").
fn inner_namespace(serializable_key: &str) -> String {
    serializable_key.to_string()
}
