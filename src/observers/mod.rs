//! Declaration Observers, spec.md §4.7. A tagged-variant `Observer` sum type
//! plus a single `handle` dispatcher over it, per the Design Notes in
//! spec.md §9 ("No inheritance is required; a sum type plus a dispatcher
//! over the variant is sufficient"). Back-references between an installer
//! and the child it installed (Serializable → its field observer, Interface
//! → its method observer) are plain bus ids stashed in the installer's own
//! state, never an owning reference, matching the same section's guidance.

pub mod interface;
pub mod namespace;
pub mod serializable;

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::NamespaceState;
use crate::error::ParseResult;
use crate::profile::Profile;
use crate::scanner::observer::{BusOp, IdAllocator};
use crate::scanner::{Event, ScannerState};

pub use interface::{InterfaceObserverState, MethodObserverState};
pub use serializable::{AutoFieldObserverState, ExplicitFieldObserverState, SerializableObserverState};

/// Every observer kind the bus can hold. `Tombstone` is the placeholder
/// `Bus::dispatch` swaps in while a handler runs (it needs to hand out `&mut`
/// access to the entry's own state while also being free to re-install new
/// entries into the same `Vec`); a live entry is never left as `Tombstone`
/// once dispatch returns.
pub enum Observer {
    Tombstone,
    /// Installed once per file by the Driver (spec.md §4.9): watches every
    /// line for a root-level `@IPC(Serializable)`/`@IPC(Interface)` and
    /// installs the matching declaration observer.
    RootAnnotationWatcher,
    /// The single, permanently-installed `NamespaceObserver` (spec.md
    /// §4.7.1). Stateless itself — the namespace stack lives in
    /// [`NamespaceState`], passed into every dispatch alongside the bus.
    Namespace,
    Serializable(SerializableObserverState),
    AutoField(AutoFieldObserverState),
    ExplicitField(ExplicitFieldObserverState),
    Interface(InterfaceObserverState),
    Method(MethodObserverState),
    /// Test-only: records which events it receives, to assert dispatch
    /// ordering independent of any production observer's behavior.
    Probe(ProbeObserver),
}

/// Dispatches one event to one observer entry's state, returning the bus
/// operations (mask changes, installs, removals) the caller should apply.
pub fn handle(
    observer: &mut Observer,
    event: Event,
    state: &ScannerState,
    profile: &mut Profile,
    namespace: &mut NamespaceState,
    ids: &IdAllocator,
) -> ParseResult<Vec<BusOp>> {
    match observer {
        Observer::Tombstone => Ok(Vec::new()),
        Observer::Probe(probe) => {
            probe.record(event);
            Ok(Vec::new())
        }
        Observer::RootAnnotationWatcher => handle_root(event, state, profile, namespace, ids),
        Observer::Namespace => {
            match event {
                Event::BracketStart(top) => namespace::on_bracket_start(namespace, state, top),
                Event::BracketEnd(_) => namespace::on_bracket_end(namespace, state),
                _ => {}
            }
            Ok(Vec::new())
        }
        Observer::Serializable(obs) => {
            serializable::handle_serializable(obs, event, state, profile, ids.next())
        }
        Observer::AutoField(obs) => serializable::handle_auto_field(obs, event, state, profile),
        Observer::ExplicitField(obs) => serializable::handle_explicit_field(obs, event, state, profile),
        Observer::Interface(obs) => {
            interface::handle_interface(obs, event, state, profile, ids.next())
        }
        Observer::Method(obs) => interface::handle_method(obs, event, state, profile),
    }
}

fn handle_root(
    event: Event,
    state: &ScannerState,
    _profile: &mut Profile,
    namespace: &mut NamespaceState,
    ids: &IdAllocator,
) -> ParseResult<Vec<BusOp>> {
    use crate::annotation::lex_annotation;
    use crate::error::ParseFailure;
    use crate::scanner::observer::EventMask;

    let Event::LineEnd = event else { return Ok(Vec::new()) };
    let annotation = lex_annotation(&state.current_line_raw)
        .map_err(|message| ParseFailure::InvalidAnnotation { location: state.location(), message })?;
    let Some(ann) = annotation else { return Ok(Vec::new()) };

    // Captured now, at the annotation line, rather than at the declaration's
    // own `BRACKET_START` — see the note on `SerializableObserverState::namespace`.
    let enclosing_ns = namespace.current();

    match ann.key.as_str() {
        "Serializable" => {
            let auto = ann.bool_kwarg("auto", true);
            Ok(vec![BusOp::Install {
                id: ids.next(),
                mask: EventMask::BRACKET_START,
                observer: Observer::Serializable(SerializableObserverState::new(auto, enclosing_ns)),
            }])
        }
        "Interface" => Ok(vec![BusOp::Install {
            id: ids.next(),
            mask: EventMask::BRACKET_START,
            observer: Observer::Interface(InterfaceObserverState::new(enclosing_ns)),
        }]),
        _ => Ok(Vec::new()),
    }
}

/// Test helper: logs a short tag for each event it receives so scanner tests
/// can assert dispatch ordering without depending on production observer
/// semantics.
#[derive(Default)]
pub struct ProbeObserver {
    pub log: Rc<RefCell<Vec<&'static str>>>,
}

impl ProbeObserver {
    fn record(&self, event: Event) {
        let tag = match event {
            Event::LineEnd => "line",
            Event::QuoteStart(_) => "quote_start",
            Event::QuoteEnd(_) => "quote_end",
            Event::BracketStart(_) => "start",
            Event::BracketEnd(_) => "end",
            Event::StatementEnd => "statement",
            Event::EndOfFile => "eof",
        };
        self.log.borrow_mut().push(tag);
    }
}
