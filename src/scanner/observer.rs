//! Observer Bus primitives, spec.md §4.2. Observers are stored as a sum type
//! ([`crate::observers::Observer`]) rather than `dyn Trait` objects, per the
//! Design Notes in spec.md §9: there is no owning back-reference graph, just
//! small immutable snapshots cloned into child observers at install time.

use std::cell::Cell;

use bitflags::bitflags;

use crate::context::NamespaceState;
use crate::error::ParseResult;
use crate::observers::Observer;
use crate::profile::Profile;
use crate::scanner::{Event, ScannerState};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventMask: u8 {
        const LINE_END      = 0b0000_0001;
        const QUOTE_START   = 0b0000_0010;
        const QUOTE_END     = 0b0000_0100;
        const BRACKET_START = 0b0000_1000;
        const BRACKET_END   = 0b0001_0000;
        const STATEMENT_END = 0b0010_0000;
        const END_OF_FILE   = 0b0100_0000;
    }
}

impl Event {
    pub fn mask_bit(&self) -> EventMask {
        match self {
            Event::LineEnd => EventMask::LINE_END,
            Event::QuoteStart(_) => EventMask::QUOTE_START,
            Event::QuoteEnd(_) => EventMask::QUOTE_END,
            Event::BracketStart(_) => EventMask::BRACKET_START,
            Event::BracketEnd(_) => EventMask::BRACKET_END,
            Event::StatementEnd => EventMask::STATEMENT_END,
            Event::EndOfFile => EventMask::END_OF_FILE,
        }
    }
}

/// Hands out monotonically increasing observer ids. A parent observer calls
/// [`IdAllocator::next`] itself so it can remember a child's id *before*
/// asking the bus to install it.
#[derive(Debug, Default)]
pub struct IdAllocator(Cell<u64>);

impl IdAllocator {
    pub fn next(&self) -> u64 {
        let id = self.0.get();
        self.0.set(id + 1);
        id
    }
}

/// An instruction a handler hands back to the bus. Handlers never get a
/// `&mut Bus` directly (the entry they run under would alias it); instead
/// they describe what should happen and the bus applies it afterward.
pub enum BusOp {
    SetMask(EventMask),
    RemoveSelf,
    Install { id: u64, mask: EventMask, observer: Observer },
    RemoveById(u64),
}

struct ObserverEntry {
    id: u64,
    mask: EventMask,
    kind: Observer,
}

/// The observer bus: a flat list of `(mask, observer)` pairs, plus the
/// enclosing-namespace stack ([`NamespaceState`]) every handler reads and
/// `NamespaceObserver` alone writes. Dispatch always operates on a snapshot
/// of the ids matching an event's mask taken *before* any handler for that
/// event runs, so installs/removals made while handling event N only take
/// effect for event N+1 onward.
#[derive(Default)]
pub struct Bus {
    entries: Vec<ObserverEntry>,
    namespace: NamespaceState,
}

impl Bus {
    /// A fresh bus, with the single persistent `NamespaceObserver` (spec.md
    /// §4.7.1) already installed under its reserved id — it lives for the
    /// whole run and is never installed a second time or removed.
    pub fn new() -> Self {
        let mut bus = Self { entries: Vec::new(), namespace: NamespaceState::default() };
        bus.install(
            crate::observers::namespace::RESERVED_ID,
            EventMask::BRACKET_START | EventMask::BRACKET_END,
            Observer::Namespace,
        );
        bus
    }

    pub fn install(&mut self, id: u64, mask: EventMask, observer: Observer) {
        self.entries.push(ObserverEntry { id, mask, kind: observer });
    }

    pub fn namespace(&self) -> &NamespaceState {
        &self.namespace
    }

    pub fn dispatch(
        &mut self,
        event: Event,
        state: &ScannerState,
        profile: &mut Profile,
        ids: &IdAllocator,
    ) -> ParseResult<()> {
        let bit = event.mask_bit();
        let snapshot: Vec<u64> =
            self.entries.iter().filter(|e| e.mask.contains(bit)).map(|e| e.id).collect();

        for target_id in snapshot {
            let Some(pos) = self.entries.iter().position(|e| e.id == target_id) else {
                continue;
            };
            let mut kind = std::mem::replace(&mut self.entries[pos].kind, Observer::Tombstone);
            let ops = crate::observers::handle(&mut kind, event, state, profile, &mut self.namespace, ids)?;
            self.entries[pos].kind = kind;

            for op in ops {
                match op {
                    BusOp::SetMask(mask) => {
                        if let Some(e) = self.entries.iter_mut().find(|e| e.id == target_id) {
                            e.mask = mask;
                        }
                    }
                    BusOp::RemoveSelf => self.entries.retain(|e| e.id != target_id),
                    BusOp::Install { id, mask, observer } => self.install(id, mask, observer),
                    BusOp::RemoveById(id) => self.entries.retain(|e| e.id != id),
                }
            }
        }
        Ok(())
    }
}
