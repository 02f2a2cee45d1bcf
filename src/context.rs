//! Shared mutable state threaded through every observer dispatch, alongside
//! the `Profile` itself. `NamespaceObserver` (spec.md §4.7.1) needs a place
//! to keep the enclosing-namespace stack that every other observer can read
//! without addressing it through the bus, so that state lives here rather
//! than inside a bus entry only `NamespaceObserver` itself could see.

/// One open namespace or type-declaration frame, tracked the way
/// `NamespaceObserver` tracks it: a name and the `brace_stack` snapshot in
/// effect when the frame was opened, used to recognize exactly when it
/// closes again.
struct Frame {
    name: String,
    brace_stack_snapshot: Vec<char>,
}

#[derive(Default)]
pub struct NamespaceState {
    frames: Vec<Frame>,
}

impl NamespaceState {
    pub fn push(&mut self, name: String, brace_stack_snapshot: Vec<char>) {
        self.frames.push(Frame { name, brace_stack_snapshot });
    }

    /// Pops the top frame if `brace_stack` matches the snapshot captured when
    /// it was pushed. A no-op otherwise (this bracket closed something other
    /// than the innermost namespace/type frame).
    pub fn pop_if_matches(&mut self, brace_stack: &[char]) {
        if self.frames.last().is_some_and(|f| f.brace_stack_snapshot == brace_stack) {
            self.frames.pop();
        }
    }

    pub fn current(&self) -> String {
        self.frames.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join("::")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_joins_nested_frames() {
        let mut ns = NamespaceState::default();
        ns.push("a".into(), vec!['{']);
        ns.push("b".into(), vec!['{', '{']);
        assert_eq!(ns.current(), "a::b");
    }

    #[test]
    fn pop_if_matches_only_pops_on_exact_snapshot() {
        let mut ns = NamespaceState::default();
        ns.push("a".into(), vec!['{']);
        ns.pop_if_matches(&['{', '{']);
        assert_eq!(ns.current(), "a");
        ns.pop_if_matches(&['{']);
        assert_eq!(ns.current(), "");
    }
}
