//! Character Scanner, spec.md §4.1. A hand-built single-pass state machine
//! over `char`s, grounded on the control flow of `code_walk` in
//! `examples/original_source/cipcc/parser.py` (push/append/notify ordering),
//! but implemented without that snapshot's comment-guard omission — see
//! SPEC_FULL.md §C.
//!
//! Deliberately does not reuse `radlr`'s bit-packed `ByteCharacterReader`
//! (`source/lib/hctk/types/reader.rs`): that reader optimizes for a grammar
//! compiler's own byte/codepoint dichotomy and would be too easy to get
//! subtly wrong without a compiler to check it against. A plain `Vec<char>`
//! scan is the safer translation of the same algorithm.

pub mod observer;

pub use observer::{Bus, EventMask, IdAllocator};

use crate::error::{Location, ParseFailure, ParseResult};
use crate::profile::Profile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    LineEnd,
    QuoteStart(char),
    QuoteEnd(char),
    BracketStart(char),
    BracketEnd(char),
    StatementEnd,
    EndOfFile,
}

/// Scanner state visible to observers while a file is being scanned.
pub struct ScannerState {
    pub source_name: String,
    pub line_no: usize,
    pub col_no: usize,
    pub brace_stack: Vec<char>,
    pub scope_text: Vec<String>,
    /// The current line's text exactly as written, comments included —
    /// distinct from `scope_text`, which never contains comment content.
    pub current_line_raw: String,
}

impl ScannerState {
    pub fn location(&self) -> Location {
        Location::new(self.source_name.clone(), self.line_no, self.col_no)
    }

    /// The suffix of `scope_text[index]` after its last `;`, Python-style
    /// negative indexing supported (`-1` = innermost scope, the default).
    pub fn statement(&self, index: isize) -> &str {
        let len = self.scope_text.len() as isize;
        let resolved = if index < 0 { len + index } else { index };
        let buf = &self.scope_text[resolved.max(0) as usize];
        match buf.rfind(';') {
            Some(pos) => &buf[pos + 1..],
            None => buf.as_str(),
        }
    }

    pub fn current_statement(&self) -> &str {
        self.statement(-1)
    }

    /// The enclosing scope's pending statement text, read at `BRACKET_START`
    /// to recover the declaration that introduced the new scope.
    pub fn scope_prefix(&self) -> &str {
        self.statement(-2)
    }
}

fn matching_open(close: char) -> Option<char> {
    match close {
        '}' => Some('{'),
        ']' => Some('['),
        ')' => Some('('),
        _ => None,
    }
}

fn matching_close(open: char) -> char {
    match open {
        '{' => '}',
        '[' => ']',
        '(' => ')',
        _ => '?',
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CommentKind {
    Line,
    Block,
}

/// Scans `text` (the contents of `source_name`), dispatching events to `bus`
/// as it goes. `profile` is threaded through to observers via the bus.
pub fn scan(
    source_name: &str,
    text: &str,
    bus: &mut Bus,
    profile: &mut Profile,
    ids: &IdAllocator,
) -> ParseResult<()> {
    let mut state = ScannerState {
        source_name: source_name.to_string(),
        line_no: 1,
        col_no: 1,
        brace_stack: Vec::new(),
        scope_text: vec![String::new()],
        current_line_raw: String::new(),
    };

    let mut is_commented = false;
    let mut comment_kind: Option<CommentKind> = None;
    let mut in_quote: Option<char> = None;
    let mut quote_escaped = false;
    let mut pending_comment_start = false;
    let mut pending_comment_end = false;

    let chars: Vec<char> = text.chars().collect();
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        state.current_line_raw.push(c);

        if is_commented {
            match comment_kind.expect("is_commented implies a comment_kind") {
                CommentKind::Line => {
                    if c == '\n' {
                        is_commented = false;
                        comment_kind = None;
                        fire_line_end(&mut state, bus, profile, ids)?;
                    }
                }
                CommentKind::Block => {
                    if pending_comment_end {
                        if c == '/' {
                            pending_comment_end = false;
                            is_commented = false;
                            comment_kind = None;
                        } else if c != '*' {
                            // Only a plain `*` keeps the close armed (so a run
                            // of `*`s immediately before `/` still closes);
                            // anything else disarms it.
                            pending_comment_end = false;
                        }
                    } else if c == '*' {
                        pending_comment_end = true;
                    }
                    if c == '\n' {
                        fire_line_end(&mut state, bus, profile, ids)?;
                    }
                }
            }
            step_col(&mut state, c);
            i += 1;
            continue;
        }

        if pending_comment_start {
            pending_comment_start = false;
            if c == '/' || c == '*' {
                if let Some(top) = state.scope_text.last_mut() {
                    top.pop();
                }
                is_commented = true;
                comment_kind = Some(if c == '/' { CommentKind::Line } else { CommentKind::Block });
                step_col(&mut state, c);
                i += 1;
                continue;
            }
        }

        if in_quote.is_none() && c == '/' {
            if let Some(top) = state.scope_text.last_mut() {
                top.push(c);
            }
            pending_comment_start = true;
            step_col(&mut state, c);
            i += 1;
            continue;
        }

        if let Some(q) = in_quote {
            if let Some(top) = state.scope_text.last_mut() {
                top.push(c);
            }
            // Only `\` (escape) and the matching quote char are honored inside
            // a quote; an escaped character never closes the quote, even if
            // it's the quote character itself or another backslash.
            if quote_escaped {
                quote_escaped = false;
            } else if c == '\\' {
                quote_escaped = true;
            } else if c == q {
                in_quote = None;
                bus.dispatch(Event::QuoteEnd(c), &state, profile, ids)?;
            }
            if c == '\n' {
                fire_line_end(&mut state, bus, profile, ids)?;
            }
            step_col(&mut state, c);
            i += 1;
            continue;
        }

        match c {
            '"' | '\'' => {
                if let Some(top) = state.scope_text.last_mut() {
                    top.push(c);
                }
                in_quote = Some(c);
                bus.dispatch(Event::QuoteStart(c), &state, profile, ids)?;
            }
            '{' | '[' | '(' => {
                state.brace_stack.push(c);
                state.scope_text.push(String::new());
                let enclosing = state.scope_text.len() - 2;
                state.scope_text[enclosing].push(c);
                bus.dispatch(Event::BracketStart(c), &state, profile, ids)?;
            }
            '}' | ']' | ')' => {
                let top = state.brace_stack.last().copied();
                if top != matching_open(c) {
                    return Err(ParseFailure::MismatchedBracket {
                        location: state.location(),
                        expected: top.map(matching_close),
                        found: c,
                    });
                }
                bus.dispatch(Event::BracketEnd(c), &state, profile, ids)?;
                state.brace_stack.pop();
                state.scope_text.pop();
                if let Some(top) = state.scope_text.last_mut() {
                    top.push(c);
                }
            }
            ';' => {
                // Dispatched before the `;` itself is appended: `statement()`
                // must return the text *up to* this terminator, not an empty
                // suffix found by searching for the `;` that ends it.
                bus.dispatch(Event::StatementEnd, &state, profile, ids)?;
                if let Some(top) = state.scope_text.last_mut() {
                    top.push(c);
                }
            }
            '\n' => {
                fire_line_end(&mut state, bus, profile, ids)?;
            }
            _ => {
                if let Some(top) = state.scope_text.last_mut() {
                    top.push(c);
                }
            }
        }

        step_col(&mut state, c);
        i += 1;
    }

    if !state.current_line_raw.is_empty() {
        fire_line_end(&mut state, bus, profile, ids)?;
    }

    if !state.brace_stack.is_empty() {
        return Err(ParseFailure::MismatchedBracket {
            location: state.location(),
            expected: state.brace_stack.last().copied().map(matching_close),
            found: '\0',
        });
    }

    bus.dispatch(Event::EndOfFile, &state, profile, ids)?;
    Ok(())
}

fn step_col(state: &mut ScannerState, c: char) {
    if c != '\n' {
        state.col_no += 1;
    }
}

fn fire_line_end(
    state: &mut ScannerState,
    bus: &mut Bus,
    profile: &mut Profile,
    ids: &IdAllocator,
) -> ParseResult<()> {
    bus.dispatch(Event::LineEnd, state, profile, ids)?;
    state.line_no += 1;
    state.col_no = 1;
    state.current_line_raw.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observers::Observer;

    fn run(text: &str) -> ParseResult<Profile> {
        let mut profile = Profile::new();
        let mut bus = Bus::new();
        let ids = IdAllocator::default();
        scan("test.h", text, &mut bus, &mut profile, &ids)?;
        Ok(profile)
    }

    #[test]
    fn balanced_brackets_scan_cleanly() {
        run("struct Foo { int x; };\n").unwrap();
    }

    #[test]
    fn mismatched_bracket_is_rejected() {
        let err = run("struct Foo { int x; ];\n").unwrap_err();
        assert!(matches!(err, ParseFailure::MismatchedBracket { .. }));
    }

    #[test]
    fn unclosed_bracket_at_eof_is_rejected() {
        let err = run("struct Foo {\n  int x;\n").unwrap_err();
        assert!(matches!(err, ParseFailure::MismatchedBracket { .. }));
    }

    #[test]
    fn line_comment_does_not_affect_scope_text() {
        // A stray brace inside a // comment must not corrupt brace_stack.
        run("struct Foo { // a comment with a } inside\n  int x;\n};\n").unwrap();
    }

    #[test]
    fn block_comment_spanning_lines_does_not_affect_scope_text() {
        run("struct Foo { /* { ( [ unbalanced on purpose */ int x; };\n").unwrap();
    }

    #[test]
    fn block_comment_with_star_run_before_close_still_terminates() {
        // A banner comment like `/**** ... ****/` has a run of `*` right
        // before the closing `/`; the comment must still close there rather
        // than swallowing the rest of the file.
        run("/**** banner ****/\nstruct Foo { int x; };\n").unwrap();
    }

    #[test]
    fn empty_block_comment_terminates_immediately() {
        run("struct Foo { /***/ int x; };\n").unwrap();
    }

    #[test]
    fn quoted_brace_does_not_affect_scope_text() {
        run("const char *s = \"{\"; struct Foo { int x; };\n").unwrap();
    }

    #[test]
    fn escaped_quote_does_not_close_the_string() {
        // The embedded `\"` must not end the string early, so the `{` right
        // after it stays inside quotes and the brace stack balances.
        run("const char *s = \"a\\\"{\"; struct Foo { int x; };\n").unwrap();
    }

    #[test]
    fn observer_receives_bracket_events_in_order() {
        use std::cell::RefCell;
        use std::rc::Rc;

        #[derive(Default)]
        struct Probe(Rc<RefCell<Vec<&'static str>>>);

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut profile = Profile::new();
        let mut bus = Bus::new();
        let ids = IdAllocator::default();
        let recorder_id = ids.next();
        bus.install(
            recorder_id,
            EventMask::BRACKET_START | EventMask::BRACKET_END | EventMask::END_OF_FILE,
            Observer::Probe(crate::observers::ProbeObserver { log: log.clone() }),
        );
        scan("test.h", "struct Foo { };\n", &mut bus, &mut profile, &ids).unwrap();
        assert_eq!(*log.borrow(), vec!["start", "end", "eof"]);
    }
}
