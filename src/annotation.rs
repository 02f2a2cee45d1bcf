//! Annotation Lexer, spec.md §4.3. Recognizes `@IPC(Key[, kw[=val], …])` in a
//! completed line of source text. Deliberately location-agnostic: callers
//! that have a `Location` (the scanner's observers) wrap the returned error
//! message into a located `ParseFailure::InvalidAnnotation`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KwValue {
    Bool(bool),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub key: String,
    pub kwargs: HashMap<String, KwValue>,
}

impl Annotation {
    pub fn bool_kwarg(&self, name: &str, default: bool) -> bool {
        match self.kwargs.get(name) {
            Some(KwValue::Bool(b)) => *b,
            _ => default,
        }
    }
}

static ANNOTATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@IPC\(([^()]*)\)").unwrap());
static KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+$").unwrap());
static KW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9]*)(?:=([A-Za-z0-9]+))?$").unwrap());

/// Returns `Ok(None)` for lines with no `@IPC(...)`, `Ok(Some(_))` for a
/// recognized one, and `Err(message)` for a malformed one.
pub fn lex_annotation(line: &str) -> Result<Option<Annotation>, String> {
    let Some(captures) = ANNOTATION_RE.captures(line) else {
        return Ok(None);
    };
    let body = captures.get(1).unwrap().as_str();
    let pieces: Vec<&str> = if body.trim().is_empty() { Vec::new() } else { body.split(',').collect() };

    let Some((first, rest)) = pieces.split_first() else {
        return Err("@IPC(...) requires at least one key argument".to_string());
    };
    let key = first.trim();
    if !KEY_RE.is_match(key) {
        return Err(format!("invalid @IPC key `{key}`"));
    }

    let mut kwargs = HashMap::new();
    for piece in rest {
        let piece = piece.trim();
        let Some(caps) = KW_RE.captures(piece) else {
            return Err(format!("invalid @IPC keyword argument `{piece}`"));
        };
        let kw_name = caps.get(1).unwrap().as_str().to_string();
        let value = match caps.get(2) {
            None => KwValue::Bool(true),
            Some(raw) => parse_kw_value(raw.as_str())
                .ok_or_else(|| format!("invalid @IPC value `{}` for `{kw_name}`", raw.as_str()))?,
        };
        kwargs.insert(kw_name, value);
    }

    Ok(Some(Annotation { key: key.to_string(), kwargs }))
}

fn parse_kw_value(raw: &str) -> Option<KwValue> {
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return raw.parse::<i64>().ok().map(KwValue::Int);
    }
    match raw {
        "True" => Some(KwValue::Bool(true)),
        "False" => Some(KwValue::Bool(false)),
        _ => None,
    }
}
