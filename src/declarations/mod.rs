//! Declaration parsers, spec.md §4.4 (Field), §4.5/§4.5.1 (Method/Parameter)
//! and §4.5.2 (splitter). Grounded on `parse_fields`/`FIELD_TYPE_NAME_PATTERN`
//! in `examples/original_source/cipcc/parser.py` for the overall shape, and
//! generalized to cover the template-argument and reference handling
//! `spec.md` specifies beyond that recovered snapshot.

pub mod field;
pub mod method;
pub mod param;
pub mod splitter;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::TypeErrorKind;
use crate::profile::Profile;
use crate::resolver;
use splitter::{matching_angle_close, split_params};

static BASE_TYPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w:]+").unwrap());

/// The result of splitting a declarator's base type from any `<...>`
/// template-argument text that immediately follows it. Owned so callers
/// don't need to juggle the source text's lifetime alongside char-index math.
pub struct BaseAndTemplate {
    pub base: String,
    pub raw_template_args: Option<String>,
    /// Byte offset into `text` just past the consumed base type (and
    /// template arguments, if present); the caller's NAME starts here.
    pub rest_start: usize,
}

/// Splits `text` (trimmed, with any leading `const`/`volatile` already
/// stripped by the caller) into its base type name and, if present, the raw
/// text between a top-level `<` and its matching `>`.
pub fn split_base_and_template(text: &str) -> Option<BaseAndTemplate> {
    let m = BASE_TYPE_RE.find(text)?;
    let base = m.as_str().to_string();
    let after_base = &text[m.end()..];
    let trimmed_after = after_base.trim_start();
    if !trimmed_after.starts_with('<') {
        return Some(BaseAndTemplate { base, raw_template_args: None, rest_start: m.end() });
    }

    let chars: Vec<char> = text.chars().collect();
    let open_char_idx = text[..m.end()].chars().count() + (after_base.len() - trimmed_after.len());
    let close_char_idx = matching_angle_close(text, open_char_idx)?;
    let raw_template_args: String = chars[open_char_idx + 1..close_char_idx].iter().collect();
    let rest_start: usize = chars[..=close_char_idx].iter().collect::<String>().len();
    Some(BaseAndTemplate { base, raw_template_args: Some(raw_template_args), rest_start })
}

/// Resolves `base` and recursively canonicalizes any template arguments in
/// `raw_template_args`, producing the fully canonical type string
/// (`resolved_name` optionally followed by `<tp1,tp2,...>`) per spec.md §4.4
/// step 3. Template argument canonicalization is delegated to `canon_tparam`,
/// supplied by the caller (Field rejects refs/pointers in tparams implicitly
/// by construction; Parameter explicitly rejects them per §4.5.1).
pub fn resolve_base_with_templates(
    base: &str,
    raw_template_args: Option<&str>,
    profile: &Profile,
    current_ns: &str,
    mut canon_tparam: impl FnMut(&str, &Profile, &str) -> Result<String, TypeErrorKind>,
) -> Result<String, TypeErrorKind> {
    let resolved_base = resolver::resolve(base, profile, current_ns)?;
    match raw_template_args {
        None => Ok(resolved_base),
        Some(raw) => {
            let pieces = split_params(raw).map_err(|_| TypeErrorKind::Unresolved {
                name: base.to_string(),
                namespace: current_ns.to_string(),
            })?;
            let mut canon_pieces = Vec::with_capacity(pieces.len());
            for piece in pieces {
                canon_pieces.push(canon_tparam(&piece, profile, current_ns)?);
            }
            Ok(format!("{resolved_base}<{}>", canon_pieces.join(",")))
        }
    }
}

/// Resolves a plain type reference with no cv/ref qualifiers — a field's
/// type, or a method's return/tail-return type — recursively canonicalizing
/// any template arguments the same way.
pub fn resolve_plain_type(text: &str, profile: &Profile, current_ns: &str) -> Result<String, TypeErrorKind> {
    let trimmed = text.trim();
    let Some(base_and_tpl) = split_base_and_template(trimmed) else {
        return Err(TypeErrorKind::Unresolved { name: trimmed.to_string(), namespace: current_ns.to_string() });
    };
    resolve_base_with_templates(
        &base_and_tpl.base,
        base_and_tpl.raw_template_args.as_deref(),
        profile,
        current_ns,
        resolve_plain_type,
    )
}

/// Strips a single leading access-specifier label (`public:`/`private:`/
/// `protected:`) from a struct/class-body statement, spec.md §4.4.
pub fn strip_access_label(statement: &str) -> &str {
    static ACCESS_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\s*(?:public|private|protected)\s*:\s*").unwrap());
    match ACCESS_RE.find(statement) {
        Some(m) => &statement[m.end()..],
        None => statement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_base_without_template() {
        let r = split_base_and_template("std::string name").unwrap();
        assert_eq!(r.base, "std::string");
        assert!(r.raw_template_args.is_none());
        assert_eq!(&"std::string name"[r.rest_start..], " name");
    }

    #[test]
    fn splits_base_with_nested_template() {
        let r = split_base_and_template("std::map<int, std::vector<int>> table").unwrap();
        assert_eq!(r.base, "std::map");
        assert_eq!(r.raw_template_args.as_deref(), Some("int, std::vector<int>"));
        assert_eq!(&"std::map<int, std::vector<int>> table"[r.rest_start..], " table");
    }

    #[test]
    fn strips_access_labels() {
        assert_eq!(strip_access_label("public: int x"), "int x");
        assert_eq!(strip_access_label("private:int x"), "int x");
        assert_eq!(strip_access_label("int x"), "int x");
    }
}
