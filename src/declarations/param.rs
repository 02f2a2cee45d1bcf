//! Parameter Parser, spec.md §4.5.1.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::MethodErrorKind;
use crate::profile::{Parameter, Profile};

use super::{resolve_base_with_templates, split_base_and_template};

static LEADING_CV_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(const|volatile)\b\s*").unwrap());
static SUFFIX_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<suffix>[\s\*&A-Za-z]*?)(?P<name>[A-Za-z_]\w*)\s*(?P<arrays>(?:\[[^\]]*\]\s*)*)$")
        .unwrap()
});

#[derive(Clone, Copy)]
struct Ref {
    is_amp: bool,
}

/// Result of a successful parameter parse: the canonicalized [`Parameter`]
/// plus whether a `= DEFAULT` tail was present (spec.md §4.5 rule 7 needs
/// this to drive default-argument overload expansion).
pub struct ParsedParam {
    pub parameter: Parameter,
    pub optional: bool,
}

/// Parses one parameter's text (already stripped of its list-level commas)
/// under namespace `current_ns`.
pub fn parse_parameter(
    text: &str,
    profile: &Profile,
    current_ns: &str,
) -> Result<ParsedParam, MethodErrorKind> {
    let text = text.trim();
    if text.is_empty() {
        return Err(MethodErrorKind::InvalidParamDeclaration("empty parameter".to_string()));
    }

    let (declarator, optional) = match text.find('=') {
        Some(pos) => (text[..pos].trim(), true),
        None => (text, false),
    };

    // Reject C-style function-pointer parameters outright; nothing in the
    // accepted grammar below would otherwise match `int (*x)(double)`. Checked
    // against the declarator only — a default-value expression like
    // `Conf c = Conf()` or `int x = f(1, 2)` legitimately contains parens.
    if declarator.contains('(') || declarator.contains(')') {
        return Err(MethodErrorKind::InvalidParamDeclaration(format!(
            "unsupported parameter declaration: `{text}`"
        )));
    }

    let mut leading_const = false;
    let mut leading_volatile = false;
    let mut rest = declarator;
    loop {
        let Some(caps) = LEADING_CV_RE.captures(rest) else { break };
        match caps.get(1).unwrap().as_str() {
            "const" => leading_const = true,
            "volatile" => leading_volatile = true,
            _ => unreachable!(),
        }
        let end = caps.get(0).unwrap().end();
        rest = &rest[end..];
    }

    let Some(base_and_tpl) = split_base_and_template(rest) else {
        return Err(MethodErrorKind::InvalidParamDeclaration(format!(
            "unrecognized parameter declaration: `{text}`"
        )));
    };
    let after_base = rest[base_and_tpl.rest_start..].trim_start();

    let Some(caps) = SUFFIX_NAME_RE.captures(after_base) else {
        return Err(MethodErrorKind::InvalidParamDeclaration(format!(
            "unrecognized parameter declaration: `{text}`"
        )));
    };
    let suffix_text = caps.name("suffix").unwrap().as_str();
    let name = caps.name("name").unwrap().as_str().to_string();
    let has_array = !caps.name("arrays").unwrap().as_str().trim().is_empty();

    let (refs, has_const, has_volatile) = tokenize_suffix(suffix_text);

    if has_array {
        return Err(MethodErrorKind::ReferenceParam(format!(
            "array parameters are not supported: `{text}`"
        )));
    }
    if refs.iter().any(|r| !r.is_amp) {
        return Err(MethodErrorKind::ReferenceParam(format!("pointer parameters are not supported: `{text}`")));
    }
    if refs.len() > 1 {
        return Err(MethodErrorKind::ReferenceParam(format!(
            "only a single reference qualifier is supported: `{text}`"
        )));
    }

    let canonical_type = if refs.first().is_some() {
        // The only accepted reference form is `const&`; pointers and
        // multi-ref declarators are already rejected above, so any cv
        // qualifier found anywhere in the suffix is this ref's own —
        // whether written `const TYPE&` or `TYPE const&`, the leading
        // and suffix positions mean the same thing for a single reference.
        if !(leading_const || has_const) || leading_volatile || has_volatile {
            return Err(MethodErrorKind::ReferenceParam(format!(
                "only `const&` reference parameters are supported: `{text}`"
            )));
        }
        let base = resolve_base_with_templates(
            &base_and_tpl.base,
            base_and_tpl.raw_template_args.as_deref(),
            profile,
            current_ns,
            canonicalize_tparam,
        )
        .map_err(MethodErrorKind::InvalidParamType)?;
        format!("{base} const&")
    } else {
        if leading_const || leading_volatile || has_const || has_volatile {
            return Err(MethodErrorKind::ReferenceParam(format!(
                "unexpected cv qualification on value parameter: `{text}`"
            )));
        }
        resolve_base_with_templates(
            &base_and_tpl.base,
            base_and_tpl.raw_template_args.as_deref(),
            profile,
            current_ns,
            canonicalize_tparam,
        )
        .map_err(MethodErrorKind::InvalidParamType)?
    };

    Ok(ParsedParam { parameter: Parameter { name, r#type: canonical_type }, optional })
}

/// Tokenizes the cv/ref suffix between a parameter's template arguments (or
/// base type) and its name. Returns the reference/pointer markers found (in
/// left-to-right order) plus whether any `const`/`volatile` token appeared
/// anywhere in the suffix — sufficient to decide acceptance, since the only
/// accepted reference form takes exactly one `&` with no other qualifiers in
/// play, and pointers/multi-ref forms are rejected regardless of their cv
/// qualification.
fn tokenize_suffix(suffix: &str) -> (Vec<Ref>, bool, bool) {
    fn flush(word: &mut String, has_const: &mut bool, has_volatile: &mut bool) {
        match word.as_str() {
            "const" => *has_const = true,
            "volatile" => *has_volatile = true,
            _ => {}
        }
        word.clear();
    }

    let mut refs = Vec::new();
    let mut has_const = false;
    let mut has_volatile = false;
    let mut word = String::new();

    for c in suffix.chars() {
        match c {
            '&' | '*' => {
                flush(&mut word, &mut has_const, &mut has_volatile);
                refs.push(Ref { is_amp: c == '&' });
            }
            c if c.is_whitespace() => flush(&mut word, &mut has_const, &mut has_volatile),
            _ => word.push(c),
        }
    }
    flush(&mut word, &mut has_const, &mut has_volatile);
    (refs, has_const, has_volatile)
}

/// Recursively canonicalizes one template argument by feeding it through the
/// Parameter Parser as the pseudo-parameter `"<tparam> x"` (spec.md §4.5.1),
/// rejecting pointer or non-const-reference arguments such as
/// `std::vector<int*>`.
fn canonicalize_tparam(
    tparam: &str,
    profile: &Profile,
    current_ns: &str,
) -> Result<String, crate::error::TypeErrorKind> {
    let pseudo = format!("{tparam} x");
    match parse_parameter(&pseudo, profile, current_ns) {
        Ok(parsed) => Ok(parsed.parameter.r#type),
        Err(MethodErrorKind::InvalidParamType(kind)) => Err(kind),
        Err(_) => Err(crate::error::TypeErrorKind::Unresolved {
            name: tparam.to_string(),
            namespace: current_ns.to_string(),
        }),
    }
}
