//! Method Signature Parser, spec.md §4.5. No recovered-source equivalent
//! exists (`InterfaceCodeObserver.__call__` in
//! `examples/original_source/cipcc/parser.py` is an unfinished `pass  # TODO`)
//! — this is built entirely from `spec.md`'s own description, following the
//! same hand-rolled-recognizer style as [`crate::declarations::field`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::MethodErrorKind;
use crate::profile::{Method, Parameter, Profile};

use super::param::parse_parameter;
use super::resolve_plain_type;
use super::splitter::{collapse_default_expressions, split_params};

static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[[^\]]*\]\]").unwrap());
static PURE_VIRTUAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"=\s*0\s*$").unwrap());
static TAIL_RETURN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"->\s*(?P<tail>[\w:<>,\s]+)$").unwrap());
static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*$").unwrap());

/// Parses a single (possibly multi-line-assembled) method declaration and
/// expands it into `1 + k` overloads, `k` being the number of parameters with
/// a default argument (spec.md §4.5 rule 7).
pub fn parse_method_declaration(
    raw: &str,
    profile: &Profile,
    current_ns: &str,
) -> Result<Vec<Method>, MethodErrorKind> {
    let without_attrs = ATTRIBUTE_RE.replace_all(raw, " ");
    let trimmed = without_attrs.trim().trim_end_matches(';').trim();

    let without_pure = PURE_VIRTUAL_RE.replace(trimmed, "").trim().to_string();

    let open_idx =
        without_pure.find('(').ok_or_else(|| MethodErrorKind::InvalidParamDeclaration(raw.to_string()))?;
    let close_idx = find_matching_paren(&without_pure, open_idx)
        .ok_or_else(|| MethodErrorKind::InvalidParamDeclaration(raw.to_string()))?;

    let head = without_pure[..open_idx].trim();
    let params_text = &without_pure[open_idx + 1..close_idx];
    let mut tail = without_pure[close_idx + 1..].trim().to_string();

    let tail_return = TAIL_RETURN_RE.captures(&tail).map(|c| {
        let t = c.name("tail").unwrap().as_str().trim().to_string();
        let consumed = c.get(0).unwrap().start();
        tail.truncate(consumed);
        t
    });
    let tail = tail.trim();

    let mut is_const = false;
    let mut is_override = false;
    let mut is_final = false;
    for word in tail.split_whitespace() {
        match word {
            "const" => is_const = true,
            "override" => is_override = true,
            "final" => is_final = true,
            other => {
                return Err(MethodErrorKind::InvalidParamDeclaration(format!(
                    "unrecognized method qualifier `{other}` in `{raw}`"
                )))
            }
        }
    }

    let (is_virtual, head_after_virtual) = match head.strip_prefix("virtual") {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => (true, rest.trim_start()),
        _ => (false, head),
    };

    if is_final {
        return Err(MethodErrorKind::FinalMethod);
    }
    if !is_virtual && !is_override {
        return Err(MethodErrorKind::NonExtendable);
    }

    let base_and_tpl = super::split_base_and_template(head_after_virtual)
        .ok_or_else(|| MethodErrorKind::InvalidParamDeclaration(raw.to_string()))?;
    let name = head_after_virtual[base_and_tpl.rest_start..].trim();
    if !IDENT_RE.is_match(name) {
        return Err(MethodErrorKind::InvalidParamDeclaration(format!(
            "unrecognized method name in `{raw}`"
        )));
    }

    let return_text = format!(
        "{}{}",
        base_and_tpl.base,
        base_and_tpl.raw_template_args.as_deref().map(|t| format!("<{t}>")).unwrap_or_default()
    );

    let return_type = resolve_return_type(&return_text, tail_return.as_deref(), profile, current_ns)?;

    let mut parsed_params = Vec::new();
    for original in split_param_list(params_text)? {
        parsed_params.push(parse_parameter(&original, profile, current_ns)?);
    }

    Ok(expand_default_overloads(name, &return_type, is_const, parsed_params))
}

/// Splits a parameter-list substring on top-level commas, tracking `<>`
/// nesting for templates and `(`/`{` nesting for default-value expressions
/// directly over the original text (so a default like `= f(1, 2)` doesn't
/// split, while still handing `parse_parameter` the original `= ...` text it
/// needs to detect whether the parameter is optional).
fn split_param_list(text: &str) -> Result<Vec<String>, MethodErrorKind> {
    // Validates bracket balance up front with the shared splitter; the actual
    // boundaries used below also need to skip default-value parens/braces,
    // which `split_params` alone does not track.
    split_params(&collapse_default_expressions(text)).map_err(|_| MethodErrorKind::UnbalancedAngleBrackets)?;

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let chars: Vec<char> = text.chars().collect();
    let mut angle_depth = 0i32;
    let mut paren_depth = 0i32;
    let mut pieces = Vec::new();
    let mut start = 0usize;
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '<' => angle_depth += 1,
            '>' => angle_depth -= 1,
            '(' | '{' => paren_depth += 1,
            ')' | '}' => paren_depth -= 1,
            ',' if angle_depth == 0 && paren_depth == 0 => {
                pieces.push(chars[start..i].iter().collect::<String>().trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(chars[start..].iter().collect::<String>().trim().to_string());
    Ok(pieces)
}

fn find_matching_paren(text: &str, open_idx: usize) -> Option<usize> {
    let chars: Vec<char> = text.chars().collect();
    let mut depth = 0i32;
    for (i, &c) in chars.iter().enumerate().skip(open_idx) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn resolve_return_type(
    return_text: &str,
    tail_return: Option<&str>,
    profile: &Profile,
    current_ns: &str,
) -> Result<String, MethodErrorKind> {
    let effective = if return_text == "auto" {
        tail_return.ok_or(MethodErrorKind::MissingTailReturn)?
    } else {
        return_text
    };
    if effective == "void" {
        return Ok("void".to_string());
    }
    resolve_plain_type(effective, profile, current_ns).map_err(MethodErrorKind::InvalidReturnType)
}

fn expand_default_overloads(
    name: &str,
    return_type: &str,
    is_const: bool,
    parsed_params: Vec<super::param::ParsedParam>,
) -> Vec<Method> {
    let mut overloads = Vec::new();
    let mut accumulated: Vec<Parameter> = Vec::new();
    for parsed in &parsed_params {
        if parsed.optional {
            overloads.push(accumulated.clone());
        }
        accumulated.push(parsed.parameter.clone());
    }
    overloads.push(accumulated);

    overloads
        .into_iter()
        .map(|parameters| Method {
            name: name.to_string(),
            return_type: return_type.to_string(),
            parameters,
            is_const,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile::new()
    }

    #[test]
    fn simple_pure_virtual_method() {
        let methods = parse_method_declaration("virtual int Encode(int foo) const = 0", &profile(), "").unwrap();
        assert_eq!(methods.len(), 1);
        let m = &methods[0];
        assert_eq!(m.signature_key(), "Encode(int)const");
        assert_eq!(m.return_type, "int");
        assert_eq!(m.parameters, vec![Parameter { name: "foo".into(), r#type: "int".into() }]);
    }

    #[test]
    fn default_arguments_expand_into_overloads() {
        let methods =
            parse_method_declaration(r#"virtual int foo(int x = 0, std::string msg = "")"#, &profile(), "")
                .unwrap();
        let keys: Vec<_> = methods.iter().map(|m| m.signature_key()).collect();
        assert_eq!(keys, vec!["foo()", "foo(int)", "foo(int,std::string)"]);
    }

    #[test]
    fn const_reference_parameter_canonicalizes() {
        let methods = parse_method_declaration("virtual int f(const int& x) const", &profile(), "").unwrap();
        assert_eq!(methods[0].signature_key(), "f(int const&)const");
        assert_eq!(methods[0].parameters[0].r#type, "int const&");
    }

    #[test]
    fn non_virtual_method_is_rejected() {
        let err = parse_method_declaration("int foo(int x)", &profile(), "").unwrap_err();
        assert!(matches!(err, MethodErrorKind::NonExtendable));
    }

    #[test]
    fn final_method_is_rejected() {
        let err = parse_method_declaration("virtual int foo(int x) final", &profile(), "").unwrap_err();
        assert!(matches!(err, MethodErrorKind::FinalMethod));
    }

    #[test]
    fn override_without_virtual_keyword_is_accepted() {
        let methods = parse_method_declaration("int foo(int x) override", &profile(), "").unwrap();
        assert_eq!(methods[0].signature_key(), "foo(int)");
    }

    #[test]
    fn auto_return_without_tail_return_is_rejected() {
        let err = parse_method_declaration("virtual auto foo(int x) const", &profile(), "").unwrap_err();
        assert!(matches!(err, MethodErrorKind::MissingTailReturn));
    }

    #[test]
    fn auto_with_tail_return_resolves_tail_type() {
        let methods =
            parse_method_declaration("virtual auto foo(int x) const -> std::string", &profile(), "").unwrap();
        assert_eq!(methods[0].return_type, "std::string");
    }

    #[test]
    fn void_return_is_accepted_without_resolution() {
        let methods = parse_method_declaration("virtual void foo(int x)", &profile(), "").unwrap();
        assert_eq!(methods[0].return_type, "void");
    }

    #[test]
    fn unresolvable_return_type_is_rejected() {
        let err = parse_method_declaration("virtual Bogus foo(int x)", &profile(), "").unwrap_err();
        assert!(matches!(err, MethodErrorKind::InvalidReturnType(_)));
    }

    #[test]
    fn empty_parameter_list() {
        let methods = parse_method_declaration("virtual int foo()", &profile(), "").unwrap();
        assert_eq!(methods.len(), 1);
        assert!(methods[0].parameters.is_empty());
    }

    #[test]
    fn attributes_are_ignored() {
        let methods =
            parse_method_declaration("[[nodiscard]] virtual int foo(int x) const", &profile(), "").unwrap();
        assert_eq!(methods[0].signature_key(), "foo(int)const");
    }

    #[test]
    fn default_value_with_internal_comma_does_not_split_parameter() {
        let methods = parse_method_declaration(
            "virtual void foo(std::vector<int> x = std::vector<int>{1, 2})",
            &profile(),
            "",
        )
        .unwrap();
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].signature_key(), "foo()");
        assert_eq!(methods[1].signature_key(), "foo(std::vector<int>)");
    }
}
