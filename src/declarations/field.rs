//! Field Declaration Parser, spec.md §4.4. Grounded on `parse_fields` in
//! `examples/original_source/cipcc/parser.py`, generalized to resolve types
//! against the Type Resolver (the recovered snapshot only captured the raw
//! type text) and to reject complex first-piece declarators per
//! SPEC_FULL.md §D.3.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::FieldErrorKind;
use crate::profile::{Field, Profile};

use super::{resolve_plain_type, split_base_and_template, strip_access_label};
use super::splitter::{collapse_default_expressions, split_params};

static LEADING_CONST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*const\s+").unwrap());
/// Matches the name as a *prefix*, deliberately unanchored at the end, so a
/// trailing initializer (`= expr`, `{expr}`, `(expr)` — spec.md §6.3) doesn't
/// make the match fail; mirrors the recovered source's own unanchored
/// `FIELD_NAME_PATTERN` (`examples/original_source/cipcc/parser.py:459`).
static NAME_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([A-Za-z_]\w*)\s*").unwrap());

/// Matches `name` at the front of `text`, then requires whatever follows to be
/// either nothing or the start of an initializer (`=`, `{`, `(`). Returns
/// `None` for anything else, e.g. trailing junk after the name.
fn extract_name(text: &str) -> Option<String> {
    let caps = NAME_PREFIX_RE.captures(text)?;
    let name = caps.get(1).unwrap().as_str().to_string();
    let rest = text[caps.get(0).unwrap().end()..].trim();
    if rest.is_empty() || rest.starts_with('=') || rest.starts_with('{') || rest.starts_with('(') {
        Some(name)
    } else {
        None
    }
}

/// A field's declarator carries only a name and a canonical type per spec.md
/// §3; there is no pointer/reference/array form a `Field` can represent.
pub fn parse_field_statement(
    statement: &str,
    profile: &Profile,
    current_ns: &str,
) -> Result<Vec<Field>, FieldErrorKind> {
    let statement = strip_access_label(statement.trim());
    if statement.trim().is_empty() {
        return Ok(Vec::new());
    }

    // Default-value expressions may themselves contain top-level commas
    // (`Conf c = Conf(1, 2)`); collapse them before splitting the declarator
    // list so `split_params` doesn't mistake an initializer's internal comma
    // for a field separator.
    let collapsed = collapse_default_expressions(statement);
    let pieces = split_params(&collapsed).map_err(|_| {
        FieldErrorKind::InvalidDeclaration(format!("unbalanced angle brackets in field declaration: `{statement}`"))
    })?;
    let Some((first, rest)) = pieces.split_first() else {
        return Ok(Vec::new());
    };

    let (type_name, first_name) = parse_first_declarator(first, profile, current_ns)?;

    let mut fields = vec![Field { name: first_name, type_name: type_name.clone() }];
    for piece in rest {
        if piece.contains('*') || piece.contains('&') || piece.contains('[') {
            return Err(FieldErrorKind::ComplexDeclaration(statement.to_string()));
        }
        let Some(name) = extract_name(piece) else {
            return Err(FieldErrorKind::InvalidDeclaration(format!("unrecognized field declarator: `{piece}`")));
        };
        fields.push(Field { name, type_name: type_name.clone() });
    }
    Ok(fields)
}

fn parse_first_declarator(
    piece: &str,
    profile: &Profile,
    current_ns: &str,
) -> Result<(String, String), FieldErrorKind> {
    let without_const = LEADING_CONST_RE.replace(piece, "");
    let Some(base_and_tpl) = split_base_and_template(without_const.trim_start()) else {
        return Err(FieldErrorKind::InvalidDeclaration(format!("unrecognized field declaration: `{piece}`")));
    };
    let after_base = without_const.trim_start()[base_and_tpl.rest_start..].trim();

    if after_base.contains('*') || after_base.contains('&') || after_base.contains('[') {
        return Err(FieldErrorKind::ComplexDeclaration(piece.to_string()));
    }
    let Some(name) = extract_name(after_base) else {
        return Err(FieldErrorKind::InvalidDeclaration(format!("unrecognized field declaration: `{piece}`")));
    };

    let type_name = resolve_plain_type(
        &format!(
            "{}{}",
            base_and_tpl.base,
            base_and_tpl.raw_template_args.as_deref().map(|t| format!("<{t}>")).unwrap_or_default()
        ),
        profile,
        current_ns,
    )
    .map_err(FieldErrorKind::InvalidType)?;

    Ok((type_name, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile::new()
    }

    #[test]
    fn parses_simple_field() {
        let fields = parse_field_statement("std::size_t id", &profile(), "").unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "id");
        assert_eq!(fields[0].type_name, "std::size_t");
    }

    #[test]
    fn parses_combined_declaration_with_shared_type() {
        let fields = parse_field_statement("int x, y, z", &profile(), "").unwrap();
        assert_eq!(fields.len(), 3);
        assert!(fields.iter().all(|f| f.type_name == "int"));
        assert_eq!(fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), vec!["x", "y", "z"]);
    }

    #[test]
    fn strips_access_label() {
        let fields = parse_field_statement("public: int x", &profile(), "").unwrap();
        assert_eq!(fields[0].name, "x");
    }

    #[test]
    fn parses_templated_field() {
        let fields = parse_field_statement("std::vector<std::uint32_t> values", &profile(), "").unwrap();
        assert_eq!(fields[0].type_name, "std::vector<std::uint32_t>");
    }

    #[test]
    fn rejects_pointer_field() {
        let err = parse_field_statement("int* x", &profile(), "").unwrap_err();
        assert!(matches!(err, FieldErrorKind::ComplexDeclaration(_)));
    }

    #[test]
    fn rejects_reference_in_additional_piece() {
        let err = parse_field_statement("int x, &y", &profile(), "").unwrap_err();
        assert!(matches!(err, FieldErrorKind::ComplexDeclaration(_)));
    }

    #[test]
    fn unresolved_type_is_an_error() {
        let err = parse_field_statement("Bogus x", &profile(), "").unwrap_err();
        assert!(matches!(err, FieldErrorKind::InvalidType(_)));
    }

    #[test]
    fn accepts_assignment_initializer() {
        let fields = parse_field_statement("int x = 5", &profile(), "").unwrap();
        assert_eq!(fields[0].name, "x");
        assert_eq!(fields[0].type_name, "int");
    }

    #[test]
    fn accepts_brace_initializer() {
        let fields = parse_field_statement("int x{5}", &profile(), "").unwrap();
        assert_eq!(fields[0].name, "x");
    }

    #[test]
    fn accepts_paren_initializer() {
        let fields = parse_field_statement("int x(5)", &profile(), "").unwrap();
        assert_eq!(fields[0].name, "x");
    }

    #[test]
    fn initializer_with_internal_comma_does_not_split_the_declaration() {
        let mut profile = profile();
        profile.serializable_types.insert(
            "Conf".to_string(),
            crate::profile::Serializable {
                name: "Conf".into(),
                kind: crate::profile::SerializableKind::Struct,
                fields: Default::default(),
            },
        );
        let fields = parse_field_statement("Conf c = Conf(1, 2)", &profile, "").unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "c");
        assert_eq!(fields[0].type_name, "Conf");
    }

    #[test]
    fn additional_piece_accepts_initializer_too() {
        let fields = parse_field_statement("int x, y = 5", &profile(), "").unwrap();
        assert_eq!(fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn resolves_sibling_serializable_type() {
        let mut profile = profile();
        profile.serializable_types.insert(
            "Conf".to_string(),
            crate::profile::Serializable {
                name: "Conf".into(),
                kind: crate::profile::SerializableKind::Struct,
                fields: Default::default(),
            },
        );
        let fields = parse_field_statement("Conf config", &profile, "").unwrap();
        assert_eq!(fields[0].type_name, "Conf");
    }
}
