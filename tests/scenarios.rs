//! End-to-end scenarios, spec.md §8 "Concrete scenarios" table, driven
//! through the public [`ipc_profile::parse`] entry point against real
//! temp-directory headers rather than the scanner directly.

use std::fs;
use std::path::Path;

use ipc_profile::ParseFailure;
use tempfile::tempdir;

fn parse_one(contents: &str) -> ipc_profile::Profile {
    let dir = tempdir().unwrap();
    let path = dir.path().join("header.h");
    fs::write(&path, contents).unwrap();
    ipc_profile::parse(&[path], &[] as &[&Path]).unwrap()
}

#[test]
fn scenario_1_simple_serializable_struct() {
    let profile = parse_one(
        "// @IPC(Serializable)\nstruct Foo {\n  std::size_t id;\n  std::string name;\n};\n",
    );
    let foo = profile.serializable_types.get("Foo").expect("Foo registered");
    assert_eq!(foo.fields.get("id").unwrap().type_name, "std::size_t");
    assert_eq!(foo.fields.get("name").unwrap().type_name, "std::string");
}

#[test]
fn scenario_2_nested_namespace_qualifies_name() {
    let profile = parse_one(
        "namespace bar::baz {\n// @IPC(Serializable)\nstruct Foo {\n  std::size_t id;\n  std::string name;\n};\n}\n",
    );
    let foo = profile.serializable_types.get("bar::baz::Foo").expect("qualified name registered");
    assert_eq!(foo.fields.get("id").unwrap().type_name, "std::size_t");
    assert_eq!(foo.fields.get("name").unwrap().type_name, "std::string");
}

#[test]
fn scenario_3_pure_virtual_const_method() {
    let profile = parse_one(
        "// @IPC(Interface)\nclass Interface {\npublic:\n  // @IPC(Method)\n  virtual int Encode(int foo) const = 0;\n};\n",
    );
    let method = profile.interfaces.get("Interface").unwrap().methods.get("Encode(int)const").unwrap();
    assert_eq!(method.return_type, "int");
    assert_eq!(method.parameters.len(), 1);
    assert_eq!(method.parameters[0].name, "foo");
    assert_eq!(method.parameters[0].r#type, "int");
}

#[test]
fn scenario_4_default_arguments_produce_three_overloads() {
    let profile = parse_one(
        "// @IPC(Interface)\nclass Interface {\npublic:\n  // @IPC(Method)\n  virtual int foo(int x = 0, std::string msg = \"\");\n};\n",
    );
    let methods = &profile.interfaces.get("Interface").unwrap().methods;
    assert!(methods.contains_key("foo()"));
    assert!(methods.contains_key("foo(int)"));
    assert!(methods.contains_key("foo(int,std::string)"));
    assert_eq!(methods.len(), 3);
}

#[test]
fn scenario_5_const_reference_parameter_canonicalizes() {
    let profile = parse_one(
        "// @IPC(Interface)\nclass Interface {\npublic:\n  // @IPC(Method)\n  virtual int f(const int& x) const;\n};\n",
    );
    let method = profile.interfaces.get("Interface").unwrap().methods.get("f(int const&)const").unwrap();
    assert_eq!(method.parameters[0].r#type, "int const&");
}

#[test]
fn scenario_6_non_virtual_method_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("header.h");
    fs::write(
        &path,
        "// @IPC(Interface)\nclass Interface {\npublic:\n  // @IPC(Method)\n  int foo(int x);\n};\n",
    )
    .unwrap();

    let err = ipc_profile::parse(&[path], &[] as &[&Path]).unwrap_err();
    assert!(matches!(err, ParseFailure::InvalidMethodDeclaration { .. }));
}

#[test]
fn explicit_field_observer_only_captures_annotated_statements() {
    let profile = parse_one(
        "// @IPC(Serializable, auto=False)\nstruct Foo {\n  int ignored_helper_field;\n  // @IPC(Field)\n  std::size_t id;\n};\n",
    );
    let foo = profile.serializable_types.get("Foo").unwrap();
    assert!(foo.fields.contains_key("id"));
    assert!(!foo.fields.contains_key("ignored_helper_field"));
}

#[test]
fn enum_serializable_has_no_fields() {
    let profile = parse_one("// @IPC(Serializable)\nenum class Color {\n  Red,\n  Green,\n  Blue,\n};\n");
    let color = profile.serializable_types.get("Color").unwrap();
    assert_eq!(color.kind, ipc_profile::SerializableKind::Enum);
    assert!(color.fields.is_empty());
}

#[test]
fn duplicate_serializable_name_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("header.h");
    fs::write(
        &path,
        "// @IPC(Serializable)\nstruct Foo { int x; };\n// @IPC(Serializable)\nstruct Foo { int y; };\n",
    )
    .unwrap();

    let err = ipc_profile::parse(&[path], &[] as &[&Path]).unwrap_err();
    assert!(matches!(err, ParseFailure::DuplicateName { .. }));
}

#[test]
fn struct_declared_as_interface_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("header.h");
    fs::write(&path, "// @IPC(Interface)\nstruct Interface {\n  int x;\n};\n").unwrap();

    let err = ipc_profile::parse(&[path], &[] as &[&Path]).unwrap_err();
    assert!(matches!(err, ParseFailure::ParsingError { .. }));
}
