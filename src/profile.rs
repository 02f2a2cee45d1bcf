//! The data model: `Profile`, `Serializable`, `Field`, `Interface`, `Method`,
//! `Parameter`, `Callback`, per spec.md §3. Grounded on
//! `examples/original_source/cipcc/interface.py`, translated from Python
//! dataclasses into Rust structs with `indexmap::IndexMap` in place of `dict`
//! so that field/method insertion order survives (spec.md §3 invariant,
//! §8 testable property 5).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerializableKind {
    Enum,
    Struct,
    Builtin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Serializable {
    pub name: String,
    pub kind: SerializableKind,
    pub fields: IndexMap<String, Field>,
}

impl Serializable {
    fn builtin(name: &str) -> Self {
        Self { name: name.to_string(), kind: SerializableKind::Builtin, fields: IndexMap::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub r#type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
    pub is_const: bool,
}

impl Method {
    /// The unique signature key within an interface: `name(type,type,...)[const]`.
    pub fn signature_key(&self) -> String {
        let params = self.parameters.iter().map(|p| p.r#type.as_str()).collect::<Vec<_>>().join(",");
        if self.is_const {
            format!("{}({})const", self.name, params)
        } else {
            format!("{}({})", self.name, params)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callback {
    pub name: String,
    pub register_method: String,
    pub remove_method: String,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub methods: IndexMap<String, Method>,
    pub callbacks: IndexMap<String, Callback>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub serializable_types: IndexMap<String, Serializable>,
    pub interfaces: IndexMap<String, Interface>,
}

/// Fixed-width integer widths recognized by the built-in type table.
const FIXED_WIDTHS: [u16; 4] = [8, 16, 32, 64];

impl Profile {
    /// A fresh profile, pre-populated with the built-in scalar and collection
    /// types (spec.md §3 invariant: "Built-in types are pre-populated into
    /// every Profile at construction").
    pub fn new() -> Self {
        let mut serializable_types = IndexMap::new();
        for name in [
            "int",
            "float",
            "double",
            "std::size_t",
            "std::string",
            "std::deque",
            "std::list",
            "std::vector",
            "std::map",
            "std::unordered_map",
        ] {
            serializable_types.insert(name.to_string(), Serializable::builtin(name));
        }
        for width in FIXED_WIDTHS {
            for prefix in ["int", "uint"] {
                let canonical = format!("std::{prefix}{width}_t");
                serializable_types.insert(canonical.clone(), Serializable::builtin(&canonical));
            }
        }
        Self { serializable_types, interfaces: IndexMap::new() }
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.serializable_types.contains_key(name) || self.interfaces.contains_key(name)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps every recognized spelling (including aliases like `size_t` or
/// `int8_t` without the `std::` prefix) to its canonical form. Used by
/// [`crate::resolver`]; kept alongside the data model because it describes
/// the same built-in table `Profile::new` populates.
pub fn builtin_canonical(candidate: &str) -> Option<&'static str> {
    match candidate {
        "int" => Some("int"),
        "float" => Some("float"),
        "double" => Some("double"),
        "size_t" | "std::size_t" => Some("std::size_t"),
        "std::string" => Some("std::string"),
        "std::deque" => Some("std::deque"),
        "std::list" => Some("std::list"),
        "std::vector" => Some("std::vector"),
        "std::map" => Some("std::map"),
        "std::unordered_map" => Some("std::unordered_map"),
        _ => fixed_width_canonical(candidate),
    }
}

fn fixed_width_canonical(candidate: &str) -> Option<&'static str> {
    const NAMES: [&str; 16] = [
        "std::int8_t",
        "std::uint8_t",
        "std::int16_t",
        "std::uint16_t",
        "std::int32_t",
        "std::uint32_t",
        "std::int64_t",
        "std::uint64_t",
        "int8_t",
        "uint8_t",
        "int16_t",
        "uint16_t",
        "int32_t",
        "uint32_t",
        "int64_t",
        "uint64_t",
    ];
    const CANONICAL: [&str; 16] = [
        "std::int8_t",
        "std::uint8_t",
        "std::int16_t",
        "std::uint16_t",
        "std::int32_t",
        "std::uint32_t",
        "std::int64_t",
        "std::uint64_t",
        "std::int8_t",
        "std::uint8_t",
        "std::int16_t",
        "std::uint16_t",
        "std::int32_t",
        "std::uint32_t",
        "std::int64_t",
        "std::uint64_t",
    ];
    NAMES.iter().position(|n| *n == candidate).map(|i| CANONICAL[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_profile_has_builtin_scalars_and_collections() {
        let profile = Profile::new();
        assert!(profile.serializable_types.contains_key("int"));
        assert!(profile.serializable_types.contains_key("std::size_t"));
        assert!(profile.serializable_types.contains_key("std::vector"));
        assert!(profile.serializable_types.contains_key("std::int8_t"));
        assert_eq!(profile.interfaces.len(), 0);
    }

    #[test]
    fn builtin_aliases_canonicalize() {
        assert_eq!(builtin_canonical("size_t"), Some("std::size_t"));
        assert_eq!(builtin_canonical("uint8_t"), Some("std::uint8_t"));
        assert_eq!(builtin_canonical("std::uint8_t"), Some("std::uint8_t"));
        assert_eq!(builtin_canonical("char"), None);
    }

    #[test]
    fn method_signature_key_includes_const() {
        let m = Method {
            name: "foo".into(),
            return_type: "void".into(),
            parameters: vec![Parameter { name: "x".into(), r#type: "int".into() }],
            is_const: true,
        };
        assert_eq!(m.signature_key(), "foo(int)const");
    }
}
