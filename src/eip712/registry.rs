//! EIP-712 Type Registry
//!
//! Named struct definitions, canonical type strings and dependency closures.
//! References to other structs may be registered in any order; they are
//! resolved when the graph is validated or hashed.

use serde_json::Value as Json;
use std::collections::{BTreeMap, BTreeSet};

use super::types::*;
use crate::abi::parser::is_identifier;
use crate::abi::{AbiType, AbiValue};

/// Registry of struct types keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeDefinition>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from definitions and validate the resulting graph
    pub fn from_definitions<I>(definitions: I) -> Result<Self, Eip712Error>
    where
        I: IntoIterator<Item = TypeDefinition>,
    {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition)?;
        }
        registry.validate()?;
        Ok(registry)
    }

    /// Register a struct type.
    ///
    /// Re-registering an identical definition is a no-op; a different field list
    /// under the same name is a `DuplicateType`.
    pub fn register(&mut self, definition: TypeDefinition) -> Result<(), Eip712Error> {
        if !is_identifier(&definition.name) || AbiType::is_elementary_name(&definition.name) {
            return Err(Eip712Error::InvalidTypeName(definition.name));
        }

        if let Some(existing) = self.types.get(&definition.name) {
            return if existing.fields == definition.fields {
                Ok(())
            } else {
                Err(Eip712Error::DuplicateType(definition.name))
            };
        }

        let mut seen = BTreeSet::new();
        for field in &definition.fields {
            if !is_identifier(&field.name) {
                return Err(Eip712Error::InvalidTypeName(format!(
                    "{}.{}",
                    definition.name, field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Eip712Error::DuplicateField {
                    type_name: definition.name.clone(),
                    field: field.name.clone(),
                });
            }
            Eip712Type::parse(&field.type_name)?;
        }

        self.types.insert(definition.name.clone(), definition);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered type names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Look up a definition, failing with `UnknownType`
    pub fn definition(&self, name: &str) -> Result<&TypeDefinition, Eip712Error> {
        self.types
            .get(name)
            .ok_or_else(|| Eip712Error::UnknownType(name.to_string()))
    }

    /// Parse a field type and check that any struct it names is registered
    pub fn resolve(&self, type_name: &str) -> Result<Eip712Type, Eip712Error> {
        let resolved = Eip712Type::parse(type_name)?;
        if let Some(name) = resolved.struct_name() {
            self.definition(name)?;
        }
        Ok(resolved)
    }

    /// Struct names transitively reachable from `name` through its fields,
    /// excluding `name` itself. Fails if any reference is unresolved.
    pub fn dependencies_of(&self, name: &str) -> Result<BTreeSet<String>, Eip712Error> {
        let mut found = BTreeSet::new();
        let mut to_visit = vec![name.to_string()];
        let mut visited = BTreeSet::new();

        while let Some(current) = to_visit.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }

            for field in &self.definition(&current)?.fields {
                if let Some(dep) = self.resolve(&field.type_name)?.struct_name() {
                    if dep != name {
                        found.insert(dep.to_string());
                    }
                    to_visit.push(dep.to_string());
                }
            }
        }

        Ok(found)
    }

    /// `encodeType`: the primary type followed by its dependencies in name order
    pub fn canonical_type_string(&self, name: &str) -> Result<String, Eip712Error> {
        let mut result = self.definition(name)?.encode();
        for dep in self.dependencies_of(name)? {
            result.push_str(&self.definition(&dep)?.encode());
        }
        Ok(result)
    }

    /// Check every field type of every registered struct
    pub fn validate(&self) -> Result<(), Eip712Error> {
        for definition in self.types.values() {
            for field in &definition.fields {
                self.resolve(&field.type_name)?;
            }
        }
        Ok(())
    }

    /// Convert a JSON value (as in `eth_signTypedData_v4` messages) into a value tree
    /// for `type_name`. Object keys the struct does not declare are rejected.
    pub fn value_from_json(&self, type_name: &str, json: &Json) -> Result<TypedValue, Eip712Error> {
        let resolved = self.resolve(type_name)?;
        self.convert_json(&resolved, json)
    }

    fn convert_json(&self, ty: &Eip712Type, json: &Json) -> Result<TypedValue, Eip712Error> {
        match ty {
            Eip712Type::Elementary(abi_type) => {
                Ok(TypedValue::Atomic(AbiValue::from_json(abi_type, json)?))
            }

            Eip712Type::Array { element, .. } => {
                let items = json.as_array().ok_or_else(|| Eip712Error::TypeMismatch {
                    expected: "array".to_string(),
                    got: json.to_string(),
                })?;
                items
                    .iter()
                    .map(|item| self.convert_json(element, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(TypedValue::Array)
            }

            Eip712Type::Struct(name) => {
                let object = json.as_object().ok_or_else(|| Eip712Error::TypeMismatch {
                    expected: name.clone(),
                    got: json.to_string(),
                })?;
                let definition = self.definition(name)?;

                let mut fields = BTreeMap::new();
                for (key, value) in object {
                    let converted = match definition.fields.iter().find(|f| &f.name == key) {
                        Some(field) => self.convert_json(&self.resolve(&field.type_name)?, value)?,
                        None => {
                            return Err(Eip712Error::UnexpectedField {
                                type_name: name.clone(),
                                field: key.clone(),
                            })
                        }
                    };
                    fields.insert(key.clone(), converted);
                }
                Ok(TypedValue::Struct(fields))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail_types() -> Vec<TypeDefinition> {
        vec![
            TypeDefinition::new(
                "Mail",
                vec![
                    FieldDefinition::new("from", "Person"),
                    FieldDefinition::new("to", "Person"),
                    FieldDefinition::new("contents", "string"),
                ],
            ),
            TypeDefinition::new(
                "Person",
                vec![
                    FieldDefinition::new("name", "string"),
                    FieldDefinition::new("wallet", "address"),
                ],
            ),
        ]
    }

    #[test]
    fn test_canonical_type_string() {
        let registry = TypeRegistry::from_definitions(mail_types()).unwrap();
        assert_eq!(
            registry.canonical_type_string("Mail").unwrap(),
            "Mail(Person from,Person to,string contents)Person(string name,address wallet)"
        );
        assert_eq!(
            registry.canonical_type_string("Person").unwrap(),
            "Person(string name,address wallet)"
        );
    }

    #[test]
    fn test_dependency_order_independent_of_registration() {
        let zebra = TypeDefinition::new("Zebra", vec![FieldDefinition::new("x", "uint8")]);
        let apple = TypeDefinition::new("Apple", vec![FieldDefinition::new("y", "bool")]);
        let root = TypeDefinition::new(
            "Root",
            vec![
                FieldDefinition::new("z", "Zebra[]"),
                FieldDefinition::new("a", "Apple"),
            ],
        );

        let forward = TypeRegistry::from_definitions(vec![root.clone(), zebra.clone(), apple.clone()]).unwrap();
        let backward = TypeRegistry::from_definitions(vec![apple, zebra, root]).unwrap();

        let expected = "Root(Zebra[] z,Apple a)Apple(bool y)Zebra(uint8 x)";
        assert_eq!(forward.canonical_type_string("Root").unwrap(), expected);
        assert_eq!(backward.canonical_type_string("Root").unwrap(), expected);
    }

    #[test]
    fn test_transitive_and_recursive_dependencies() {
        let registry = TypeRegistry::from_definitions(vec![
            TypeDefinition::new("A", vec![FieldDefinition::new("b", "B")]),
            TypeDefinition::new("B", vec![FieldDefinition::new("c", "C[2]")]),
            TypeDefinition::new(
                "C",
                vec![
                    FieldDefinition::new("v", "uint256"),
                    FieldDefinition::new("parent", "A"),
                ],
            ),
        ])
        .unwrap();

        let deps: Vec<_> = registry.dependencies_of("A").unwrap().into_iter().collect();
        assert_eq!(deps, vec!["B", "C"]);
    }

    #[test]
    fn test_register_idempotent_and_duplicate() {
        let mut registry = TypeRegistry::new();
        let person = mail_types().remove(1);
        registry.register(person.clone()).unwrap();
        registry.register(person).unwrap();
        assert_eq!(registry.len(), 1);

        let other = TypeDefinition::new("Person", vec![FieldDefinition::new("name", "string")]);
        assert_eq!(
            registry.register(other),
            Err(Eip712Error::DuplicateType("Person".to_string()))
        );
    }

    #[test]
    fn test_register_rejects_bad_definitions() {
        let mut registry = TypeRegistry::new();
        assert!(matches!(
            registry.register(TypeDefinition::new("uint256", vec![])),
            Err(Eip712Error::InvalidTypeName(_))
        ));
        assert!(matches!(
            registry.register(TypeDefinition::new(
                "Dup",
                vec![FieldDefinition::new("a", "bool"), FieldDefinition::new("a", "bool")],
            )),
            Err(Eip712Error::DuplicateField { .. })
        ));
        assert!(matches!(
            registry.register(TypeDefinition::new("Bad", vec![FieldDefinition::new("a", "uint7")])),
            Err(Eip712Error::Abi(_))
        ));
    }

    #[test]
    fn test_unknown_reference() {
        let err = TypeRegistry::from_definitions(vec![TypeDefinition::new(
            "Mail",
            vec![FieldDefinition::new("from", "Person")],
        )])
        .unwrap_err();
        assert_eq!(err, Eip712Error::UnknownType("Person".to_string()));
    }

    #[test]
    fn test_value_from_json_rejects_extra_keys() {
        let registry = TypeRegistry::from_definitions(mail_types()).unwrap();
        let err = registry
            .value_from_json(
                "Person",
                &serde_json::json!({"name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826", "age": 3}),
            )
            .unwrap_err();
        assert!(matches!(err, Eip712Error::UnexpectedField { .. }));
    }
}
