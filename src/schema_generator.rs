use crate::facts::{FactStore, PropertyKind, TypeRef};
use crate::type_resolver::{FieldDef, PrimitiveType, TypeKind, TypeResolver};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Prefix of every definition reference
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Schema generator - converts declared types to Swagger schemas and owns
/// the named model definitions they reference
pub struct SchemaGenerator<'a, S: FactStore + ?Sized> {
    /// Type resolver for classifying declared types
    type_resolver: TypeResolver<'a, S>,
    /// Named definitions, registered at most once per name
    definitions: BTreeMap<String, Schema>,
    /// Types that degraded to the generic object schema
    fallbacks: Vec<Fallback>,
}

/// Swagger 2.0 schema object.
///
/// Keys without a dedicated field are kept in `extra`, so a raw schema read
/// from a manifest is written back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Reference to a named definition
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Properties for object types, in declaration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Required>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Any other keyword (`minLength`, `pattern`, `additionalProperties`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `required` is a flag on parameters and properties but a list of property
/// names on an object schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Required {
    Flag(bool),
    Fields(Vec<String>),
}

impl Schema {
    /// Schema with only a `type`
    pub fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    /// Object schema with the given properties
    pub fn object(properties: IndexMap<String, Schema>) -> Self {
        Self {
            schema_type: Some("object".to_string()),
            properties: Some(properties),
            ..Self::default()
        }
    }

    /// Reference to a named definition
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", DEFINITIONS_PREFIX, name)),
            ..Self::default()
        }
    }

    /// Merge `top` over `self`.
    ///
    /// Every field set in `top` wins; unset fields keep the value from
    /// `self`. Callers put explicit metadata (description, required,
    /// default) in `top` and the resolved type fragment in `self`.
    pub fn overlay(self, top: Schema) -> Schema {
        let mut extra = self.extra;
        extra.extend(top.extra);
        Schema {
            description: top.description.or(self.description),
            reference: top.reference.or(self.reference),
            schema_type: top.schema_type.or(self.schema_type),
            format: top.format.or(self.format),
            enum_values: top.enum_values.or(self.enum_values),
            items: top.items.or(self.items),
            properties: top.properties.or(self.properties),
            required: top.required.or(self.required),
            default: top.default.or(self.default),
            example: top.example.or(self.example),
            extra,
        }
    }
}

/// Result of resolving a declared type
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Schema fields to be used in place
    Inline(Schema),
    /// A model reference, carried under a `schema` key by its consumer
    Wrapped(Schema),
}

impl Resolved {
    /// The schema, with a model wrapper flattened away
    pub fn into_schema(self) -> Schema {
        match self {
            Resolved::Inline(schema) | Resolved::Wrapped(schema) => schema,
        }
    }
}

/// A declared type that could not be resolved to a documented schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback {
    pub type_name: String,
}

impl<'a, S: FactStore + ?Sized> SchemaGenerator<'a, S> {
    /// Create a new SchemaGenerator with a TypeResolver
    pub fn new(type_resolver: TypeResolver<'a, S>) -> Self {
        debug!("Initializing SchemaGenerator");
        Self {
            type_resolver,
            definitions: BTreeMap::new(),
            fallbacks: Vec::new(),
        }
    }

    /// Resolve a declared type into a schema fragment.
    ///
    /// A documented model resolves to a wrapped reference and has its
    /// definition registered on first use. An undocumented class resolves to
    /// `{type: "object"}` and is recorded in [`Self::fallbacks`].
    pub fn resolve(&mut self, type_ref: &TypeRef) -> Resolved {
        match self.type_resolver.resolve_type(type_ref) {
            TypeKind::Primitive(primitive) => Resolved::Inline(Self::primitive_to_schema(primitive)),
            TypeKind::Inline(schema) => Resolved::Inline(schema),
            TypeKind::Model { class, definition } => {
                self.generate_definition(&definition, &class);
                Resolved::Wrapped(Schema::reference(&definition))
            }
            TypeKind::Undocumented(class) => {
                warn!(
                    "Type {} has no model metadata, documenting it as a generic object",
                    class
                );
                self.fallbacks.push(Fallback { type_name: class });
                Resolved::Inline(Schema::of_type("object"))
            }
        }
    }

    /// Convert a primitive marker to a schema
    fn primitive_to_schema(primitive: PrimitiveType) -> Schema {
        match primitive {
            PrimitiveType::Text => Schema::of_type("string"),
            PrimitiveType::Number | PrimitiveType::Date => Schema::of_type("integer"),
            PrimitiveType::Boolean => Schema::of_type("boolean"),
        }
    }

    /// Generate the definition of a model class and add it to the collection
    fn generate_definition(&mut self, name: &str, class: &str) {
        // The placeholder below is what stops recursive models
        if self.definitions.contains_key(name) {
            debug!("Definition for {} already exists", name);
            return;
        }

        debug!("Generating definition {} for class {}", name, class);
        self.definitions
            .insert(name.to_string(), Schema::object(IndexMap::new()));

        let mut properties = IndexMap::new();
        for field in self.type_resolver.model_fields(class) {
            let schema = self.field_schema(&field);
            properties.insert(field.name, schema);
        }

        if let Some(definition) = self.definitions.get_mut(name) {
            definition.properties = Some(properties);
        }
    }

    /// Convert a model field to a property schema
    fn field_schema(&mut self, field: &FieldDef) -> Schema {
        let described = Schema {
            description: Some(field.description.clone()),
            ..Schema::default()
        };

        match &field.kind {
            PropertyKind::Array => {
                let items = self.resolve(&field.type_ref).into_schema();
                Schema {
                    items: Some(Box::new(items)),
                    ..Schema::of_type("array")
                }
                .overlay(described)
            }
            PropertyKind::Enum(values) => Schema {
                enum_values: Some(values.clone()),
                ..Schema::of_type("enum")
            }
            .overlay(described),
            PropertyKind::Scalar => self.resolve(&field.type_ref).into_schema().overlay(described),
        }
    }

    /// Get all generated definitions
    pub fn definitions(&self) -> &BTreeMap<String, Schema> {
        &self.definitions
    }

    /// Types that degraded to the generic object schema, in resolution order
    pub fn fallbacks(&self) -> &[Fallback] {
        &self.fallbacks
    }

    pub fn into_definitions(self) -> BTreeMap<String, Schema> {
        self.definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::store::MetadataStore;
    use crate::facts::{Fact, ModelFact, PropertyFact, Target};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn declare_model(store: &mut MetadataStore, class: &str, name: Option<&str>) {
        store.attach(
            Target::class(class),
            Fact::ResponseModel(ModelFact {
                name: name.map(str::to_string),
            }),
        );
    }

    fn declare_field(
        store: &mut MetadataStore,
        class: &str,
        field: &str,
        ty: TypeRef,
        kind: PropertyKind,
        schema: Option<TypeRef>,
    ) {
        store.declare_property(class, field, ty).attach(
            Target::member(class, field),
            Fact::ModelProperty(PropertyFact {
                description: format!("{} of {}", field, class),
                kind,
                schema,
            }),
        );
    }

    #[test]
    fn test_primitive_mapping() {
        let store = MetadataStore::new();
        let mut generator = SchemaGenerator::new(TypeResolver::new(&store));

        assert_eq!(
            generator.resolve(&TypeRef::String),
            Resolved::Inline(Schema::of_type("string"))
        );
        assert_eq!(
            generator.resolve(&TypeRef::Number),
            Resolved::Inline(Schema::of_type("integer"))
        );
        assert_eq!(
            generator.resolve(&TypeRef::Date),
            Resolved::Inline(Schema::of_type("integer"))
        );
        assert_eq!(
            generator.resolve(&TypeRef::Boolean),
            Resolved::Inline(Schema::of_type("boolean"))
        );
        assert!(generator.definitions().is_empty());
        assert!(generator.fallbacks().is_empty());
    }

    #[test]
    fn test_undecorated_class_falls_back_and_is_recorded() {
        let store = MetadataStore::new();
        let mut generator = SchemaGenerator::new(TypeResolver::new(&store));

        let resolved = generator.resolve(&TypeRef::class("Context"));

        assert_eq!(resolved, Resolved::Inline(Schema::of_type("object")));
        assert_eq!(
            generator.fallbacks(),
            &[Fallback {
                type_name: "Context".to_string()
            }]
        );
        assert!(generator.definitions().is_empty());
    }

    #[test]
    fn test_model_resolves_to_wrapped_reference_once() {
        let mut store = MetadataStore::new();
        declare_model(&mut store, "User", None);
        declare_field(&mut store, "User", "name", TypeRef::String, PropertyKind::Scalar, None);

        let mut generator = SchemaGenerator::new(TypeResolver::new(&store));
        let first = generator.resolve(&TypeRef::class("User"));
        let second = generator.resolve(&TypeRef::class("User"));

        assert_eq!(first, second);
        assert!(matches!(first, Resolved::Wrapped(_)));
        assert_eq!(first.into_schema(), Schema::reference("User"));
        assert_eq!(generator.definitions().len(), 1);
    }

    #[test]
    fn test_explicit_model_name() {
        let mut store = MetadataStore::new();
        declare_model(&mut store, "UserEntity", Some("User"));

        let mut generator = SchemaGenerator::new(TypeResolver::new(&store));
        let schema = generator.resolve(&TypeRef::class("UserEntity")).into_schema();

        assert_eq!(schema.reference.as_deref(), Some("#/definitions/User"));
        assert!(generator.definitions().contains_key("User"));
        assert!(!generator.definitions().contains_key("UserEntity"));
    }

    #[test]
    fn test_definition_property_shapes() {
        let mut store = MetadataStore::new();
        declare_model(&mut store, "User", None);
        declare_model(&mut store, "Address", None);
        declare_field(&mut store, "User", "id", TypeRef::Number, PropertyKind::Scalar, None);
        declare_field(
            &mut store,
            "User",
            "nicknames",
            TypeRef::class("Array"),
            PropertyKind::Array,
            Some(TypeRef::String),
        );
        declare_field(
            &mut store,
            "User",
            "role",
            TypeRef::String,
            PropertyKind::Enum(vec![json!("admin"), json!("member")]),
            None,
        );
        declare_field(
            &mut store,
            "User",
            "address",
            TypeRef::class("Address"),
            PropertyKind::Scalar,
            None,
        );
        declare_field(&mut store, "Address", "city", TypeRef::String, PropertyKind::Scalar, None);

        let mut generator = SchemaGenerator::new(TypeResolver::new(&store));
        generator.resolve(&TypeRef::class("User"));

        let user = serde_json::to_value(&generator.definitions()["User"]).unwrap();
        assert_eq!(
            user,
            json!({
                "type": "object",
                "properties": {
                    "id": {"description": "id of User", "type": "integer"},
                    "nicknames": {
                        "description": "nicknames of User",
                        "type": "array",
                        "items": {"type": "string"}
                    },
                    "role": {
                        "description": "role of User",
                        "type": "enum",
                        "enum": ["admin", "member"]
                    },
                    "address": {
                        "description": "address of User",
                        "$ref": "#/definitions/Address"
                    }
                }
            })
        );
        assert!(generator.definitions().contains_key("Address"));
    }

    #[test]
    fn test_array_of_models_unwraps_reference() {
        let mut store = MetadataStore::new();
        declare_model(&mut store, "Team", None);
        declare_model(&mut store, "Member", None);
        declare_field(
            &mut store,
            "Team",
            "members",
            TypeRef::class("Array"),
            PropertyKind::Array,
            Some(TypeRef::class("Member")),
        );

        let mut generator = SchemaGenerator::new(TypeResolver::new(&store));
        generator.resolve(&TypeRef::class("Team"));

        let members = &generator.definitions()["Team"].properties.as_ref().unwrap()["members"];
        assert_eq!(members.schema_type.as_deref(), Some("array"));
        assert_eq!(
            members.items.as_deref(),
            Some(&Schema::reference("Member"))
        );
    }

    #[test]
    fn test_mutually_recursive_models_terminate() {
        let mut store = MetadataStore::new();
        declare_model(&mut store, "A", None);
        declare_model(&mut store, "B", None);
        declare_field(&mut store, "A", "b", TypeRef::class("B"), PropertyKind::Scalar, None);
        declare_field(&mut store, "B", "a", TypeRef::class("A"), PropertyKind::Scalar, None);

        let mut generator = SchemaGenerator::new(TypeResolver::new(&store));
        generator.resolve(&TypeRef::class("A"));

        let definitions = generator.definitions();
        assert_eq!(definitions.len(), 2);
        assert_eq!(
            definitions["A"].properties.as_ref().unwrap()["b"].reference.as_deref(),
            Some("#/definitions/B")
        );
        assert_eq!(
            definitions["B"].properties.as_ref().unwrap()["a"].reference.as_deref(),
            Some("#/definitions/A")
        );
    }

    #[test]
    fn test_self_referencing_model() {
        let mut store = MetadataStore::new();
        declare_model(&mut store, "Node", None);
        declare_field(
            &mut store,
            "Node",
            "children",
            TypeRef::class("Array"),
            PropertyKind::Array,
            Some(TypeRef::class("Node")),
        );

        let mut generator = SchemaGenerator::new(TypeResolver::new(&store));
        generator.resolve(&TypeRef::class("Node"));

        assert_eq!(generator.definitions().len(), 1);
        let children = &generator.definitions()["Node"].properties.as_ref().unwrap()["children"];
        assert_eq!(children.items.as_deref(), Some(&Schema::reference("Node")));
    }

    #[test]
    fn test_undocumented_property_type_degrades() {
        let mut store = MetadataStore::new();
        declare_model(&mut store, "Event", None);
        declare_field(
            &mut store,
            "Event",
            "payload",
            TypeRef::class("Buffer"),
            PropertyKind::Scalar,
            None,
        );

        let mut generator = SchemaGenerator::new(TypeResolver::new(&store));
        generator.resolve(&TypeRef::class("Event"));

        let payload = &generator.definitions()["Event"].properties.as_ref().unwrap()["payload"];
        assert_eq!(payload.schema_type.as_deref(), Some("object"));
        assert_eq!(payload.description.as_deref(), Some("payload of Event"));
        assert_eq!(generator.fallbacks().len(), 1);
    }

    #[test]
    fn test_overlay_precedence() {
        let fragment = Schema {
            description: Some("from type".to_string()),
            format: Some("uuid".to_string()),
            ..Schema::of_type("string")
        };
        let merged = fragment.overlay(Schema {
            description: Some("explicit".to_string()),
            required: Some(Required::Flag(true)),
            ..Schema::default()
        });

        assert_eq!(merged.description.as_deref(), Some("explicit"));
        assert_eq!(merged.schema_type.as_deref(), Some("string"));
        assert_eq!(merged.format.as_deref(), Some("uuid"));
        assert_eq!(merged.required, Some(Required::Flag(true)));
    }

    #[test]
    fn test_definition_keeps_declaration_order() {
        let mut store = MetadataStore::new();
        declare_model(&mut store, "Event", None);
        declare_field(&mut store, "Event", "zeta", TypeRef::String, PropertyKind::Scalar, None);
        declare_field(&mut store, "Event", "alpha", TypeRef::Number, PropertyKind::Scalar, None);

        let mut generator = SchemaGenerator::new(TypeResolver::new(&store));
        generator.resolve(&TypeRef::class("Event"));

        let properties = generator.definitions()["Event"].properties.as_ref().unwrap();
        let names: Vec<&str> = properties.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);

        let rendered = serde_json::to_string(&generator.definitions()["Event"]).unwrap();
        assert!(rendered.find("zeta").unwrap() < rendered.find("alpha").unwrap());
    }

    #[test]
    fn test_inline_schema_is_kept_verbatim() {
        let raw = json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": {"type": "string", "minLength": 3, "pattern": "^a"},
                "tags": {"type": "array", "items": {"type": "string"}, "uniqueItems": true}
            },
            "additionalProperties": false
        });
        let schema: Schema = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(
            schema.required,
            Some(Required::Fields(vec!["id".to_string()]))
        );

        let store = MetadataStore::new();
        let mut generator = SchemaGenerator::new(TypeResolver::new(&store));
        let resolved = generator.resolve(&TypeRef::Inline(schema)).into_schema();

        assert_eq!(serde_json::to_value(&resolved).unwrap(), raw);
        assert!(generator.fallbacks().is_empty());
    }

    #[test]
    fn test_overlay_merges_extra_keywords() {
        let mut fragment = Schema::of_type("string");
        fragment.extra.insert("minLength".to_string(), json!(1));
        fragment.extra.insert("maxLength".to_string(), json!(8));
        let mut top = Schema::default();
        top.extra.insert("maxLength".to_string(), json!(4));

        let merged = fragment.overlay(top);
        assert_eq!(
            serde_json::to_value(&merged).unwrap(),
            json!({"type": "string", "minLength": 1, "maxLength": 4})
        );
    }
}
