use crate::facts::{Fact, FactKey, FactStore, PropertyKind, Target, TypeRef};
use crate::schema_generator::Schema;
use log::debug;

/// Type resolver - classifies declared types against the fact store
pub struct TypeResolver<'a, S: FactStore + ?Sized> {
    facts: &'a S,
}

/// Type kind - represents different categories of declared types
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// A primitive marker
    Primitive(PrimitiveType),
    /// A class carrying a model fact, documented under `definition`
    Model { class: String, definition: String },
    /// A class without a model fact
    Undocumented(String),
    /// A raw schema supplied verbatim
    Inline(Schema),
}

/// Primitive markers supported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Text,
    Number,
    Date,
    Boolean,
}

/// Field definition of a documented model
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// External name (rename fact, else the property identifier)
    pub name: String,
    pub description: String,
    pub kind: PropertyKind,
    /// Declared type, or the property fact's override when present
    pub type_ref: TypeRef,
}

impl<'a, S: FactStore + ?Sized> TypeResolver<'a, S> {
    pub fn new(facts: &'a S) -> Self {
        Self { facts }
    }

    /// Resolve a declared type
    pub fn resolve_type(&self, type_ref: &TypeRef) -> TypeKind {
        match type_ref {
            TypeRef::String => TypeKind::Primitive(PrimitiveType::Text),
            TypeRef::Number => TypeKind::Primitive(PrimitiveType::Number),
            TypeRef::Date => TypeKind::Primitive(PrimitiveType::Date),
            TypeRef::Boolean => TypeKind::Primitive(PrimitiveType::Boolean),
            TypeRef::Inline(schema) => TypeKind::Inline(schema.clone()),
            TypeRef::Class(class) => match self.definition_name(class) {
                Some(definition) => TypeKind::Model {
                    class: class.clone(),
                    definition,
                },
                None => TypeKind::Undocumented(class.clone()),
            },
        }
    }

    /// Definition name of a model class: its explicit name, else the class name
    pub fn definition_name(&self, class: &str) -> Option<String> {
        match self
            .facts
            .get_fact(&Target::class(class), FactKey::ResponseModel)?
        {
            Fact::ResponseModel(model) => Some(
                model
                    .name
                    .clone()
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| class.to_string()),
            ),
            _ => None,
        }
    }

    /// Documented fields of a model class, in declaration order
    ///
    /// Properties without a property fact are not part of the model.
    pub fn model_fields(&self, class: &str) -> Vec<FieldDef> {
        let mut fields = Vec::new();
        for property in self.facts.properties(class) {
            let target = Target::member(class, &property.name);
            let Some(Fact::ModelProperty(fact)) =
                self.facts.get_fact(&target, FactKey::ModelProperty)
            else {
                debug!("Skipping undocumented property {}.{}", class, property.name);
                continue;
            };

            let name = self
                .facts
                .get_fact(&target, FactKey::PropertyName)
                .and_then(Fact::as_text)
                .filter(|name| !name.is_empty())
                .unwrap_or(property.name.as_str())
                .to_string();

            fields.push(FieldDef {
                name,
                description: fact.description.clone(),
                kind: fact.kind.clone(),
                type_ref: fact.schema.clone().unwrap_or_else(|| property.ty.clone()),
            });
        }
        fields
    }
}
