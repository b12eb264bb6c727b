//! Metadata facts describing controllers, handlers, parameters and models.
//!
//! The document builder never looks at how facts get attached. It only reads
//! them through the [`FactStore`] trait, which answers presence, single-fact
//! and multi-fact queries keyed by a [`Target`] and a [`FactKey`], plus two
//! reflection queries: the handler methods of a class (with their positional
//! parameter types) and the declared properties of a model class.
//!
//! [`store::MetadataStore`] is the in-memory implementation; the
//! [`crate::manifest`] module fills one from declarative manifest files.
//!
//! Classes are identified by their canonical string name. Nothing in this
//! crate relies on object identity.

pub mod store;

use crate::schema_generator::Schema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Read-only access to metadata facts.
pub trait FactStore {
    /// Returns every fact of kind `key` attached to `target`, in attachment order.
    fn get_all_facts(&self, target: &Target, key: FactKey) -> Vec<&Fact>;

    /// Returns the first fact of kind `key` attached to `target`.
    fn get_fact(&self, target: &Target, key: FactKey) -> Option<&Fact> {
        self.get_all_facts(target, key).into_iter().next()
    }

    /// Whether `target` carries at least one fact of kind `key`.
    fn has_fact(&self, target: &Target, key: FactKey) -> bool {
        self.get_fact(target, key).is_some()
    }

    /// Methods declared on `class`, in declaration order.
    fn methods(&self, class: &str) -> &[MethodSignature];

    /// Properties declared on `class`, in declaration order.
    fn properties(&self, class: &str) -> &[PropertySignature];
}

/// What a fact is attached to: a class, one of its members, or a positional
/// parameter of a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub class: String,
    pub member: Option<String>,
    pub index: Option<usize>,
}

impl Target {
    pub fn class(class: &str) -> Self {
        Self {
            class: class.to_string(),
            member: None,
            index: None,
        }
    }

    pub fn member(class: &str, member: &str) -> Self {
        Self {
            class: class.to_string(),
            member: Some(member.to_string()),
            index: None,
        }
    }

    pub fn parameter(class: &str, method: &str, index: usize) -> Self {
        Self {
            class: class.to_string(),
            member: Some(method.to_string()),
            index: Some(index),
        }
    }
}

/// Discriminant used to query one kind of fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactKey {
    Controller,
    Http,
    Tag,
    Summary,
    Description,
    Binding(ParameterLocation),
    Required,
    Response,
    ResponseBody,
    ResponseException,
    ResponseModel,
    ModelProperty,
    PropertyName,
}

/// A single typed fact.
#[derive(Debug, Clone, PartialEq)]
pub enum Fact {
    /// Marks a class as a controller.
    Controller(ControllerFact),
    /// One verb + path binding of a handler method.
    Http(HttpBinding),
    /// A tag declared on a controller class.
    Tag(TagFact),
    Summary(String),
    /// Description of a handler method or of a parameter.
    Description(String),
    /// Where a handler parameter is bound from.
    Binding(ParameterBinding),
    Required(RequiredFact),
    /// Status code of the primary response.
    Response(u16),
    ResponseBody(ResponseBodyFact),
    ResponseException(ResponseExceptionFact),
    /// Marks a class as a documented model.
    ResponseModel(ModelFact),
    ModelProperty(PropertyFact),
    /// External name of a model property.
    PropertyName(String),
}

impl Fact {
    pub fn key(&self) -> FactKey {
        match self {
            Fact::Controller(_) => FactKey::Controller,
            Fact::Http(_) => FactKey::Http,
            Fact::Tag(_) => FactKey::Tag,
            Fact::Summary(_) => FactKey::Summary,
            Fact::Description(_) => FactKey::Description,
            Fact::Binding(binding) => FactKey::Binding(binding.location),
            Fact::Required(_) => FactKey::Required,
            Fact::Response(_) => FactKey::Response,
            Fact::ResponseBody(_) => FactKey::ResponseBody,
            Fact::ResponseException(_) => FactKey::ResponseException,
            Fact::ResponseModel(_) => FactKey::ResponseModel,
            Fact::ModelProperty(_) => FactKey::ModelProperty,
            Fact::PropertyName(_) => FactKey::PropertyName,
        }
    }

    /// Text payload of summary, description and property-name facts.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Fact::Summary(text) | Fact::Description(text) | Fact::PropertyName(text) => {
                Some(text)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ControllerFact {
    #[serde(default)]
    pub base_path: String,
    /// Advice controllers hold cross-cutting handlers and are not documented.
    #[serde(default)]
    pub advice: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HttpBinding {
    pub method: HttpMethod,
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TagFact {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBinding {
    pub location: ParameterLocation,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequiredFact {
    pub value: bool,
    pub default: Option<serde_json::Value>,
}

/// Declared body of the primary response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseBodyFact {
    pub description: String,
    pub shape: Option<ResponseShape>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// A single value of the given type.
    Single(TypeRef),
    /// An array whose elements have the given type.
    Array(TypeRef),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseExceptionFact {
    pub code: u16,
    pub description: String,
    #[serde(default, rename = "type")]
    pub ty: Option<TypeRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelFact {
    /// Explicit definition name; the class name is used when absent.
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFact {
    pub description: String,
    pub kind: PropertyKind,
    /// Overrides the declared property type (element type for arrays).
    pub schema: Option<TypeRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PropertyKind {
    #[default]
    Scalar,
    Array,
    Enum(Vec<serde_json::Value>),
}

/// Location a handler parameter is bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
}

impl ParameterLocation {
    /// Order in which bindings are checked; the first one present wins.
    pub const PRECEDENCE: [ParameterLocation; 4] = [
        ParameterLocation::Path,
        ParameterLocation::Query,
        ParameterLocation::Header,
        ParameterLocation::Body,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Body => "body",
        }
    }
}

/// HTTP methods a handler can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// Lower-cased verb, as used for path item keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "delete" => Ok(HttpMethod::Delete),
            "patch" => Ok(HttpMethod::Patch),
            "options" => Ok(HttpMethod::Options),
            "head" => Ok(HttpMethod::Head),
            _ => Err(format!("unsupported HTTP method: {}", s)),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Declared type of a parameter, property or response body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "TypeRefRepr")]
pub enum TypeRef {
    String,
    Number,
    Date,
    Boolean,
    /// Reference to a class by its canonical name.
    Class(String),
    /// A raw schema supplied verbatim.
    Inline(Schema),
}

impl TypeRef {
    pub fn class(name: &str) -> Self {
        TypeRef::Class(name.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TypeRefRepr {
    Named(String),
    Inline(Schema),
}

impl From<TypeRefRepr> for TypeRef {
    fn from(repr: TypeRefRepr) -> Self {
        match repr {
            TypeRefRepr::Named(name) => match name.as_str() {
                "string" => TypeRef::String,
                "number" => TypeRef::Number,
                "date" => TypeRef::Date,
                "boolean" => TypeRef::Boolean,
                _ => TypeRef::Class(name),
            },
            TypeRefRepr::Inline(schema) => TypeRef::Inline(schema),
        }
    }
}

/// A method declared on a class, with the types of its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub name: String,
    pub parameters: Vec<TypeRef>,
}

/// A property declared on a class.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySignature {
    pub name: String,
    pub ty: TypeRef,
}
