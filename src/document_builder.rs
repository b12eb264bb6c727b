use crate::facts::{
    Fact, FactKey, FactStore, MethodSignature, ParameterLocation, ResponseShape, TagFact, Target,
};
use crate::schema_generator::{Fallback, Required, Resolved, Schema, SchemaGenerator};
use crate::type_resolver::TypeResolver;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Swagger protocol version written into every document
pub const SWAGGER_VERSION: &str = "2.0";

/// Media type every operation consumes and produces
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Swagger document builder
pub struct DocumentBuilder<'a, S: FactStore + ?Sized> {
    /// Metadata facts for the registered controllers
    facts: &'a S,
    /// Host the API is served from
    host: Option<String>,
    /// Info section
    info: Info,
    /// Tags, in first-seen order
    tags: Vec<Tag>,
    /// Paths collection (path -> lower-cased verb -> operation)
    paths: BTreeMap<String, BTreeMap<String, Operation>>,
    /// Schema generator owning the definitions
    schema_gen: SchemaGenerator<'a, S>,
}

/// Info object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Tag object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Operation object - one handler bound to one (path, verb) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub responses: BTreeMap<String, Response>,
}

/// Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter location (path, query, header, body)
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub name: String,
    /// Description, required flag, default and inline schema fields
    #[serde(flatten)]
    pub fields: Schema,
    /// Referenced schema (model-typed and body parameters)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Response object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Complete Swagger 2.0 document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub swagger: String,
    pub schemes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub info: Info,
    pub tags: Vec<Tag>,
    pub paths: BTreeMap<String, BTreeMap<String, Operation>>,
    pub definitions: BTreeMap<String, Schema>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            swagger: SWAGGER_VERSION.to_string(),
            schemes: vec!["https".to_string(), "http".to_string()],
            host: None,
            info: Info::default(),
            tags: Vec::new(),
            paths: BTreeMap::new(),
            definitions: BTreeMap::new(),
        }
    }
}

impl Parameter {
    /// Path, query or header parameter.
    ///
    /// A model reference lands under `schema`; inline fragments are merged
    /// into the parameter itself, under the explicit metadata.
    fn simple(location: ParameterLocation, name: &str, resolved: Resolved, explicit: Schema) -> Self {
        let (fields, schema) = match resolved {
            Resolved::Wrapped(reference) => (explicit, Some(reference)),
            Resolved::Inline(fragment) => (fragment.overlay(explicit), None),
        };
        Self {
            location,
            name: name.to_string(),
            fields,
            schema,
        }
    }

    /// The synthetic parameter aggregating every body-bound parameter
    fn body(properties: IndexMap<String, Schema>) -> Self {
        Self {
            location: ParameterLocation::Body,
            name: "body".to_string(),
            fields: Schema::default(),
            schema: Some(Schema::object(properties)),
        }
    }
}

impl Response {
    fn described(description: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            schema: None,
        }
    }
}

impl<'a, S: FactStore + ?Sized> DocumentBuilder<'a, S> {
    /// Create a new DocumentBuilder reading from `facts`
    pub fn new(facts: &'a S) -> Self {
        debug!("Initializing DocumentBuilder");
        Self {
            facts,
            host: None,
            info: Info::default(),
            tags: Vec::new(),
            paths: BTreeMap::new(),
            schema_gen: SchemaGenerator::new(TypeResolver::new(facts)),
        }
    }

    /// Set the info section
    pub fn with_info(
        mut self,
        title: Option<String>,
        version: Option<String>,
        description: Option<String>,
    ) -> Self {
        self.info = Info {
            title,
            version,
            description,
        };
        self
    }

    /// Set the host
    pub fn with_host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    /// Add a tag, or fill in the description of an existing one.
    ///
    /// A description, once set, is never replaced.
    pub fn add_tag(&mut self, name: &str, description: Option<&str>) {
        if let Some(tag) = self.tags.iter_mut().find(|tag| tag.name == name) {
            if tag.description.is_none() {
                tag.description = description.map(str::to_string);
            }
            return;
        }
        self.tags.push(Tag {
            name: name.to_string(),
            description: description.map(str::to_string),
        });
    }

    /// Register a controller class.
    ///
    /// Classes without a controller fact and advice controllers are ignored.
    /// Every HTTP binding of every handler becomes one operation; a later
    /// registration of the same path and verb replaces the earlier one.
    pub fn register(&mut self, class: &str) {
        let facts = self.facts;
        let class_target = Target::class(class);

        let controller = match facts.get_fact(&class_target, FactKey::Controller) {
            Some(Fact::Controller(controller)) => controller,
            _ => {
                debug!("{} is not a controller, skipping", class);
                return;
            }
        };
        if controller.advice {
            debug!("{} is an advice controller, skipping", class);
            return;
        }

        let tags: Vec<&TagFact> = facts
            .get_all_facts(&class_target, FactKey::Tag)
            .into_iter()
            .filter_map(|fact| match fact {
                Fact::Tag(tag) => Some(tag),
                _ => None,
            })
            .collect();
        for tag in &tags {
            self.add_tag(&tag.name, tag.description.as_deref());
        }
        let mut tag_names: Vec<String> = Vec::new();
        for tag in &tags {
            if !tag_names.contains(&tag.name) {
                tag_names.push(tag.name.clone());
            }
        }

        for method in facts.methods(class) {
            let method_target = Target::member(class, &method.name);
            let bindings = facts.get_all_facts(&method_target, FactKey::Http);
            if bindings.is_empty() {
                continue;
            }

            let summary = facts
                .get_fact(&method_target, FactKey::Summary)
                .and_then(Fact::as_text)
                .unwrap_or(method.name.as_str())
                .to_string();
            let description = facts
                .get_fact(&method_target, FactKey::Description)
                .and_then(Fact::as_text)
                .map(str::to_string);

            for binding in bindings {
                let Fact::Http(binding) = binding else {
                    continue;
                };
                let path = Self::join_path(&controller.base_path, &binding.path);
                debug!("Adding operation: {} {}", binding.method, path);

                let operation = Operation {
                    summary: summary.clone(),
                    description: description.clone(),
                    tags: tag_names.clone(),
                    consumes: vec![JSON_MEDIA_TYPE.to_string()],
                    produces: vec![JSON_MEDIA_TYPE.to_string()],
                    parameters: self.resolve_parameters(class, method),
                    responses: self.resolve_responses(class, &method.name),
                };

                self.paths
                    .entry(path)
                    .or_default()
                    .insert(binding.method.as_str().to_string(), operation);
            }
        }
    }

    /// Resolve the documented parameters of a handler
    fn resolve_parameters(&mut self, class: &str, method: &MethodSignature) -> Vec<Parameter> {
        let facts = self.facts;
        let mut parameters = Vec::new();
        let mut body: Option<IndexMap<String, Schema>> = None;

        for (index, type_ref) in method.parameters.iter().enumerate() {
            let target = Target::parameter(class, &method.name, index);

            let binding = ParameterLocation::PRECEDENCE.iter().find_map(|location| {
                match facts.get_fact(&target, FactKey::Binding(*location)) {
                    Some(Fact::Binding(binding)) => Some(binding),
                    _ => None,
                }
            });
            let Some(binding) = binding else {
                debug!("Parameter {} of {}.{} is not bound", index, class, method.name);
                continue;
            };
            let Some(name) = binding.name.as_deref().filter(|name| !name.is_empty()) else {
                debug!(
                    "Parameter {} of {}.{} is bound to {} without a name",
                    index,
                    class,
                    method.name,
                    binding.location.as_str()
                );
                continue;
            };

            let mut explicit = Schema {
                description: Some(
                    facts
                        .get_fact(&target, FactKey::Description)
                        .and_then(Fact::as_text)
                        .unwrap_or(name)
                        .to_string(),
                ),
                required: Some(Required::Flag(false)),
                ..Schema::default()
            };
            if let Some(Fact::Required(required)) = facts.get_fact(&target, FactKey::Required) {
                explicit.required = Some(Required::Flag(required.value));
                explicit.default = required.default.clone();
            }

            let resolved = self.schema_gen.resolve(type_ref);
            if binding.location == ParameterLocation::Body {
                body.get_or_insert_with(IndexMap::new)
                    .insert(name.to_string(), resolved.into_schema().overlay(explicit));
            } else {
                parameters.push(Parameter::simple(binding.location, name, resolved, explicit));
            }
        }

        if let Some(properties) = body {
            parameters.push(Parameter::body(properties));
        }
        parameters
    }

    /// Resolve the responses of a handler
    fn resolve_responses(&mut self, class: &str, method: &str) -> BTreeMap<String, Response> {
        let facts = self.facts;
        let target = Target::member(class, method);
        let mut responses = BTreeMap::new();

        match facts.get_fact(&target, FactKey::Response) {
            Some(Fact::Response(status)) => {
                let mut response = Response::default();
                if let Some(Fact::ResponseBody(body)) = facts.get_fact(&target, FactKey::ResponseBody) {
                    response.description = Some(body.description.clone());
                    response.schema = match &body.shape {
                        Some(ResponseShape::Array(element)) => {
                            let items = self.schema_gen.resolve(element).into_schema();
                            Some(Schema {
                                items: Some(Box::new(items)),
                                ..Schema::of_type("array")
                            })
                        }
                        Some(ResponseShape::Single(type_ref)) => {
                            Some(self.schema_gen.resolve(type_ref).into_schema())
                        }
                        None => None,
                    };
                }
                responses.insert(status.to_string(), response);
            }
            _ => {
                responses.insert("200".to_string(), Response::described("Success"));
            }
        }

        for fact in facts.get_all_facts(&target, FactKey::ResponseException) {
            let Fact::ResponseException(exception) = fact else {
                continue;
            };
            let schema = exception
                .ty
                .as_ref()
                .map(|type_ref| self.schema_gen.resolve(type_ref).into_schema());
            responses
                .entry(exception.code.to_string())
                .or_insert(Response {
                    description: Some(exception.description.clone()),
                    schema,
                });
        }

        responses
    }

    /// Join a controller base path and a handler path segment-wise.
    ///
    /// The result always has exactly one leading `/` and no trailing `/`;
    /// empty and `.` segments are dropped and `..` removes the previous one.
    pub fn join_path(base: &str, path: &str) -> String {
        let mut segments: Vec<&str> = Vec::new();
        for segment in base.split('/').chain(path.split('/')) {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                segment => segments.push(segment),
            }
        }
        format!("/{}", segments.join("/"))
    }

    /// Types that degraded to the generic object schema so far
    pub fn fallbacks(&self) -> &[Fallback] {
        self.schema_gen.fallbacks()
    }

    /// Build the final document
    pub fn build(self) -> Document {
        debug!("Building final document");
        let definitions = self.schema_gen.into_definitions();
        Document {
            host: self.host,
            info: self.info,
            tags: self.tags,
            paths: self.paths,
            definitions,
            ..Document::default()
        }
    }
}
