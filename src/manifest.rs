//! Declarative manifests describing controllers and models.
//!
//! A manifest is a YAML (or JSON) file with two top-level lists,
//! `controllers` and `models`. Loading one attaches the facts it describes
//! to a [`MetadataStore`]:
//!
//! ```yaml
//! controllers:
//!   - name: UserController
//!     base_path: /api
//!     tags: [{name: users, description: User operations}]
//!     handlers:
//!       - name: getUser
//!         routes: [{method: GET, path: /users/:id}]
//!         params:
//!           - {type: number, in: path, name: id, required: true}
//!         response: {status: 200, description: OK, type: User}
//! models:
//!   - name: User
//!     properties:
//!       - {name: id, type: number, description: Identifier}
//! ```

use crate::error::{Error, Result};
use crate::facts::store::MetadataStore;
use crate::facts::{
    ControllerFact, Fact, HttpBinding, ModelFact, ParameterBinding, ParameterLocation,
    PropertyFact, PropertyKind, RequiredFact, ResponseBodyFact, ResponseExceptionFact,
    ResponseShape, TagFact, Target, TypeRef,
};
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of one manifest file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    pub controllers: Vec<ControllerEntry>,
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerEntry {
    pub name: String,
    #[serde(default)]
    pub base_path: String,
    #[serde(default)]
    pub advice: bool,
    #[serde(default)]
    pub tags: Vec<TagFact>,
    #[serde(default)]
    pub handlers: Vec<HandlerEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerEntry {
    pub name: String,
    #[serde(default)]
    pub routes: Vec<HttpBinding>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub params: Vec<ParamEntry>,
    pub response: Option<ResponseEntry>,
    #[serde(default)]
    pub exceptions: Vec<ResponseExceptionFact>,
}

/// Positional handler parameter. Without `in` it is declared but unbound.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamEntry {
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(rename = "in")]
    pub location: Option<ParameterLocation>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub required: Option<bool>,
    pub default: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseEntry {
    #[serde(default = "default_status")]
    pub status: u16,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ty: Option<TypeRef>,
    /// The body is an array of `type`
    #[serde(default)]
    pub array: bool,
}

fn default_status() -> u16 {
    200
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelEntry {
    pub name: String,
    /// Definition name, when it differs from the class name
    pub model_name: Option<String>,
    /// `false` declares a plain class that is not documented as a model
    #[serde(default = "default_true")]
    pub model: bool,
    #[serde(default)]
    pub properties: Vec<PropertyEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyEntry {
    pub name: String,
    /// Declared type; the element type for arrays
    #[serde(rename = "type")]
    pub ty: Option<TypeRef>,
    pub kind: Option<PropertyShape>,
    #[serde(default)]
    pub values: Vec<Value>,
    pub rename: Option<String>,
    #[serde(default)]
    pub description: String,
    pub schema: Option<TypeRef>,
    /// Declared on the class but left out of the model
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyShape {
    Array,
    Enum,
}

/// Facts loaded from one or more manifests
#[derive(Debug, Default)]
pub struct LoadedManifests {
    pub store: MetadataStore,
    /// Controller class names in load order
    pub controllers: Vec<String>,
}

impl Manifest {
    /// Parse manifest text
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    /// Read and parse a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading manifest {}", path.display());
        let content = fs::read_to_string(path)?;
        let manifest = Self::parse(&content).map_err(|message| Error::ManifestError {
            file: path.to_path_buf(),
            message,
        })?;
        manifest.validate().map_err(|message| Error::ManifestError {
            file: path.to_path_buf(),
            message,
        })?;
        Ok(manifest)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        for controller in &self.controllers {
            if controller.name.trim().is_empty() {
                return Err("controller without a name".to_string());
            }
            for handler in &controller.handlers {
                if handler.name.trim().is_empty() {
                    return Err(format!("handler without a name in {}", controller.name));
                }
            }
        }
        if self.models.iter().any(|m| m.name.trim().is_empty()) {
            return Err("model without a name".to_string());
        }
        Ok(())
    }

    /// Attach every fact described by this manifest to `store`.
    ///
    /// Returns the names of the declared controllers.
    pub fn apply(self, store: &mut MetadataStore) -> Vec<String> {
        for model in self.models {
            apply_model(store, model);
        }
        self.controllers
            .into_iter()
            .map(|controller| apply_controller(store, controller))
            .collect()
    }
}

fn apply_model(store: &mut MetadataStore, model: ModelEntry) {
    let class = model.name;
    if model.model {
        store.attach(
            Target::class(&class),
            Fact::ResponseModel(ModelFact {
                name: model.model_name,
            }),
        );
    }

    for property in model.properties {
        let (declared, kind, schema) = match property.kind {
            Some(PropertyShape::Array) => (
                TypeRef::class("Array"),
                PropertyKind::Array,
                property.schema.or(property.ty).or(Some(TypeRef::String)),
            ),
            Some(PropertyShape::Enum) => (
                property.ty.unwrap_or(TypeRef::String),
                PropertyKind::Enum(property.values),
                property.schema,
            ),
            None => (
                property.ty.unwrap_or(TypeRef::String),
                PropertyKind::Scalar,
                property.schema,
            ),
        };

        store.declare_property(&class, &property.name, declared);
        if property.hidden {
            continue;
        }

        let target = Target::member(&class, &property.name);
        store.attach(
            target.clone(),
            Fact::ModelProperty(PropertyFact {
                description: property.description,
                kind,
                schema,
            }),
        );
        if let Some(rename) = property.rename {
            store.attach(target, Fact::PropertyName(rename));
        }
    }
}

fn apply_controller(store: &mut MetadataStore, controller: ControllerEntry) -> String {
    let class = controller.name;
    let class_target = Target::class(&class);
    store.attach(
        class_target.clone(),
        Fact::Controller(ControllerFact {
            base_path: controller.base_path,
            advice: controller.advice,
        }),
    );
    for tag in controller.tags {
        store.attach(class_target.clone(), Fact::Tag(tag));
    }

    for handler in controller.handlers {
        let method = handler.name;
        let target = Target::member(&class, &method);
        let parameter_types = handler.params.iter().map(|p| p.ty.clone()).collect();
        store.declare_method(&class, &method, parameter_types);

        for route in handler.routes {
            store.attach(target.clone(), Fact::Http(route));
        }
        if let Some(summary) = handler.summary {
            store.attach(target.clone(), Fact::Summary(summary));
        }
        if let Some(description) = handler.description {
            store.attach(target.clone(), Fact::Description(description));
        }

        for (index, param) in handler.params.into_iter().enumerate() {
            apply_param(store, Target::parameter(&class, &method, index), param);
        }

        if let Some(response) = handler.response {
            store.attach(target.clone(), Fact::Response(response.status));
            if response.description.is_some() || response.ty.is_some() {
                let shape = response.ty.map(|ty| {
                    if response.array {
                        ResponseShape::Array(ty)
                    } else {
                        ResponseShape::Single(ty)
                    }
                });
                store.attach(
                    target.clone(),
                    Fact::ResponseBody(ResponseBodyFact {
                        description: response.description.unwrap_or_default(),
                        shape,
                    }),
                );
            }
        }
        for exception in handler.exceptions {
            store.attach(target.clone(), Fact::ResponseException(exception));
        }
    }
    class
}

fn apply_param(store: &mut MetadataStore, target: Target, param: ParamEntry) {
    if let Some(location) = param.location {
        store.attach(
            target.clone(),
            Fact::Binding(ParameterBinding {
                location,
                name: param.name,
            }),
        );
    }
    if let Some(description) = param.description {
        store.attach(target.clone(), Fact::Description(description));
    }
    if param.required.is_some() || param.default.is_some() {
        store.attach(
            target,
            Fact::Required(RequiredFact {
                value: param.required.unwrap_or(false),
                default: param.default,
            }),
        );
    }
}

/// Load manifest files, in the given order, into one store
pub fn load_manifests(paths: &[PathBuf]) -> Result<LoadedManifests> {
    let mut loaded = LoadedManifests::default();
    for path in paths {
        let controllers = Manifest::load(path)?.apply(&mut loaded.store);
        for controller in controllers {
            if !loaded.controllers.contains(&controller) {
                loaded.controllers.push(controller);
            }
        }
    }
    info!(
        "Loaded {} manifest file(s): {} controller(s), {} fact target(s)",
        paths.len(),
        loaded.controllers.len(),
        loaded.store.target_count()
    );
    Ok(loaded)
}
