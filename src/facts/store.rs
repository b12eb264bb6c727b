use super::{Fact, FactKey, FactStore, MethodSignature, PropertySignature, Target, TypeRef};
use log::debug;
use std::collections::HashMap;

/// In-memory fact store.
///
/// Facts are kept per target in attachment order. Method and property
/// declarations stand in for reflection: they tell the builder which members
/// a class has and which types they were declared with.
#[derive(Debug, Default)]
pub struct MetadataStore {
    facts: HashMap<Target, Vec<Fact>>,
    methods: HashMap<String, Vec<MethodSignature>>,
    properties: HashMap<String, Vec<PropertySignature>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a fact to a target.
    pub fn attach(&mut self, target: Target, fact: Fact) -> &mut Self {
        debug!("Attaching {:?} to {:?}", fact.key(), target);
        self.facts.entry(target).or_default().push(fact);
        self
    }

    /// Declare a method and its positional parameter types.
    ///
    /// Declaring the same method twice replaces the earlier signature but
    /// keeps its position.
    pub fn declare_method(&mut self, class: &str, name: &str, parameters: Vec<TypeRef>) -> &mut Self {
        let methods = self.methods.entry(class.to_string()).or_default();
        let signature = MethodSignature {
            name: name.to_string(),
            parameters,
        };
        match methods.iter_mut().find(|m| m.name == name) {
            Some(existing) => *existing = signature,
            None => methods.push(signature),
        }
        self
    }

    /// Declare a property and its type.
    pub fn declare_property(&mut self, class: &str, name: &str, ty: TypeRef) -> &mut Self {
        let properties = self.properties.entry(class.to_string()).or_default();
        let signature = PropertySignature {
            name: name.to_string(),
            ty,
        };
        match properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => *existing = signature,
            None => properties.push(signature),
        }
        self
    }

    /// Number of targets carrying at least one fact.
    pub fn target_count(&self) -> usize {
        self.facts.len()
    }
}

impl FactStore for MetadataStore {
    fn get_all_facts(&self, target: &Target, key: FactKey) -> Vec<&Fact> {
        self.facts
            .get(target)
            .map(|facts| facts.iter().filter(|f| f.key() == key).collect())
            .unwrap_or_default()
    }

    fn methods(&self, class: &str) -> &[MethodSignature] {
        self.methods.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    fn properties(&self, class: &str) -> &[PropertySignature] {
        self.properties.get(class).map(Vec::as_slice).unwrap_or(&[])
    }
}
