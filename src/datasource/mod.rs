//! Per-subgraph capability tables.

use serde::Deserialize;
use serde::Serialize;

use crate::error::FederationError;

/// What a single subgraph can resolve, as seen by the planner.
///
/// A `(type, field)` pair is a root node when the subgraph can start resolving at it, either as an
/// entry point or as the target of an entity jump. It is a child node when it can only be resolved
/// while the subgraph is already resolving a surrounding selection of that type.
pub trait DataSource {
    fn has_root_node(&self, type_name: &str, field_name: &str) -> bool;

    fn has_child_node(&self, type_name: &str, field_name: &str) -> bool;

    fn has_root_node_with_typename(&self, type_name: &str) -> bool;

    fn has_child_node_with_typename(&self, type_name: &str) -> bool;

    /// Selection sets of the federation keys declared for `type_name`.
    fn required_fields_by_key(&self, type_name: &str) -> Vec<&str>;

    /// A type is an entity when the subgraph declares at least one non-empty key for it.
    fn has_entity(&self, type_name: &str) -> bool {
        self.required_fields_by_key(type_name)
            .iter()
            .any(|selection_set| !selection_set.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeField {
    pub type_name: String,
    pub field_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederationFieldConfiguration {
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    pub selection_set: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederationMetaData {
    #[serde(default)]
    pub keys: Vec<FederationFieldConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceConfiguration {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub root_nodes: Vec<TypeField>,
    #[serde(default)]
    pub child_nodes: Vec<TypeField>,
    #[serde(default)]
    pub federation: FederationMetaData,
}

impl DataSourceConfiguration {
    pub fn from_json(json: &str) -> Result<Self, FederationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn builder(id: impl Into<String>) -> DataSourceConfigurationBuilder {
        DataSourceConfigurationBuilder {
            configuration: DataSourceConfiguration {
                id: id.into(),
                ..Default::default()
            },
        }
    }
}

fn has_node(nodes: &[TypeField], type_name: &str, field_name: &str) -> bool {
    nodes.iter().any(|node| {
        node.type_name == type_name && node.field_names.iter().any(|name| name == field_name)
    })
}

impl DataSource for DataSourceConfiguration {
    fn has_root_node(&self, type_name: &str, field_name: &str) -> bool {
        has_node(&self.root_nodes, type_name, field_name)
    }

    fn has_child_node(&self, type_name: &str, field_name: &str) -> bool {
        has_node(&self.child_nodes, type_name, field_name)
    }

    fn has_root_node_with_typename(&self, type_name: &str) -> bool {
        self.root_nodes.iter().any(|node| node.type_name == type_name)
    }

    fn has_child_node_with_typename(&self, type_name: &str) -> bool {
        self.child_nodes.iter().any(|node| node.type_name == type_name)
    }

    fn required_fields_by_key(&self, type_name: &str) -> Vec<&str> {
        self.federation
            .keys
            .iter()
            .filter(|key| key.type_name == type_name && key.field_name.is_none())
            .map(|key| key.selection_set.as_str())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct DataSourceConfigurationBuilder {
    configuration: DataSourceConfiguration,
}

impl DataSourceConfigurationBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.configuration.name = name.into();
        self
    }

    pub fn root_node<'a>(
        mut self,
        type_name: &str,
        field_names: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        add_node(&mut self.configuration.root_nodes, type_name, field_names);
        self
    }

    pub fn child_node<'a>(
        mut self,
        type_name: &str,
        field_names: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        add_node(&mut self.configuration.child_nodes, type_name, field_names);
        self
    }

    pub fn key(mut self, type_name: &str, selection_set: &str) -> Self {
        self.configuration
            .federation
            .keys
            .push(FederationFieldConfiguration {
                type_name: type_name.to_owned(),
                field_name: None,
                selection_set: selection_set.to_owned(),
            });
        self
    }

    pub fn build(self) -> DataSourceConfiguration {
        self.configuration
    }
}

fn add_node<'a>(
    nodes: &mut Vec<TypeField>,
    type_name: &str,
    field_names: impl IntoIterator<Item = &'a str>,
) {
    let field_names = field_names.into_iter().map(str::to_owned);
    match nodes.iter_mut().find(|node| node.type_name == type_name) {
        Some(node) => node.field_names.extend(field_names),
        None => nodes.push(TypeField {
            type_name: type_name.to_owned(),
            field_names: field_names.collect(),
        }),
    }
}
