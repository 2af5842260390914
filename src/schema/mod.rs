use apollo_compiler::ast::OperationType;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::Valid;
use apollo_compiler::Name;
use apollo_compiler::Schema;

use crate::error::FederationError;

/// Read-only view over a schema document.
///
/// The same view is used for the federated (supergraph) schema, which decides which concrete types
/// an abstract type logically spans, and for the upstream (subgraph) schema, which decides which
/// types a single subgraph recognizes as members of that abstract type. The two may disagree.
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    schema: Valid<Schema>,
}

impl SchemaDefinition {
    pub fn new(schema: Valid<Schema>) -> Self {
        Self { schema }
    }

    pub fn parse(sdl: &str, path: &str) -> Result<Self, FederationError> {
        let schema = Schema::parse_and_validate(sdl, path)?;
        Ok(Self::new(schema))
    }

    pub fn node_by_name(&self, type_name: &str) -> Option<&ExtendedType> {
        self.schema.types.get(type_name)
    }

    pub fn root_operation_type_name(&self, operation_type: OperationType) -> Option<&Name> {
        self.schema.root_operation(operation_type)
    }

    /// Names of the object types implementing `interface_name`, in definition order.
    ///
    /// Returns `None` when the name does not resolve to an interface.
    pub fn interface_implementers(&self, interface_name: &str) -> Option<Vec<Name>> {
        let Some(ExtendedType::Interface(_)) = self.node_by_name(interface_name) else {
            return None;
        };
        let implementers = self
            .schema
            .types
            .iter()
            .filter_map(|(name, ty)| match ty {
                ExtendedType::Object(object) => object
                    .implements_interfaces
                    .iter()
                    .any(|implemented| implemented.name.as_str() == interface_name)
                    .then(|| name.clone()),
                _ => None,
            })
            .collect();
        Some(implementers)
    }

    /// Member type names of the union `union_name`, in definition order.
    ///
    /// Returns `None` when the name does not resolve to a union.
    pub fn union_members(&self, union_name: &str) -> Option<Vec<Name>> {
        let Some(ExtendedType::Union(union_)) = self.node_by_name(union_name) else {
            return None;
        };
        Some(
            union_
                .members
                .iter()
                .map(|member| member.name.clone())
                .collect(),
        )
    }

    /// Resolves the named return type of `field_name` on the object or interface
    /// `enclosing_type_name`.
    pub fn field_type_node(
        &self,
        field_name: &str,
        enclosing_type_name: &str,
    ) -> Option<(&Name, &ExtendedType)> {
        let field = match self.node_by_name(enclosing_type_name)? {
            ExtendedType::Object(object) => object.fields.get(field_name)?,
            ExtendedType::Interface(interface) => interface.fields.get(field_name)?,
            _ => return None,
        };
        let type_name = field.ty.inner_named_type();
        self.schema.types.get_key_value(type_name.as_str())
    }
}
