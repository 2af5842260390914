//! Rewrites selections of interface and union typed fields for a single data source.
//!
//! A subgraph does not necessarily resolve every concrete type behind an abstract type, nor every
//! field of an interface on each of its implementers. Before a selection on such a field is sent to
//! a subgraph, it is checked against the data source capabilities and, when needed, flattened into
//! one inline fragment per concrete type the subgraph can resolve. Fields that the subgraph cannot
//! resolve as root nodes are left to be fetched by another subgraph through an entity call.

use apollo_compiler::schema::ExtendedType;
use apollo_compiler::Name;
use indexmap::IndexMap;
use tracing::debug;
use tracing::instrument;

use crate::datasource::DataSource;
use crate::error::AbstractKind;
use crate::error::FederationError;
use crate::error::SingleFederationError;
use crate::operation::FieldId;
use crate::operation::OperationDocument;
use crate::schema::SchemaDefinition;

mod changed_refs;
mod decision;
mod mutation;
mod predicates;
mod selection_info;

use predicates::DataSourceCapabilities;
use selection_info::SelectionSetAnalyzer;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteResult {
    pub rewritten: bool,
    /// For every field below the rewritten field, the fields that now select its response path.
    /// Fields that were left in place are not listed.
    pub changed_field_refs: IndexMap<FieldId, Vec<FieldId>>,
}

/// Type names an abstract field can resolve to.
#[derive(Debug, Clone)]
pub(crate) struct AbstractFieldInfo {
    pub(crate) kind: AbstractKind,
    /// Members or implementers according to the federated schema.
    pub(crate) type_names: Vec<Name>,
    /// The subset of `type_names` the upstream schema agrees on, sorted.
    pub(crate) allowed_type_names: Vec<Name>,
    /// Entities among `allowed_type_names`, sorted.
    pub(crate) entity_names: Vec<Name>,
}

/// Rewrites abstract field selections of one operation for one data source.
///
/// The rewriter borrows the operation mutably for its whole lifetime: selections are rewritten in
/// place and ids obtained before a rewrite may no longer be reachable from the operation root.
pub struct FieldSelectionRewriter<'a> {
    operation: &'a mut OperationDocument,
    definition: &'a SchemaDefinition,
    upstream_definition: &'a SchemaDefinition,
    capabilities: DataSourceCapabilities<'a>,
    skip_field_refs: Vec<FieldId>,
}

impl<'a> FieldSelectionRewriter<'a> {
    pub fn new(
        operation: &'a mut OperationDocument,
        definition: &'a SchemaDefinition,
        upstream_definition: &'a SchemaDefinition,
        datasource: &'a dyn DataSource,
    ) -> Self {
        Self {
            operation,
            definition,
            upstream_definition,
            capabilities: DataSourceCapabilities::new(datasource),
            skip_field_refs: Vec::new(),
        }
    }

    pub fn operation(&self) -> &OperationDocument {
        self.operation
    }

    /// `__typename` fields injected only to keep selection sets valid. They must not show up in
    /// the final response.
    pub fn skip_field_refs(&self) -> &[FieldId] {
        &self.skip_field_refs
    }

    /// Rewrites the selection set of `field` if its return type is abstract and the data source
    /// cannot resolve the selection as it is.
    ///
    /// Fields with any other return type are left untouched. `enclosing_type_name` is the name of
    /// the object or interface type the field is selected on.
    ///
    /// `field` must belong to the operation the rewriter was created with. Ids past the end of
    /// that operation are reported as [`SingleFederationError::FieldNotFound`].
    #[instrument(level = "trace", skip_all, fields(field = %field, enclosing_type_name = %enclosing_type_name))]
    pub fn rewrite_field_selection(
        &mut self,
        field: FieldId,
        enclosing_type_name: &str,
    ) -> Result<RewriteResult, FederationError> {
        let field_name = self
            .operation
            .field(field)
            .ok_or_else(|| SingleFederationError::FieldNotFound {
                path: field.to_string(),
            })?
            .name
            .clone();
        let Some((type_name, type_node)) = self
            .definition
            .field_type_node(field_name.as_str(), enclosing_type_name)
        else {
            return Ok(RewriteResult::default());
        };
        let kind = match type_node {
            ExtendedType::Interface(_) => AbstractKind::Interface,
            ExtendedType::Union(_) => AbstractKind::Union,
            _ => return Ok(RewriteResult::default()),
        };
        let type_name = type_name.clone();

        self.process_abstract_selection(field, &type_name, kind)
            .map_err(|error| FederationError::AbstractFieldRewrite {
                coordinate: format!("{enclosing_type_name}.{field_name}"),
                abstract_kind: kind,
                source: error.into_single(),
            })
    }

    fn process_abstract_selection(
        &mut self,
        field: FieldId,
        type_name: &Name,
        kind: AbstractKind,
    ) -> Result<RewriteResult, FederationError> {
        let field_info = self.abstract_field_info(type_name, kind)?;
        let selection_set_info = SelectionSetAnalyzer {
            operation: self.operation,
            definition: self.definition,
            upstream_definition: self.upstream_definition,
            capabilities: &self.capabilities,
        }
        .collect_field_information(field)?;

        let needs_rewrite = match kind {
            AbstractKind::Interface => decision::interface_field_selection_needs_rewrite(
                &self.capabilities,
                &selection_set_info,
                &field_info,
            ),
            AbstractKind::Union => decision::union_field_selection_needs_rewrite(
                &self.capabilities,
                &selection_set_info,
                &field_info,
            ),
        };
        if !needs_rewrite {
            debug!(%type_name, "selection can be sent to the data source as is");
            return Ok(RewriteResult::default());
        }

        let paths_before = changed_refs::field_paths(self.operation, field);
        let mutation = mutation::rewrite_abstract_selection(
            self.operation,
            &self.capabilities,
            field,
            &selection_set_info,
            &field_info,
        )?;
        if let Some(typename) = mutation.synthetic_typename {
            self.skip_field_refs.push(typename);
        }
        let paths_after = changed_refs::path_fields(self.operation, field);
        let changed_field_refs = changed_refs::changed_field_refs(&paths_before, &paths_after);

        debug!(
            %type_name,
            allowed_types = field_info.allowed_type_names.len(),
            changed_fields = changed_field_refs.len(),
            synthetic_typename = mutation.synthetic_typename.is_some(),
            "rewrote abstract selection"
        );
        Ok(RewriteResult {
            rewritten: true,
            changed_field_refs,
        })
    }

    fn abstract_field_info(
        &self,
        type_name: &Name,
        kind: AbstractKind,
    ) -> Result<AbstractFieldInfo, FederationError> {
        let (type_names, upstream_type_names) = match kind {
            AbstractKind::Interface => (
                self.definition.interface_implementers(type_name.as_str()),
                self.upstream_definition
                    .node_by_name(type_name.as_str())
                    .map(|_| self.upstream_definition.interface_implementers(type_name.as_str())),
            ),
            AbstractKind::Union => (
                self.definition.union_members(type_name.as_str()),
                self.upstream_definition
                    .node_by_name(type_name.as_str())
                    .map(|_| self.upstream_definition.union_members(type_name.as_str())),
            ),
        };
        let expected = match kind {
            AbstractKind::Interface => "an interface",
            AbstractKind::Union => "a union",
        };
        let type_names = type_names.ok_or_else(|| SingleFederationError::SchemaNodeKindMismatch {
            type_name: type_name.to_string(),
            schema: "federated",
            expected,
        })?;

        let mut allowed_type_names = match upstream_type_names {
            // The upstream schema does not know the abstract type at all: trust the federated one.
            None => type_names.clone(),
            Some(None) => {
                return Err(SingleFederationError::SchemaNodeKindMismatch {
                    type_name: type_name.to_string(),
                    schema: "upstream",
                    expected,
                }
                .into())
            }
            Some(Some(upstream_type_names)) => type_names
                .iter()
                .filter(|name| upstream_type_names.contains(name))
                .cloned()
                .collect(),
        };
        allowed_type_names.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        let entity_names = self.capabilities.entity_names(&allowed_type_names);
        Ok(AbstractFieldInfo {
            kind,
            type_names,
            allowed_type_names,
            entity_names,
        })
    }
}
