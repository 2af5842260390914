use apollo_compiler::schema::ExtendedType;
use apollo_compiler::Name;

use super::predicates::DataSourceCapabilities;
use crate::error::FederationError;
use crate::error::SingleFederationError;
use crate::operation::FieldId;
use crate::operation::InlineFragmentId;
use crate::operation::OperationDocument;
use crate::operation::SelectionId;
use crate::operation::SelectionSetId;
use crate::operation::TYPENAME_FIELD;
use crate::schema::SchemaDefinition;

/// Snapshot of the selections directly under a field or an inline fragment.
///
/// It is computed from the live operation before a rewrite and stays valid while the rewrite
/// replaces the selections it describes, since the rewrite only ever copies nodes.
#[derive(Debug, Clone, Default)]
pub(crate) struct SelectionSetInfo {
    /// The explicit `__typename` selection, kept out of `fields`.
    pub(crate) typename_selection: Option<FieldSelection>,
    pub(crate) fields: Vec<FieldSelection>,
    pub(crate) inline_fragments_on_objects: Vec<InlineFragmentSelection>,
    pub(crate) inline_fragments_on_interfaces: Vec<InlineFragmentSelectionOnInterface>,
}

impl SelectionSetInfo {
    pub(crate) fn has_typename_selection(&self) -> bool {
        self.typename_selection.is_some()
    }

    pub(crate) fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    pub(crate) fn has_inline_fragments_on_objects(&self) -> bool {
        !self.inline_fragments_on_objects.is_empty()
    }

    pub(crate) fn has_inline_fragments_on_interfaces(&self) -> bool {
        !self.inline_fragments_on_interfaces.is_empty()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FieldSelection {
    pub(crate) selection: SelectionId,
    pub(crate) field_name: Name,
    pub(crate) response_key: Name,
    pub(crate) is_leaf: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct InlineFragmentSelection {
    pub(crate) selection: SelectionId,
    pub(crate) type_name: Name,
    pub(crate) has_directives: bool,
    pub(crate) selection_set_info: SelectionSetInfo,
}

#[derive(Debug, Clone)]
pub(crate) struct InlineFragmentSelectionOnInterface {
    pub(crate) fragment: InlineFragmentSelection,
    /// Implementers according to the federated schema.
    pub(crate) type_names_implementing_interface: Vec<Name>,
    /// Implementers according to the upstream schema, `None` when the upstream schema does not
    /// know the interface.
    pub(crate) type_names_implementing_interface_in_current_ds: Option<Vec<Name>>,
    /// Upstream implementers that are entities on the data source, sorted.
    pub(crate) entity_names_implementing_interface: Vec<Name>,
}

impl InlineFragmentSelectionOnInterface {
    pub(crate) fn has_type_implementing_interface(&self, type_name: &str) -> bool {
        self.type_names_implementing_interface_in_current_ds
            .as_ref()
            .is_some_and(|names| names.iter().any(|name| name.as_str() == type_name))
    }

    pub(crate) fn applies_to(&self, type_name: &str) -> bool {
        self.type_names_implementing_interface
            .iter()
            .any(|name| name.as_str() == type_name)
    }
}

pub(crate) struct SelectionSetAnalyzer<'a> {
    pub(crate) operation: &'a OperationDocument,
    pub(crate) definition: &'a SchemaDefinition,
    pub(crate) upstream_definition: &'a SchemaDefinition,
    pub(crate) capabilities: &'a DataSourceCapabilities<'a>,
}

impl SelectionSetAnalyzer<'_> {
    pub(crate) fn collect_field_information(
        &self,
        field: FieldId,
    ) -> Result<SelectionSetInfo, FederationError> {
        let selection_set = self.operation.field_selection_set(field).ok_or_else(|| {
            SingleFederationError::FieldHasNoSelectionSet {
                field_name: self.operation.field_name(field).to_string(),
            }
        })?;
        self.collect_selection_set_information(selection_set)
    }

    fn collect_selection_set_information(
        &self,
        selection_set: SelectionSetId,
    ) -> Result<SelectionSetInfo, FederationError> {
        let mut info = SelectionSetInfo::default();
        for (selection, field) in self.operation.selection_set_field_selections(selection_set) {
            let field_selection = self.field_selection(selection, field);
            if field_selection.field_name.as_str() == TYPENAME_FIELD {
                if info.typename_selection.is_none() {
                    info.typename_selection = Some(field_selection);
                }
                continue;
            }
            info.fields.push(field_selection);
        }

        for (selection, inline_fragment) in self
            .operation
            .selection_set_inline_fragment_selections(selection_set)
        {
            self.collect_inline_fragment_information(selection, inline_fragment, &mut info)?;
        }
        Ok(info)
    }

    fn field_selection(&self, selection: SelectionId, field: FieldId) -> FieldSelection {
        let field = &self.operation[field];
        FieldSelection {
            selection,
            field_name: field.name.clone(),
            response_key: field.response_key().clone(),
            is_leaf: field.selection_set.is_none(),
        }
    }

    fn collect_inline_fragment_information(
        &self,
        selection: SelectionId,
        inline_fragment: InlineFragmentId,
        info: &mut SelectionSetInfo,
    ) -> Result<(), FederationError> {
        let type_condition = self
            .operation
            .inline_fragment_type_condition(inline_fragment)
            .ok_or_else(|| SingleFederationError::InlineFragmentTypeUnresolvable {
                type_condition: "<none>".to_owned(),
            })?
            .clone();
        let selection_set = self
            .operation
            .inline_fragment_selection_set(inline_fragment)
            .ok_or_else(|| SingleFederationError::InlineFragmentHasNoSelectionSet {
                type_condition: type_condition.to_string(),
            })?;

        // The type condition is resolved against the federated schema: the subgraph may not know it.
        let node = self
            .definition
            .node_by_name(type_condition.as_str())
            .ok_or_else(|| SingleFederationError::InlineFragmentTypeUnresolvable {
                type_condition: type_condition.to_string(),
            })?;

        let fragment = InlineFragmentSelection {
            selection,
            type_name: type_condition.clone(),
            has_directives: self.operation.inline_fragment_has_directives(inline_fragment),
            selection_set_info: self.collect_selection_set_information(selection_set)?,
        };

        match node {
            ExtendedType::Object(_) => info.inline_fragments_on_objects.push(fragment),
            ExtendedType::Interface(_) => {
                let type_names_implementing_interface = self
                    .definition
                    .interface_implementers(type_condition.as_str())
                    .unwrap_or_default();
                let type_names_implementing_interface_in_current_ds = self
                    .upstream_definition
                    .interface_implementers(type_condition.as_str());
                let entity_names_implementing_interface = self.capabilities.entity_names(
                    type_names_implementing_interface_in_current_ds
                        .as_deref()
                        .unwrap_or_default(),
                );
                info.inline_fragments_on_interfaces
                    .push(InlineFragmentSelectionOnInterface {
                        fragment,
                        type_names_implementing_interface,
                        type_names_implementing_interface_in_current_ds,
                        entity_names_implementing_interface,
                    });
            }
            _ => {
                return Err(SingleFederationError::SchemaNodeKindMismatch {
                    type_name: type_condition.to_string(),
                    schema: "federated",
                    expected: "an object or interface type",
                }
                .into())
            }
        }
        Ok(())
    }
}
