use apollo_compiler::Name;
use itertools::Itertools;

use super::selection_info::FieldSelection;
use super::selection_info::InlineFragmentSelection;
use super::selection_info::InlineFragmentSelectionOnInterface;
use crate::datasource::DataSource;
use crate::operation::TYPENAME_FIELD;

/// Boolean queries over the capability table of the data source being planned for.
#[derive(Clone, Copy)]
pub(crate) struct DataSourceCapabilities<'a> {
    datasource: &'a dyn DataSource,
}

impl<'a> DataSourceCapabilities<'a> {
    pub(crate) fn new(datasource: &'a dyn DataSource) -> Self {
        Self { datasource }
    }

    pub(crate) fn has_type_on_datasource(&self, type_name: &str) -> bool {
        self.datasource.has_root_node_with_typename(type_name)
            || self.datasource.has_child_node_with_typename(type_name)
    }

    /// `__typename` is resolvable on every type the data source knows about.
    pub(crate) fn has_field_on_datasource(&self, type_name: &str, field_name: &str) -> bool {
        field_name == TYPENAME_FIELD
            || self.datasource.has_root_node(type_name, field_name)
            || self.datasource.has_child_node(type_name, field_name)
    }

    /// The entities among `type_names`, sorted by name.
    pub(crate) fn entity_names(&self, type_names: &[Name]) -> Vec<Name> {
        type_names
            .iter()
            .filter(|type_name| self.datasource.has_entity(type_name.as_str()))
            .sorted_by(|a, b| a.as_str().cmp(b.as_str()))
            .dedup()
            .cloned()
            .collect()
    }

    pub(crate) fn all_fragment_types_exist(&self, fragments: &[InlineFragmentSelection]) -> bool {
        fragments
            .iter()
            .all(|fragment| self.has_type_on_datasource(fragment.type_name.as_str()))
    }

    pub(crate) fn all_fragment_types_implement_interface(
        &self,
        fragments: &[InlineFragmentSelection],
        implementer_names: &[Name],
    ) -> bool {
        fragments
            .iter()
            .all(|fragment| implementer_names.contains(&fragment.type_name))
    }

    pub(crate) fn entity_has_fields_as_root_node(
        &self,
        entity_name: &str,
        fields: &[FieldSelection],
    ) -> bool {
        fields
            .iter()
            .filter(|field| field.field_name.as_str() != TYPENAME_FIELD)
            .all(|field| {
                self.datasource
                    .has_root_node(entity_name, field.field_name.as_str())
            })
    }

    pub(crate) fn all_entities_have_fields_as_root_node(
        &self,
        entity_names: &[Name],
        fields: &[FieldSelection],
    ) -> bool {
        entity_names
            .iter()
            .all(|entity_name| self.entity_has_fields_as_root_node(entity_name.as_str(), fields))
    }

    /// Whether every field the fragment does not select itself is still reachable on its type.
    pub(crate) fn inline_fragment_has_all_fields_local(
        &self,
        fragment: &InlineFragmentSelection,
        fields: &[FieldSelection],
    ) -> bool {
        not_selected_fields_for_inline_fragment(fragment, fields)
            .all(|field| {
                self.has_field_on_datasource(fragment.type_name.as_str(), field.field_name.as_str())
            })
    }

    pub(crate) fn type_has_all_fields_local(
        &self,
        type_name: &str,
        fields: &[FieldSelection],
    ) -> bool {
        fields
            .iter()
            .all(|field| self.has_field_on_datasource(type_name, field.field_name.as_str()))
    }

    pub(crate) fn all_entities_implement_interfaces(
        &self,
        interface_fragments: &[InlineFragmentSelectionOnInterface],
        entity_names: &[Name],
    ) -> bool {
        interface_fragments.iter().all(|interface_fragment| {
            let implementing = entities_implementing_interface(interface_fragment, entity_names);
            self.all_entities_have_fields_as_root_node(
                &implementing,
                &interface_fragment.fragment.selection_set_info.fields,
            )
        })
    }

    pub(crate) fn all_entity_fragments_satisfy_interfaces(
        &self,
        interface_fragments: &[InlineFragmentSelectionOnInterface],
        object_fragments: &[InlineFragmentSelection],
        entity_names: &[Name],
    ) -> bool {
        interface_fragments.iter().all(|interface_fragment| {
            let fields = &interface_fragment.fragment.selection_set_info.fields;
            let implementing = entities_implementing_interface(interface_fragment, entity_names);
            object_fragments
                .iter()
                .filter(|fragment| implementing.contains(&fragment.type_name))
                .all(|fragment| {
                    self.inline_fragment_has_all_fields_local(fragment, fields)
                        || self.entity_has_fields_as_root_node(fragment.type_name.as_str(), fields)
                })
        })
    }
}

pub(crate) fn entity_names_without_fragments(
    fragments: &[InlineFragmentSelection],
    entity_names: &[Name],
) -> Vec<Name> {
    entity_names
        .iter()
        .filter(|entity_name| !fragments.iter().any(|f| &f.type_name == *entity_name))
        .cloned()
        .collect()
}

pub(crate) fn entity_names_with_fragments(
    fragments: &[InlineFragmentSelection],
    entity_names: &[Name],
) -> Vec<Name> {
    entity_names
        .iter()
        .filter(|entity_name| fragments.iter().any(|f| &f.type_name == *entity_name))
        .cloned()
        .collect()
}

/// Entities of `entity_names` implementing the fragment's interface upstream.
fn entities_implementing_interface(
    interface_fragment: &InlineFragmentSelectionOnInterface,
    entity_names: &[Name],
) -> Vec<Name> {
    entity_names
        .iter()
        .filter(|entity_name| {
            interface_fragment.has_type_implementing_interface(entity_name.as_str())
        })
        .cloned()
        .collect()
}

fn not_selected_fields_for_inline_fragment<'f>(
    fragment: &'f InlineFragmentSelection,
    fields: &'f [FieldSelection],
) -> impl Iterator<Item = &'f FieldSelection> + 'f {
    fields.iter().filter(move |field| {
        field.field_name.as_str() != TYPENAME_FIELD
            && !fragment
                .selection_set_info
                .fields
                .iter()
                .any(|selected| selected.field_name == field.field_name)
    })
}
