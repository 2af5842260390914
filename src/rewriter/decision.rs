use apollo_compiler::Name;
use tracing::trace;

use super::predicates::entity_names_with_fragments;
use super::predicates::entity_names_without_fragments;
use super::predicates::DataSourceCapabilities;
use super::selection_info::InlineFragmentSelection;
use super::selection_info::InlineFragmentSelectionOnInterface;
use super::selection_info::SelectionSetInfo;
use super::AbstractFieldInfo;

/// Decides whether the selection of an interface typed field must be rewritten before it can be
/// sent to the data source.
pub(crate) fn interface_field_selection_needs_rewrite(
    capabilities: &DataSourceCapabilities<'_>,
    selection_set_info: &SelectionSetInfo,
    field_info: &AbstractFieldInfo,
) -> bool {
    let entity_names = &field_info.entity_names;

    if !selection_set_info.has_inline_fragments_on_objects()
        && !selection_set_info.has_inline_fragments_on_interfaces()
    {
        let needs_rewrite = !capabilities
            .all_entities_have_fields_as_root_node(entity_names, &selection_set_info.fields);
        trace!(needs_rewrite, "shared fields only");
        return needs_rewrite;
    }

    let object_fragments = &selection_set_info.inline_fragments_on_objects;
    if !capabilities.all_fragment_types_exist(object_fragments) {
        trace!("object fragment type is missing on the data source");
        return true;
    }
    if !capabilities
        .all_fragment_types_implement_interface(object_fragments, &field_info.allowed_type_names)
    {
        trace!("object fragment type does not implement the interface on the data source");
        return true;
    }
    if nested_interface_fragments_require_cleanup(capabilities, object_fragments) {
        trace!("interface fragment nested in an object fragment requires cleanup");
        return true;
    }

    let entities_without_fragment = entity_names_without_fragments(object_fragments, entity_names);
    if selection_set_info.has_fields() {
        if !capabilities.all_entities_have_fields_as_root_node(
            &entities_without_fragment,
            &selection_set_info.fields,
        ) {
            trace!("shared fields are not root nodes of every entity without a fragment");
            return true;
        }
        if object_fragments.iter().any(|fragment| {
            !capabilities.inline_fragment_has_all_fields_local(fragment, &selection_set_info.fields)
        }) {
            trace!("shared fields are not local to an object fragment type");
            return true;
        }
    }

    if interface_fragments_require_cleanup(
        capabilities,
        &selection_set_info.inline_fragments_on_interfaces,
        &field_info.type_names,
    ) {
        trace!("interface fragment requires cleanup");
        return true;
    }

    mixed_fragments_need_rewrite(
        capabilities,
        selection_set_info,
        &entities_without_fragment,
        entity_names,
    )
}

/// Decides whether the selection of a union typed field must be rewritten before it can be sent
/// to the data source.
pub(crate) fn union_field_selection_needs_rewrite(
    capabilities: &DataSourceCapabilities<'_>,
    selection_set_info: &SelectionSetInfo,
    field_info: &AbstractFieldInfo,
) -> bool {
    let object_fragments = &selection_set_info.inline_fragments_on_objects;
    if !capabilities.all_fragment_types_exist(object_fragments)
        || !capabilities
            .all_fragment_types_implement_interface(object_fragments, &field_info.allowed_type_names)
    {
        trace!("object fragment type is not a member of the union on the data source");
        return true;
    }
    if nested_interface_fragments_require_cleanup(capabilities, object_fragments) {
        trace!("interface fragment nested in an object fragment requires cleanup");
        return true;
    }

    if !selection_set_info.has_inline_fragments_on_interfaces() {
        return false;
    }

    if interface_fragments_require_cleanup(
        capabilities,
        &selection_set_info.inline_fragments_on_interfaces,
        &field_info.type_names,
    ) {
        trace!("interface fragment requires cleanup");
        return true;
    }

    let entity_names = &field_info.entity_names;
    if !selection_set_info.has_inline_fragments_on_objects() {
        let needs_rewrite = !capabilities.all_entities_implement_interfaces(
            &selection_set_info.inline_fragments_on_interfaces,
            entity_names,
        );
        trace!(needs_rewrite, "interface fragments only");
        return needs_rewrite;
    }

    let entities_without_fragment = entity_names_without_fragments(object_fragments, entity_names);
    mixed_fragments_need_rewrite(
        capabilities,
        selection_set_info,
        &entities_without_fragment,
        entity_names,
    )
}

/// Both object and interface fragments are selected: every entity has to get the interface
/// fragment fields, either through its own fragment or as root nodes.
fn mixed_fragments_need_rewrite(
    capabilities: &DataSourceCapabilities<'_>,
    selection_set_info: &SelectionSetInfo,
    entities_without_fragment: &[Name],
    entity_names: &[Name],
) -> bool {
    if !selection_set_info.has_inline_fragments_on_interfaces()
        || !selection_set_info.has_inline_fragments_on_objects()
    {
        return false;
    }
    let interface_fragments = &selection_set_info.inline_fragments_on_interfaces;

    if !entities_without_fragment.is_empty()
        && !capabilities.all_entities_implement_interfaces(
            interface_fragments,
            entities_without_fragment,
        )
    {
        trace!("entity without a fragment cannot resolve interface fragment fields");
        return true;
    }

    let object_fragments = &selection_set_info.inline_fragments_on_objects;
    let entities_with_fragment = entity_names_with_fragments(object_fragments, entity_names);
    if !entities_with_fragment.is_empty()
        && !capabilities.all_entity_fragments_satisfy_interfaces(
            interface_fragments,
            object_fragments,
            &entities_with_fragment,
        )
    {
        trace!("entity fragment cannot resolve interface fragment fields");
        return true;
    }
    false
}

pub(crate) fn interface_fragments_require_cleanup(
    capabilities: &DataSourceCapabilities<'_>,
    interface_fragments: &[InlineFragmentSelectionOnInterface],
    parent_type_names: &[Name],
) -> bool {
    interface_fragments.iter().any(|interface_fragment| {
        interface_fragment_requires_cleanup(capabilities, interface_fragment, parent_type_names)
    })
}

/// An interface fragment can be forwarded as is only when the data source agrees on which of the
/// enclosing types implement the interface, and can resolve every field of the fragment on them.
fn interface_fragment_requires_cleanup(
    capabilities: &DataSourceCapabilities<'_>,
    interface_fragment: &InlineFragmentSelectionOnInterface,
    parent_type_names: &[Name],
) -> bool {
    if interface_fragment
        .type_names_implementing_interface_in_current_ds
        .is_none()
    {
        return true;
    }

    let candidates: Vec<Name> = parent_type_names
        .iter()
        .filter(|type_name| interface_fragment.applies_to(type_name.as_str()))
        .cloned()
        .collect();
    let valid_type_names: Vec<Name> = candidates
        .iter()
        .filter(|type_name| {
            capabilities.has_type_on_datasource(type_name.as_str())
                && interface_fragment.has_type_implementing_interface(type_name.as_str())
        })
        .cloned()
        .collect();
    if valid_type_names.is_empty() || valid_type_names.len() != candidates.len() {
        return true;
    }

    let info = &interface_fragment.fragment.selection_set_info;
    if !valid_type_names
        .iter()
        .all(|type_name| capabilities.type_has_all_fields_local(type_name.as_str(), &info.fields))
    {
        return true;
    }

    if object_fragments_require_cleanup(
        capabilities,
        &info.inline_fragments_on_objects,
        &valid_type_names,
    ) {
        return true;
    }

    interface_fragments_require_cleanup(
        capabilities,
        &info.inline_fragments_on_interfaces,
        &valid_type_names,
    )
}

fn object_fragments_require_cleanup(
    capabilities: &DataSourceCapabilities<'_>,
    object_fragments: &[InlineFragmentSelection],
    parent_type_names: &[Name],
) -> bool {
    !capabilities.all_fragment_types_exist(object_fragments)
        || !capabilities.all_fragment_types_implement_interface(object_fragments, parent_type_names)
        || nested_interface_fragments_require_cleanup(capabilities, object_fragments)
}

/// Interface fragments nested in an object fragment only ever apply to the object type itself.
fn nested_interface_fragments_require_cleanup(
    capabilities: &DataSourceCapabilities<'_>,
    object_fragments: &[InlineFragmentSelection],
) -> bool {
    object_fragments.iter().any(|fragment| {
        interface_fragments_require_cleanup(
            capabilities,
            &fragment.selection_set_info.inline_fragments_on_interfaces,
            std::slice::from_ref(&fragment.type_name),
        )
    })
}
