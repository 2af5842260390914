use apollo_compiler::ast::DirectiveList;
use apollo_compiler::name;
use apollo_compiler::Name;
use indexmap::IndexSet;

use super::predicates::DataSourceCapabilities;
use super::selection_info::FieldSelection;
use super::selection_info::InlineFragmentSelection;
use super::selection_info::InlineFragmentSelectionOnInterface;
use super::selection_info::SelectionSetInfo;
use super::AbstractFieldInfo;
use crate::error::AbstractKind;
use crate::error::FederationError;
use crate::error::SingleFederationError;
use crate::operation::Field;
use crate::operation::FieldId;
use crate::operation::InlineFragment;
use crate::operation::InlineFragmentId;
use crate::operation::OperationDocument;
use crate::operation::Selection;
use crate::operation::SelectionId;
use crate::operation::SelectionSet;
use crate::operation::SelectionSetId;

/// Outcome of replacing the selection set of an abstract field.
#[derive(Debug, Default)]
pub(crate) struct Mutation {
    /// The `__typename` field injected to keep the selection set non-empty.
    pub(crate) synthetic_typename: Option<FieldId>,
}

/// A selection one concrete type has to resolve once abstract fragments are flattened.
enum Demanded<'i> {
    Field(&'i FieldSelection),
    /// Selections of a fragment carrying directives. They stay behind the same directives, on a
    /// fragment on the concrete type.
    Conditional {
        fragment: &'i InlineFragmentSelection,
        selections: Vec<Demanded<'i>>,
    },
}

/// Rebuilds the selection set of `field` as one inline fragment per concrete type the data source
/// can resolve, then swaps it in.
///
/// New selections are deep copies; the nodes referenced by `selection_set_info` are only detached.
/// Every fallible step runs before the swap, so on error the field keeps its original selections.
pub(crate) fn rewrite_abstract_selection(
    operation: &mut OperationDocument,
    capabilities: &DataSourceCapabilities<'_>,
    field: FieldId,
    selection_set_info: &SelectionSetInfo,
    field_info: &AbstractFieldInfo,
) -> Result<Mutation, FederationError> {
    let selection_set = operation.field_selection_set(field).ok_or_else(|| {
        SingleFederationError::FieldHasNoSelectionSet {
            field_name: operation.field_name(field).to_string(),
        }
    })?;

    let mut new_selections = Vec::new();
    if let Some(typename) = &selection_set_info.typename_selection {
        new_selections.push(operation.copy_selection(typename.selection));
    }

    let shared_fields: &[FieldSelection] = match field_info.kind {
        AbstractKind::Interface => &selection_set_info.fields,
        AbstractKind::Union => &[],
    };

    for type_name in field_info
        .allowed_type_names
        .iter()
        .filter(|type_name| capabilities.has_type_on_datasource(type_name.as_str()))
    {
        let mut demanded: Vec<Demanded<'_>> = shared_fields.iter().map(Demanded::Field).collect();
        for interface_fragment in &selection_set_info.inline_fragments_on_interfaces {
            collect_interface_fragment_fields(interface_fragment, type_name, &mut demanded);
        }

        let (plain, conditional): (Vec<&InlineFragmentSelection>, Vec<_>) = selection_set_info
            .inline_fragments_on_objects
            .iter()
            .filter(|fragment| &fragment.type_name == type_name)
            .partition(|fragment| !fragment.has_directives);

        // Directive-free fragments on the same type merge into one, together with the fields
        // demanded from the shared selection and from interface fragments.
        if let Some(fragment) = object_fragment_selection(
            operation,
            type_name,
            &plain,
            DirectiveList::default(),
            &demanded,
        )? {
            new_selections.push(fragment);
        }

        for fragment in conditional {
            let inline_fragment = inline_fragment_id(operation, fragment)?;
            let directives = operation[inline_fragment].directives.clone();
            if let Some(fragment) =
                object_fragment_selection(operation, type_name, &[fragment], directives, &[])?
            {
                new_selections.push(fragment);
            }
        }
    }

    Ok(replace_field_selections(operation, selection_set, new_selections))
}

/// Selections of an interface fragment that apply to `type_name`, including the selections of
/// nested fragments on the same type.
fn collect_interface_fragment_fields<'i>(
    interface_fragment: &'i InlineFragmentSelectionOnInterface,
    type_name: &Name,
    demanded: &mut Vec<Demanded<'i>>,
) {
    if interface_fragment.applies_to(type_name.as_str()) {
        collect_fragment_fields(&interface_fragment.fragment, type_name, demanded);
    }
}

fn collect_fragment_fields<'i>(
    fragment: &'i InlineFragmentSelection,
    type_name: &Name,
    demanded: &mut Vec<Demanded<'i>>,
) {
    if !fragment.has_directives {
        collect_fields_for_type(&fragment.selection_set_info, type_name, demanded);
        return;
    }
    let mut selections = Vec::new();
    collect_fields_for_type(&fragment.selection_set_info, type_name, &mut selections);
    if !selections.is_empty() {
        demanded.push(Demanded::Conditional {
            fragment,
            selections,
        });
    }
}

fn collect_fields_for_type<'i>(
    info: &'i SelectionSetInfo,
    type_name: &Name,
    demanded: &mut Vec<Demanded<'i>>,
) {
    demanded.extend(info.typename_selection.iter().map(Demanded::Field));
    demanded.extend(info.fields.iter().map(Demanded::Field));
    for fragment in &info.inline_fragments_on_objects {
        if &fragment.type_name == type_name {
            collect_fragment_fields(fragment, type_name, demanded);
        }
    }
    for interface_fragment in &info.inline_fragments_on_interfaces {
        collect_interface_fragment_fields(interface_fragment, type_name, demanded);
    }
}

/// Builds `... on type_name` out of the selections of `fragments` followed by `demanded`.
///
/// Interface fragments nested directly in `fragments` are flattened into the concrete type, the
/// data source may not agree on which types implement them. Returns `None` when nothing is left
/// to select.
fn object_fragment_selection(
    operation: &mut OperationDocument,
    type_name: &Name,
    fragments: &[&InlineFragmentSelection],
    directives: DirectiveList,
    demanded: &[Demanded<'_>],
) -> Result<Option<SelectionId>, FederationError> {
    let target = operation.add_selection_set(SelectionSet::default());
    let mut response_keys = IndexSet::new();

    for fragment in fragments {
        let source = fragment_selection_set(operation, fragment)?;
        let nested_interface_fragments =
            &fragment.selection_set_info.inline_fragments_on_interfaces;
        for selection in operation.selections(source).to_vec() {
            if let Some(interface_fragment) = nested_interface_fragments
                .iter()
                .find(|interface_fragment| interface_fragment.fragment.selection == selection)
            {
                let mut flattened = Vec::new();
                collect_interface_fragment_fields(interface_fragment, type_name, &mut flattened);
                append_demanded(operation, target, type_name, &flattened, &mut response_keys)?;
                continue;
            }
            match operation[selection] {
                Selection::Field(field) => {
                    let response_key = operation.field_response_key(field).clone();
                    let is_leaf = operation.field_selection_set(field).is_none();
                    append_field(
                        operation,
                        target,
                        selection,
                        response_key,
                        is_leaf,
                        &mut response_keys,
                    );
                }
                Selection::InlineFragment(_) => {
                    let copy = operation.copy_selection(selection);
                    operation.add_selection_to_selection_set(target, copy);
                }
            }
        }
    }

    append_demanded(operation, target, type_name, demanded, &mut response_keys)?;

    if operation.selections(target).is_empty() {
        return Ok(None);
    }
    let selection = type_fragment_selection(operation, type_name, directives, target);
    Ok(Some(selection))
}

fn append_demanded(
    operation: &mut OperationDocument,
    target: SelectionSetId,
    type_name: &Name,
    demanded: &[Demanded<'_>],
    response_keys: &mut IndexSet<Name>,
) -> Result<(), FederationError> {
    for item in demanded {
        match item {
            Demanded::Field(field) => append_field(
                operation,
                target,
                field.selection,
                field.response_key.clone(),
                field.is_leaf,
                response_keys,
            ),
            Demanded::Conditional {
                fragment,
                selections,
            } => {
                let inline_fragment = inline_fragment_id(operation, fragment)?;
                let directives = operation[inline_fragment].directives.clone();
                let nested = operation.add_selection_set(SelectionSet::default());
                append_demanded(operation, nested, type_name, selections, &mut IndexSet::new())?;
                let selection = type_fragment_selection(operation, type_name, directives, nested);
                operation.add_selection_to_selection_set(target, selection);
            }
        }
    }
    Ok(())
}

/// Appends a copy of a field selection unless a leaf with the same response key is already there.
/// Composite fields are always appended, the executor merges them.
fn append_field(
    operation: &mut OperationDocument,
    target: SelectionSetId,
    selection: SelectionId,
    response_key: Name,
    is_leaf: bool,
    response_keys: &mut IndexSet<Name>,
) {
    if !response_keys.insert(response_key) && is_leaf {
        return;
    }
    let copy = operation.copy_selection(selection);
    operation.add_selection_to_selection_set(target, copy);
}

fn type_fragment_selection(
    operation: &mut OperationDocument,
    type_name: &Name,
    directives: DirectiveList,
    selection_set: SelectionSetId,
) -> SelectionId {
    let type_condition = operation.add_named_type(type_name.clone());
    let inline_fragment = operation.add_inline_fragment(InlineFragment {
        type_condition: Some(type_condition),
        directives,
        selection_set: Some(selection_set),
    });
    operation.add_selection(inline_fragment)
}

fn inline_fragment_id(
    operation: &OperationDocument,
    fragment: &InlineFragmentSelection,
) -> Result<InlineFragmentId, FederationError> {
    match operation[fragment.selection] {
        Selection::InlineFragment(inline_fragment) => Ok(inline_fragment),
        Selection::Field(field) => Err(FederationError::internal(format!(
            "expected an inline fragment on {}, found {field:?}",
            fragment.type_name
        ))),
    }
}

fn fragment_selection_set(
    operation: &OperationDocument,
    fragment: &InlineFragmentSelection,
) -> Result<SelectionSetId, FederationError> {
    let inline_fragment = inline_fragment_id(operation, fragment)?;
    operation
        .inline_fragment_selection_set(inline_fragment)
        .ok_or_else(|| {
            SingleFederationError::InlineFragmentHasNoSelectionSet {
                type_condition: fragment.type_name.to_string(),
            }
            .into()
        })
}

fn replace_field_selections(
    operation: &mut OperationDocument,
    selection_set: SelectionSetId,
    new_selections: Vec<SelectionId>,
) -> Mutation {
    operation.empty_selection_set(selection_set);
    if new_selections.is_empty() {
        let (selection, field) = typename_selection(operation);
        operation.add_selection_to_selection_set(selection_set, selection);
        return Mutation {
            synthetic_typename: Some(field),
        };
    }
    for selection in new_selections {
        operation.add_selection_to_selection_set(selection_set, selection);
    }
    Mutation::default()
}

fn typename_selection(operation: &mut OperationDocument) -> (SelectionId, FieldId) {
    let field = operation.add_field(Field::new(name!("__typename")));
    (operation.add_selection(field), field)
}
