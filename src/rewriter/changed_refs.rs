use indexmap::IndexMap;
use multimap::MultiMap;

use crate::operation::FieldId;
use crate::operation::OperationDocument;
use crate::operation::Selection;
use crate::operation::SelectionSetId;

/// Response paths of `field` and of every field below it, keyed by field.
///
/// Paths are dot separated response keys starting at `field`; inline fragments do not add a
/// segment.
pub(crate) fn field_paths(operation: &OperationDocument, field: FieldId) -> IndexMap<FieldId, String> {
    let mut paths = IndexMap::new();
    walk_field(operation, field, "", &mut |field, path| {
        paths.insert(field, path.to_owned());
    });
    paths
}

/// Same walk as [`field_paths`], grouped by path: after a rewrite one path can be selected by
/// several fields, one per emitted fragment.
pub(crate) fn path_fields(operation: &OperationDocument, field: FieldId) -> MultiMap<String, FieldId> {
    let mut fields = MultiMap::new();
    walk_field(operation, field, "", &mut |field, path| {
        fields.insert(path.to_owned(), field);
    });
    fields
}

/// Maps every field recorded before a rewrite to the fields at the same path afterwards. Fields
/// that still occupy their path alone, or whose path disappeared, are left out.
pub(crate) fn changed_field_refs(
    before: &IndexMap<FieldId, String>,
    after: &MultiMap<String, FieldId>,
) -> IndexMap<FieldId, Vec<FieldId>> {
    before
        .iter()
        .filter_map(|(&field, path)| {
            let new_fields = after.get_vec(path)?;
            match new_fields.as_slice() {
                [] => None,
                [only] if *only == field => None,
                _ => Some((field, new_fields.clone())),
            }
        })
        .collect()
}

fn walk_field(
    operation: &OperationDocument,
    field: FieldId,
    parent_path: &str,
    visit: &mut impl FnMut(FieldId, &str),
) {
    let response_key = operation.field_response_key(field);
    let path = if parent_path.is_empty() {
        response_key.to_string()
    } else {
        format!("{parent_path}.{response_key}")
    };
    visit(field, &path);
    if let Some(selection_set) = operation.field_selection_set(field) {
        walk_selection_set(operation, selection_set, &path, visit);
    }
}

fn walk_selection_set(
    operation: &OperationDocument,
    selection_set: SelectionSetId,
    path: &str,
    visit: &mut impl FnMut(FieldId, &str),
) {
    for &selection in operation.selections(selection_set) {
        match operation[selection] {
            Selection::Field(field) => walk_field(operation, field, path, visit),
            Selection::InlineFragment(inline_fragment) => {
                if let Some(nested) = operation.inline_fragment_selection_set(inline_fragment) {
                    walk_selection_set(operation, nested, path, visit);
                }
            }
        }
    }
}
