//! Index-addressed operation document.
//!
//! The rewriter performs tree surgery on the operation it plans: selection sets are emptied and
//! refilled, selections are deep-copied and fragments are synthesized. The document therefore
//! stores every node in an arena and nodes refer to each other through small copyable ids. Ids
//! are never invalidated; nodes that are no longer reachable from the operation root simply stay
//! in the arena until the document is dropped.

use apollo_compiler::ast::Argument;
use apollo_compiler::ast::DirectiveList;
use apollo_compiler::ast::OperationType;
use apollo_compiler::ast::VariableDefinition;
use apollo_compiler::Name;
use apollo_compiler::Node;

use crate::error::FederationError;
use crate::error::SingleFederationError;
use crate::schema::SchemaDefinition;

mod from_ast;
mod print;

pub(crate) const TYPENAME_FIELD: &str = "__typename";

macro_rules! id_newtypes {
    ($($ty:ident.$field:ident[$name:ident] => $out:ident unless $msg:literal,)*) => {
        $(
            #[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
            pub struct $name(std::num::NonZeroU32);

            impl std::ops::Index<$name> for $ty {
                type Output = $out;

                fn index(&self, index: $name) -> &$out {
                    &self.$field[usize::from(index)]
                }
            }

            impl std::ops::IndexMut<$name> for $ty {
                fn index_mut(&mut self, index: $name) -> &mut $out {
                    &mut self.$field[usize::from(index)]
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    usize::from(*self).fmt(f)
                }
            }

            impl std::fmt::Debug for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    let name = stringify!($name);
                    write!(f, "{}#{}", name.strip_suffix("Id").unwrap_or(name), usize::from(*self))
                }
            }

            impl From<usize> for $name {
                fn from(value: usize) -> Self {
                    Self(
                        u32::try_from(value)
                            .ok()
                            .and_then(|value| value.checked_add(1))
                            .and_then(std::num::NonZeroU32::new)
                            .expect($msg),
                    )
                }
            }

            impl From<$name> for usize {
                fn from(id: $name) -> Self {
                    (id.0.get() - 1) as usize
                }
            }
        )*
    }
}

id_newtypes! {
    OperationDocument.fields[FieldId] => Field unless "Too many fields",
    OperationDocument.inline_fragments[InlineFragmentId] => InlineFragment unless "Too many inline fragments",
    OperationDocument.selections[SelectionId] => Selection unless "Too many selections",
    OperationDocument.selection_sets[SelectionSetId] => SelectionSet unless "Too many selection sets",
    OperationDocument.named_types[NamedTypeId] => Name unless "Too many named types",
}

#[derive(Debug, Clone)]
pub struct Field {
    pub alias: Option<Name>,
    pub name: Name,
    pub arguments: Vec<Node<Argument>>,
    pub directives: DirectiveList,
    pub selection_set: Option<SelectionSetId>,
}

impl Field {
    pub fn new(name: Name) -> Self {
        Self {
            alias: None,
            name,
            arguments: Vec::new(),
            directives: DirectiveList::default(),
            selection_set: None,
        }
    }

    /// The key under which the field shows up in a response: its alias, or its name.
    pub fn response_key(&self) -> &Name {
        self.alias.as_ref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct InlineFragment {
    pub type_condition: Option<NamedTypeId>,
    pub directives: DirectiveList,
    pub selection_set: Option<SelectionSetId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::From)]
pub enum Selection {
    Field(FieldId),
    InlineFragment(InlineFragmentId),
}

#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    pub selections: Vec<SelectionId>,
}

/// A single executable operation, stored as an arena.
///
/// All mutating methods take `&mut self`: whoever plans the operation owns it exclusively for the
/// whole planning pass.
#[derive(Debug, Clone)]
pub struct OperationDocument {
    pub operation_type: OperationType,
    pub name: Option<Name>,
    pub variables: Vec<Node<VariableDefinition>>,
    pub directives: DirectiveList,
    root_selection_set: SelectionSetId,
    fields: Vec<Field>,
    inline_fragments: Vec<InlineFragment>,
    selections: Vec<Selection>,
    selection_sets: Vec<SelectionSet>,
    named_types: Vec<Name>,
}

impl OperationDocument {
    pub fn new(operation_type: OperationType, name: Option<Name>) -> Self {
        let mut document = Self {
            operation_type,
            name,
            variables: Vec::new(),
            directives: DirectiveList::default(),
            root_selection_set: SelectionSetId::from(0),
            fields: Vec::new(),
            inline_fragments: Vec::new(),
            selections: Vec::new(),
            selection_sets: Vec::new(),
            named_types: Vec::new(),
        };
        document.root_selection_set = document.add_selection_set(SelectionSet::default());
        document
    }

    pub fn root_selection_set(&self) -> SelectionSetId {
        self.root_selection_set
    }

    /// Looks a field up without panicking on ids that belong to another document.
    pub fn field(&self, field: FieldId) -> Option<&Field> {
        self.fields.get(usize::from(field))
    }

    pub fn field_name(&self, field: FieldId) -> &Name {
        &self[field].name
    }

    pub fn field_response_key(&self, field: FieldId) -> &Name {
        self[field].response_key()
    }

    pub fn field_selection_set(&self, field: FieldId) -> Option<SelectionSetId> {
        self[field].selection_set
    }

    pub fn inline_fragment_selection_set(
        &self,
        inline_fragment: InlineFragmentId,
    ) -> Option<SelectionSetId> {
        self[inline_fragment].selection_set
    }

    pub fn inline_fragment_type_condition(&self, inline_fragment: InlineFragmentId) -> Option<&Name> {
        self[inline_fragment]
            .type_condition
            .map(|named_type| &self[named_type])
    }

    pub fn inline_fragment_has_directives(&self, inline_fragment: InlineFragmentId) -> bool {
        !self[inline_fragment].directives.is_empty()
    }

    pub fn selections(&self, selection_set: SelectionSetId) -> &[SelectionId] {
        &self[selection_set].selections
    }

    /// Direct field selections of a selection set, in document order.
    pub fn selection_set_field_selections(
        &self,
        selection_set: SelectionSetId,
    ) -> impl Iterator<Item = (SelectionId, FieldId)> + '_ {
        self.selections(selection_set)
            .iter()
            .filter_map(|&selection| match self[selection] {
                Selection::Field(field) => Some((selection, field)),
                Selection::InlineFragment(_) => None,
            })
    }

    /// Direct inline fragment selections of a selection set, in document order.
    pub fn selection_set_inline_fragment_selections(
        &self,
        selection_set: SelectionSetId,
    ) -> impl Iterator<Item = (SelectionId, InlineFragmentId)> + '_ {
        self.selections(selection_set)
            .iter()
            .filter_map(|&selection| match self[selection] {
                Selection::InlineFragment(inline_fragment) => Some((selection, inline_fragment)),
                Selection::Field(_) => None,
            })
    }

    pub fn add_field(&mut self, field: Field) -> FieldId {
        self.fields.push(field);
        FieldId::from(self.fields.len() - 1)
    }

    pub fn add_inline_fragment(&mut self, inline_fragment: InlineFragment) -> InlineFragmentId {
        self.inline_fragments.push(inline_fragment);
        InlineFragmentId::from(self.inline_fragments.len() - 1)
    }

    pub fn add_selection(&mut self, selection: impl Into<Selection>) -> SelectionId {
        self.selections.push(selection.into());
        SelectionId::from(self.selections.len() - 1)
    }

    pub fn add_selection_set(&mut self, selection_set: SelectionSet) -> SelectionSetId {
        self.selection_sets.push(selection_set);
        SelectionSetId::from(self.selection_sets.len() - 1)
    }

    pub fn add_named_type(&mut self, name: Name) -> NamedTypeId {
        self.named_types.push(name);
        NamedTypeId::from(self.named_types.len() - 1)
    }

    pub fn add_selection_to_selection_set(
        &mut self,
        selection_set: SelectionSetId,
        selection: SelectionId,
    ) {
        self[selection_set].selections.push(selection);
    }

    /// Detaches every selection of the set. The detached nodes stay in the arena.
    pub fn empty_selection_set(&mut self, selection_set: SelectionSetId) {
        self[selection_set].selections.clear();
    }

    /// Deep-copies a selection into fresh nodes. The copy shares no node with the original.
    pub fn copy_selection(&mut self, selection: SelectionId) -> SelectionId {
        match self[selection] {
            Selection::Field(field) => {
                let field = self.copy_field(field);
                self.add_selection(field)
            }
            Selection::InlineFragment(inline_fragment) => {
                let inline_fragment = self.copy_inline_fragment(inline_fragment);
                self.add_selection(inline_fragment)
            }
        }
    }

    pub fn copy_field(&mut self, field: FieldId) -> FieldId {
        let mut copy = self[field].clone();
        copy.selection_set = copy
            .selection_set
            .map(|selection_set| self.copy_selection_set(selection_set));
        self.add_field(copy)
    }

    pub fn copy_inline_fragment(&mut self, inline_fragment: InlineFragmentId) -> InlineFragmentId {
        let mut copy = self[inline_fragment].clone();
        if let Some(named_type) = copy.type_condition {
            let type_name = self[named_type].clone();
            copy.type_condition = Some(self.add_named_type(type_name));
        }
        copy.selection_set = copy
            .selection_set
            .map(|selection_set| self.copy_selection_set(selection_set));
        self.add_inline_fragment(copy)
    }

    pub fn copy_selection_set(&mut self, selection_set: SelectionSetId) -> SelectionSetId {
        let originals = self[selection_set].selections.clone();
        let selections = originals
            .into_iter()
            .map(|selection| self.copy_selection(selection))
            .collect();
        self.add_selection_set(SelectionSet { selections })
    }

    /// Finds a field by its dot separated response path, starting at the operation root.
    ///
    /// Inline fragments are transparent to the path. Returns the field together with the name of
    /// the type enclosing it, as resolved against `schema`.
    pub fn field_by_path(
        &self,
        schema: &SchemaDefinition,
        path: &str,
    ) -> Result<(FieldId, Name), FederationError> {
        let not_found = || SingleFederationError::FieldNotFound {
            path: path.to_owned(),
        };
        let mut enclosing_type = schema
            .root_operation_type_name(self.operation_type)
            .ok_or_else(not_found)?
            .clone();
        let mut selection_set = Some(self.root_selection_set);
        let mut found = None;
        for segment in path.split('.') {
            let current = selection_set.ok_or_else(not_found)?;
            let (field, parent_type) = self
                .find_field(current, &enclosing_type, segment)
                .ok_or_else(not_found)?;
            let (field_type, _) = schema
                .field_type_node(self.field_name(field), &parent_type)
                .ok_or_else(not_found)?;
            found = Some((field, parent_type));
            enclosing_type = field_type.clone();
            selection_set = self.field_selection_set(field);
        }
        found.ok_or_else(|| not_found().into())
    }

    fn find_field(
        &self,
        selection_set: SelectionSetId,
        enclosing_type: &Name,
        response_key: &str,
    ) -> Option<(FieldId, Name)> {
        for &selection in self.selections(selection_set) {
            match self[selection] {
                Selection::Field(field) => {
                    if self.field_response_key(field).as_str() == response_key {
                        return Some((field, enclosing_type.clone()));
                    }
                }
                Selection::InlineFragment(inline_fragment) => {
                    let fragment_type = self
                        .inline_fragment_type_condition(inline_fragment)
                        .unwrap_or(enclosing_type);
                    let found = self
                        .inline_fragment_selection_set(inline_fragment)
                        .and_then(|nested| self.find_field(nested, fragment_type, response_key));
                    if found.is_some() {
                        return found;
                    }
                }
            }
        }
        None
    }
}
