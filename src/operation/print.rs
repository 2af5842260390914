use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

use apollo_compiler::ast;
use apollo_compiler::Node;

use super::FieldId;
use super::InlineFragmentId;
use super::OperationDocument;
use super::Selection;
use super::SelectionSetId;

impl From<&OperationDocument> for ast::OperationDefinition {
    fn from(document: &OperationDocument) -> Self {
        Self {
            operation_type: document.operation_type,
            name: document.name.clone(),
            variables: document.variables.clone(),
            directives: document.directives.clone(),
            selection_set: document.to_ast_selection_set(document.root_selection_set()),
        }
    }
}

impl OperationDocument {
    fn to_ast_selection_set(&self, selection_set: SelectionSetId) -> Vec<ast::Selection> {
        self.selections(selection_set)
            .iter()
            .map(|&selection| match self[selection] {
                Selection::Field(field) => ast::Selection::Field(self.to_ast_field(field)),
                Selection::InlineFragment(inline_fragment) => {
                    ast::Selection::InlineFragment(self.to_ast_inline_fragment(inline_fragment))
                }
            })
            .collect()
    }

    fn to_ast_field(&self, field: FieldId) -> Node<ast::Field> {
        let field = &self[field];
        Node::new(ast::Field {
            alias: field.alias.clone(),
            name: field.name.clone(),
            arguments: field.arguments.clone(),
            directives: field.directives.clone(),
            selection_set: field
                .selection_set
                .map(|selection_set| self.to_ast_selection_set(selection_set))
                .unwrap_or_default(),
        })
    }

    fn to_ast_inline_fragment(&self, inline_fragment: InlineFragmentId) -> Node<ast::InlineFragment> {
        Node::new(ast::InlineFragment {
            type_condition: self.inline_fragment_type_condition(inline_fragment).cloned(),
            directives: self[inline_fragment].directives.clone(),
            selection_set: self
                .inline_fragment_selection_set(inline_fragment)
                .map(|selection_set| self.to_ast_selection_set(selection_set))
                .unwrap_or_default(),
        })
    }
}

impl Display for OperationDocument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        ast::OperationDefinition::from(self).serialize().fmt(f)
    }
}
