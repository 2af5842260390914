use apollo_compiler::ast;
use apollo_compiler::Name;
use apollo_compiler::Node;
use indexmap::IndexMap;
use indexmap::IndexSet;

use super::Field;
use super::InlineFragment;
use super::OperationDocument;
use super::SelectionId;
use super::SelectionSet;
use super::SelectionSetId;
use crate::error::FederationError;
use crate::error::SingleFederationError;

impl OperationDocument {
    /// Parses `source` and converts the selected operation into an arena document.
    ///
    /// Named fragment spreads are expanded into inline fragments on the fragment's type condition.
    pub fn parse(
        source: &str,
        path: &str,
        operation_name: Option<&str>,
    ) -> Result<Self, FederationError> {
        let document = ast::Document::parse(source, path)?;
        Self::from_ast(&document, operation_name)
    }

    pub fn from_ast(
        document: &ast::Document,
        operation_name: Option<&str>,
    ) -> Result<Self, FederationError> {
        let mut operations = Vec::new();
        let mut fragments = IndexMap::new();
        for definition in &document.definitions {
            match definition {
                ast::Definition::OperationDefinition(operation) => operations.push(operation),
                ast::Definition::FragmentDefinition(fragment) => {
                    fragments.insert(fragment.name.clone(), fragment);
                }
                _ => {}
            }
        }

        let operation = match operation_name {
            Some(operation_name) => operations.into_iter().find(|operation| {
                operation
                    .name
                    .as_ref()
                    .is_some_and(|name| name.as_str() == operation_name)
            }),
            None if operations.len() == 1 => operations.pop(),
            None => None,
        }
        .ok_or_else(|| SingleFederationError::InvalidGraphQL {
            message: match operation_name {
                Some(operation_name) => format!("operation {operation_name} was not found"),
                None => "expected exactly one operation when no operation name is given".to_owned(),
            },
        })?;

        let mut document = OperationDocument::new(operation.operation_type, operation.name.clone());
        document.variables = operation.variables.clone();
        document.directives = operation.directives.clone();

        let mut converter = AstConverter {
            document,
            fragments,
            expanding: IndexSet::new(),
        };
        let root = converter.document.root_selection_set();
        converter.convert_selections_into(&operation.selection_set, root)?;
        Ok(converter.document)
    }
}

struct AstConverter<'doc> {
    document: OperationDocument,
    fragments: IndexMap<Name, &'doc Node<ast::FragmentDefinition>>,
    /// Named fragments currently being expanded, used to reject spread cycles.
    expanding: IndexSet<Name>,
}

impl<'doc> AstConverter<'doc> {
    fn convert_selections_into(
        &mut self,
        selections: &[ast::Selection],
        target: SelectionSetId,
    ) -> Result<(), FederationError> {
        for selection in selections {
            let selection = self.convert_selection(selection)?;
            self.document.add_selection_to_selection_set(target, selection);
        }
        Ok(())
    }

    fn convert_selection_set(
        &mut self,
        selections: &[ast::Selection],
    ) -> Result<Option<SelectionSetId>, FederationError> {
        if selections.is_empty() {
            return Ok(None);
        }
        let selection_set = self.document.add_selection_set(SelectionSet::default());
        self.convert_selections_into(selections, selection_set)?;
        Ok(Some(selection_set))
    }

    fn convert_selection(
        &mut self,
        selection: &ast::Selection,
    ) -> Result<SelectionId, FederationError> {
        match selection {
            ast::Selection::Field(field) => {
                let selection_set = self.convert_selection_set(&field.selection_set)?;
                let field = self.document.add_field(Field {
                    alias: field.alias.clone(),
                    name: field.name.clone(),
                    arguments: field.arguments.clone(),
                    directives: field.directives.clone(),
                    selection_set,
                });
                Ok(self.document.add_selection(field))
            }
            ast::Selection::InlineFragment(inline_fragment) => {
                let selection_set = self.convert_selection_set(&inline_fragment.selection_set)?;
                let type_condition = inline_fragment
                    .type_condition
                    .clone()
                    .map(|type_condition| self.document.add_named_type(type_condition));
                let inline_fragment = self.document.add_inline_fragment(InlineFragment {
                    type_condition,
                    directives: inline_fragment.directives.clone(),
                    selection_set,
                });
                Ok(self.document.add_selection(inline_fragment))
            }
            ast::Selection::FragmentSpread(spread) => {
                let fragment = *self.fragments.get(&spread.fragment_name).ok_or_else(|| {
                    SingleFederationError::InvalidGraphQL {
                        message: format!("fragment {} is not defined", spread.fragment_name),
                    }
                })?;
                if !self.expanding.insert(fragment.name.clone()) {
                    return Err(SingleFederationError::InvalidGraphQL {
                        message: format!("fragment {} spreads itself", fragment.name),
                    }
                    .into());
                }
                let selection_set = self.convert_selection_set(&fragment.selection_set)?;
                self.expanding.shift_remove(&fragment.name);

                let type_condition = self
                    .document
                    .add_named_type(fragment.type_condition.clone());
                let inline_fragment = self.document.add_inline_fragment(InlineFragment {
                    type_condition: Some(type_condition),
                    directives: spread.directives.clone(),
                    selection_set,
                });
                Ok(self.document.add_selection(inline_fragment))
            }
        }
    }
}
