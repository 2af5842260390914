use subgraph_rewriter::error::FederationError;
use subgraph_rewriter::operation::FieldId;
use subgraph_rewriter::DataSourceConfiguration;
use subgraph_rewriter::FieldSelectionRewriter;
use subgraph_rewriter::OperationDocument;
use subgraph_rewriter::RewriteResult;
use subgraph_rewriter::SchemaDefinition;

mod errors;
mod union_fields;

/// Schemas and capabilities of one subgraph, shared by the operations of a test.
struct Subgraph {
    definition: SchemaDefinition,
    upstream_definition: SchemaDefinition,
    datasource: DataSourceConfiguration,
}

struct Rewritten {
    result: RewriteResult,
    skip_field_refs: Vec<FieldId>,
}

impl Subgraph {
    /// A subgraph whose own schema agrees with the supergraph.
    fn new(definition: &str, datasource: DataSourceConfiguration) -> Self {
        Self::with_upstream(definition, definition, datasource)
    }

    fn with_upstream(
        definition: &str,
        upstream_definition: &str,
        datasource: DataSourceConfiguration,
    ) -> Self {
        Self {
            definition: SchemaDefinition::parse(definition, "supergraph.graphql").unwrap(),
            upstream_definition: SchemaDefinition::parse(upstream_definition, "subgraph.graphql")
                .unwrap(),
            datasource,
        }
    }

    fn parse(&self, operation: &str) -> OperationDocument {
        OperationDocument::parse(operation, "operation.graphql", None).unwrap()
    }

    fn rewrite(
        &self,
        operation: &mut OperationDocument,
        field_path: &str,
    ) -> Result<Rewritten, FederationError> {
        let (field, enclosing_type_name) = operation.field_by_path(&self.definition, field_path)?;
        let mut rewriter = FieldSelectionRewriter::new(
            operation,
            &self.definition,
            &self.upstream_definition,
            &self.datasource,
        );
        let result = rewriter.rewrite_field_selection(field, enclosing_type_name.as_str())?;
        Ok(Rewritten {
            result,
            skip_field_refs: rewriter.skip_field_refs().to_vec(),
        })
    }

    /// Rewrites the field at `field_path` and checks both the printed operation and whether the
    /// selection had to change.
    #[track_caller]
    fn assert_rewrite(
        &self,
        operation: &str,
        field_path: &str,
        expected: &str,
        should_rewrite: bool,
    ) -> OperationDocument {
        let mut document = self.parse(operation);
        let rewritten = self.rewrite(&mut document, field_path).unwrap();
        assert_eq!(expected, document.to_string());
        assert_eq!(should_rewrite, rewritten.result.rewritten);
        assert!(rewritten.skip_field_refs.is_empty());
        document
    }
}
