use subgraph_rewriter::error::FederationError;
use subgraph_rewriter::error::SingleFederationError;
use subgraph_rewriter::DataSourceConfiguration;
use subgraph_rewriter::FieldSelectionRewriter;

use super::Subgraph;

const DEFINITION: &str = r#"
    interface Node {
        id: ID!
    }

    type User implements Node {
        id: ID!
        name: String!
    }

    union Account = User

    type Query {
        node: Node!
        account: Account!
    }
"#;

fn datasource() -> DataSourceConfiguration {
    DataSourceConfiguration::builder("accounts")
        .root_node("Query", ["node", "account"])
        .root_node("User", ["id"])
        .key("User", "id")
        .build()
}

#[test]
fn field_without_selection_set() {
    let subgraph = Subgraph::new(DEFINITION, datasource());
    let mut document = subgraph.parse("{ node }");
    let error = subgraph.rewrite(&mut document, "node").err().unwrap();

    assert_eq!(error.kind().code(), "FIELD_HAS_NO_SELECTION_SET");
    assert_eq!(
        error.to_string(),
        "failed to rewrite field Query.node with the interface return type: unexpected error: field node does not have a selection set"
    );
}

#[test]
fn unresolvable_type_condition_leaves_the_selection_untouched() {
    let subgraph = Subgraph::new(DEFINITION, datasource());
    let mut document = subgraph.parse("{ account { ... on Robot { id } } }");
    let printed = document.to_string();
    let error = subgraph.rewrite(&mut document, "account").err().unwrap();

    assert!(matches!(
        error,
        FederationError::AbstractFieldRewrite {
            source: SingleFederationError::InlineFragmentTypeUnresolvable { .. },
            ..
        }
    ));
    assert_eq!(printed, document.to_string());
}

#[test]
fn upstream_kind_mismatch() {
    let upstream_definition = r#"
        interface Account {
            id: ID!
        }

        type User implements Account {
            id: ID!
        }

        type Query {
            account: Account!
        }
    "#;
    let subgraph = Subgraph::with_upstream(DEFINITION, upstream_definition, datasource());
    let mut document = subgraph.parse("{ account { ... on User { id } } }");
    let error = subgraph.rewrite(&mut document, "account").err().unwrap();

    assert_eq!(error.kind().code(), "SCHEMA_NODE_KIND_MISMATCH");
    insta::assert_snapshot!(
        error.to_string(),
        @"failed to rewrite field Query.account with the union return type: unexpected error: Account in the upstream schema is not a union"
    );
}

#[test]
fn unknown_field_path() {
    let subgraph = Subgraph::new(DEFINITION, datasource());
    let mut document = subgraph.parse("{ node { id } }");
    let error = subgraph.rewrite(&mut document, "node.missing").err().unwrap();
    assert_eq!(error.kind().code(), "FIELD_NOT_FOUND");
}

#[test]
fn field_of_another_operation() {
    let subgraph = Subgraph::new(DEFINITION, datasource());
    let other = subgraph.parse("{ node { id } account { ... on User { id name } } }");
    let (foreign, _) = other.field_by_path(&subgraph.definition, "account.name").unwrap();

    let mut document = subgraph.parse("{ node { id } }");
    let printed = document.to_string();
    let mut rewriter = FieldSelectionRewriter::new(
        &mut document,
        &subgraph.definition,
        &subgraph.upstream_definition,
        &subgraph.datasource,
    );
    let error = rewriter.rewrite_field_selection(foreign, "User").err().unwrap();

    assert_eq!(error.kind().code(), "FIELD_NOT_FOUND");
    assert_eq!(printed, document.to_string());
}
