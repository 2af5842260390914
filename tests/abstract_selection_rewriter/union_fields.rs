use subgraph_rewriter::DataSourceConfiguration;
use subgraph_rewriter::OperationDocument;

use super::Subgraph;

const DEFINITION: &str = r#"
    interface Named {
        name: String!
    }

    type A implements Named {
        id: ID!
        name: String!
    }

    type B implements Named {
        id: ID!
        name: String!
    }

    type C implements Named {
        id: ID!
        name: String!
    }

    union Member = A | B | C

    type Query {
        member: Member!
    }
"#;

/// The subgraph only knows `A` and `B`.
const UPSTREAM_DEFINITION: &str = r#"
    interface Named {
        name: String!
    }

    type A implements Named {
        id: ID!
        name: String!
    }

    type B implements Named {
        id: ID!
        name: String!
    }

    union Member = A | B

    type Query {
        member: Member!
    }
"#;

fn members_a_and_b() -> Subgraph {
    let datasource = DataSourceConfiguration::builder("members")
        .root_node("Query", ["member"])
        .root_node("A", ["id", "name"])
        .root_node("B", ["id", "name"])
        .key("A", "id")
        .key("B", "id")
        .build();
    Subgraph::with_upstream(DEFINITION, UPSTREAM_DEFINITION, datasource)
}

fn all_members(b_name_is_root: bool) -> Subgraph {
    let builder = DataSourceConfiguration::builder("members")
        .root_node("Query", ["member"])
        .root_node("A", ["id", "name"])
        .root_node("C", ["id", "name"])
        .key("A", "id")
        .key("B", "id")
        .key("C", "id");
    let datasource = if b_name_is_root {
        builder.root_node("B", ["id", "name"]).build()
    } else {
        builder.root_node("B", ["id"]).child_node("B", ["name"]).build()
    };
    Subgraph::new(DEFINITION, datasource)
}

#[test]
fn object_fragments_on_known_members_are_left_alone() {
    members_a_and_b().assert_rewrite(
        "{ member { ... on A { id } ... on B { name } } }",
        "member",
        r#"{
  member {
    ... on A {
      id
    }
    ... on B {
      name
    }
  }
}"#,
        false,
    );
}

#[test]
fn object_fragment_on_a_member_missing_on_the_datasource_is_pruned() {
    members_a_and_b().assert_rewrite(
        "{ member { ... on A { id } ... on C { id } } }",
        "member",
        r#"{
  member {
    ... on A {
      id
    }
  }
}"#,
        true,
    );
}

#[test]
fn interface_fragment_is_flattened_to_known_members() {
    members_a_and_b().assert_rewrite(
        "{ member { ... on Named { name } } }",
        "member",
        r#"{
  member {
    ... on A {
      name
    }
    ... on B {
      name
    }
  }
}"#,
        true,
    );
}

#[test]
fn requested_typename_stays_first() {
    let subgraph = members_a_and_b();
    let document = subgraph.assert_rewrite(
        "{ member { __typename ... on Named { name } } }",
        "member",
        r#"{
  member {
    __typename
    ... on A {
      name
    }
    ... on B {
      name
    }
  }
}"#,
        true,
    );
    assert_eq!(typename_count(&subgraph, &document), 1);
}

fn typename_count(subgraph: &Subgraph, document: &OperationDocument) -> usize {
    let (member, _) = document
        .field_by_path(&subgraph.definition, "member")
        .unwrap();
    let selection_set = document.field_selection_set(member).unwrap();
    document
        .selection_set_field_selections(selection_set)
        .filter(|(_, field)| document.field_name(*field).as_str() == "__typename")
        .count()
}

#[test]
fn rewritten_union_selection_is_stable() {
    let subgraph = members_a_and_b();
    let mut document = subgraph.parse("{ member { __typename ... on Named { name } } }");
    assert!(subgraph.rewrite(&mut document, "member").unwrap().result.rewritten);
    let printed = document.to_string();

    let second = subgraph.rewrite(&mut document, "member").unwrap();
    assert!(!second.result.rewritten);
    assert_eq!(printed, document.to_string());
    assert_eq!(typename_count(&subgraph, &document), 1);
}

#[test]
fn interface_fragment_resolvable_on_every_member_is_left_alone() {
    all_members(true).assert_rewrite(
        "{ member { ... on Named { name } } }",
        "member",
        r#"{
  member {
    ... on Named {
      name
    }
  }
}"#,
        false,
    );
}

#[test]
fn interface_fragment_field_not_a_root_node_of_an_entity() {
    all_members(false).assert_rewrite(
        "{ member { ... on Named { name } } }",
        "member",
        r#"{
  member {
    ... on A {
      name
    }
    ... on B {
      name
    }
    ... on C {
      name
    }
  }
}"#,
        true,
    );
}

#[test]
fn object_fragment_receives_interface_fragment_fields() {
    all_members(false).assert_rewrite(
        "{ member { ... on A { id } ... on Named { name } } }",
        "member",
        r#"{
  member {
    ... on A {
      id
      name
    }
    ... on B {
      name
    }
    ... on C {
      name
    }
  }
}"#,
        true,
    );
}

#[test]
fn object_fragment_able_to_resolve_interface_fields_is_left_alone() {
    all_members(true).assert_rewrite(
        "{ member { ... on A { id } ... on Named { name } } }",
        "member",
        r#"{
  member {
    ... on A {
      id
    }
    ... on Named {
      name
    }
  }
}"#,
        false,
    );
}

#[test]
fn duplicate_fragments_are_merged() {
    let subgraph = members_a_and_b();
    let operation = r#"
        query Members($withId: Boolean!) {
          member {
            ... on A {
              id
            }
            ... on A {
              id
              name
            }
            ... on A @include(if: $withId) {
              id
            }
            ... on C {
              id
            }
          }
        }
    "#;
    subgraph.assert_rewrite(
        operation,
        "member",
        r#"query Members($withId: Boolean!) {
  member {
    ... on A {
      id
      name
    }
    ... on A @include(if: $withId) {
      id
    }
  }
}"#,
        true,
    );
}

#[test]
fn changed_field_refs_list_one_copy_per_member() {
    let subgraph = members_a_and_b();
    let mut document = subgraph.parse("{ member { ... on Named { name } } }");
    let (name, _) = document
        .field_by_path(&subgraph.definition, "member.name")
        .unwrap();

    let rewritten = subgraph.rewrite(&mut document, "member").unwrap();

    assert_eq!(rewritten.result.changed_field_refs.len(), 1);
    assert_eq!(rewritten.result.changed_field_refs[&name].len(), 2);
}

#[test]
fn interface_fragment_in_conditional_member_fragment_is_flattened() {
    let datasource = DataSourceConfiguration::builder("members")
        .root_node("Query", ["member"])
        .root_node("A", ["id", "name"])
        .root_node("B", ["id"])
        .root_node("C", ["id", "name"])
        .key("A", "id")
        .key("B", "id")
        .key("C", "id")
        .build();
    Subgraph::new(DEFINITION, datasource).assert_rewrite(
        r#"
        query Members($withB: Boolean!) {
          member {
            ... on B @include(if: $withB) {
              id
              ... on Named {
                name
              }
            }
          }
        }
        "#,
        "member",
        r#"query Members($withB: Boolean!) {
  member {
    ... on B @include(if: $withB) {
      id
      name
    }
  }
}"#,
        true,
    );
}
