//! Prepares selections of a federated operation for a single subgraph.
//!
//! An operation is written against the supergraph schema, but every fetch goes to one subgraph
//! that may only know part of the concrete types behind an interface or union, or only part of
//! their fields. [`FieldSelectionRewriter`] reshapes the selection of such abstract fields so that
//! the subgraph can resolve it on its own:
//!
//! ```
//! use subgraph_rewriter::DataSourceConfiguration;
//! use subgraph_rewriter::FieldSelectionRewriter;
//! use subgraph_rewriter::OperationDocument;
//! use subgraph_rewriter::SchemaDefinition;
//!
//! let sdl = r#"
//!     interface Node { id: ID! name: String! }
//!     type User implements Node { id: ID! name: String! }
//!     type Admin implements Node { id: ID! name: String! }
//!     type Query { node: Node! }
//! "#;
//! let definition = SchemaDefinition::parse(sdl, "supergraph.graphql")?;
//! let upstream_definition = SchemaDefinition::parse(sdl, "subgraph.graphql")?;
//! let datasource = DataSourceConfiguration::builder("accounts")
//!     .root_node("Query", ["node"])
//!     .root_node("User", ["id", "name"])
//!     .root_node("Admin", ["id"])
//!     .child_node("Admin", ["name"])
//!     .key("User", "id")
//!     .key("Admin", "id")
//!     .build();
//!
//! let mut operation = OperationDocument::parse("{ node { name } }", "operation.graphql", None)?;
//! let (field, enclosing_type_name) = operation.field_by_path(&definition, "node")?;
//! let mut rewriter =
//!     FieldSelectionRewriter::new(&mut operation, &definition, &upstream_definition, &datasource);
//! let result = rewriter.rewrite_field_selection(field, enclosing_type_name.as_str())?;
//! assert!(result.rewritten);
//! # Ok::<(), subgraph_rewriter::error::FederationError>(())
//! ```

pub mod datasource;
pub mod error;
pub mod operation;
pub mod rewriter;
pub mod schema;

pub use crate::datasource::DataSource;
pub use crate::datasource::DataSourceConfiguration;
pub use crate::operation::OperationDocument;
pub use crate::rewriter::FieldSelectionRewriter;
pub use crate::rewriter::RewriteResult;
pub use crate::schema::SchemaDefinition;
