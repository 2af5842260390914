use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use subgraph_rewriter::DataSourceConfiguration;
use subgraph_rewriter::FieldSelectionRewriter;
use subgraph_rewriter::OperationDocument;
use subgraph_rewriter::SchemaDefinition;

/// CLI arguments. See <https://docs.rs/clap/latest/clap/_derive/index.html>
#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Rewrites the selection of an interface or union typed field for one subgraph
    Rewrite {
        /// The path to the supergraph schema file
        #[arg(long)]
        supergraph: PathBuf,
        /// The path to the schema file of the subgraph the operation is sent to
        #[arg(long)]
        subgraph: PathBuf,
        /// The path to the JSON capability table of the subgraph
        #[arg(long)]
        datasource: PathBuf,
        /// The path to the operation file, or `-` for stdin
        #[arg(long)]
        operation: PathBuf,
        /// The operation to rewrite, required when the file holds more than one
        #[arg(long)]
        operation_name: Option<String>,
        /// Dot separated response path of the field to rewrite, e.g. `user.accounts`
        #[arg(long)]
        path: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .without_time()
        .init();

    let args = Args::parse();
    match args.command {
        Command::Rewrite {
            supergraph,
            subgraph,
            datasource,
            operation,
            operation_name,
            path,
        } => rewrite(
            &supergraph,
            &subgraph,
            &datasource,
            &operation,
            operation_name.as_deref(),
            &path,
        ),
    }
}

fn read_input(input_path: &Path) -> anyhow::Result<String> {
    let input = if input_path == Path::new("-") {
        io::read_to_string(io::stdin())
    } else {
        fs::read_to_string(input_path)
    };
    input.with_context(|| format!("failed to read {}", input_path.display()))
}

fn rewrite(
    supergraph_path: &Path,
    subgraph_path: &Path,
    datasource_path: &Path,
    operation_path: &Path,
    operation_name: Option<&str>,
    field_path: &str,
) -> anyhow::Result<()> {
    let definition = SchemaDefinition::parse(
        &read_input(supergraph_path)?,
        &supergraph_path.to_string_lossy(),
    )?;
    let upstream_definition =
        SchemaDefinition::parse(&read_input(subgraph_path)?, &subgraph_path.to_string_lossy())?;
    let datasource = DataSourceConfiguration::from_json(&read_input(datasource_path)?)?;
    let mut operation = OperationDocument::parse(
        &read_input(operation_path)?,
        &operation_path.to_string_lossy(),
        operation_name,
    )?;

    let (field, enclosing_type_name) = operation.field_by_path(&definition, field_path)?;
    let mut rewriter =
        FieldSelectionRewriter::new(&mut operation, &definition, &upstream_definition, &datasource);
    let result = rewriter.rewrite_field_selection(field, enclosing_type_name.as_str())?;

    println!("{}", rewriter.operation());
    let skip_field_refs = rewriter.skip_field_refs();
    if !result.rewritten {
        eprintln!("{field_path} can be sent to {} as is", datasource.id);
    }
    if !skip_field_refs.is_empty() {
        eprintln!("synthetic __typename fields: {skip_field_refs:?}");
    }
    Ok(())
}
