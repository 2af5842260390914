use apollo_compiler::validation::DiagnosticList;
use apollo_compiler::validation::WithErrors;

/// The kind of abstract type a rewritten field returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum AbstractKind {
    #[strum(to_string = "interface")]
    Interface,
    #[strum(to_string = "union")]
    Union,
}

#[derive(Debug, Clone, thiserror::Error, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SingleFederationError {
    #[error(
        "An internal error has occurred, please report this bug.\n\nDetails: {message}"
    )]
    Internal { message: String },
    #[error("{message}")]
    InvalidGraphQL { message: String },
    #[error("invalid data source configuration: {message}")]
    InvalidDataSourceConfiguration { message: String },
    #[error("unexpected error: field {field_name} does not have a selection set")]
    FieldHasNoSelectionSet { field_name: String },
    #[error("unexpected error: inline fragment on {type_condition} does not have a selection set")]
    InlineFragmentHasNoSelectionSet { type_condition: String },
    #[error("unexpected error: inline fragment type condition {type_condition} does not exist")]
    InlineFragmentTypeUnresolvable { type_condition: String },
    #[error("unexpected error: {type_name} in the {schema} schema is not {expected}")]
    SchemaNodeKindMismatch {
        type_name: String,
        schema: &'static str,
        expected: &'static str,
    },
    #[error("field {path} was not found in the operation")]
    FieldNotFound { path: String },
}

impl SingleFederationError {
    /// Stable machine readable code of the error kind.
    pub fn code(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FederationError {
    #[error(transparent)]
    SingleFederationError(#[from] SingleFederationError),
    #[error("failed to rewrite field {coordinate} with the {abstract_kind} return type: {source}")]
    AbstractFieldRewrite {
        coordinate: String,
        abstract_kind: AbstractKind,
        source: SingleFederationError,
    },
}

impl FederationError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        SingleFederationError::Internal {
            message: message.into(),
        }
        .into()
    }

    /// The innermost error kind, regardless of the context it was wrapped in.
    pub fn kind(&self) -> &SingleFederationError {
        match self {
            FederationError::SingleFederationError(error) => error,
            FederationError::AbstractFieldRewrite { source, .. } => source,
        }
    }

    pub(crate) fn into_single(self) -> SingleFederationError {
        match self {
            FederationError::SingleFederationError(error) => error,
            FederationError::AbstractFieldRewrite { source, .. } => source,
        }
    }
}

impl From<DiagnosticList> for FederationError {
    fn from(diagnostics: DiagnosticList) -> Self {
        SingleFederationError::InvalidGraphQL {
            message: diagnostics.to_string(),
        }
        .into()
    }
}

impl<T> From<WithErrors<T>> for FederationError {
    fn from(WithErrors { errors, .. }: WithErrors<T>) -> Self {
        errors.into()
    }
}

impl From<serde_json::Error> for FederationError {
    fn from(error: serde_json::Error) -> Self {
        SingleFederationError::InvalidDataSourceConfiguration {
            message: error.to_string(),
        }
        .into()
    }
}
