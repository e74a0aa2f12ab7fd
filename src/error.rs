use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unexpected shape at {path}: expected {expected}")]
    UnexpectedShape { path: String, expected: &'static str },

    #[error("missing field '{field}' at {path}")]
    MissingField { path: String, field: String },

    #[error("invalid schema json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum BuildError {
    /// Raised for entries lacking `text` or `path`; `path` is the nearest
    /// location that could be identified.
    #[error("resource entry at {path} is missing required field '{field}'")]
    MissingField { path: String, field: &'static str },

    #[error("resource path '{path}' does not extend parent path '{parent}' with segment '{segment}'")]
    PathMismatch {
        path: String,
        parent: String,
        segment: String,
    },

    #[error("resource '{parent}' already has placeholder child '{existing}', cannot add '{segment}'")]
    DuplicateIndexedChild {
        parent: String,
        existing: String,
        segment: String,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("generated code is invalid: {0}")]
    InvalidCode(#[from] syn::Error),

    #[error("failed to write output file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{verb} is not available on {path}")]
    UnsupportedVerb { verb: String, path: String },

    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("http {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
