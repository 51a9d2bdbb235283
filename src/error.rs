use thiserror::Error;

#[derive(Debug, Error)]
pub enum TfcfError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Cloudflare(#[from] crate::cloudflare::CloudflareError),

    #[error(transparent)]
    Resource(#[from] crate::resource::ResourceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid state JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Validation(#[from] crate::validation::ValidationErrors),

    #[error("state for {0} has no id")]
    MissingId(String),

    #[error("changes to {} require replacing {resource}; delete and create instead", .attributes.join(", "))]
    ReplacementRequired {
        resource: String,
        attributes: Vec<String>,
    },

    #[error("cannot import non-existent {resource} {id:?}")]
    ImportNotFound { resource: String, id: String },
}
