use std::fmt;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// External services the retrieval pipeline depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    DenseEmbedder,
    SparseEmbedder,
    CandidateStore,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Collaborator::DenseEmbedder => "dense embedder",
            Collaborator::SparseEmbedder => "sparse embedder",
            Collaborator::CandidateStore => "candidate store",
        })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Raised while building a component, never at query time.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("{collaborator} unavailable: {source}")]
    UpstreamUnavailable {
        collaborator: Collaborator,
        #[source]
        source: BoxError,
    },

    #[error("Rerank failed: {0}")]
    RerankFailure(#[source] BoxError),

    #[error("Generation failed: {0}")]
    Generation(#[source] BoxError),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self { Error::Configuration(msg.into()) }

    pub fn upstream(collaborator: Collaborator, err: impl Into<BoxError>) -> Self {
        Error::UpstreamUnavailable { collaborator, source: err.into() }
    }

    pub fn rerank(err: impl Into<BoxError>) -> Self { Error::RerankFailure(err.into()) }

    pub fn generation(err: impl Into<BoxError>) -> Self { Error::Generation(err.into()) }
}

pub type Result<T> = std::result::Result<T, Error>;
