#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error(
        "Extension {extension:?} of language {new:?} is already claimed by language {existing:?}"
    )]
    AmbiguousLanguage {
        extension: String,
        existing: String,
        new: String,
    },

    #[error("No language is registered for source file {filename:?}")]
    UnknownLanguage { filename: String },

    #[error("Task {0} not found")]
    TaskNotFound(String),

    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("Step {step} escapes the working directory through token {token:?}")]
    UnconfinedCommand { step: usize, token: String },

    #[error("Language {language:?} invokes {program:?}, which is not an allowed toolchain")]
    DisallowedToolchain { language: String, program: String },

    #[error("Language {0:?} produced different pipelines for identical inputs")]
    NondeterministicPlugin(String),

    #[error("Language {language:?} lists extension {extension:?} in more than one category")]
    OverlappingExtensions { language: String, extension: String },
}

pub use Error::*;

pub type Result<T, E = Error> = std::result::Result<T, E>;
