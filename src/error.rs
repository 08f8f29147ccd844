use crate::workflow::WorkflowStep;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal outcome of a pipeline run. Coder failures never surface here; they
/// are folded into a reduced page count instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InputValidation(#[from] InputError),

    #[error("{step} model invocation failed: {source}")]
    ModelInvocation {
        step: WorkflowStep,
        #[source]
        source: ProviderError,
    },

    #[error("{step} output could not be decoded: {source}")]
    Decoding {
        step: WorkflowStep,
        #[source]
        source: DecodeError,
    },

    #[error("Storage error: {0}")]
    Persistence(#[from] StoreError),

    #[error("Commit failed: {0}")]
    VersionControl(#[from] VcsError),
}

impl PipelineError {
    /// Attribute a stage failure to the step that produced it
    pub fn from_stage(step: WorkflowStep, err: StageError) -> Self {
        match err {
            StageError::EmptySpec => PipelineError::InputValidation(InputError::EmptySpec),
            StageError::Model(source) => PipelineError::ModelInvocation { step, source },
            StageError::Decode(source) => PipelineError::Decoding { step, source },
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("Cannot run workflow: spec.md is empty or missing")]
    EmptySpec,

    #[error("Invalid version id '{0}'. Expected \"projectId/versionFolder\"")]
    InvalidVersionId(String),

    #[error("Plan references unknown page id '{0}'")]
    UnknownPageId(String),

    #[error("Plan has more than one task for page id '{0}'")]
    DuplicatePageId(String),

    #[error("Plan has no task for design page '{0}'")]
    MissingPage(String),

    #[error("Page '{0}' not found in canvas")]
    PageNotFound(String),

    #[error("Page '{0}' has no HTML to revise")]
    PageHasNoHtml(String),

    #[error("Modification request is empty")]
    EmptyPrompt,

    #[error("Page name is empty")]
    EmptyPageName,
}

/// Failure inside a single stage (Architect, Planner, Reviewer)
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Cannot run workflow: spec.md is empty or missing")]
    EmptySpec,

    #[error("Model error: {0}")]
    Model(#[from] ProviderError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to parse model response as JSON ({source}). Response starts with: \"{snippet}\"")]
    InvalidJson {
        snippet: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model response does not match schema: {0}")]
    SchemaViolation(String),

    #[error("Failed to compile schema: {0}")]
    Schema(String),

    #[error("Validated response could not be deserialized: {0}")]
    Shape(#[source] serde_json::Error),

    #[error("Design has {count} pages, at most {max} are allowed")]
    TooManyPages { count: usize, max: usize },

    #[error("Design declares page id '{0}' more than once")]
    DuplicatePageId(String),

    #[error("Stage input could not be serialized: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process failed with exit code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Provider response is missing content: {0}")]
    EmptyResponse(String),

    #[error("Provider misconfigured: {0}")]
    Misconfiguration(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Canvas metadata not found for {0}")]
    CanvasMissing(String),
}

#[derive(Error, Debug)]
pub enum VcsError {
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error("Invalid file path '{0}'")]
    InvalidPath(String),

    #[error("Invalid commit ref '{0}'")]
    InvalidRef(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write report: {0}")]
    WriteReport(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("quality_threshold must be between 1 and 10, got {0}")]
    ThresholdOutOfRange(f64),

    #[error("max_pages must be between 1 and 8, got {0}")]
    MaxPagesOutOfRange(usize),

    #[error("Custom provider requires base_url")]
    MissingBaseUrl,
}
