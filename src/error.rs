use crate::checksum::ChecksumType;
use crate::resource::Owner;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Resource \"{0}\" defined more than once.")]
    DuplicateResource(String),

    #[error("Formula {} does not define resource \"{name}\".", owner_name(.owner))]
    ResourceMissing { owner: Option<Owner>, name: String },

    #[error("Option name is required.")]
    OptionNameRequired,

    #[error("Options should not start with dashes: {0}")]
    OptionStartsWithDash(String),

    #[error("Unsupported special dependency: {0}")]
    UnsupportedDependency(String),

    #[error("Checksum is missing for {}", .0.display())]
    ChecksumMissing(PathBuf),

    #[error(
        "{ty} mismatch\nExpected: {expected}\nActual: {actual}\nArchive: {}",
        .path.display()
    )]
    ChecksumMismatch {
        ty: ChecksumType,
        expected: String,
        actual: String,
        path: PathBuf,
    },

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn owner_name(owner: &Option<Owner>) -> &str {
    owner.as_ref().map(Owner::name).unwrap_or("(unowned)")
}

pub type Result<T> = std::result::Result<T, SpecError>;
