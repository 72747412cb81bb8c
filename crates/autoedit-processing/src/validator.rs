use autoedit_core::AppError;
use std::path::Path;

/// Validation errors for uploaded videos
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("No video file provided")]
    MissingFile,

    #[error("Uploaded file is empty")]
    EmptyFile,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("File has no extension: {0}")]
    MissingExtension(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingFile | ValidationError::EmptyFile => {
                AppError::MissingFile(err.to_string())
            }
            ValidationError::FileTooLarge { max, .. } => AppError::PayloadTooLarge(format!(
                "File size exceeds maximum allowed size of {} MB",
                max / 1024 / 1024
            )),
            ValidationError::InvalidExtension { ref allowed, .. } => {
                AppError::UnsupportedFormat(format!(
                    "Unsupported format. Allowed extensions: {}",
                    allowed.join(", ")
                ))
            }
            ValidationError::MissingExtension(_) => AppError::UnsupportedFormat(err.to_string()),
        }
    }
}

/// Upload validator
///
/// Presence, size and extension checks, applied before anything touches the disk.
#[derive(Clone, Debug)]
pub struct UploadValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
}

impl UploadValidator {
    pub fn new(max_file_size: usize, allowed_extensions: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// A file part must carry a non-blank client filename
    pub fn validate_presence<'a>(&self, filename: Option<&'a str>) -> Result<&'a str, ValidationError> {
        match filename {
            Some(name) if !name.trim().is_empty() => Ok(name),
            _ => Err(ValidationError::MissingFile),
        }
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate file extension against the allow-list (case-insensitive)
    pub fn validate_extension(&self, filename: &str) -> Result<String, ValidationError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| ValidationError::MissingExtension(filename.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(extension)
    }
}
