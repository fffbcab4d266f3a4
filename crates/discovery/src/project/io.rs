use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Why a source file could not be read as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    Skipped(String, String), // file_path, reason
    Error(String, String),   // file_path, error_message
}

impl ReadError {
    pub fn file_path(&self) -> &str {
        match self {
            Self::Skipped(path, _) | Self::Error(path, _) => path,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Skipped(_, reason) | Self::Error(_, reason) => reason,
        }
    }
}

/// Read a text file with a size check.
///
/// - Opens the file once and inspects metadata from the handle
/// - Non-UTF-8 content is skipped rather than lossily decoded
pub fn read_text_file(full_path: &Path, max_file_size: usize) -> Result<String, ReadError> {
    let file_path = full_path.to_string_lossy().to_string();

    let mut file = File::open(full_path)
        .map_err(|e| ReadError::Error(file_path.clone(), format!("Failed to open file: {e}")))?;

    let metadata = file.metadata().map_err(|e| {
        ReadError::Error(file_path.clone(), format!("Failed to read metadata: {e}"))
    })?;

    let file_len = metadata.len() as usize;
    if file_len > max_file_size {
        return Err(ReadError::Skipped(
            file_path,
            format!("File too large: {} bytes", metadata.len()),
        ));
    }

    if file_len == 0 {
        return Ok(String::new());
    }

    let mut bytes = Vec::with_capacity(file_len);
    file.read_to_end(&mut bytes)
        .map_err(|e| ReadError::Error(file_path.clone(), format!("Failed to read file: {e}")))?;

    String::from_utf8(bytes)
        .map_err(|_| ReadError::Skipped(file_path, "Non-UTF-8 content".to_string()))
}
