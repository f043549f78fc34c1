use std::path::{Path, PathBuf};

/// One video to retrieve.
#[derive(Debug, Clone)]
pub struct Job {
    pub source_id: String,
    pub display_title: String,
    pub destination_folder: PathBuf,
}

impl Job {
    pub fn new(source_id: &str, display_title: &str, destination_folder: &Path) -> Self {
        Self {
            source_id: source_id.to_string(),
            display_title: display_title.to_string(),
            destination_folder: destination_folder.to_path_buf(),
        }
    }

    pub fn output_path(&self, extension: &str) -> PathBuf {
        self.destination_folder
            .join(format!("{}.{}", sanitize_title(&self.display_title), extension))
    }

    /// Per-job scratch directory for segment files.
    pub fn work_dir(&self) -> PathBuf {
        self.destination_folder
            .join(format!("{}_segments", sanitize_file_name(&self.source_id)))
    }
}

/// Title for use as a file name: `:` becomes ` - `, the rest as [`sanitize_file_name`].
pub fn sanitize_title(title: &str) -> String {
    sanitize_file_name(&title.replace(':', " - "))
}

pub fn sanitize_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '?' | '*' | '"' | '<' | '>' | '|' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c == ' ' || c == '.');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}
