use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

/// A collection to fetch into a folder.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct JobInput {
    pub folder: PathBuf,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("reading input file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing JSON input: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reads `.json` files as `[{"folder": .., "url": ..}]`, anything else as lines.
pub fn read_inputs(file: &Path) -> Result<Vec<JobInput>, InputError> {
    let text = std::fs::read_to_string(file).map_err(|source| InputError::Read {
        path: file.display().to_string(),
        source,
    })?;

    let is_json = file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(serde_json::from_str(&text)?)
    } else {
        Ok(parse_lines(&text))
    }
}

/// `folder,url` per line, or a bare url whose last path segment names the folder.
pub fn parse_lines(text: &str) -> Vec<JobInput> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match line.split_once(',') {
            Some((folder, url)) => JobInput {
                folder: PathBuf::from(folder.trim()),
                url: url.trim().to_string(),
            },
            None => {
                let folder = default_folder(line);
                info!("No folder name specified. Using default folder name: {}", folder);
                JobInput {
                    folder: PathBuf::from(folder),
                    url: line.to_string(),
                }
            }
        })
        .collect()
}

pub fn default_folder(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_line_forms() {
        let inputs = parse_lines(
            "Guard Course, https://example.com/course/guard\n\n# skipped\nhttps://example.com/commentaries/abc123\n",
        );
        assert_eq!(
            inputs,
            vec![
                JobInput {
                    folder: PathBuf::from("Guard Course"),
                    url: "https://example.com/course/guard".into()
                },
                JobInput {
                    folder: PathBuf::from("abc123"),
                    url: "https://example.com/commentaries/abc123".into()
                },
            ]
        );
    }

    #[test]
    fn reads_json_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("download.json");
        std::fs::write(&path, r#"[{"folder": "out", "url": "https://example.com/c/1"}]"#).unwrap();

        let inputs = read_inputs(&path).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].folder, PathBuf::from("out"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(
            read_inputs(Path::new("/definitely/not/here.txt")),
            Err(InputError::Read { .. })
        ));
    }
}
