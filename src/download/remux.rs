use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

/// What the caller needs to know about a finished external process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stderr: String,
}

/// Runs external programs. Injected so assembly can be tested without ffmpeg.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput>;
}

pub struct ProcessExecutor;

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        debug!("Running {} {}", program, args.join(" "));

        let output = tokio::process::Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("remux tool `{program}` is not available: {reason}")]
pub struct RemuxUnavailable {
    pub program: String,
    pub reason: String,
}

/// Checked once before any job starts.
pub async fn ensure_available(executor: &dyn CommandExecutor, program: &str) -> Result<(), RemuxUnavailable> {
    let unavailable = |reason: String| RemuxUnavailable {
        program: program.to_string(),
        reason,
    };

    match executor.run(program, &["-version".to_string()]).await {
        Ok(output) if output.success => Ok(()),
        Ok(output) => Err(unavailable(format!("exited with {:?}", output.code))),
        Err(err) => Err(unavailable(err.to_string())),
    }
}

/// ffmpeg concat-demuxer list, one `file '<path>'` line per segment.
pub fn concat_manifest(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| {
            let path = path.to_string_lossy().replace('\'', "'\\''");
            format!("file '{}'\n", path)
        })
        .collect()
}

pub fn stream_copy_args(manifest: &str, output: &str) -> Vec<String> {
    [
        "-loglevel", "error",
        "-f", "concat",
        "-safe", "0",
        "-i", manifest,
        "-c", "copy",
        "-y", output,
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect()
}
