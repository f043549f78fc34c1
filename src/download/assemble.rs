use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::download::remux::{concat_manifest, stream_copy_args, CommandExecutor};
use crate::error::AssemblyError;

const MANIFEST_NAME: &str = "segments.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyStrategy {
    /// Append segment bytes in-process.
    Concat,
    /// Let ffmpeg stream-copy the segments into the target container.
    Remux,
}

impl AssemblyStrategy {
    /// MPEG-TS chunks can be joined byte for byte; other containers need a remux.
    pub fn for_container(extension: &str) -> Self {
        if extension.eq_ignore_ascii_case("ts") {
            AssemblyStrategy::Concat
        } else {
            AssemblyStrategy::Remux
        }
    }
}

#[derive(Debug)]
pub struct Assembled {
    pub path: PathBuf,
    pub size: u64,
}

pub struct StreamAssembler {
    strategy: AssemblyStrategy,
    executor: Arc<dyn CommandExecutor>,
    program: String,
}

impl StreamAssembler {
    pub fn new(strategy: AssemblyStrategy, executor: Arc<dyn CommandExecutor>, program: &str) -> Self {
        Self {
            strategy,
            executor,
            program: program.to_string(),
        }
    }

    pub fn strategy(&self) -> AssemblyStrategy {
        self.strategy
    }

    /// Joins `segments` into `output`. Segment files and the manifest are removed
    /// whatever the result; `output` only appears once it is complete.
    pub async fn assemble(
        &self,
        segments: &[PathBuf],
        work_dir: &Path,
        output: &Path,
    ) -> Result<Assembled, AssemblyError> {
        if segments.is_empty() {
            return Err(AssemblyError::NoSegments);
        }

        info!("Concatenating {} segments into {} ...", segments.len(), output.display());

        let staging = staging_path(output);
        let manifest = work_dir.join(MANIFEST_NAME);

        let built = match self.strategy {
            AssemblyStrategy::Concat => concat(segments, &staging).await,
            AssemblyStrategy::Remux => self.remux(segments, &manifest, &staging).await,
        };

        let result = match built {
            Ok(()) => finalize(&staging, output).await,
            Err(err) => {
                remove_quietly(&staging).await;
                Err(err)
            }
        };

        for segment in segments {
            remove_quietly(segment).await;
        }
        remove_quietly(&manifest).await;

        result
    }

    async fn remux(&self, segments: &[PathBuf], manifest: &Path, staging: &Path) -> Result<(), AssemblyError> {
        let mut absolute = Vec::with_capacity(segments.len());
        for segment in segments {
            absolute.push(tokio::fs::canonicalize(segment).await?);
        }
        tokio::fs::write(manifest, concat_manifest(&absolute)).await?;

        let args = stream_copy_args(&manifest.to_string_lossy(), &staging.to_string_lossy());
        let output = self
            .executor
            .run(&self.program, &args)
            .await
            .map_err(|source| AssemblyError::RemuxSpawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.success {
            return Err(AssemblyError::RemuxFailed {
                code: output.code,
                stderr: output.stderr,
            });
        }

        if !tokio::fs::try_exists(staging).await? {
            return Err(AssemblyError::MissingOutput(staging.display().to_string()));
        }

        Ok(())
    }
}

async fn concat(segments: &[PathBuf], staging: &Path) -> Result<(), AssemblyError> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::File::create(staging).await?;

    for segment in segments {
        let mut part = tokio::fs::File::open(segment).await?;
        tokio::io::copy(&mut part, &mut file).await?;
    }

    file.flush().await?;
    file.sync_all().await?;

    Ok(())
}

async fn finalize(staging: &Path, output: &Path) -> Result<Assembled, AssemblyError> {
    if let Err(err) = tokio::fs::rename(staging, output).await {
        remove_quietly(staging).await;
        return Err(err.into());
    }

    let size = tokio::fs::metadata(output).await?.len();
    info!("Video file '{}' created ({:.2} Mb)", output.display(), size as f64 / (1024.0 * 1024.0));

    Ok(Assembled {
        path: output.to_path_buf(),
        size,
    })
}

/// `dir/name.ts` -> `dir/name.part.ts`; the extension stays last so ffmpeg can pick the muxer.
pub fn staging_path(output: &Path) -> PathBuf {
    let stem = output.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{}.part.{}", stem, ext.to_string_lossy()),
        None => format!("{}.part", stem),
    };
    output.with_file_name(name)
}

async fn remove_quietly(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!("Error deleting temporary file {}: {}", path.display(), err);
        }
    }
}
