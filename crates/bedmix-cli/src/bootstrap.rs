//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together:
//! - Settings and storage layout (via bedmix-core)
//! - Tool adapters (via bedmix-runtime)
//! - The process-wide final mix gate and the session registry (via bedmix-pipeline)

use std::path::PathBuf;
use std::sync::Arc;

use bedmix_core::{
    DirectoryCreationStrategy, MixerSettings, StorageLayout, ensure_directory, load_settings,
    resolve_data_root, validate_settings,
};
use bedmix_pipeline::{FinalMixGate, PipelineConfig, SessionRegistry, WorkerDeps};
use bedmix_runtime::{FfmpegTranscoder, JsonSessionStore, Tool, ToolPaths, YtDlpSource};
use tracing::debug;

use crate::error::CliError;

/// Whether a command will run the pipeline and so needs the external tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolRequirement {
    Required,
    /// Storage-only commands; adapters are built but never invoked.
    NotNeeded,
}

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub data_root: PathBuf,
    pub settings: MixerSettings,
}

impl CliConfig {
    /// Resolve the data root and load `config.json` plus environment overrides.
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self, CliError> {
        let data_root = match data_dir {
            Some(dir) => dir,
            None => resolve_data_root(|key| std::env::var(key).ok())?,
        };

        let layout = StorageLayout::new(&data_root);
        let mut settings = load_settings(&layout.config_path());
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        validate_settings(&settings)?;

        Ok(Self {
            data_root,
            settings,
        })
    }
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    pub layout: StorageLayout,
    pub settings: MixerSettings,
    pub registry: Arc<SessionRegistry>,
}

/// Bootstrap the CLI application.
pub fn bootstrap(config: CliConfig, tools: ToolRequirement) -> Result<CliContext, CliError> {
    let layout = StorageLayout::new(&config.data_root);
    ensure_directory(layout.root(), DirectoryCreationStrategy::AutoCreate)?;

    let tool_paths = match tools {
        ToolRequirement::Required => ToolPaths::resolve()?,
        ToolRequirement::NotNeeded => ToolPaths {
            ffmpeg: Tool::Ffmpeg.binary_name().into(),
            ffprobe: Tool::Ffprobe.binary_name().into(),
            ytdlp: Tool::YtDlp.binary_name().into(),
        },
    };
    debug!(?tool_paths, root = %layout.root().display(), "Bootstrapping");

    let deps = WorkerDeps {
        source: Arc::new(YtDlpSource::new(tool_paths.ytdlp)),
        transcoder: Arc::new(FfmpegTranscoder::new(tool_paths.ffmpeg, tool_paths.ffprobe)),
        gate: Arc::new(FinalMixGate::new()),
        config: Arc::new(PipelineConfig::from_settings(&config.settings)),
    };
    let store = Arc::new(JsonSessionStore::new(layout.clone()));
    let registry = Arc::new(SessionRegistry::new(layout.clone(), deps, store));

    Ok(CliContext {
        layout,
        settings: config.settings,
        registry,
    })
}
