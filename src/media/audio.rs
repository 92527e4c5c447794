//! Модуль для работы с аудио
//!
//! Обрезка и сведение аудиодорожек через ffmpeg.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::AudioMixOptions;
use crate::error::{ReelSyncError, Result};
use crate::media::filter_graph::{MixGraph, MIX_OUTPUT_LABEL};
use crate::utils::artifact::ArtifactGuard;
use crate::utils::ffmpeg::{MediaTool, MediaToolRunner};

/// Поддерживаемые расширения аудиофайлов
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "ogg", "m4a", "flac"];

/// Описание одной дорожки для сведения
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioTrackSpec {
    /// Путь к исходному файлу
    pub source: PathBuf,
    /// Множитель громкости (0.0 и выше)
    pub volume: f32,
    /// Смещение начала дорожки в секундах
    pub offset_seconds: f64,
}

impl AudioTrackSpec {
    pub fn new(source: impl Into<PathBuf>, volume: f32, offset_seconds: f64) -> Self {
        Self {
            source: source.into(),
            volume,
            offset_seconds,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.volume >= 0.0) || !self.volume.is_finite() {
            return Err(ReelSyncError::InvalidInput(format!(
                "Track {} has invalid volume {}",
                self.source.display(),
                self.volume
            )));
        }
        if !(self.offset_seconds >= 0.0) || !self.offset_seconds.is_finite() {
            return Err(ReelSyncError::InvalidInput(format!(
                "Track {} has invalid offset {}",
                self.source.display(),
                self.offset_seconds
            )));
        }
        Ok(())
    }
}

/// Проверяет, что файл существует и имеет поддерживаемое расширение
pub fn is_supported_audio_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Имя файла по умолчанию для обрезанной дорожки
pub fn default_trim_name(source: &Path, duration: f64) -> String {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio.mp3".to_string());
    format!("trimmed-{}s-{}", duration as u64, name)
}

/// Имя файла по умолчанию для сведенной дорожки
pub fn default_mix_name(duration: f64) -> String {
    format!("mixed-audio-{}s.mp3", duration as u64)
}

fn validate_duration(duration: f64) -> Result<()> {
    if duration > 0.0 && duration.is_finite() {
        Ok(())
    } else {
        Err(ReelSyncError::InvalidInput(format!(
            "Target duration must be positive, got {}",
            duration
        )))
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Сборщик аудиодорожки: обрезка и сведение
pub struct AudioAssembler {
    runner: Arc<dyn MediaToolRunner>,
    options: AudioMixOptions,
}

impl AudioAssembler {
    pub fn new(runner: Arc<dyn MediaToolRunner>, options: AudioMixOptions) -> Self {
        Self { runner, options }
    }

    /// Обрезает дорожку до `duration` секунд без перекодирования.
    ///
    /// При ошибке частично записанный выходной файл удаляется.
    pub async fn trim(&self, source: &Path, duration: f64, output: &Path) -> Result<PathBuf> {
        if !source.exists() {
            return Err(ReelSyncError::FileNotFound(format!(
                "Audio file not found: {}",
                source.display()
            )));
        }
        validate_duration(duration)?;

        info!("Trimming audio: {} -> {}s", source.display(), duration);

        let guard = ArtifactGuard::for_file(output);
        let args = vec![
            "-i".to_string(),
            path_arg(source),
            "-t".to_string(),
            duration.to_string(),
            "-acodec".to_string(),
            "copy".to_string(),
            "-y".to_string(),
            path_arg(output),
        ];
        self.runner.run(MediaTool::Ffmpeg, &args).await?;
        guard.commit();

        info!("Audio trimmed successfully: {}", output.display());
        Ok(output.to_path_buf())
    }

    /// Сводит дорожки в одну длительностью `output_duration` секунд.
    ///
    /// Отсутствующие файлы пропускаются с предупреждением. Длительность сведения
    /// определяется первой дорожкой, результат жестко обрезается до `output_duration`.
    pub async fn mix(
        &self,
        tracks: &[AudioTrackSpec],
        output_duration: f64,
        output: &Path,
    ) -> Result<PathBuf> {
        if tracks.is_empty() {
            return Err(ReelSyncError::InvalidInput(
                "No audio tracks provided for mixing".to_string(),
            ));
        }
        validate_duration(output_duration)?;
        for track in tracks {
            track.validate()?;
        }

        let mut graph = MixGraph::new(self.options.dropout_transition);
        let mut args: Vec<String> = Vec::new();
        for track in tracks {
            if !track.source.exists() {
                warn!(
                    "Audio file not found during mixing, skipping: {}",
                    track.source.display()
                );
                continue;
            }
            args.push("-i".to_string());
            args.push(path_arg(&track.source));
            graph.push_track(track.offset_seconds, track.volume);
        }

        if graph.is_empty() {
            return Err(ReelSyncError::FileNotFound(format!(
                "None of the {} audio tracks exist",
                tracks.len()
            )));
        }

        args.extend([
            "-filter_complex".to_string(),
            graph.render(),
            "-map".to_string(),
            format!("[{}]", MIX_OUTPUT_LABEL),
            "-t".to_string(),
            output_duration.to_string(),
            "-y".to_string(),
            path_arg(output),
        ]);

        info!(
            "Mixing {} of {} audio tracks into {}",
            graph.stages().len(),
            tracks.len(),
            output.display()
        );

        let guard = ArtifactGuard::for_file(output);
        self.runner.run(MediaTool::Ffmpeg, &args).await?;
        guard.commit();

        info!("Audio mixed successfully: {}", output.display());
        Ok(output.to_path_buf())
    }
}
