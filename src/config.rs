//! Модуль конфигурации библиотеки reel-sync
//!
//! Этот модуль содержит структуры для настройки нормализации изображений,
//! генерации таймлайна, субтитров и сведения аудио.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReelSyncError, Result};

/// Параметры выходных кадров
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Ширина кадра в пикселях
    pub width: u32,
    /// Высота кадра в пикселях
    pub height: u32,
    /// Качество JPEG (1 - 100)
    pub jpeg_quality: u8,
    /// Цвет фона, на который накладываются изображения с прозрачностью (RGB)
    pub background: [u8; 3],
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            jpeg_quality: 95,
            background: [0, 0, 0],
        }
    }
}

/// Глобальный стиль ASS субтитров
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SubtitleStyle {
    pub font_name: String,
    pub font_size: u32,
    /// Цвета в формате ASS (&HAABBGGRR)
    pub primary_colour: String,
    pub secondary_colour: String,
    pub outline_colour: String,
    pub back_colour: String,
    pub bold: bool,
    pub italic: bool,
    pub border_style: u8,
    pub outline: u32,
    pub shadow: u32,
    /// Положение по нумпаду (2 = снизу по центру)
    pub alignment: u8,
    pub margin_l: u32,
    pub margin_r: u32,
    pub margin_v: u32,
    pub encoding: u32,
    /// Количество слов в одной строке караоке
    pub words_per_line: usize,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_name: "Arial".to_string(),
            font_size: 125,
            primary_colour: "&H00FFFFFF".to_string(),
            secondary_colour: "&H00FF0000".to_string(),
            outline_colour: "&H00000000".to_string(),
            back_colour: "&H00000000".to_string(),
            bold: true,
            italic: false,
            border_style: 1,
            outline: 3,
            shadow: 0,
            alignment: 2,
            margin_l: 10,
            margin_r: 10,
            margin_v: 850,
            encoding: 1,
            words_per_line: 4,
        }
    }
}

/// Параметры генерации таймлайна
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimelineOptions {
    /// Длительность кадра, если точки синхронизации закончились (секунды)
    pub fallback_duration: f64,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            fallback_duration: 2.0,
        }
    }
}

/// Параметры сведения аудио
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioMixOptions {
    /// Время затухания amix при окончании одной из дорожек (секунды)
    pub dropout_transition: u32,
}

impl Default for AudioMixOptions {
    fn default() -> Self {
        Self {
            dropout_transition: 3,
        }
    }
}

/// Конфигурация библиотеки
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelSyncConfig {
    pub output: OutputConfig,
    pub subtitle_style: SubtitleStyle,
    pub timeline: TimelineOptions,
    pub audio: AudioMixOptions,
    /// Корневая директория для артефактов задач
    pub output_root: PathBuf,
    /// Путь к ffmpeg
    pub ffmpeg_path: PathBuf,
    /// Путь к ffprobe
    pub ffprobe_path: PathBuf,
    /// Максимальное время работы одного вызова внешнего инструмента
    pub process_timeout_secs: u64,
    /// Удалять директорию задачи при ошибке
    pub cleanup_on_failure: bool,
}

impl Default for ReelSyncConfig {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            subtitle_style: SubtitleStyle::default(),
            timeline: TimelineOptions::default(),
            audio: AudioMixOptions::default(),
            output_root: PathBuf::from("output"),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            process_timeout_secs: 1800,
            cleanup_on_failure: true,
        }
    }
}

impl ReelSyncConfig {
    /// Загрузить конфигурацию из JSON файла. Отсутствующие поля берутся по умолчанию.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReelSyncError::Configuration(format!(
                "Failed to read config {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Применить переопределения из переменных окружения
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(ffmpeg) = std::env::var("REEL_SYNC_FFMPEG") {
            self.ffmpeg_path = PathBuf::from(ffmpeg);
        }
        if let Ok(ffprobe) = std::env::var("REEL_SYNC_FFPROBE") {
            self.ffprobe_path = PathBuf::from(ffprobe);
        }
        if let Ok(dir) = std::env::var("REEL_SYNC_OUTPUT_DIR") {
            self.output_root = PathBuf::from(dir);
        }
        self
    }

    /// Проверить корректность конфигурации
    pub fn validate(&self) -> Result<()> {
        if self.output.width == 0 || self.output.height == 0 {
            return Err(ReelSyncError::Configuration(format!(
                "Output resolution must be non-zero, got {}x{}",
                self.output.width, self.output.height
            )));
        }
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(ReelSyncError::Configuration(format!(
                "JPEG quality must be within 1..=100, got {}",
                self.output.jpeg_quality
            )));
        }
        if self.subtitle_style.words_per_line == 0 {
            return Err(ReelSyncError::Configuration(
                "words_per_line must be at least 1".to_string(),
            ));
        }
        if !(self.timeline.fallback_duration > 0.0) {
            return Err(ReelSyncError::Configuration(format!(
                "fallback_duration must be positive, got {}",
                self.timeline.fallback_duration
            )));
        }
        if self.process_timeout_secs == 0 {
            return Err(ReelSyncError::Configuration(
                "process_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ReelSyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.output.width, 1080);
        assert_eq!(config.output.height, 1920);
        assert_eq!(config.subtitle_style.words_per_line, 4);
        assert_eq!(config.timeline.fallback_duration, 2.0);
    }

    #[test]
    fn test_partial_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "output": { "width": 720, "height": 1280 }, "subtitle_style": { "font_size": 90 } }"#,
        )
        .unwrap();

        let config = ReelSyncConfig::from_file(&path).unwrap();
        assert_eq!(config.output.width, 720);
        assert_eq!(config.output.height, 1280);
        assert_eq!(config.output.jpeg_quality, 95);
        assert_eq!(config.subtitle_style.font_size, 90);
        assert_eq!(config.subtitle_style.font_name, "Arial");
        assert_eq!(config.process_timeout_secs, 1800);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ReelSyncConfig::default();
        config.subtitle_style.words_per_line = 0;
        assert!(config.validate().is_err());

        let mut config = ReelSyncConfig::default();
        config.timeline.fallback_duration = 0.0;
        assert!(config.validate().is_err());

        let mut config = ReelSyncConfig::default();
        config.output.height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let err = ReelSyncConfig::from_file("/nonexistent/reel-sync.json").unwrap_err();
        assert!(matches!(err, ReelSyncError::Configuration(_)));
    }
}
