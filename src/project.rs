//! Описание проекта видео
//!
//! Входные данные задачи: разрешение, длительность, изображения,
//! аудиодорожки и слова-маркеры.

use std::path::{Path, PathBuf};

use path_clean::clean;
use serde::{Deserialize, Serialize};

use crate::error::{ReelSyncError, Result};
use crate::media::audio::AudioTrackSpec;

/// Пресеты разрешений (ширина, высота)
const RESOLUTION_PRESETS: &[(&str, u32, u32)] = &[
    ("sd", 640, 480),
    ("hd", 1280, 720),
    ("full-hd", 1920, 1080),
    ("squared", 1080, 1080),
    ("youtube-short", 1080, 1920),
    ("instagram-story", 1080, 1920),
    ("instagram-post", 1080, 1080),
    ("instagram-reel", 1080, 1920),
    ("tiktok", 1080, 1920),
    ("twitter-landscape", 1200, 675),
    ("twitter-portrait", 1080, 1350),
    ("twitter-square", 1080, 1080),
    ("facebook-video", 1080, 1920),
    ("facebook-story", 1080, 1920),
    ("facebook-post", 1080, 1080),
    ("snapchat", 1080, 1920),
];

/// Размеры кадра для пресета
pub fn preset_dimensions(name: &str) -> Option<(u32, u32)> {
    RESOLUTION_PRESETS
        .iter()
        .find(|(preset, _, _)| *preset == name)
        .map(|(_, w, h)| (*w, *h))
}

fn default_resolution() -> String {
    "hd".to_string()
}

fn default_background() -> String {
    "#000000".to_string()
}

fn default_volume() -> f32 {
    1.0
}

/// Аудиодорожка проекта
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudioSource {
    /// Путь к файлу (относительно директории проекта или абсолютный)
    pub src: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Момент видео, с которого начинает звучать дорожка (секунды)
    #[serde(default, alias = "videoBegin")]
    pub audio_begin: f64,
}

/// Проект видео
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoProject {
    pub name: String,
    #[serde(default = "default_resolution")]
    pub resolution: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Длительность итогового видео в секундах
    pub duration: f64,
    #[serde(default = "default_background")]
    pub background_color: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub audios: Vec<AudioSource>,
    #[serde(default)]
    pub marker_words: Vec<String>,
    /// Текст озвучки
    #[serde(default)]
    pub script: Option<String>,
}

impl VideoProject {
    /// Загрузить проект из JSON файла
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReelSyncError::FileNotFound(format!("{}: {}", path.display(), e))
        })?;
        let project: Self = serde_json::from_str(&content)?;
        project.validate()?;
        Ok(project)
    }

    /// Проверка обязательных полей
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ReelSyncError::InvalidInput(
                "Project name must not be empty".to_string(),
            ));
        }
        if !(self.duration > 0.0) || !self.duration.is_finite() {
            return Err(ReelSyncError::InvalidInput(format!(
                "Project duration must be positive, got {}",
                self.duration
            )));
        }
        if self.images.is_empty() {
            return Err(ReelSyncError::InvalidInput(
                "Project has no images".to_string(),
            ));
        }
        self.resolve_dimensions()?;
        self.background_rgb()?;
        Ok(())
    }

    /// Размеры кадра: явные `width`/`height` важнее пресета
    pub fn resolve_dimensions(&self) -> Result<(u32, u32)> {
        let preset = preset_dimensions(&self.resolution);
        let (width, height) = match (self.width, self.height, preset) {
            (Some(w), Some(h), _) => (w, h),
            (w, h, Some((pw, ph))) => (w.unwrap_or(pw), h.unwrap_or(ph)),
            (_, _, None) => {
                return Err(ReelSyncError::InvalidInput(format!(
                    "Unknown resolution preset '{}'",
                    self.resolution
                )))
            }
        };
        if width == 0 || height == 0 {
            return Err(ReelSyncError::InvalidInput(format!(
                "Invalid frame size {}x{}",
                width, height
            )));
        }
        Ok((width, height))
    }

    /// Цвет фона `#RRGGBB` в виде RGB
    pub fn background_rgb(&self) -> Result<[u8; 3]> {
        let hex = self.background_color.trim_start_matches('#');
        let invalid = || {
            ReelSyncError::InvalidInput(format!(
                "Invalid background color '{}'",
                self.background_color
            ))
        };
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok([channel(0)?, channel(2)?, channel(4)?])
    }

    /// Пути к изображениям относительно `base_dir`
    pub fn image_paths(&self, base_dir: &Path) -> Vec<PathBuf> {
        self.images
            .iter()
            .map(|src| resolve_media_path(base_dir, src))
            .collect()
    }

    /// Дорожки для сборщика аудио
    pub fn audio_tracks(&self, base_dir: &Path) -> Vec<AudioTrackSpec> {
        self.audios
            .iter()
            .map(|audio| {
                AudioTrackSpec::new(
                    resolve_media_path(base_dir, &audio.src),
                    audio.volume,
                    audio.audio_begin,
                )
            })
            .collect()
    }
}

/// Разрешает путь к медиафайлу относительно директории проекта
pub fn resolve_media_path(base_dir: &Path, src: &str) -> PathBuf {
    let path = Path::new(src);
    if path.is_absolute() {
        clean(path)
    } else {
        clean(base_dir.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_json(extra: &str) -> String {
        format!(
            r#"{{"name": "demo", "duration": 12.5, "images": ["a.png"]{}}}"#,
            extra
        )
    }

    #[test]
    fn test_defaults_from_minimal_json() {
        let project: VideoProject = serde_json::from_str(&project_json("")).unwrap();
        assert_eq!(project.resolution, "hd");
        assert_eq!(project.background_color, "#000000");
        assert!(project.audios.is_empty());
        assert_eq!(project.resolve_dimensions().unwrap(), (1280, 720));
        project.validate().unwrap();
    }

    #[test]
    fn test_audio_source_defaults_and_alias() {
        let project: VideoProject = serde_json::from_str(&project_json(
            r#", "audios": [{"src": "voice.mp3"}, {"src": "music.mp3", "volume": 0.2, "videoBegin": 1.5}]"#,
        ))
        .unwrap();

        assert_eq!(project.audios[0].volume, 1.0);
        assert_eq!(project.audios[0].audio_begin, 0.0);
        assert_eq!(project.audios[1].volume, 0.2);
        assert_eq!(project.audios[1].audio_begin, 1.5);
    }

    #[test]
    fn test_resolution_presets() {
        let mut project: VideoProject =
            serde_json::from_str(&project_json(r#", "resolution": "tiktok""#)).unwrap();
        assert_eq!(project.resolve_dimensions().unwrap(), (1080, 1920));

        project.width = Some(720);
        assert_eq!(project.resolve_dimensions().unwrap(), (720, 1920));

        project.resolution = "cinema".to_string();
        project.width = None;
        assert!(project.resolve_dimensions().unwrap_err().is_input_error());

        project.width = Some(100);
        project.height = Some(200);
        assert_eq!(project.resolve_dimensions().unwrap(), (100, 200));

        assert_eq!(preset_dimensions("twitter-landscape"), Some((1200, 675)));
    }

    #[test]
    fn test_background_color() {
        let mut project: VideoProject = serde_json::from_str(&project_json(
            r##", "backgroundColor": "#FF8000""##,
        ))
        .unwrap();
        assert_eq!(project.background_rgb().unwrap(), [255, 128, 0]);

        project.background_color = "red".to_string();
        assert!(project.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_projects() {
        let project: VideoProject =
            serde_json::from_str(r#"{"name": "demo", "duration": 0, "images": ["a.png"]}"#).unwrap();
        assert!(project.validate().unwrap_err().is_input_error());

        let project: VideoProject =
            serde_json::from_str(r#"{"name": "demo", "duration": 3}"#).unwrap();
        assert!(project.validate().unwrap_err().is_input_error());
    }

    #[test]
    fn test_resolve_media_path() {
        let base = Path::new("/projects/demo");
        assert_eq!(
            resolve_media_path(base, "./assets/../img/a.png"),
            PathBuf::from("/projects/demo/img/a.png")
        );
        assert_eq!(
            resolve_media_path(base, "/abs/./b.png"),
            PathBuf::from("/abs/b.png")
        );
    }

    #[test]
    fn test_audio_tracks_resolved() {
        let project: VideoProject = serde_json::from_str(&project_json(
            r#", "audios": [{"src": "sfx/../voice.mp3", "volume": 0.5, "audioBegin": 2}]"#,
        ))
        .unwrap();
        let tracks = project.audio_tracks(Path::new("/p"));
        assert_eq!(tracks, vec![AudioTrackSpec::new("/p/voice.mp3", 0.5, 2.0)]);
    }
}
