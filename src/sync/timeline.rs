//! Генерация таймлайна для concat демультиплексора ffmpeg

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use crate::alignment::WordAlignment;
use crate::config::TimelineOptions;
use crate::error::{ReelSyncError, Result};
use crate::sync::sync_points::compute_sync_points;

/// Имя файла таймлайна в выходной директории
pub const TIMELINE_FILE_NAME: &str = "inputs.txt";

/// Кадр таймлайна
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageTimelineEntry {
    pub path: PathBuf,
    /// Длительность показа в секундах, округленная до миллисекунд
    pub duration: f64,
}

/// Округление до миллисекунд
pub fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Сопоставляет каждому кадру длительность по соседним точкам синхронизации.
///
/// Если точки закончились или разница неположительна, подставляется
/// `options.fallback_duration`.
pub fn timeline_entries(
    images: &[PathBuf],
    sync_points: &[f64],
    options: &TimelineOptions,
) -> Vec<ImageTimelineEntry> {
    images
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let duration = match (sync_points.get(i), sync_points.get(i + 1)) {
                (Some(start), Some(end)) => round_millis(end - start),
                _ => {
                    warn!(
                        "Sync points exhausted at image {} ({}), using fallback duration {}s",
                        i,
                        path.display(),
                        options.fallback_duration
                    );
                    options.fallback_duration
                }
            };

            let duration = if duration > 0.0 {
                duration
            } else {
                warn!(
                    "Image {} ({}) got non-positive duration {}, using fallback duration {}s",
                    i,
                    path.display(),
                    duration,
                    options.fallback_duration
                );
                options.fallback_duration
            };

            ImageTimelineEntry {
                path: path.clone(),
                duration,
            }
        })
        .collect()
}

/// Экранирует путь для строки `file '...'`
fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}

/// Сериализует таймлайн в формат concat демультиплексора.
///
/// Последний кадр повторяется без длительности, чтобы ffmpeg удержал его на экране.
pub fn render_timeline(entries: &[ImageTimelineEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(out, "file '{}'", escape_concat_path(&entry.path));
        let _ = writeln!(out, "duration {:.3}", entry.duration);
    }
    if let Some(last) = entries.last() {
        let _ = writeln!(out, "file '{}'", escape_concat_path(&last.path));
    }
    out
}

/// Генерирует файл таймлайна `inputs.txt` в `output_dir` и возвращает путь к нему.
pub async fn generate_timeline(
    images: &[PathBuf],
    alignment: &WordAlignment,
    markers: &[String],
    output_dir: &Path,
    options: &TimelineOptions,
) -> Result<PathBuf> {
    if images.is_empty() {
        return Err(ReelSyncError::InvalidInput(
            "Cannot build a timeline without images".to_string(),
        ));
    }
    if alignment.is_empty() {
        warn!("No alignment data provided, every image gets the fallback duration");
    }

    let (mode, sync_points) = compute_sync_points(alignment, images.len(), markers);
    let entries = timeline_entries(images, &sync_points, options);

    tokio::fs::create_dir_all(output_dir).await?;
    let timeline_path = output_dir.join(TIMELINE_FILE_NAME);
    tokio::fs::write(&timeline_path, render_timeline(&entries)).await?;

    info!(
        "Timeline with {} images ({:?}) generated at {}",
        entries.len(),
        mode,
        timeline_path.display()
    );
    Ok(timeline_path)
}
