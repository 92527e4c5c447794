//! Модуль синхронизации кадров с речью
//!
//! Вычисляет точки смены изображений по словам-маркерам или равномерно
//! и записывает таймлайн для concat демультиплексора ffmpeg.

pub mod sync_points;
pub mod timeline;

pub use sync_points::{compute_sync_points, SyncMode};
pub use timeline::{generate_timeline, ImageTimelineEntry};
