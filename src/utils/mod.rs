//! Вспомогательные модули: запуск ffmpeg и охрана выходных файлов

pub mod artifact;
pub mod ffmpeg;

pub use artifact::ArtifactGuard;
pub use ffmpeg::{MediaTool, MediaToolRunner, SystemToolRunner, ToolOutput};
