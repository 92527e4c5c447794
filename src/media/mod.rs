//! Модуль для работы с медиафайлами
//!
//! Нормализация изображений, построение графа фильтров и сборка аудиодорожки.

pub mod audio;
pub mod filter_graph;
pub mod images;

pub use audio::{AudioAssembler, AudioTrackSpec};
pub use filter_graph::{MixGraph, TrackStage};
pub use images::{crop_region, CropRegion, ImageNormalizer};
