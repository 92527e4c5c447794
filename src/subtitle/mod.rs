//! Модуль субтитров
//!
//! Генерация караоке-субтитров в формате ASS по пословному выравниванию.

pub mod ass;
pub mod karaoke;

pub use karaoke::{generate_subtitles, KaraokeWord, SubtitleLine};
