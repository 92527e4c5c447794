//! Караоке-субтитры с пословной подсветкой

use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::alignment::{WordAlignment, WordTiming};
use crate::config::SubtitleStyle;
use crate::error::Result;
use crate::subtitle::ass;

/// Имя файла субтитров в выходной директории
pub const SUBTITLE_FILE_NAME: &str = "subs.ass";

/// Минимальная длительность подсветки слова (секунды); ASS не умеет `\k0`
pub const MIN_HIGHLIGHT_SECONDS: f64 = 0.01;

/// Слово строки с длительностью подсветки
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KaraokeWord {
    pub text: String,
    /// Длительность подсветки в секундах, не меньше `MIN_HIGHLIGHT_SECONDS`
    pub highlight: f64,
}

impl KaraokeWord {
    /// Длительность в сотых долях секунды для тега `\k`
    pub fn centiseconds(&self) -> u32 {
        ((self.highlight * 100.0).round() as u32).max(1)
    }
}

/// Одна отображаемая строка субтитров
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubtitleLine {
    pub start: f64,
    pub end: f64,
    pub words: Vec<KaraokeWord>,
}

impl SubtitleLine {
    /// Текст строки с тегами `\k`; пробел после каждого слова, кроме последнего
    pub fn render_text(&self) -> String {
        let last = self.words.len().saturating_sub(1);
        self.words
            .iter()
            .enumerate()
            .map(|(j, word)| {
                let separator = if j < last { " " } else { "" };
                format!("{{\\k{}}}{}{}", word.centiseconds(), word.text, separator)
            })
            .collect()
    }
}

fn build_line(chunk: &[WordTiming]) -> Option<SubtitleLine> {
    let first = chunk.first()?;
    let last = chunk.last()?;

    let words = chunk
        .iter()
        .enumerate()
        .map(|(j, word)| {
            // подсветка держится до начала следующего слова, сглаживая паузы
            let raw = match chunk.get(j + 1) {
                Some(next) => next.start - word.start,
                None => word.end - word.start,
            };
            KaraokeWord {
                text: word.word.clone(),
                highlight: raw.max(MIN_HIGHLIGHT_SECONDS),
            }
        })
        .collect();

    Some(SubtitleLine {
        start: first.start,
        end: last.end,
        words,
    })
}

/// Разбивает выравнивание на строки по `words_per_line` слов
pub fn build_lines(alignment: &WordAlignment, words_per_line: usize) -> Vec<SubtitleLine> {
    alignment
        .words()
        .chunks(words_per_line.max(1))
        .filter_map(build_line)
        .collect()
}

/// Полный текст документа ASS
pub fn render_document(
    lines: &[SubtitleLine],
    style: &SubtitleStyle,
    play_res: (u32, u32),
) -> String {
    let mut parts = vec![ass::header(style, play_res)];
    parts.extend(
        lines
            .iter()
            .map(|line| ass::dialogue_line(line.start, line.end, &line.render_text())),
    );
    parts.join("\n")
}

/// Генерирует `subs.ass` в `output_dir` и возвращает путь к нему.
pub async fn generate_subtitles(
    alignment: &WordAlignment,
    output_dir: &Path,
    style: &SubtitleStyle,
    play_res: (u32, u32),
) -> Result<PathBuf> {
    let lines = build_lines(alignment, style.words_per_line);

    tokio::fs::create_dir_all(output_dir).await?;
    let subs_path = output_dir.join(SUBTITLE_FILE_NAME);
    tokio::fs::write(&subs_path, render_document(&lines, style, play_res)).await?;

    info!(
        "Subtitles with {} lines generated at {}",
        lines.len(),
        subs_path.display()
    );
    Ok(subs_path)
}
