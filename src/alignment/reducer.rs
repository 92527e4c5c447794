//! Свертка посимвольного выравнивания в пословное

use log::debug;

use crate::alignment::{CharacterAlignment, WordAlignment, WordTiming};
use crate::error::{ReelSyncError, Result};

/// Накопитель текущего слова
struct WordBuffer {
    text: String,
    start: f64,
}

/// Преобразует посимвольное выравнивание в последовательность слов.
///
/// Слово заканчивается на пробельном символе или в конце ввода; его конец берется
/// у последнего символа слова. Пустой ввод дает пустое выравнивание.
pub fn reduce_to_words(alignment: &CharacterAlignment) -> Result<WordAlignment> {
    let chars = &alignment.characters;
    let starts = &alignment.character_start_times_seconds;
    let ends = &alignment.character_end_times_seconds;

    if chars.len() != starts.len() || chars.len() != ends.len() {
        return Err(ReelSyncError::InvalidInput(format!(
            "Character alignment arrays differ in length: {} characters, {} start times, {} end times",
            chars.len(),
            starts.len(),
            ends.len()
        )));
    }

    let mut words: Vec<WordTiming> = Vec::new();
    let mut current: Option<WordBuffer> = None;

    for (i, ch) in chars.iter().enumerate() {
        if ch.trim().is_empty() {
            if let Some(buffer) = current.take() {
                // i > 0 гарантировано: буфер не пуст, значит до пробела был символ
                push_word(&mut words, buffer, ends[i - 1]);
            }
            continue;
        }

        match current.as_mut() {
            Some(buffer) => buffer.text.push_str(ch),
            None => {
                current = Some(WordBuffer {
                    text: ch.clone(),
                    start: starts[i],
                })
            }
        }
    }

    if let Some(buffer) = current.take() {
        if let Some(&last_end) = ends.last() {
            push_word(&mut words, buffer, last_end);
        }
    }

    debug!(
        "Reduced {} characters into {} words",
        chars.len(),
        words.len()
    );
    WordAlignment::new(words)
}

/// Добавляет слово, приводя зашумленные метки к инвариантам выравнивания
fn push_word(words: &mut Vec<WordTiming>, buffer: WordBuffer, end: f64) {
    let mut start = buffer.start;
    if let Some(prev) = words.last() {
        if start < prev.start {
            debug!(
                "Word '{}' starts at {} before previous word start {}, clamping",
                buffer.text, start, prev.start
            );
            start = prev.start;
        }
    }
    let end = if end < start {
        debug!(
            "Word '{}' ends at {} before it starts at {}, clamping",
            buffer.text, end, start
        );
        start
    } else {
        end
    };

    words.push(WordTiming {
        word: buffer.text,
        start,
        end,
    });
}
