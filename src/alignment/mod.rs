//! Модуль выравнивания речи
//!
//! Содержит типы посимвольного и пословного выравнивания, а также
//! преобразование первого во второе.

pub mod reducer;

use serde::{Deserialize, Serialize};

use crate::error::{ReelSyncError, Result};

pub use reducer::reduce_to_words;

/// Посимвольное выравнивание в том виде, в котором его отдает TTS провайдер
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CharacterAlignment {
    pub characters: Vec<String>,
    pub character_start_times_seconds: Vec<f64>,
    pub character_end_times_seconds: Vec<f64>,
}

/// Слово с временными метками (в секундах)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WordTiming {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

impl WordTiming {
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            start,
            end,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Упорядоченная по времени последовательность слов.
///
/// Гарантирует `start <= end` для каждого слова и неубывание `start`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct WordAlignment {
    words: Vec<WordTiming>,
}

impl WordAlignment {
    /// Создать выравнивание, проверив инварианты
    pub fn new(words: Vec<WordTiming>) -> Result<Self> {
        for (i, w) in words.iter().enumerate() {
            if !w.start.is_finite() || !w.end.is_finite() {
                return Err(ReelSyncError::InvalidInput(format!(
                    "Word {} ('{}') has a non-finite timestamp",
                    i, w.word
                )));
            }
            if w.start > w.end {
                return Err(ReelSyncError::InvalidInput(format!(
                    "Word {} ('{}') starts at {} after it ends at {}",
                    i, w.word, w.start, w.end
                )));
            }
        }
        if let Some(i) = words.windows(2).position(|pair| pair[0].start > pair[1].start) {
            return Err(ReelSyncError::InvalidInput(format!(
                "Word alignment is not time-ordered at index {}",
                i + 1
            )));
        }
        Ok(Self { words })
    }

    pub fn words(&self) -> &[WordTiming] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Время окончания последнего слова, если выравнивание не пустое
    pub fn end_time(&self) -> Option<f64> {
        self.words.last().map(|w| w.end)
    }
}

impl<'de> Deserialize<'de> for WordAlignment {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            words: Vec<WordTiming>,
        }

        let raw = Raw::deserialize(deserializer)?;
        WordAlignment::new(raw.words).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_inverted_word() {
        let err = WordAlignment::new(vec![WordTiming::new("hi", 0.5, 0.2)]).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_rejects_unordered_words() {
        let words = vec![
            WordTiming::new("b", 1.0, 1.2),
            WordTiming::new("a", 0.5, 0.8),
        ];
        assert!(WordAlignment::new(words).is_err());
    }

    #[test]
    fn test_end_time() {
        let alignment = WordAlignment::new(vec![
            WordTiming::new("hi", 0.0, 0.3),
            WordTiming::new("there", 0.4, 0.8),
        ])
        .unwrap();
        assert_eq!(alignment.end_time(), Some(0.8));
        assert_eq!(WordAlignment::default().end_time(), None);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: WordAlignment =
            serde_json::from_str(r#"{"words":[{"word":"hi","start":0.0,"end":0.3}]}"#).unwrap();
        assert_eq!(ok.len(), 1);

        let bad = serde_json::from_str::<WordAlignment>(
            r#"{"words":[{"word":"hi","start":0.4,"end":0.3}]}"#,
        );
        assert!(bad.is_err());
    }
}
