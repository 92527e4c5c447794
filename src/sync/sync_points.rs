//! Вычисление точек синхронизации (границ между кадрами)

use log::{debug, warn};

use crate::alignment::WordAlignment;

/// Пунктуация, отбрасываемая по краям слова при поиске маркеров
const MARKER_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':', '"', '\''];

/// Режим расстановки границ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Границы по первому вхождению слов-маркеров
    MarkerWords,
    /// Равномерное распределение слов по кадрам
    EvenDistribution,
}

/// Нормализует слово для сравнения с маркером
pub fn normalize_word(word: &str) -> String {
    word.to_lowercase()
        .trim_matches(MARKER_PUNCTUATION)
        .to_string()
}

/// Вычисляет неубывающую последовательность точек синхронизации, начинающуюся с 0.0.
///
/// Если список маркеров не пуст, используется режим маркеров, иначе слова
/// распределяются по `image_count` кадрам равномерно. В обоих режимах последняя
/// точка совпадает с окончанием речи.
pub fn compute_sync_points(
    alignment: &WordAlignment,
    image_count: usize,
    markers: &[String],
) -> (SyncMode, Vec<f64>) {
    let (mode, mut points) = if markers.is_empty() {
        (
            SyncMode::EvenDistribution,
            even_sync_points(alignment, image_count),
        )
    } else {
        (SyncMode::MarkerWords, marker_sync_points(alignment, markers))
    };

    if let Some(end) = alignment.end_time() {
        if points.last().copied() != Some(end) {
            points.push(end);
        }
    }

    debug!("Computed {} sync points in {:?} mode", points.len(), mode);
    (mode, points)
}

fn marker_sync_points(alignment: &WordAlignment, markers: &[String]) -> Vec<f64> {
    let normalized: Vec<String> = alignment
        .words()
        .iter()
        .map(|w| normalize_word(&w.word))
        .collect();

    let mut points = vec![0.0];
    for marker in markers {
        let wanted = marker.trim().to_lowercase();
        match normalized.iter().position(|w| *w == wanted) {
            Some(idx) => {
                let start = alignment.words()[idx].start;
                if !points.contains(&start) {
                    points.push(start);
                } else {
                    debug!("Marker '{}' at {}s duplicates an existing sync point", marker, start);
                }
            }
            None => warn!("Marker word '{}' not found in transcript", marker),
        }
    }

    points.sort_by(|a, b| a.total_cmp(b));
    points
}

fn even_sync_points(alignment: &WordAlignment, image_count: usize) -> Vec<f64> {
    let mut points = vec![0.0];
    let words = alignment.words();
    let total_words = words.len();
    if total_words == 0 || image_count == 0 {
        return points;
    }

    // концы слов могут перекрываться; границы держатся в пределах [предыдущая, конец речи]
    let speech_end = words[total_words - 1].end;
    let step = total_words / image_count;
    for i in 0..image_count - 1 {
        // последнее слово (i + 1)-й группы
        let idx = ((i + 1) * step).clamp(1, total_words) - 1;
        let previous = points.last().copied().unwrap_or(0.0);
        let boundary = words[idx].end.min(speech_end).max(previous);
        if boundary != words[idx].end {
            debug!(
                "Boundary after word {} clamped from {} to {}",
                idx, words[idx].end, boundary
            );
        }
        points.push(boundary);
    }
    points
}
