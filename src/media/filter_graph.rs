//! Построение графа фильтров ffmpeg для сведения аудиодорожек
//!
//! Каждая дорожка превращается в стадию `adelay` + `volume`, затем все стадии
//! сводятся одним `amix` с длительностью по первому входу.

use std::fmt;

/// Метка выхода графа, передаваемая в `-map`
pub const MIX_OUTPUT_LABEL: &str = "out";

/// Стадия обработки одной дорожки
#[derive(Debug, Clone, PartialEq)]
pub struct TrackStage {
    /// Индекс входа ffmpeg (порядок `-i`)
    pub input_index: usize,
    /// Задержка начала дорожки в миллисекундах
    pub delay_ms: u64,
    /// Множитель громкости
    pub volume: f32,
}

impl TrackStage {
    /// Создает стадию; смещение переводится в целые миллисекунды отбрасыванием дробной части
    pub fn new(input_index: usize, offset_seconds: f64, volume: f32) -> Self {
        Self {
            input_index,
            delay_ms: (offset_seconds.max(0.0) * 1000.0) as u64,
            volume,
        }
    }

    pub fn label(&self) -> String {
        format!("a{}", self.input_index)
    }
}

impl fmt::Display for TrackStage {
    // задержка одинакова для обоих каналов стерео
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:a]adelay={}|{},volume={}[{}]",
            self.input_index,
            self.delay_ms,
            self.delay_ms,
            self.volume,
            self.label()
        )
    }
}

/// Граф сведения: стадии дорожек и финальный `amix`
#[derive(Debug, Clone, PartialEq)]
pub struct MixGraph {
    stages: Vec<TrackStage>,
    dropout_transition: u32,
}

impl MixGraph {
    pub fn new(dropout_transition: u32) -> Self {
        Self {
            stages: Vec::new(),
            dropout_transition,
        }
    }

    /// Добавить дорожку; индекс входа назначается по порядку добавления
    pub fn push_track(&mut self, offset_seconds: f64, volume: f32) -> &TrackStage {
        let index = self.stages.len();
        self.stages.push(TrackStage::new(index, offset_seconds, volume));
        &self.stages[index]
    }

    pub fn stages(&self) -> &[TrackStage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Стадия сведения всех дорожек
    fn mix_stage(&self) -> String {
        let inputs: String = self
            .stages
            .iter()
            .map(|stage| format!("[{}]", stage.label()))
            .collect();
        format!(
            "{}amix=inputs={}:duration=first:dropout_transition={}[{}]",
            inputs,
            self.stages.len(),
            self.dropout_transition,
            MIX_OUTPUT_LABEL
        )
    }

    /// Строка для `-filter_complex`
    pub fn render(&self) -> String {
        self.stages
            .iter()
            .map(TrackStage::to_string)
            .chain(std::iter::once(self.mix_stage()))
            .collect::<Vec<_>>()
            .join(";")
    }
}
