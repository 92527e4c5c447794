//! Модуль для отслеживания прогресса выполнения задачи
//!
//! Этот модуль предоставляет реализацию паттерна Observer для отслеживания
//! этапов подготовки ассетов. Этапы могут выполняться одновременно, поэтому
//! общий прогресс считается как взвешенная сумма завершенных этапов.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

/// Информация о прогрессе выполнения задачи
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressInfo {
    /// Этап, к которому относится уведомление
    pub step: String,
    /// Процент выполнения этапа (0.0 - 100.0)
    pub step_progress: f32,
    /// Общий процент выполнения задачи (0.0 - 100.0)
    pub total_progress: f32,
    /// Дополнительная информация
    pub details: Option<String>,
    /// Время уведомления
    pub timestamp: DateTime<Utc>,
}

impl ProgressInfo {
    /// Создает новый экземпляр ProgressInfo
    pub fn new(
        step: impl Into<String>,
        step_progress: f32,
        total_progress: f32,
        details: Option<String>,
    ) -> Self {
        Self {
            step: step.into(),
            step_progress: step_progress.clamp(0.0, 100.0),
            total_progress: total_progress.clamp(0.0, 100.0),
            details,
            timestamp: Utc::now(),
        }
    }
}

/// Трейт для наблюдателя, получающего уведомления о прогрессе
pub trait ProgressObserver: Send + Sync {
    /// Метод, вызываемый при обновлении прогресса
    fn on_progress_update(&self, progress: ProgressInfo);
}

/// Трейт для объекта, отправляющего уведомления о прогрессе
pub trait ProgressReporter: Send + Sync {
    /// Добавить наблюдателя
    ///
    /// Возвращает идентификатор, по которому наблюдателя можно удалить.
    fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize;

    /// Удалить наблюдателя по идентификатору
    fn remove_observer(&mut self, id: usize) -> Option<Box<dyn ProgressObserver>>;

    /// Уведомить всех наблюдателей о прогрессе
    fn notify_progress(&self, progress: ProgressInfo);
}

/// Реализация ProgressReporter по умолчанию
pub struct DefaultProgressReporter {
    observers: RwLock<HashMap<usize, Box<dyn ProgressObserver>>>,
    next_id: AtomicUsize,
}

impl DefaultProgressReporter {
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
        }
    }
}

impl Default for DefaultProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for DefaultProgressReporter {
    fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.observers.write().insert(id, observer);
        id
    }

    fn remove_observer(&mut self, id: usize) -> Option<Box<dyn ProgressObserver>> {
        self.observers.write().remove(&id)
    }

    fn notify_progress(&self, progress: ProgressInfo) {
        for observer in self.observers.read().values() {
            observer.on_progress_update(progress.clone());
        }
    }
}

/// Этапы подготовки ассетов
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Нормализация изображений
    ImageNormalization,
    /// Преобразование посимвольного выравнивания в пословное
    AlignmentReduction,
    /// Генерация таймлайна кадров
    TimelineGeneration,
    /// Генерация караоке-субтитров
    SubtitleGeneration,
    /// Обрезка или сведение аудио
    AudioAssembly,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 5] = [
        Self::ImageNormalization,
        Self::AlignmentReduction,
        Self::TimelineGeneration,
        Self::SubtitleGeneration,
        Self::AudioAssembly,
    ];

    /// Название этапа
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImageNormalization => "Нормализация изображений",
            Self::AlignmentReduction => "Разбор выравнивания",
            Self::TimelineGeneration => "Генерация таймлайна",
            Self::SubtitleGeneration => "Генерация субтитров",
            Self::AudioAssembly => "Сборка аудио",
        }
    }

    /// Весовой коэффициент этапа (в процентах от всей задачи)
    pub fn weight(&self) -> f32 {
        match self {
            Self::ImageNormalization => 35.0,
            Self::AlignmentReduction => 5.0,
            Self::TimelineGeneration => 10.0,
            Self::SubtitleGeneration => 10.0,
            Self::AudioAssembly => 40.0,
        }
    }
}

/// Трекер прогресса задачи
pub struct ProgressTracker {
    reporter: Option<Box<dyn ProgressReporter>>,
    /// Завершенные этапы
    completed: Mutex<HashSet<PipelineStage>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            reporter: None,
            completed: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_reporter(reporter: Box<dyn ProgressReporter>) -> Self {
        Self {
            reporter: Some(reporter),
            completed: Mutex::new(HashSet::new()),
        }
    }

    /// Установить репортер прогресса
    pub fn set_reporter(&mut self, reporter: Box<dyn ProgressReporter>) {
        self.reporter = Some(reporter);
    }

    /// Добавить наблюдателя
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> Option<usize> {
        self.reporter
            .as_mut()
            .map(|reporter| reporter.add_observer(observer))
    }

    /// Общий прогресс по завершенным этапам
    pub fn total_progress(&self) -> f32 {
        let completed = self.completed.lock();
        let done: f32 = completed.iter().map(PipelineStage::weight).sum();
        let all: f32 = PipelineStage::ALL.iter().map(PipelineStage::weight).sum();
        (done / all * 100.0).clamp(0.0, 100.0)
    }

    /// Отметить начало этапа
    pub fn mark_started(&self, stage: PipelineStage) {
        self.report(stage, 0.0, None);
    }

    /// Отметить завершение этапа
    pub fn mark_completed(&self, stage: PipelineStage, details: Option<String>) {
        self.completed.lock().insert(stage);
        self.report(stage, 100.0, details);
    }

    /// Сбросить состояние перед новой задачей
    pub fn reset(&self) {
        self.completed.lock().clear();
    }

    fn report(&self, stage: PipelineStage, step_progress: f32, details: Option<String>) {
        if let Some(reporter) = &self.reporter {
            reporter.notify_progress(ProgressInfo::new(
                stage.as_str(),
                step_progress,
                self.total_progress(),
                details,
            ));
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
