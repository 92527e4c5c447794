//! Модуль для реализации системы уведомлений
//!
//! Конкретные наблюдатели для системы прогресса библиотеки reel-sync.

use std::sync::Arc;

use log::info;
use parking_lot::Mutex;

use crate::progress::{ProgressInfo, ProgressObserver};

/// Наблюдатель, пишущий прогресс в лог
pub struct LogProgressObserver {
    /// Префикс сообщений, например идентификатор задачи
    prefix: Option<String>,
}

impl LogProgressObserver {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn format(&self, progress: &ProgressInfo) -> String {
        let prefix = self.prefix.as_deref().unwrap_or("");
        let details = match progress.details.as_deref() {
            Some(details) if !details.is_empty() => format!(" ({})", details),
            _ => String::new(),
        };
        format!(
            "{}[{:.1}%] {}: {:.0}%{}",
            prefix, progress.total_progress, progress.step, progress.step_progress, details
        )
    }
}

impl Default for LogProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for LogProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        info!("{}", self.format(&progress));
    }
}

/// Наблюдатель, сохраняющий информацию о прогрессе в памяти
#[derive(Clone, Default)]
pub struct MemoryProgressObserver {
    history: Arc<Mutex<Vec<ProgressInfo>>>,
}

impl MemoryProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// История обновлений прогресса
    pub fn history(&self) -> Vec<ProgressInfo> {
        self.history.lock().clone()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }
}

impl ProgressObserver for MemoryProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        self.history.lock().push(progress);
    }
}

/// Наблюдатель, вызывающий функцию обратного вызова
pub struct CallbackProgressObserver<F>
where
    F: Fn(ProgressInfo) + Send + Sync + 'static,
{
    callback: F,
}

impl<F> CallbackProgressObserver<F>
where
    F: Fn(ProgressInfo) + Send + Sync + 'static,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressObserver for CallbackProgressObserver<F>
where
    F: Fn(ProgressInfo) + Send + Sync + 'static,
{
    fn on_progress_update(&self, progress: ProgressInfo) {
        (self.callback)(progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_log_observer_format() {
        let observer = LogProgressObserver::with_prefix("job-1 ");
        let line = observer.format(&ProgressInfo::new(
            "Сборка аудио",
            100.0,
            40.0,
            Some("mixed 2 tracks".to_string()),
        ));
        assert_eq!(line, "job-1 [40.0%] Сборка аудио: 100% (mixed 2 tracks)");

        // не паникует без инициализированного логгера
        observer.on_progress_update(ProgressInfo::new("step", 0.0, 0.0, None));
    }

    #[test]
    fn test_memory_observer() {
        let observer = MemoryProgressObserver::new();
        observer.on_progress_update(ProgressInfo::new("Step 1", 50.0, 25.0, None));
        observer.on_progress_update(ProgressInfo::new("Step 2", 100.0, 75.0, None));

        let history = observer.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].total_progress, 75.0);
        assert!(history[0].timestamp <= history[1].timestamp);

        observer.clear_history();
        assert!(observer.history().is_empty());
    }

    #[test]
    fn test_callback_observer() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();
        let observer = CallbackProgressObserver::new(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        observer.on_progress_update(ProgressInfo::new("Step 1", 50.0, 25.0, None));
        observer.on_progress_update(ProgressInfo::new("Step 2", 0.0, 50.0, None));

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
