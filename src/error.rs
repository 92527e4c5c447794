//! Модуль обработки ошибок библиотеки reel-sync
//!
//! Этот модуль содержит типы ошибок, которые могут возникнуть при подготовке
//! ассетов для видеокомпозитора.

use thiserror::Error;

/// Категория ошибки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Некорректные входные данные: отсутствующий файл, пустой список и т.п.
    Input,
    /// Внешний инструмент (ffmpeg, кодек изображений) завершился с ошибкой
    Processing,
    /// Ошибки ввода-вывода, сериализации и прочие
    Other,
}

/// Ошибки библиотеки reel-sync
#[derive(Debug, Error)]
pub enum ReelSyncError {
    /// Файл не найден
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Некорректные входные данные
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Внешний инструмент вернул ненулевой код завершения
    #[error("{tool} failed with status {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    /// Внешний инструмент не уложился в отведенное время
    #[error("{tool} timed out after {seconds} seconds")]
    ToolTimeout { tool: String, seconds: u64 },

    /// Ошибка обработки изображения
    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    /// Ошибка кодека изображений
    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// Ошибка ввода-вывода
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка сериализации/десериализации JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Ошибка конфигурации
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Другая ошибка
    #[error("Other error: {0}")]
    Other(String),
}

impl ReelSyncError {
    /// Категория ошибки
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound(_) | Self::InvalidInput(_) => ErrorKind::Input,
            Self::ToolFailed { .. }
            | Self::ToolTimeout { .. }
            | Self::ImageProcessing(_)
            | Self::Image(_) => ErrorKind::Processing,
            Self::Io(_) | Self::Json(_) | Self::Configuration(_) | Self::Other(_) => {
                ErrorKind::Other
            }
        }
    }

    pub fn is_input_error(&self) -> bool {
        self.kind() == ErrorKind::Input
    }
}

impl From<&str> for ReelSyncError {
    fn from(s: &str) -> Self {
        ReelSyncError::Other(s.to_string())
    }
}

impl From<String> for ReelSyncError {
    fn from(s: String) -> Self {
        ReelSyncError::Other(s)
    }
}

/// Тип Result для библиотеки reel-sync
pub type Result<T> = std::result::Result<T, ReelSyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ReelSyncError::FileNotFound("a.mp3".into()).kind(),
            ErrorKind::Input
        );
        assert!(ReelSyncError::InvalidInput("empty".into()).is_input_error());

        let failed = ReelSyncError::ToolFailed {
            tool: "ffmpeg".into(),
            status: "exit status: 1".into(),
            stderr: "No such filter".into(),
        };
        assert_eq!(failed.kind(), ErrorKind::Processing);
        assert!(failed.to_string().contains("No such filter"));

        let io = ReelSyncError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(io.kind(), ErrorKind::Other);
    }
}
