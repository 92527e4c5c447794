//! Модуль для работы с FFmpeg
//!
//! Запуск ffmpeg/ffprobe вынесен за трейт `MediaToolRunner`, чтобы сборщик аудио
//! можно было тестировать без установленного ffmpeg.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, error, info};
use regex::Regex;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::ReelSyncConfig;
use crate::error::{ReelSyncError, Result};

lazy_static! {
    static ref FFMPEG_VERSION_RE: Regex =
        Regex::new(r"(?:ffmpeg|ffprobe) version n?(\d+(?:\.\d+){0,2})").unwrap();
}

/// Внешний медиаинструмент
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaTool {
    Ffmpeg,
    Ffprobe,
}

impl MediaTool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ffmpeg => "ffmpeg",
            Self::Ffprobe => "ffprobe",
        }
    }
}

/// Результат успешного запуска инструмента
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Запускает ffmpeg/ffprobe с заданными аргументами.
///
/// Ненулевой код завершения должен возвращаться как `ReelSyncError::ToolFailed`
/// с текстом stderr.
#[async_trait]
pub trait MediaToolRunner: Send + Sync {
    async fn run(&self, tool: MediaTool, args: &[String]) -> Result<ToolOutput>;
}

/// Запуск установленных в системе ffmpeg/ffprobe
#[derive(Debug, Clone)]
pub struct SystemToolRunner {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl SystemToolRunner {
    pub fn new(ffmpeg_path: PathBuf, ffprobe_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            timeout,
        }
    }

    pub fn from_config(config: &ReelSyncConfig) -> Self {
        Self::new(
            config.ffmpeg_path.clone(),
            config.ffprobe_path.clone(),
            Duration::from_secs(config.process_timeout_secs),
        )
    }

    fn program(&self, tool: MediaTool) -> &Path {
        match tool {
            MediaTool::Ffmpeg => &self.ffmpeg_path,
            MediaTool::Ffprobe => &self.ffprobe_path,
        }
    }
}

impl Default for SystemToolRunner {
    fn default() -> Self {
        Self::from_config(&ReelSyncConfig::default())
    }
}

#[async_trait]
impl MediaToolRunner for SystemToolRunner {
    async fn run(&self, tool: MediaTool, args: &[String]) -> Result<ToolOutput> {
        let program = self.program(tool);
        debug!("Running {}: {} {}", tool.as_str(), program.display(), args.join(" "));

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ReelSyncError::ToolFailed {
                tool: tool.as_str().to_string(),
                status: "not started".to_string(),
                stderr: format!("Failed to start {}: {}", program.display(), e),
            })?;

        // при таймауте future отбрасывается, kill_on_drop завершает процесс
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                error!(
                    "{} timed out after {} seconds",
                    tool.as_str(),
                    self.timeout.as_secs()
                );
                return Err(ReelSyncError::ToolTimeout {
                    tool: tool.as_str().to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            error!("{} failed with status {}: {}", tool.as_str(), output.status, stderr);
            return Err(ReelSyncError::ToolFailed {
                tool: tool.as_str().to_string(),
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }
}

/// Извлекает номер версии из вывода `ffmpeg -version`
pub fn parse_version(version_output: &str) -> Option<String> {
    FFMPEG_VERSION_RE
        .captures(version_output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Проверка наличия ffmpeg; возвращает первую строку `ffmpeg -version`
pub async fn check_ffmpeg_installed(runner: &dyn MediaToolRunner) -> Result<String> {
    let output = runner
        .run(MediaTool::Ffmpeg, &["-version".to_string()])
        .await?;
    let first_line = output.stdout.lines().next().unwrap_or("").to_string();
    match parse_version(&first_line) {
        Some(version) => info!("FFmpeg version: {}", version),
        None => debug!("Could not parse ffmpeg version from '{}'", first_line),
    }
    Ok(first_line)
}

/// Получение длительности медиафайла через ffprobe
pub async fn probe_duration(runner: &dyn MediaToolRunner, path: &Path) -> Result<f64> {
    if !path.exists() {
        return Err(ReelSyncError::FileNotFound(path.display().to_string()));
    }

    let args = vec![
        "-v".to_string(),
        "error".to_string(),
        "-show_entries".to_string(),
        "format=duration".to_string(),
        "-of".to_string(),
        "default=noprint_wrappers=1:nokey=1".to_string(),
        path.to_string_lossy().to_string(),
    ];
    let output = runner.run(MediaTool::Ffprobe, &args).await?;
    let duration_str = output.stdout.trim();
    duration_str.parse::<f64>().map_err(|_| {
        ReelSyncError::Other(format!(
            "Failed to parse media duration for {}: '{}'",
            path.display(),
            duration_str
        ))
    })
}

/// Проверка, доступен ли ffmpeg по указанному пути
pub async fn is_available(runner: &dyn MediaToolRunner) -> bool {
    check_ffmpeg_installed(runner).await.is_ok()
}

#[cfg(test)]
pub(crate) mod testing {
    //! Поддельный запускальщик для тестов

    use super::*;
    use parking_lot::Mutex;

    /// Что делать поддельному ffmpeg при вызове
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FakeBehavior {
        /// Записать выходной файл (последний аргумент) и завершиться успешно
        Succeed,
        /// Записать часть выходного файла и упасть
        FailAfterWriting,
    }

    pub struct FakeToolRunner {
        pub behavior: FakeBehavior,
        pub probe_stdout: String,
        pub calls: Mutex<Vec<(MediaTool, Vec<String>)>>,
    }

    impl FakeToolRunner {
        pub fn new(behavior: FakeBehavior) -> Self {
            Self {
                behavior,
                probe_stdout: "10.000000\n".to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<(MediaTool, Vec<String>)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl MediaToolRunner for FakeToolRunner {
        async fn run(&self, tool: MediaTool, args: &[String]) -> Result<ToolOutput> {
            self.calls.lock().push((tool, args.to_vec()));
            if tool == MediaTool::Ffprobe {
                return Ok(ToolOutput {
                    stdout: self.probe_stdout.clone(),
                    stderr: String::new(),
                });
            }
            if args.first().map(String::as_str) == Some("-version") {
                return Ok(ToolOutput {
                    stdout: "ffmpeg version 6.1.1 Copyright (c) 2000-2023\n".to_string(),
                    stderr: String::new(),
                });
            }

            if let Some(output) = args.last() {
                std::fs::write(output, b"fake audio")?;
            }
            match self.behavior {
                FakeBehavior::Succeed => Ok(ToolOutput::default()),
                FakeBehavior::FailAfterWriting => Err(ReelSyncError::ToolFailed {
                    tool: tool.as_str().to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "Invalid data found when processing input".to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FakeBehavior, FakeToolRunner};
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(
            parse_version("ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023"),
            Some("6.1.1".to_string())
        );
        assert_eq!(
            parse_version("ffmpeg version n7.0 Copyright"),
            Some("7.0".to_string())
        );
        assert_eq!(parse_version("ffmpeg version git-2024-01-01"), None);
    }

    #[tokio::test]
    async fn test_check_ffmpeg_installed_with_fake() {
        let runner = FakeToolRunner::new(FakeBehavior::Succeed);
        let line = check_ffmpeg_installed(&runner).await.unwrap();
        assert!(line.starts_with("ffmpeg version 6.1.1"));
        assert!(is_available(&runner).await);
    }

    #[tokio::test]
    async fn test_probe_duration() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("voice.mp3");
        std::fs::write(&audio, b"id3").unwrap();

        let runner = FakeToolRunner::new(FakeBehavior::Succeed);
        let duration = probe_duration(&runner, &audio).await.unwrap();
        assert_eq!(duration, 10.0);

        let calls = runner.calls();
        assert_eq!(calls[0].0, MediaTool::Ffprobe);
        assert_eq!(calls[0].1.last().unwrap(), &audio.to_string_lossy().to_string());
    }

    #[tokio::test]
    async fn test_probe_duration_missing_file() {
        let runner = FakeToolRunner::new(FakeBehavior::Succeed);
        let err = probe_duration(&runner, Path::new("/nonexistent/a.mp3"))
            .await
            .unwrap_err();
        assert!(err.is_input_error());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_binary_is_processing_failure() {
        let runner = SystemToolRunner::new(
            PathBuf::from("/nonexistent/ffmpeg-binary"),
            PathBuf::from("/nonexistent/ffprobe-binary"),
            Duration::from_secs(5),
        );
        let err = runner
            .run(MediaTool::Ffmpeg, &["-version".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ReelSyncError::ToolFailed { .. }));
        assert!(!is_available(&runner).await);
    }
}
