//! Основной файл библиотеки reel-sync
//!
//! Библиотека готовит ассеты для видеокомпозитора: нормализованные кадры,
//! таймлайн для concat демультиплексора, караоке-субтитры ASS и итоговую
//! аудиодорожку. Все тайминги выводятся из одного пословного выравнивания речи.

pub mod alignment;
pub mod config;
pub mod error;
pub mod media;
pub mod notification;
pub mod progress;
pub mod project;
pub mod subtitle;
pub mod sync;
pub mod utils;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::alignment::{reduce_to_words, WordAlignment};
use crate::config::OutputConfig;
use crate::media::audio::{default_mix_name, default_trim_name, is_supported_audio_file};
use crate::progress::{PipelineStage, ProgressObserver, ProgressReporter, ProgressTracker};
use crate::utils::ffmpeg::check_ffmpeg_installed;

pub use crate::alignment::CharacterAlignment;
pub use crate::config::ReelSyncConfig;
pub use crate::error::{ErrorKind, ReelSyncError, Result};
pub use crate::media::{AudioAssembler, AudioTrackSpec, ImageNormalizer};
pub use crate::project::{AudioSource, VideoProject};
pub use crate::utils::{MediaTool, MediaToolRunner, SystemToolRunner, ToolOutput};

/// Имя файла с описанием артефактов задачи
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Артефакты, подготовленные для видеокомпозитора
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifacts {
    pub job_id: String,
    pub job_dir: PathBuf,
    /// Нормализованные кадры в порядке показа
    pub images: Vec<PathBuf>,
    /// Таймлайн `inputs.txt`
    pub timeline: PathBuf,
    /// Субтитры `subs.ass`
    pub subtitles: PathBuf,
    /// Итоговая аудиодорожка, если в проекте есть аудио
    pub audio: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub duration: f64,
    pub word_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Основная структура для работы с библиотекой
pub struct ReelSync {
    config: ReelSyncConfig,
    runner: Arc<dyn MediaToolRunner>,
    progress_tracker: Option<ProgressTracker>,
}

impl ReelSync {
    /// Создать экземпляр с системными ffmpeg/ffprobe
    pub fn new(config: ReelSyncConfig) -> Self {
        let runner = Arc::new(SystemToolRunner::from_config(&config));
        Self::with_runner(config, runner)
    }

    /// Создать экземпляр с заданным запуском медиаинструментов
    pub fn with_runner(config: ReelSyncConfig, runner: Arc<dyn MediaToolRunner>) -> Self {
        Self {
            config,
            runner,
            progress_tracker: None,
        }
    }

    /// Установить репортер прогресса
    pub fn set_progress_reporter(&mut self, reporter: Box<dyn ProgressReporter>) {
        match &mut self.progress_tracker {
            Some(tracker) => tracker.set_reporter(reporter),
            None => self.progress_tracker = Some(ProgressTracker::with_reporter(reporter)),
        }
    }

    /// Добавить наблюдателя прогресса
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> Option<usize> {
        if self.progress_tracker.is_none() {
            self.set_progress_reporter(Box::new(progress::DefaultProgressReporter::new()));
        }
        self.progress_tracker
            .as_mut()
            .and_then(|tracker| tracker.add_observer(observer))
    }

    pub fn config(&self) -> &ReelSyncConfig {
        &self.config
    }

    fn started(&self, stage: PipelineStage) {
        if let Some(tracker) = &self.progress_tracker {
            tracker.mark_started(stage);
        }
    }

    fn completed(&self, stage: PipelineStage, details: String) {
        if let Some(tracker) = &self.progress_tracker {
            tracker.mark_completed(stage, Some(details));
        }
    }

    /// Подготовить все ассеты проекта.
    ///
    /// Относительные пути медиафайлов разрешаются от `base_dir`. Результаты
    /// складываются в `<output_root>/<job id>/`; при ошибке директория задачи
    /// удаляется, если включен `cleanup_on_failure`.
    pub async fn process(
        &self,
        project: &VideoProject,
        alignment: &CharacterAlignment,
        base_dir: &Path,
    ) -> Result<PipelineArtifacts> {
        self.config.validate()?;
        project.validate()?;

        let job_id = Uuid::new_v4().to_string();
        // concat демультиплексор разрешает относительные пути от директории таймлайна
        let job_dir = std::path::absolute(self.config.output_root.join(&job_id))?;
        tokio::fs::create_dir_all(&job_dir).await?;
        info!("Starting job {} for project '{}'", job_id, project.name);

        if let Some(tracker) = &self.progress_tracker {
            tracker.reset();
        }

        match self
            .run_job(project, alignment, base_dir, &job_id, &job_dir)
            .await
        {
            Ok(artifacts) => {
                info!("Job {} completed: {}", job_id, job_dir.display());
                Ok(artifacts)
            }
            Err(e) => {
                error!("Job {} failed: {}", job_id, e);
                if self.config.cleanup_on_failure {
                    if let Err(cleanup_err) = tokio::fs::remove_dir_all(&job_dir).await {
                        warn!(
                            "Failed to remove job directory {}: {}",
                            job_dir.display(),
                            cleanup_err
                        );
                    }
                }
                Err(e)
            }
        }
    }

    async fn run_job(
        &self,
        project: &VideoProject,
        alignment: &CharacterAlignment,
        base_dir: &Path,
        job_id: &str,
        job_dir: &Path,
    ) -> Result<PipelineArtifacts> {
        let (width, height) = project.resolve_dimensions()?;
        let tracks = project.audio_tracks(base_dir);
        if !tracks.is_empty() {
            check_ffmpeg_installed(self.runner.as_ref()).await?;
        }

        self.started(PipelineStage::AlignmentReduction);
        let words = reduce_to_words(alignment)?;
        self.completed(
            PipelineStage::AlignmentReduction,
            format!("{} words", words.len()),
        );

        let output = OutputConfig {
            width,
            height,
            background: project.background_rgb()?,
            ..self.config.output.clone()
        };

        let visuals =
            self.build_visuals(project.image_paths(base_dir), output, &words, project, job_dir);
        let subtitles = self.build_subtitles(&words, (width, height), job_dir);
        let audio = self.build_audio(tracks, project.duration, job_dir);
        // ветки доводятся до конца: кадры пишутся в блокирующей задаче, которую нельзя отменить
        let (visuals, subtitles, audio) = tokio::join!(visuals, subtitles, audio);
        let (images, timeline) = visuals?;
        let subtitles = subtitles?;
        let audio = audio?;

        let artifacts = PipelineArtifacts {
            job_id: job_id.to_string(),
            job_dir: job_dir.to_path_buf(),
            images,
            timeline,
            subtitles,
            audio,
            width,
            height,
            duration: project.duration,
            word_count: words.len(),
            created_at: Utc::now(),
        };

        let manifest = serde_json::to_string_pretty(&artifacts)?;
        tokio::fs::write(job_dir.join(MANIFEST_FILE_NAME), manifest).await?;
        Ok(artifacts)
    }

    /// Нормализация кадров и таймлайн по ним
    async fn build_visuals(
        &self,
        sources: Vec<PathBuf>,
        output: OutputConfig,
        words: &WordAlignment,
        project: &VideoProject,
        job_dir: &Path,
    ) -> Result<(Vec<PathBuf>, PathBuf)> {
        self.started(PipelineStage::ImageNormalization);
        let normalizer = ImageNormalizer::new(output);
        let dir = job_dir.to_path_buf();
        let images = tokio::task::spawn_blocking(move || normalizer.normalize(&sources, &dir))
            .await
            .map_err(|e| ReelSyncError::Other(format!("Image normalization task failed: {}", e)))??;
        self.completed(
            PipelineStage::ImageNormalization,
            format!("{} images", images.len()),
        );

        self.started(PipelineStage::TimelineGeneration);
        let timeline = sync::generate_timeline(
            &images,
            words,
            &project.marker_words,
            job_dir,
            &self.config.timeline,
        )
        .await?;
        self.completed(PipelineStage::TimelineGeneration, timeline.display().to_string());

        Ok((images, timeline))
    }

    async fn build_subtitles(
        &self,
        words: &WordAlignment,
        play_res: (u32, u32),
        job_dir: &Path,
    ) -> Result<PathBuf> {
        self.started(PipelineStage::SubtitleGeneration);
        let path =
            subtitle::generate_subtitles(words, job_dir, &self.config.subtitle_style, play_res)
                .await?;
        self.completed(PipelineStage::SubtitleGeneration, path.display().to_string());
        Ok(path)
    }

    /// Одна дорожка без смещения и с исходной громкостью только обрезается,
    /// в остальных случаях дорожки сводятся
    async fn build_audio(
        &self,
        tracks: Vec<AudioTrackSpec>,
        duration: f64,
        job_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        self.started(PipelineStage::AudioAssembly);
        if tracks.is_empty() {
            info!("Project has no audio tracks");
            self.completed(PipelineStage::AudioAssembly, "no audio".to_string());
            return Ok(None);
        }

        if let Some(track) = tracks
            .iter()
            .find(|t| t.source.exists() && !is_supported_audio_file(&t.source))
        {
            return Err(ReelSyncError::InvalidInput(format!(
                "Unsupported audio format: {}",
                track.source.display()
            )));
        }

        let assembler = AudioAssembler::new(self.runner.clone(), self.config.audio.clone());
        let path = match tracks.as_slice() {
            [single] if single.offset_seconds == 0.0 && single.volume == 1.0 => {
                let output = job_dir.join(default_trim_name(&single.source, duration));
                assembler.trim(&single.source, duration, &output).await?
            }
            _ => {
                let output = job_dir.join(default_mix_name(duration));
                assembler.mix(&tracks, duration, &output).await?
            }
        };
        self.completed(PipelineStage::AudioAssembly, path.display().to_string());
        Ok(Some(path))
    }
}

impl Default for ReelSync {
    fn default() -> Self {
        Self::new(ReelSyncConfig::default())
    }
}

/// Загрузить посимвольное выравнивание из JSON файла
pub fn load_alignment(path: &Path) -> Result<CharacterAlignment> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ReelSyncError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&content)?)
}

/// Публичный API для удобного использования: проект и выравнивание из JSON файлов,
/// медиафайлы разрешаются относительно директории проекта
pub async fn prepare_assets(
    project_path: &Path,
    alignment_path: &Path,
    config: ReelSyncConfig,
) -> Result<PipelineArtifacts> {
    let project = VideoProject::from_file(project_path)?;
    let alignment = load_alignment(alignment_path)?;
    let base_dir = project_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    ReelSync::new(config)
        .process(&project, &alignment, &base_dir)
        .await
}
