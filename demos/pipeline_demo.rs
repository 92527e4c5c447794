//! Пример подготовки ассетов проекта
//!
//! Запуск:
//! `cargo run --example pipeline_demo -- project.json alignment.json [config.json]`
//!
//! Пути к изображениям и аудио в проекте разрешаются относительно файла проекта.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use reel_sync::notification::LogProgressObserver;
use reel_sync::project::VideoProject;
use reel_sync::{load_alignment, ReelSync, ReelSyncConfig};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        bail!("usage: pipeline_demo <project.json> <alignment.json> [config.json]");
    }
    let project_path = PathBuf::from(&args[0]);
    let alignment_path = PathBuf::from(&args[1]);

    let config = match args.get(2) {
        Some(path) => ReelSyncConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path))?,
        None => ReelSyncConfig::default(),
    }
    .with_env_overrides();

    let project = VideoProject::from_file(&project_path)
        .with_context(|| format!("failed to load project {}", project_path.display()))?;
    let alignment = load_alignment(&alignment_path)
        .with_context(|| format!("failed to load alignment {}", alignment_path.display()))?;
    let base_dir = project_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();

    let mut reel = ReelSync::new(config);
    reel.add_observer(Box::new(LogProgressObserver::with_prefix(format!(
        "{} ",
        project.name
    ))));

    let artifacts = reel
        .process(&project, &alignment, &base_dir)
        .await
        .context("asset preparation failed")?;

    println!("Job:       {}", artifacts.job_id);
    println!("Images:    {}", artifacts.images.len());
    println!("Timeline:  {}", artifacts.timeline.display());
    println!("Subtitles: {}", artifacts.subtitles.display());
    match &artifacts.audio {
        Some(audio) => println!("Audio:     {}", audio.display()),
        None => println!("Audio:     none"),
    }
    Ok(())
}
