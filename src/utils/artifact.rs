//! Модуль для работы с выходными артефактами
//!
//! Гарантирует, что файл, созданный неудавшейся операцией, не останется на диске.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::Result;

/// Охранник выходных файлов операции.
///
/// Все зарегистрированные пути удаляются при уничтожении охранника, если
/// операция не была подтверждена вызовом `commit`.
pub struct ArtifactGuard {
    /// Список путей, созданных операцией
    files: Vec<PathBuf>,
    /// Операция завершилась успешно
    committed: bool,
}

impl ArtifactGuard {
    /// Создать пустой охранник
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            committed: false,
        }
    }

    /// Создать охранник для одного выходного файла
    pub fn for_file(path: impl Into<PathBuf>) -> Self {
        let mut guard = Self::new();
        guard.track(path);
        guard
    }

    /// Зарегистрировать путь
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.files.push(path.into());
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.files
    }

    /// Подтвердить успех: файлы остаются на диске
    pub fn commit(mut self) -> Vec<PathBuf> {
        self.committed = true;
        std::mem::take(&mut self.files)
    }

    /// Удалить все зарегистрированные файлы
    pub fn discard(&mut self) -> Result<()> {
        for file in self.files.drain(..) {
            remove_if_exists(&file)?;
        }
        Ok(())
    }
}

impl Default for ArtifactGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = self.discard() {
            warn!("Failed to remove partial artifact: {}", e);
        }
    }
}

/// Удалить файл, если он существует
pub fn remove_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
        debug!("Removed partial artifact {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncommitted_files_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.mp3");
        let b = dir.path().join("b.jpg");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();

        {
            let mut guard = ArtifactGuard::for_file(&a);
            guard.track(&b);
            guard.track(dir.path().join("never-written.jpg"));
        }

        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn test_committed_files_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.mp3");
        fs::write(&a, b"a").unwrap();

        let guard = ArtifactGuard::for_file(&a);
        let kept = guard.commit();

        assert_eq!(kept, vec![a.clone()]);
        assert!(a.exists());
    }
}
