//! Ошибки библиотеки.

use std::path::PathBuf;

use thiserror::Error;

/// Ошибки захвата камеры и управления сессией.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("камера недоступна: {0}")]
    CameraUnavailable(String),
    #[error("доступ к камере запрещён пользователем")]
    PermissionDenied,
    #[error("не удалось переключиться на камеру {device}: {reason}")]
    DeviceSwitchFailure { device: String, reason: String },
    #[error("сканер не запущен")]
    NotStarted,
}

/// Сбой одной попытки распознавания. Наружу не выходит.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ошибка распознавания кадра: {0}")]
pub struct DecodeFailure(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TorchError {
    #[error("камера не поддерживает фонарик")]
    Unsupported,
    #[error("фонарик не переключился: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("не удалось прочитать {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("некорректный TOML: {0}")]
    Parse(#[from] toml::de::Error),
}
