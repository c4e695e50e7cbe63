//! Абстракция камеры: перечисление устройств, захват потока, фонарик.

use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::Frame;
use crate::decoder::NativeDetector;
use crate::error::{ScanError, TorchError};
use crate::region::Region;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    /// Пустая метка = разрешение ещё не выдано.
    pub label: String,
}

impl DeviceInfo {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into() }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Тыловая камера.
    #[default]
    Environment,
    User,
}

/// Параметры `start()`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StartOptions {
    pub device_id: Option<String>,
    pub facing_mode: Option<FacingMode>,
    pub region: Option<Region>,
}

/// Что просим у камеры при открытии. `device_id` - точное совпадение,
/// `facing_mode` - пожелание.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraConstraints {
    pub device_id: Option<String>,
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

#[async_trait]
pub trait CameraBackend: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, ScanError>;

    /// Разовый запрос разрешения (после него метки устройств заполнены).
    async fn grant_permission(&self) -> Result<(), ScanError>;

    async fn open(&self, constraints: &CameraConstraints) -> Result<Box<dyn CameraStream>, ScanError>;

    /// Нативный детектор, если платформа его предоставляет.
    fn native_detector(&self) -> Option<Box<dyn NativeDetector>> {
        None
    }
}

/// Открытый видеопоток одной камеры.
pub trait CameraStream: Send {
    fn device_id(&self) -> &str;

    /// Текущий кадр; `None`, пока видео не готово.
    fn grab_frame(&mut self) -> Option<Frame>;

    fn torch_supported(&self) -> bool {
        false
    }

    fn set_torch(&mut self, _on: bool) -> Result<(), TorchError> {
        Err(TorchError::Unsupported)
    }

    /// Освободить трек. Повторный вызов ничего не делает.
    fn stop(&mut self);
}

/// Запоминает последнюю выбранную камеру. Значение - только подсказка.
pub trait DeviceCache: Send + Sync {
    fn load(&self) -> Option<String>;
    fn store(&self, device_id: &str);
}

#[derive(Debug, Default)]
pub struct MemoryDeviceCache(Mutex<Option<String>>);

impl DeviceCache for MemoryDeviceCache {
    fn load(&self) -> Option<String> {
        self.0.lock().clone()
    }

    fn store(&self, device_id: &str) {
        *self.0.lock() = Some(device_id.to_string());
    }
}

/// Кэш в файле: одна строка с id камеры.
#[derive(Debug, Clone)]
pub struct FileDeviceCache {
    path: PathBuf,
}

impl FileDeviceCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DeviceCache for FileDeviceCache {
    fn load(&self) -> Option<String> {
        let id = fs::read_to_string(&self.path).ok()?;
        let id = id.trim();
        (!id.is_empty()).then(|| id.to_string())
    }

    fn store(&self, device_id: &str) {
        if let Err(err) = fs::write(&self.path, device_id) {
            tracing::warn!(path = %self.path.display(), error = %err, "device_cache_write_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_cache_keeps_last_value() {
        let cache = MemoryDeviceCache::default();
        assert_eq!(cache.load(), None);
        cache.store("cam-1");
        cache.store("cam-2");
        assert_eq!(cache.load().as_deref(), Some("cam-2"));
    }

    #[test]
    fn file_cache_round_trips_and_ignores_blank() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FileDeviceCache::new(dir.path().join("camera"));
        assert_eq!(cache.load(), None);
        cache.store("back-wide");
        assert_eq!(cache.load().as_deref(), Some("back-wide"));
        cache.store("  ");
        assert_eq!(cache.load(), None);
    }
}
