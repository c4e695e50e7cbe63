//! Камера из заранее заготовленных кадров: демо-бинарники и тесты без железа.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::Frame;
use crate::error::{ScanError, TorchError};
use crate::session::camera::{CameraBackend, CameraConstraints, CameraStream, DeviceInfo, FacingMode};

struct StillDevice {
    info: DeviceInfo,
    facing: FacingMode,
    frames: Arc<Vec<Frame>>,
}

/// Каждое устройство по кругу отдаёт свои кадры.
pub struct StillCamera {
    devices: Vec<StillDevice>,
    torch: bool,
    deny_permission: bool,
    hide_labels: bool,
    granted: AtomicBool,
    broken: Mutex<HashSet<String>>,
    open_tracks: Arc<AtomicUsize>,
    /// Устройства, на открытом треке которых горит фонарик.
    lit: Arc<Mutex<HashSet<String>>>,
    last_open: Mutex<Option<CameraConstraints>>,
}

impl Default for StillCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl StillCamera {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            torch: false,
            deny_permission: false,
            hide_labels: false,
            granted: AtomicBool::new(false),
            broken: Mutex::new(HashSet::new()),
            open_tracks: Arc::new(AtomicUsize::new(0)),
            lit: Arc::new(Mutex::new(HashSet::new())),
            last_open: Mutex::new(None),
        }
    }

    pub fn with_device(mut self, info: DeviceInfo, facing: FacingMode, frames: Vec<Frame>) -> Self {
        self.devices.push(StillDevice { info, facing, frames: Arc::new(frames) });
        self
    }

    pub fn with_torch(mut self, supported: bool) -> Self {
        self.torch = supported;
        self
    }

    pub fn deny_permission(mut self) -> Self {
        self.deny_permission = true;
        self
    }

    /// Метки устройств пустые, пока не вызван `grant_permission`.
    pub fn hide_labels_until_granted(mut self) -> Self {
        self.hide_labels = true;
        self
    }

    /// Дальнейшие попытки открыть устройство падают.
    pub fn break_device(&self, id: &str) {
        self.broken.lock().insert(id.to_string());
    }

    /// Сколько треков открыто и ещё не остановлено.
    pub fn open_tracks(&self) -> usize {
        self.open_tracks.load(Ordering::SeqCst)
    }

    /// С какими ограничениями была последняя попытка открыть камеру.
    pub fn last_constraints(&self) -> Option<CameraConstraints> {
        self.last_open.lock().clone()
    }

    pub fn torch_lit(&self, id: &str) -> bool {
        self.lit.lock().contains(id)
    }

    fn pick(&self, c: &CameraConstraints) -> Result<&StillDevice, ScanError> {
        if self.devices.is_empty() {
            return Err(ScanError::CameraUnavailable("нет видеовходов".into()));
        }
        match &c.device_id {
            Some(id) => self
                .devices
                .iter()
                .find(|d| d.info.id == *id)
                .ok_or_else(|| ScanError::CameraUnavailable(format!("устройство {id} не найдено"))),
            None => Ok(self
                .devices
                .iter()
                .find(|d| d.facing == c.facing_mode)
                .unwrap_or(&self.devices[0])),
        }
    }
}

#[async_trait]
impl CameraBackend for StillCamera {
    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, ScanError> {
        let hide = self.hide_labels && !self.granted.load(Ordering::SeqCst);
        Ok(self
            .devices
            .iter()
            .map(|d| DeviceInfo::new(d.info.id.clone(), if hide { String::new() } else { d.info.label.clone() }))
            .collect())
    }

    async fn grant_permission(&self) -> Result<(), ScanError> {
        if self.deny_permission {
            return Err(ScanError::PermissionDenied);
        }
        self.granted.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn open(&self, constraints: &CameraConstraints) -> Result<Box<dyn CameraStream>, ScanError> {
        *self.last_open.lock() = Some(constraints.clone());
        if self.deny_permission {
            return Err(ScanError::PermissionDenied);
        }
        let dev = self.pick(constraints)?;
        if self.broken.lock().contains(&dev.info.id) {
            return Err(ScanError::CameraUnavailable(format!("устройство {} занято", dev.info.id)));
        }
        self.granted.store(true, Ordering::SeqCst);
        self.open_tracks.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StillStream {
            device_id: dev.info.id.clone(),
            frames: Arc::clone(&dev.frames),
            next: 0,
            torch: self.torch,
            lit: Arc::clone(&self.lit),
            open_tracks: Some(Arc::clone(&self.open_tracks)),
        }))
    }
}

struct StillStream {
    device_id: String,
    frames: Arc<Vec<Frame>>,
    next: usize,
    torch: bool,
    lit: Arc<Mutex<HashSet<String>>>,
    /// `None` после `stop()`.
    open_tracks: Option<Arc<AtomicUsize>>,
}

impl CameraStream for StillStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn grab_frame(&mut self) -> Option<Frame> {
        if self.open_tracks.is_none() || self.frames.is_empty() {
            return None;
        }
        let frame = self.frames[self.next % self.frames.len()].clone();
        self.next = self.next.wrapping_add(1);
        Some(frame)
    }

    fn torch_supported(&self) -> bool {
        self.torch && self.open_tracks.is_some()
    }

    fn set_torch(&mut self, on: bool) -> Result<(), TorchError> {
        if !self.torch_supported() {
            return Err(TorchError::Unsupported);
        }
        let mut lit = self.lit.lock();
        if on {
            lit.insert(self.device_id.clone());
        } else {
            lit.remove(&self.device_id);
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(tracks) = self.open_tracks.take() {
            tracks.fetch_sub(1, Ordering::SeqCst);
            self.lit.lock().remove(&self.device_id);
        }
    }
}

impl Drop for StillStream {
    fn drop(&mut self) {
        self.stop();
    }
}
