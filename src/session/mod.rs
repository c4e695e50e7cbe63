//! Сессия сканера: камера → стратегия → стабилизатор → выдача кода.
//!
//! Захват идёт в отдельной задаче tokio с интервалом стратегии. Стабилизатор
//! живёт внутри задачи, детекции обрабатываются строго по порядку. `stop()`
//! дожидается завершения задачи и только потом освобождает трек камеры.

pub mod camera;
pub mod emission;
pub mod still;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::config::ScannerConfig;
use crate::decoder::{select_strategy, FrameDecoder, StrategyKind};
use crate::error::ScanError;
use crate::region::Region;
use crate::stabilizer::{Stabilizer, Verdict};

pub use camera::{
    CameraBackend, CameraConstraints, CameraStream, DeviceCache, DeviceInfo, FacingMode, FileDeviceCache,
    MemoryDeviceCache, StartOptions,
};
pub use emission::{CodeCallback, CodeSink, EmissionRecord, Emitter, ScanEvent};
pub use still::StillCamera;

type SharedStream = Arc<Mutex<Box<dyn CameraStream>>>;

/// Итог `switch_device`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched,
    /// Новая камера не открылась, работаем на прежней.
    FellBack { error: ScanError },
}

struct Running {
    device_id: String,
    strategy: StrategyKind,
    region: Region,
    /// С чем запускались; переживает `switch_device`.
    options: StartOptions,
    torch_on: bool,
    stream: SharedStream,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

pub struct ScannerSession {
    backend: Arc<dyn CameraBackend>,
    config: ScannerConfig,
    cache: Option<Arc<dyn DeviceCache>>,
    emitter: Arc<Mutex<Emitter>>,
    sink: CodeSink,
    running: Option<Running>,
}

impl ScannerSession {
    pub fn new(backend: Arc<dyn CameraBackend>, config: ScannerConfig) -> Self {
        let sink = CodeSink::default();
        let emitter = Emitter::with_sink(config.session.dedupe_window(), sink.clone());
        Self {
            backend,
            config,
            cache: None,
            emitter: Arc::new(Mutex::new(emitter)),
            sink,
            running: None,
        }
    }

    pub fn with_device_cache(mut self, cache: Arc<dyn DeviceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Единственный потребитель кодов; повторная регистрация заменяет прежнего.
    /// Пока потребителя нет, принятые коды не выдаются и не попадают в
    /// окно дедупликации. Регистрировать можно и изнутри колбэка (через
    /// [`ScannerSession::code_sink`]).
    pub fn on_code<F>(&self, callback: F)
    where
        F: FnMut(&ScanEvent) + Send + 'static,
    {
        self.sink.set(Box::new(callback));
    }

    /// Слот потребителя; клон можно унести в колбэк.
    pub fn code_sink(&self) -> CodeSink {
        self.sink.clone()
    }

    pub fn is_active(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.task.is_finished())
    }

    pub fn active_device(&self) -> Option<&str> {
        self.running.as_ref().map(|r| r.device_id.as_str())
    }

    pub fn strategy(&self) -> Option<StrategyKind> {
        self.running.as_ref().map(|r| r.strategy)
    }

    /// ROI, с которой работает текущая стратегия.
    pub fn region(&self) -> Option<Region> {
        self.running.as_ref().map(|r| r.region)
    }

    /// Включён ли фонарик на активной камере.
    pub fn torch_on(&self) -> bool {
        self.running.as_ref().is_some_and(|r| r.torch_on)
    }

    /// Запуск (или перезапуск). Выбор камеры: явный id, затем
    /// запомненный (если он ещё в списке), затем по направлению.
    pub async fn start(&mut self, options: StartOptions) -> Result<(), ScanError> {
        self.stop().await;

        if options.device_id.is_none() {
            if let Some(cached) = self.cached_device().await {
                let with_cached = StartOptions { device_id: Some(cached.clone()), ..options.clone() };
                match self.launch(with_cached, false).await {
                    Ok(()) => return Ok(()),
                    Err(err) => warn!(device_id = %cached, error = %err, "cached_device_unusable"),
                }
            }
        }
        self.launch(options, false).await
    }

    /// Остановить захват. Повторный вызов и вызов до `start()` безопасны.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        let _ = running.shutdown.send(true);
        if let Err(err) = running.task.await {
            warn!(error = %err, "capture_task_join_failed");
        }
        running.stream.lock().stop();
        info!(device_id = %running.device_id, "scanner_stopped");
    }

    /// Перезапуск на другой камере с прежними ROI, направлением и фонариком.
    pub async fn switch_device(&mut self, device_id: &str) -> Result<SwitchOutcome, ScanError> {
        let Some(running) = self.running.as_ref() else {
            return Err(ScanError::NotStarted);
        };
        let previous = running.device_id.clone();
        let torch = running.torch_on;
        let options = running.options.clone();
        self.stop().await;

        let target = StartOptions { device_id: Some(device_id.to_string()), ..options.clone() };
        match self.launch(target, torch).await {
            Ok(()) => {
                info!(from = %previous, to = %device_id, "device_switched");
                Ok(SwitchOutcome::Switched)
            }
            Err(err) => {
                let error = ScanError::DeviceSwitchFailure {
                    device: device_id.to_string(),
                    reason: err.to_string(),
                };
                warn!(error = %error, fallback = %previous, "device_switch_failed");
                let back = StartOptions { device_id: Some(previous), ..options };
                self.launch(back, torch).await?;
                Ok(SwitchOutcome::FellBack { error })
            }
        }
    }

    /// Видеовходы. Если меток нет, один раз просим разрешение и перечисляем снова.
    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>, ScanError> {
        let devices = self.backend.list_devices().await?;
        if devices.is_empty() || devices.iter().any(|d| !d.label.is_empty()) {
            return Ok(devices);
        }
        self.backend.grant_permission().await?;
        self.backend.list_devices().await
    }

    /// Никогда не ошибается: без активной камеры просто `false`.
    pub fn supports_torch(&self) -> bool {
        self.running.as_ref().is_some_and(|r| r.stream.lock().torch_supported())
    }

    /// `true`, только если фонарик действительно переключился.
    pub fn set_torch(&mut self, on: bool) -> bool {
        let Some(running) = self.running.as_mut() else {
            return false;
        };
        let result = running.stream.lock().set_torch(on);
        match result {
            Ok(()) => {
                running.torch_on = on;
                true
            }
            Err(err) => {
                warn!(device_id = %running.device_id, error = %err, "torch_toggle_failed");
                false
            }
        }
    }

    async fn cached_device(&self) -> Option<String> {
        let id = self.cache.as_ref()?.load()?;
        match self.backend.list_devices().await {
            Ok(devices) if devices.iter().any(|d| d.id == id) => Some(id),
            Ok(_) => {
                debug!(device_id = %id, "cached_device_gone");
                None
            }
            Err(err) => {
                debug!(error = %err, "device_list_failed");
                None
            }
        }
    }

    async fn launch(&mut self, options: StartOptions, torch: bool) -> Result<(), ScanError> {
        let cam = &self.config.camera;
        let constraints = CameraConstraints {
            device_id: options.device_id.clone(),
            facing_mode: options.facing_mode.unwrap_or(cam.facing_mode),
            ideal_width: cam.ideal_width,
            ideal_height: cam.ideal_height,
        };
        let mut stream = self.backend.open(&constraints).await?;
        let device_id = stream.device_id().to_string();

        let torch_on = torch && stream.torch_supported() && stream.set_torch(true).is_ok();
        if torch && !torch_on {
            warn!(device_id = %device_id, "torch_not_restored");
        }
        if let Some(cache) = &self.cache {
            cache.store(&device_id);
        }

        let region = options.region.unwrap_or_default();
        let decoder = select_strategy(self.backend.native_detector(), &self.config.decoder, region);
        let strategy = decoder.kind();
        let stream: SharedStream = Arc::new(Mutex::new(stream));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(capture_loop(
            Arc::clone(&stream),
            decoder,
            Stabilizer::new(&self.config.stabilizer),
            Arc::clone(&self.emitter),
            shutdown_rx,
        ));

        info!(device_id = %device_id, strategy = %strategy, "scanner_started");
        self.running = Some(Running {
            device_id,
            strategy,
            region,
            options,
            torch_on,
            stream,
            shutdown,
            task,
        });
        Ok(())
    }
}

impl Drop for ScannerSession {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown.send(true);
            running.task.abort();
            running.stream.lock().stop();
        }
    }
}

async fn capture_loop(
    stream: SharedStream,
    mut decoder: Box<dyn FrameDecoder>,
    mut stabilizer: Stabilizer,
    emitter: Arc<Mutex<Emitter>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(decoder.cadence().max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        let frame = stream.lock().grab_frame();
        let Some(frame) = frame else {
            trace!("frame_not_ready");
            continue;
        };
        let now = time::Instant::now().into_std();
        for det in decoder.decode(&frame, now) {
            if let Verdict::Accepted(code) = stabilizer.push(det) {
                let event = ScanEvent::from(code);
                let emitted = emitter.lock().offer(&event, now);
                if emitted {
                    info!(code = %event.code, symbology = %event.symbology, "code_emitted");
                }
            }
        }
    }
    debug!("capture_loop_stopped");
}
