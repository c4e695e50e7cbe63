//! Настройки сканера из TOML.
//!
//! Все таблицы и поля необязательны; отсутствующее берётся из `Default`.
//!
//! ```toml
//! [stabilizer]
//! window_ms = 1600
//! min_stable_ms = 300
//!
//! [decoder]
//! strategy = "software"
//! scan_rows = 21
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::session::camera::FacingMode;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub stabilizer: StabilizerConfig,
    pub decoder: DecoderConfig,
    pub session: SessionConfig,
    pub camera: CameraConfig,
}

/// Пороги стабилизатора. Числа подобраны эмпирически, поэтому вынесены сюда.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Скользящее окно попаданий.
    pub window_ms: u64,
    /// Меньше попаданий - не принимаем никогда.
    pub min_hits: usize,
    pub fast_hit_margin: usize,
    pub fast_confidence_margin: f32,
    pub fast_min_stable_ms: u64,
    pub stable_hit_margin: usize,
    pub stable_confidence_margin: f32,
    /// Сколько лидер должен удерживать узкий отрыв.
    pub min_stable_ms: u64,
    /// Уверенность детекции, если движок её не сообщил.
    pub default_confidence: f32,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            window_ms: 1600,
            min_hits: 2,
            fast_hit_margin: 4,
            fast_confidence_margin: 0.15,
            fast_min_stable_ms: 0,
            stable_hit_margin: 2,
            stable_confidence_margin: 0.05,
            min_stable_ms: 300,
            default_confidence: 1.0,
        }
    }
}

impl StabilizerConfig {
    #[inline]
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyPreference {
    /// Нативный детектор, если камера его даёт, иначе программный.
    #[default]
    Auto,
    Native,
    Software,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub strategy: StrategyPreference,
    pub native_interval_ms: u64,
    pub software_interval_ms: u64,
    /// Строк на кадр для программного декодера.
    pub scan_rows: usize,
    pub ean: bool,
    pub code128: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyPreference::Auto,
            native_interval_ms: 16,
            software_interval_ms: 250,
            scan_rows: 15,
            ean: true,
            code128: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Повтор того же кода внутри окна не выдаётся.
    pub dedupe_window_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { dedupe_window_ms: 1600 }
    }
}

impl SessionConfig {
    #[inline]
    pub fn dedupe_window(&self) -> Duration {
        Duration::from_millis(self.dedupe_window_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            ideal_width: 1280,
            ideal_height: 720,
        }
    }
}

impl ScannerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = ScannerConfig::from_toml_str("").expect("empty toml");
        assert_eq!(cfg, ScannerConfig::default());
        assert_eq!(cfg.stabilizer.window(), Duration::from_millis(1600));
        assert_eq!(cfg.session.dedupe_window(), Duration::from_millis(1600));
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let cfg = ScannerConfig::from_toml_str(
            r#"
            [stabilizer]
            min_stable_ms = 500

            [decoder]
            strategy = "software"

            [camera]
            facing_mode = "user"
            "#,
        )
        .expect("valid toml");
        assert_eq!(cfg.stabilizer.min_stable_ms, 500);
        assert_eq!(cfg.stabilizer.fast_hit_margin, 4);
        assert_eq!(cfg.decoder.strategy, StrategyPreference::Software);
        assert_eq!(cfg.decoder.scan_rows, 15);
        assert_eq!(cfg.camera.facing_mode, FacingMode::User);
    }

    #[test]
    fn bad_values_are_parse_errors() {
        let err = ScannerConfig::from_toml_str("[decoder]\nstrategy = \"laser\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
