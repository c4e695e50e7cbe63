//! Синтетический кадр → полная сессия сканера на «камере» из снимков.
//!
//! cargo run --bin scan_synthetic -- --code 5901234123457 --duration-ms 2000
//! cargo run --bin scan_synthetic -- --kind code128 --code HELLO-128 --write out.png

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use barscan::one_d::code128::CodeSet;
use barscan::one_d::synth;
use barscan::session::{DeviceInfo, FacingMode, ScannerSession, StartOptions, StillCamera};
use barscan::ScannerConfig;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    /// EAN-13 (13 цифр) или UPC-A (12 цифр)
    Ean13,
    Ean8,
    Code128,
}

#[derive(Parser, Debug)]
#[command(name = "scan_synthetic", version, about = "Прогнать синтетический штрих-код через сессию")]
struct Args {
    #[arg(long, value_enum, default_value = "ean13")]
    kind: Kind,

    #[arg(long, default_value = "5901234123457")]
    code: String,

    /// Ширина модуля в пикселях
    #[arg(long, default_value_t = 2)]
    unit: usize,

    #[arg(long, default_value_t = 120)]
    height: u32,

    /// Сколько держать код перед «камерой»
    #[arg(long, default_value_t = 2000)]
    duration_ms: u64,

    /// Сохранить кадр (формат по расширению)
    #[arg(long)]
    write: Option<PathBuf>,

    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => ScannerConfig::load_from_path(path)
            .with_context(|| format!("настройки {}", path.display()))?,
        None => ScannerConfig::default(),
    };

    let row = match args.kind {
        Kind::Ean13 => synth::ean13_row(&args.code, args.unit),
        Kind::Ean8 => synth::ean8_row(&args.code, args.unit),
        Kind::Code128 => synth::code128_row(&args.code, CodeSet::B, args.unit),
    }
    .ok_or_else(|| anyhow!("нельзя закодировать {:?} как {:?}", args.code, args.kind))?;

    // поля по ширине кода, чтобы ROI по умолчанию не обрезал бары
    let frame = synth::frame_from_row(&row, args.height, row.len() as u32 / 2);
    if let Some(path) = &args.write {
        frame.save(path).with_context(|| format!("запись {}", path.display()))?;
        println!("кадр сохранён: {}", path.display());
    }

    let camera = StillCamera::new().with_device(
        DeviceInfo::new("synthetic", "Синтетическая камера"),
        FacingMode::Environment,
        vec![frame],
    );
    let mut session = ScannerSession::new(Arc::new(camera), cfg);
    session.on_code(|ev| {
        println!("{} {}  aliases=[{}]", ev.symbology, ev.code, ev.aliases.join(", "));
    });

    session.start(StartOptions::default()).await?;
    tokio::time::sleep(Duration::from_millis(args.duration_ms)).await;
    session.stop().await;
    Ok(())
}
