//! Распознать коды на готовых снимках (PGM/PNG/JPEG).
//!
//! cargo run --bin scan_pgm -- ./shelf.pgm --rows 25
//! cargo run --bin scan_pgm -- a.png b.png --region 0.1,0.2,0.8,0.6

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use barscan::checksum;
use barscan::decoder::{FrameDecoder, SoftwareStrategy};
use barscan::gtin;
use barscan::region::Region;
use barscan::ScannerConfig;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scan_pgm", version, about = "Распознать штрих-коды на снимках")]
struct Args {
    /// Файлы изображений
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Сколько строк сканировать
    #[arg(long)]
    rows: Option<usize>,

    /// ROI долями кадра: x,y,w,h (по умолчанию весь снимок)
    #[arg(long, value_parser = parse_region)]
    region: Option<Region>,

    /// TOML с настройками
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn parse_region(s: &str) -> Result<Region, String> {
    let v: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{p}: {e}")))
        .collect::<Result<_, _>>()?;
    match v.as_slice() {
        &[x, y, width, height] => Ok(Region { x, y, width, height }.clamped()),
        _ => Err("нужно четыре числа: x,y,w,h".to_string()),
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => ScannerConfig::load_from_path(path)
            .with_context(|| format!("настройки {}", path.display()))?,
        None => ScannerConfig::default(),
    };
    if let Some(rows) = args.rows {
        cfg.decoder.scan_rows = rows;
    }
    let mut strategy = SoftwareStrategy::new(&cfg.decoder, args.region.unwrap_or(Region::FULL));

    let mut found = 0usize;
    for path in &args.paths {
        let frame = image::open(path).with_context(|| format!("не удалось открыть {}", path.display()))?;
        let dets = strategy.decode(&frame, Instant::now());
        if dets.is_empty() {
            println!("{}: ничего не распознано", path.display());
            continue;
        }
        for det in dets {
            let valid = checksum::validate(det.symbology, &det.text);
            let norm = gtin::normalize(det.symbology, &det.text);
            let aliases: Vec<&str> = norm.aliases.iter().map(String::as_str).collect();
            println!(
                "{}: {} {}  primary={} aliases=[{}] confidence={:.2}{}",
                path.display(),
                det.symbology,
                det.text,
                norm.primary,
                aliases.join(", "),
                det.confidence.unwrap_or(1.0),
                if valid { "" } else { "  (контрольная сумма не сошлась)" },
            );
            found += 1;
        }
    }
    if found == 0 && args.paths.len() == 1 {
        bail!("коды не найдены");
    }
    Ok(())
}
