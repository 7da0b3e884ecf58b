//!
//! CLI для просмотра аудио-датасетов wavedb.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use audio::save_wav;
use tracing::debug;
use wavedb::DatasetEngine;
use wavedb_core::{AudioDataset, DatasetOptions};

#[derive(Parser)]
#[command(name = "wavedb")]
#[command(author, version, about = "wavedb: random-access audio window datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Общие параметры открытия датасета.
#[derive(Args, Debug, Clone)]
struct DatasetArgs {
    /// Путь к LMDB-директории датасета или URL удалённого сервиса
    #[arg(long)]
    db: PathBuf,

    /// YAML с параметрами датасета и аугментаций
    #[arg(long)]
    config: Option<PathBuf>,

    /// Требуемое количество каналов (по умолчанию как в датасете)
    #[arg(long)]
    channels: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print dataset kind, length, channels and sample rates
    Info {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Печатать JSON вместо текста
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Fetch one window and write it to a 32-bit float WAV file
    Sample {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Индекс окна
        #[arg(long, default_value_t = 0)]
        index: usize,

        /// Выходной WAV-файл
        #[arg(long)]
        out: PathBuf,
    },

    /// Print the train/validation split sizes
    Split {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Доля валидационной части в процентах
        #[arg(long)]
        percent: usize,

        /// Максимальный размер валидационной части
        #[arg(long)]
        max_residual: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { dataset, json } => run_info(&dataset, json),
        Commands::Sample {
            dataset,
            index,
            out,
        } => run_sample(&dataset, index, &out),
        Commands::Split {
            dataset,
            percent,
            max_residual,
        } => run_split(&dataset, percent, max_residual),
    }
}

/// Собрать [`DatasetOptions`] из `--config` и `--channels`.
fn load_options(config: Option<&Path>, channels: Option<usize>) -> Result<DatasetOptions> {
    let mut options = match config {
        Some(path) => DatasetOptions::from_yaml_file(path)
            .with_context(|| format!("Не удалось прочитать конфигурацию: {}", path.display()))?,
        None => DatasetOptions::default(),
    };
    if channels.is_some() {
        options.channels = channels;
    }
    Ok(options)
}

fn open_engine(args: &DatasetArgs) -> Result<DatasetEngine> {
    let options = load_options(args.config.as_deref(), args.channels)?;
    debug!(?options, "opening dataset");
    let start = Instant::now();
    let engine = DatasetEngine::open(&args.db, &options)
        .with_context(|| format!("Не удалось открыть датасет: {}", args.db.display()))?;
    debug!("dataset opened in {:.2}s", start.elapsed().as_secs_f32());
    Ok(engine)
}

fn run_info(args: &DatasetArgs, json: bool) -> Result<()> {
    let engine = open_engine(args)?;
    let info = engine.info();

    if json {
        println!("{}", serde_json::to_string_pretty(info)?);
        return Ok(());
    }

    println!("Dataset: {}", args.db.display());
    println!("Kind: {}", info.kind);
    println!("Windows: {}", info.len);
    println!("Channels: {}", info.channels);
    println!(
        "Sample rate: {} Hz (dataset {} Hz)",
        info.sample_rate, info.dataset_sample_rate
    );
    println!("Window length: {} samples", info.n_signal);
    if info.stages.is_empty() {
        println!("Augmentations: -");
    } else {
        println!("Augmentations: {}", info.stages.join(" -> "));
    }
    Ok(())
}

fn run_sample(args: &DatasetArgs, index: usize, out: &Path) -> Result<()> {
    let engine = open_engine(args)?;
    if index >= engine.len() {
        anyhow::bail!(
            "Индекс {index} вне диапазона: в датасете {} окон",
            engine.len()
        );
    }

    let start = Instant::now();
    let window = engine
        .get(index)
        .with_context(|| format!("Не удалось получить окно {index}"))?;
    save_wav(out, &window).with_context(|| format!("Не удалось записать {}", out.display()))?;

    let (channels, samples) = window.shape();
    println!(
        "Window {index}: {channels} ch x {samples} samples, peak {:.4}, {:.2}s -> {}",
        window.peak(),
        start.elapsed().as_secs_f32(),
        out.display()
    );
    Ok(())
}

fn run_split(args: &DatasetArgs, percent: usize, max_residual: Option<usize>) -> Result<()> {
    let engine = open_engine(args)?;
    let (train, val) = engine.split(percent, max_residual);
    println!("train set: {} examples", train.len());
    println!("val set: {} examples", val.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_options_defaults() {
        let options = load_options(None, None).unwrap();
        assert_eq!(options, DatasetOptions::default());

        let options = load_options(None, Some(2)).unwrap();
        assert_eq!(options.channels, Some(2));
    }

    #[test]
    fn test_load_options_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.yaml");
        std::fs::write(
            &path,
            "channels: 1\naudio_key: audio\naugment:\n  sample_rate: 48000\n  n_signal: 65536\n  gain_db: 6\n",
        )
        .unwrap();

        let options = load_options(Some(&path), Some(2)).unwrap();
        assert_eq!(options.channels, Some(2));
        assert_eq!(options.audio_key, "audio");
        assert_eq!(options.augment.sample_rate, 48000);
        assert_eq!(options.augment.allpass_p, 0.8);
    }

    #[test]
    fn test_load_options_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "augment:\n  delay_p: 2.0\n").unwrap();
        assert!(load_options(Some(&path), None).is_err());
    }

    #[test]
    fn test_cli_parses_split() {
        let cli = Cli::try_parse_from([
            "wavedb", "split", "--db", "data/guitar", "--percent", "5", "--max-residual", "100",
        ])
        .unwrap();
        match cli.command {
            Commands::Split {
                dataset,
                percent,
                max_residual,
            } => {
                assert_eq!(dataset.db, PathBuf::from("data/guitar"));
                assert_eq!(percent, 5);
                assert_eq!(max_residual, Some(100));
            }
            _ => panic!("expected split"),
        }
    }
}
