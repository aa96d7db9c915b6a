use clap::Parser;
use ridgematch::{
    load_gray_image, save_binarized_png, Candidate, ExtractConfig, Extractor, MatchConfig,
    MatchResult, Matcher, Minutia, MinutiaSet,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract and match fingerprint minutiae from a JSON job file")]
struct Cli {
    /// Job file describing the captures and settings.
    #[arg(short, long, value_name = "FILE", default_value = "ridgematch.json")]
    config: PathBuf,
    /// Write the job file schema to stdout.
    #[arg(long)]
    print_schema: bool,
    /// Write a sample job file to stdout.
    #[arg(long)]
    print_example: bool,
    /// Log stage timings and counters to stderr (filter with RUST_LOG).
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Mode {
    #[default]
    Extract,
    Verify,
    Identify,
}

#[derive(Debug, Deserialize)]
struct CaptureConfig {
    path: String,
    #[serde(default = "default_ppi")]
    ppi: u32,
}

fn default_ppi() -> u32 {
    500
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    mode: Mode,
    probe: Option<CaptureConfig>,
    gallery: Vec<CaptureConfig>,
    threshold: Option<u32>,
    output_path: Option<String>,
    /// Where to write the probe's binarized image as PNG.
    binarized_path: Option<String>,
    extract: ExtractConfig,
    #[serde(rename = "match")]
    match_cfg: MatchConfig,
}

#[derive(Debug, Serialize)]
struct ExtractOutput<'a> {
    path: &'a str,
    ridge_endings: usize,
    bifurcations: usize,
    minutiae: &'a [Minutia],
}

#[derive(Debug, Serialize)]
struct VerifyOutput<'a> {
    probe: &'a str,
    gallery: &'a str,
    result: MatchResult,
}

#[derive(Debug, Serialize)]
struct CandidateRecord<'a> {
    path: &'a str,
    score: u32,
    matched: Option<bool>,
}

#[derive(Debug, Serialize)]
struct IdentifyOutput<'a> {
    probe: &'a str,
    candidates: Vec<CandidateRecord<'a>>,
}

fn extract(
    extractor: &Extractor,
    capture: &CaptureConfig,
    binarized_path: Option<&str>,
) -> Result<MinutiaSet, Box<dyn std::error::Error>> {
    let image = load_gray_image(&capture.path, capture.ppi)?;
    let extraction = extractor.extract_image(&image)?;
    if let Some(path) = binarized_path {
        save_binarized_png(extraction.binarized(), path)?;
    }
    Ok(extraction.into_minutiae())
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("ridgematch=info"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if cli.print_schema || cli.print_example {
        let text = if cli.print_schema { SCHEMA_JSON } else { EXAMPLE_JSON };
        print!("{text}");
        return Ok(());
    }
    if cli.trace {
        init_tracing()?;
    }

    let config: Config = serde_json::from_slice(&fs::read(&cli.config)?)?;
    let probe = config
        .probe
        .as_ref()
        .ok_or("probe must be set in the config")?;

    let extractor = Extractor::new(config.extract.clone())?;
    let matcher = Matcher::new(config.match_cfg.clone())?;
    let probe_set = extract(&extractor, probe, config.binarized_path.as_deref())?;

    let json = match config.mode {
        Mode::Extract => serde_json::to_string_pretty(&ExtractOutput {
            path: &probe.path,
            ridge_endings: probe_set.count_kind(ridgematch::MinutiaKind::RidgeEnding),
            bifurcations: probe_set.count_kind(ridgematch::MinutiaKind::Bifurcation),
            minutiae: probe_set.as_slice(),
        })?,
        Mode::Verify => {
            let [gallery] = config.gallery.as_slice() else {
                return Err("verify mode expects exactly one gallery capture".into());
            };
            let gallery_set = extract(&extractor, gallery, None)?;
            let mut result = matcher.match_sets(&probe_set, &gallery_set);
            if let Some(threshold) = config.threshold {
                result = result.with_threshold(threshold);
            }
            serde_json::to_string_pretty(&VerifyOutput {
                probe: &probe.path,
                gallery: &gallery.path,
                result,
            })?
        }
        Mode::Identify => {
            if config.gallery.is_empty() {
                return Err("identify mode expects at least one gallery capture".into());
            }
            let compiled = config
                .gallery
                .iter()
                .map(|capture| Ok(matcher.compile(&extract(&extractor, capture, None)?)))
                .collect::<Result<Vec<_>, Box<dyn std::error::Error>>>()?;
            let ranked: Vec<Candidate> = matcher.identify(&probe_set, &compiled);
            let candidates = ranked
                .iter()
                .map(|c| CandidateRecord {
                    path: &config.gallery[c.index].path,
                    score: c.score,
                    matched: config.threshold.map(|t| c.score >= t),
                })
                .collect();
            serde_json::to_string_pretty(&IdentifyOutput {
                probe: &probe.path,
                candidates,
            })?
        }
    };

    tracing::info!(mode = ?config.mode, probe = %probe.path, "job finished");
    if let Some(path) = &config.output_path {
        fs::write(path, json)?;
    } else {
        println!("{json}");
    }
    Ok(())
}
