use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use food_nutrition_analyzer::config::config::{
    API_KEY_ENV, DEFAULT_ENDPOINT, DEFAULT_MODEL, MAX_DIMENSION_RANGE, MAX_DIMENSION_STEP,
    QUALITY_RANGE, QUALITY_STEP, check_stepped_range,
};
use food_nutrition_analyzer::error::classify;
use food_nutrition_analyzer::session::{DISCLAIMER, read_upload};
use food_nutrition_analyzer::{
    AnalysisSession, AnalyzerConfig, AnalyzerError, EncodingSettings, HasRecoverySuggestion,
    PreparedImage, Retryable, VisionClient, render_failure,
};

const API_KEY_HELP: &str = "\
API key:
  1. Go to https://groq.com and sign up for an account
  2. Generate an API key from your dashboard
  3. Pass it with --api-key or export GROQ_API_KEY";

const TIPS: &str = "\
Tips for best results:
  - Use well-lit, clear photos and include the entire food item in the frame
  - Avoid blurry or dark images; a plain background helps
  - Include a size reference when possible (plate, utensils)
  - Lower --max-size for faster uploads; raise --quality for more detail
  - For most food photos the defaults (800px, quality 85) work well";

/// 🍽️ Upload a photo of your food to get detailed nutritional information.
#[derive(Parser, Debug)]
#[command(name = "nutrition", version)]
#[command(about = "🍽️ Estimate the nutritional content of a food photo with a vision model")]
#[command(long_about = "Resize and compress a food photo locally, send it to a hosted vision model,
and print the model's nutrition estimate (calories, macros, ingredients, allergens).")]
#[command(after_help = TIPS)]
struct Args {
    /// Food photo to analyze (.jpg, .jpeg or .png)
    image: PathBuf,

    /// Longest side of the uploaded image in pixels
    #[arg(short = 's', long, default_value_t = 800, value_parser = parse_max_size,
          help = "Max image size in pixels: 400-1200 in steps of 100")]
    max_size: u32,

    /// JPEG quality
    #[arg(short, long, default_value_t = 85, value_parser = parse_quality,
          help = "Image quality: 50-100 in steps of 5 (higher = more detail, larger upload)")]
    quality: u8,

    /// API key for the vision service
    #[arg(long, env = API_KEY_ENV, hide_env_values = true, long_help = API_KEY_HELP)]
    api_key: Option<String>,

    /// Vision model identifier
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// OpenAI-compatible chat completions URL
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Only prepare the image and report its sizes; nothing is sent
    #[arg(long)]
    preview: bool,

    /// Write the processed JPEG to this path
    #[arg(long, value_name = "PATH")]
    save_processed: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = AnalyzerConfig {
        encoding: EncodingSettings::new(args.max_size, args.quality),
        endpoint: args.endpoint.clone(),
        model: args.model.clone(),
        timeout_secs: args.timeout,
        ..AnalyzerConfig::default()
    };
    config.validate()?;

    let bytes = read_upload(&args.image)?;

    if args.preview {
        let prepared = food_nutrition_analyzer::prepare_image(&bytes, config.encoding)?;
        print_sizes(&prepared);
        save_processed(&args, &prepared)?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(api_key) = args.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
        eprintln!("👆 Please provide your Groq API key to get started.\n");
        eprintln!("{}", API_KEY_HELP);
        return Ok(ExitCode::from(2));
    };

    let client = VisionClient::new(api_key, &config.to_model_options())?;
    let mut session = AnalysisSession::new(config, client)?;

    // Local failures abort before anything is sent.
    let prepared = session.preview(&bytes)?;
    print_sizes(&prepared);
    save_processed(&args, &prepared)?;

    println!("🔍 Analyzing your food...");
    match session.analyze(&prepared) {
        Ok(result) => {
            println!();
            println!("📊 Nutritional Analysis");
            println!("───────────────────────");
            println!("{}", result.text);
            println!();
            println!("⚠️  {}", DISCLAIMER);
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            println!("{}", render_failure(&error));
            if let Some(suggestion) = error.recovery_suggestion() {
                println!("💡 {}", suggestion);
            }
            if let Some(hint) = retry_hint(&error) {
                println!("🔁 {}", hint);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Tell the user when running the same command again may succeed.
fn retry_hint(error: &AnalyzerError) -> Option<String> {
    if !classify::is_transient(error) {
        return None;
    }
    let hint = match error.retry_delay_ms() {
        Some(ms) if ms >= 1000 => format!(
            "This looks temporary. Wait about {}s and run the same command again.",
            ms.div_ceil(1000)
        ),
        _ => "This looks temporary. Run the same command again.".to_string(),
    };
    Some(hint)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn print_sizes(prepared: &PreparedImage) {
    println!(
        "Original Size: ({}, {})",
        prepared.original_size.w, prepared.original_size.h
    );
    println!(
        "Processed Size: ({}, {})",
        prepared.processed_size.w, prepared.processed_size.h
    );
    println!(
        "Upload: {:.1} KB JPEG at quality {}",
        prepared.jpeg.len() as f64 / 1024.0,
        prepared.settings.quality
    );
}

fn save_processed(args: &Args, prepared: &PreparedImage) -> Result<()> {
    if let Some(path) = &args.save_processed {
        std::fs::write(path, &prepared.jpeg)
            .with_context(|| format!("Failed to write processed image to {}", path.display()))?;
        println!("Saved processed image to {}", path.display());
    }
    Ok(())
}

/// Parse and range-check the max image size.
fn parse_max_size(value: &str) -> Result<u32, String> {
    let parsed: u32 = value
        .parse()
        .map_err(|_| format!("invalid number: {}", value))?;
    let (min, max) = MAX_DIMENSION_RANGE;
    check_stepped_range(parsed, min, max, MAX_DIMENSION_STEP)
}

/// Parse and range-check the JPEG quality.
fn parse_quality(value: &str) -> Result<u8, String> {
    let parsed: u32 = value
        .parse()
        .map_err(|_| format!("invalid number: {}", value))?;
    let (min, max) = QUALITY_RANGE;
    check_stepped_range(parsed, min as u32, max as u32, QUALITY_STEP as u32).map(|q| q as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_max_size() {
        assert_eq!(parse_max_size("800"), Ok(800));
        assert_eq!(parse_max_size("400"), Ok(400));
        assert_eq!(parse_max_size("1200"), Ok(1200));
        assert!(parse_max_size("1300").is_err());
        assert!(parse_max_size("750").is_err());
        assert!(parse_max_size("big").is_err());
    }

    #[test]
    fn test_parse_quality() {
        assert_eq!(parse_quality("85"), Ok(85));
        assert_eq!(parse_quality("50"), Ok(50));
        assert!(parse_quality("45").is_err());
        assert!(parse_quality("87").is_err());
        assert!(parse_quality("-1").is_err());
    }

    #[test]
    fn test_retry_hint_only_for_transient_errors() {
        let throttled = AnalyzerError::rate_limited("slow down", Some(3));
        assert_eq!(
            retry_hint(&throttled).as_deref(),
            Some("This looks temporary. Wait about 3s and run the same command again.")
        );
        assert!(retry_hint(&AnalyzerError::network("chat completion", "refused")).is_some());
        assert!(retry_hint(&AnalyzerError::auth(401, "Invalid API Key")).is_none());
        assert!(retry_hint(&AnalyzerError::api(500, "boom")).is_none());
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["nutrition", "lunch.jpg"]).unwrap();
        assert_eq!(args.max_size, 800);
        assert_eq!(args.quality, 85);
        assert!(!args.preview);
        assert_eq!(args.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_args_reject_out_of_range() {
        assert!(Args::try_parse_from(["nutrition", "lunch.jpg", "--max-size", "2000"]).is_err());
        assert!(Args::try_parse_from(["nutrition", "lunch.jpg", "-q", "20"]).is_err());
    }
}
