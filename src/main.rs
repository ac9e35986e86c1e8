//! recipe-forge – command-line recipe JSON → PDF generator.
//!
//! Usage:
//!   recipe-forge <recipe.json> [output.pdf] [--no-image] [--timeout 8]
//!   recipe-forge --sample tomato_soup [output.pdf]
//!
//! If `output.pdf` is omitted the PDF is named after the recipe title
//! (e.g. "Tomato Soup" → `tomato_soup.pdf`) in the current directory.

use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
};

use recipe_forge::pipeline::{generate_recipe_pdf, PipelineConfig};
use recipe_forge::recipe::RecipeRecord;
use recipe_forge::samples;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut layout_json: Option<PathBuf> = None;
    let mut sample: Option<String> = None;
    let mut no_image = false;
    let mut fallback_image: Option<String> = None;
    let mut timeout_secs: Option<u64> = None;
    let mut metrics_font: Option<PathBuf> = None;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--no-image" => no_image = true,
            "--fallback-image" => fallback_image = Some(flag_value(&mut iter, arg, &args[0])),
            "--timeout" => {
                let raw = flag_value(&mut iter, arg, &args[0]);
                match raw.parse::<u64>() {
                    Ok(secs) => timeout_secs = Some(secs),
                    Err(_) => {
                        eprintln!("Invalid --timeout value: {raw}");
                        process::exit(1);
                    }
                }
            }
            "--metrics-font" => {
                metrics_font = Some(PathBuf::from(flag_value(&mut iter, arg, &args[0])))
            }
            "--config" | "-c" => {
                config_path = Some(PathBuf::from(flag_value(&mut iter, arg, &args[0])))
            }
            "--layout-json" => {
                layout_json = Some(PathBuf::from(flag_value(&mut iter, arg, &args[0])))
            }
            "--sample" | "-s" => sample = Some(flag_value(&mut iter, arg, &args[0])),
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                // With --sample the only positional is the output path.
                let slot = if sample.is_some() { positional + 1 } else { positional };
                match slot {
                    0 => input_path = Some(PathBuf::from(path)),
                    1 => output_path = Some(PathBuf::from(path)),
                    _ => {
                        eprintln!("Unexpected argument: {path}");
                        print_usage(&args[0]);
                        process::exit(1);
                    }
                }
                positional += 1;
            }
        }
    }

    let record = match (&sample, &input_path) {
        (Some(name), _) => match samples::by_name(name) {
            Some(r) => r,
            None => {
                eprintln!(
                    "Unknown sample '{name}' (available: {})",
                    samples::SAMPLE_NAMES.join(", ")
                );
                process::exit(1);
            }
        },
        (None, Some(input)) => read_record(input),
        (None, None) => {
            eprintln!("Error: no input file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let mut config = match &config_path {
        Some(path) => match PipelineConfig::from_json_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error reading config '{}': {e}", path.display());
                process::exit(1);
            }
        },
        None => PipelineConfig::default(),
    };
    if no_image {
        config.fetch_images = false;
    }
    if let Some(url) = fallback_image {
        config.fallback_image_url = Some(url);
    }
    if let Some(secs) = timeout_secs {
        config.fetch_timeout_secs = secs;
    }
    if metrics_font.is_some() {
        config.metrics_font = metrics_font;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {e}");
            process::exit(1);
        }
    };

    match runtime.block_on(generate_recipe_pdf(&record, &config)) {
        Ok((doc, layout)) => {
            let output = output_path.unwrap_or_else(|| PathBuf::from(&doc.filename));
            // Create output directory if necessary.
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        eprintln!("Error creating output directory: {e}");
                        process::exit(1);
                    }
                }
            }
            if let Err(e) = fs::write(&output, &doc.bytes) {
                eprintln!("Error writing '{}': {e}", output.display());
                process::exit(1);
            }
            if let Some(path) = layout_json {
                let written = layout
                    .to_json()
                    .map_err(|e| e.to_string())
                    .and_then(|json| fs::write(&path, json).map_err(|e| e.to_string()));
                if let Err(e) = written {
                    eprintln!("Error writing layout '{}': {e}", path.display());
                    process::exit(1);
                }
            }
            let pages = doc.page_count;
            eprintln!(
                "Wrote '{}' ({} bytes, {} page{})",
                output.display(),
                doc.bytes.len(),
                pages,
                if pages == 1 { "" } else { "s" }
            );
        }
        Err(e) => {
            eprintln!("Error generating PDF: {e}");
            process::exit(1);
        }
    }
}

fn flag_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str, prog: &str) -> String {
    match iter.next() {
        Some(v) => v.clone(),
        None => {
            eprintln!("Missing value for {flag}");
            print_usage(prog);
            process::exit(1);
        }
    }
}

fn read_record(input: &Path) -> RecipeRecord {
    let json = match fs::read_to_string(input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };
    match serde_json::from_str(&json) {
        Ok(record) => record,
        Err(e) => {
            eprintln!("Error parsing recipe '{}': {e}", input.display());
            process::exit(1);
        }
    }
}

fn print_usage(prog: &str) {
    eprintln!("recipe-forge – recipe JSON to PDF generator");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <recipe.json> [output.pdf] [flags]");
    eprintln!("  {prog} --sample <name> [output.pdf] [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <recipe.json>  Recipe record (title, ingredients, instructions, cuisine, ...)");
    eprintln!("  [output.pdf]   Output path  (default: derived from the recipe title)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --no-image               Skip image fetching entirely");
    eprintln!("  --fallback-image <url>   Image used when the recipe's own image fails");
    eprintln!("  --timeout <secs>         Per-fetch timeout (default: 8)");
    eprintln!("  --metrics-font <ttf>     Measure text with this font's metrics");
    eprintln!("  --config, -c <json>      Pipeline config file");
    eprintln!("  --layout-json <path>     Also write the computed layout as JSON");
    eprintln!(
        "  --sample, -s <name>      Use a built-in recipe ({})",
        samples::SAMPLE_NAMES.join(", ")
    );
    eprintln!("  --help                   Print this message");
}
