use blazecss_lib::{minify, minify_sources, KeepSpecialComments, MinifyOutput, Options};
use clap::Parser;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use rayon::prelude::*;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

const BLAZECSS_INTRO: &str = r#"
        ____  __                 ________________
       / __ )/ /___ _____  ___  / ____/ ___/ ___/
      / __  / / __ `/_  / / _ \/ /    \__ \\__ \
     / /_/ / / /_/ / / /_/  __/ /___ ___/ /__/ /
    /_____/_/\__,_/ /___/\___/\____//____/____/

    BlazeCSS - The Rust-Powered CSS Minifier
"#;

#[derive(Parser)]
#[command(name = "BlazeCSS")]
#[command(about = "Minify CSS using Rust", before_help = BLAZECSS_INTRO)]
struct Args {
    /// Input files. Reads stdin when none are given.
    inputs: Vec<PathBuf>,

    /// Output file. Writes to stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Minify every input on its own into this directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// JSON file with options; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Compatibility preset with overrides, e.g. `ie8,+units.rem`.
    #[arg(long)]
    compatibility: Option<String>,

    #[arg(long)]
    keep_breaks: bool,

    /// `*` keeps all special comments, `1` the first one, `0` none.
    #[arg(long, value_parser = parse_keep_special_comments)]
    keep_special_comments: Option<KeepSpecialComments>,

    #[arg(long)]
    skip_advanced: bool,

    #[arg(long)]
    skip_aggressive_merging: bool,

    #[arg(long)]
    skip_media_merging: bool,

    #[arg(long)]
    skip_restructuring: bool,

    #[arg(long)]
    skip_shorthand_compacting: bool,

    #[arg(long)]
    semantic_merging: bool,

    /// Decimal places kept for px values.
    #[arg(long)]
    rounding_precision: Option<u8>,

    /// Re-parse the output and fail if it is not valid CSS.
    #[arg(long)]
    verify: bool,
}

fn parse_keep_special_comments(value: &str) -> Result<KeepSpecialComments, String> {
    KeepSpecialComments::parse(value).ok_or_else(|| format!("expected `*`, `1` or `0`, got `{}`", value))
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), String> {
    let options = load_options(args)?;

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir).map_err(|e| format!("cannot create {}: {}", dir.display(), e))?;
        let failures: Vec<String> = args
            .inputs
            .par_iter()
            .filter_map(|input| minify_into_dir(input, dir, &options, args.verify).err())
            .collect();
        return if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.join("\n"))
        };
    }

    let output = if args.inputs.is_empty() {
        let mut css = String::new();
        io::stdin()
            .read_to_string(&mut css)
            .map_err(|e| format!("cannot read stdin: {}", e))?;
        minify(&css, &options)
    } else {
        let mut sources = Vec::with_capacity(args.inputs.len());
        for input in &args.inputs {
            sources.push((input.display().to_string(), read(input)?));
        }
        log::info!("minifying {} files as one stylesheet", sources.len());
        minify_sources(&sources, &options)
    };

    let styles = checked_styles(output, "<output>", args.verify)?;
    match &args.output {
        Some(path) => fs::write(path, styles).map_err(|e| format!("cannot write {}: {}", path.display(), e)),
        None => io::stdout()
            .write_all(styles.as_bytes())
            .map_err(|e| format!("cannot write stdout: {}", e)),
    }
}

fn load_options(args: &Args) -> Result<Options, String> {
    let mut options = match &args.config {
        Some(path) => {
            let text = read(path)?;
            serde_json::from_str::<Options>(&text).map_err(|e| format!("invalid config {}: {}", path.display(), e))?
        }
        None => Options::default(),
    };

    if let Some(compatibility) = &args.compatibility {
        options.compatibility = blazecss_lib::Compatibility::Preset(compatibility.clone());
    }
    if let Some(keep) = args.keep_special_comments {
        options.keep_special_comments = keep;
    }
    if let Some(precision) = args.rounding_precision {
        options.rounding_precision = precision;
    }
    options.keep_breaks |= args.keep_breaks;
    options.semantic_merging |= args.semantic_merging;
    options.advanced &= !args.skip_advanced;
    options.aggressive_merging &= !args.skip_aggressive_merging;
    options.media_merging &= !args.skip_media_merging;
    options.restructuring &= !args.skip_restructuring;
    options.shorthand_compacting &= !args.skip_shorthand_compacting;
    Ok(options)
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))
}

fn minify_into_dir(input: &Path, dir: &Path, options: &Options, verify: bool) -> Result<(), String> {
    let css = read(input)?;
    let name = input.display().to_string();
    let styles = checked_styles(minify_sources(&[(name.as_str(), css.as_str())], options), &name, verify)?;

    let file_name = input
        .file_name()
        .ok_or_else(|| format!("{} has no file name", input.display()))?;
    let target = dir.join(file_name);
    fs::write(&target, styles).map_err(|e| format!("cannot write {}: {}", target.display(), e))?;
    log::info!("{} -> {}", input.display(), target.display());
    Ok(())
}

/// Reports warnings, turns errors into a failure and optionally re-parses
/// the result.
fn checked_styles(output: MinifyOutput, name: &str, verify: bool) -> Result<String, String> {
    for warning in &output.warnings {
        eprintln!("Warning: {}", warning);
    }
    if !output.errors.is_empty() {
        return Err(format!("{}: {}", name, output.errors.join("; ")));
    }
    if verify {
        StyleSheet::parse(&output.styles, ParserOptions::default())
            .map_err(|e| format!("{}: output does not re-parse: {}", name, e))?;
    }
    Ok(output.styles)
}
