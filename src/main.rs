use std::path::PathBuf;

use anyhow::anyhow;
use dotenvy::dotenv;
use tracing::info;

mod config;
mod consult;
mod llm;
mod utils;

use config::CONFIG;
use consult::{analysis_schema, analyze_profile, IntakeForm, PortraitImage, StylePreference};
use llm::GeminiClient;
use utils::logging::init_logging;
use utils::timing::{complete_submission_timer, start_submission_timer};

#[derive(Debug, Clone, PartialEq)]
struct AnalyzeArgs {
    image: Option<PathBuf>,
    name: String,
    dob: String,
    job: String,
    style: StylePreference,
    prior_tattoo: bool,
    json: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum CliCommand {
    Analyze(AnalyzeArgs),
    Schema,
    Help,
}

fn usage() -> &'static str {
    "Usage:\n  brow-consult analyze --image <path> --name <text> --dob <YYYY-MM-DD> --job <text> [--style <natural|natural-slim|slender>] [--prior-tattoo] [--json]\n  brow-consult schema\n  brow-consult --help"
}

fn next_value<'a>(args: &'a [String], index: &mut usize, flag: &str) -> anyhow::Result<&'a str> {
    *index += 1;
    args.get(*index)
        .map(|value| value.as_str())
        .ok_or_else(|| anyhow!("Missing value for {flag}"))
}

fn parse_analyze_args(args: &[String]) -> anyhow::Result<AnalyzeArgs> {
    let mut parsed = AnalyzeArgs {
        image: None,
        name: String::new(),
        dob: String::new(),
        job: String::new(),
        style: StylePreference::default(),
        prior_tattoo: false,
        json: false,
    };

    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--image" => {
                parsed.image = Some(PathBuf::from(next_value(args, &mut index, "--image")?));
            }
            "--name" => parsed.name = next_value(args, &mut index, "--name")?.to_string(),
            "--dob" => parsed.dob = next_value(args, &mut index, "--dob")?.to_string(),
            "--job" => parsed.job = next_value(args, &mut index, "--job")?.to_string(),
            "--style" => {
                parsed.style = next_value(args, &mut index, "--style")?.parse()?;
            }
            "--prior-tattoo" => parsed.prior_tattoo = true,
            "--json" => parsed.json = true,
            other => {
                return Err(anyhow!(
                    "Unknown analyze argument: {other}\n{}",
                    usage()
                ));
            }
        }
        index += 1;
    }

    Ok(parsed)
}

fn parse_cli_args(args: &[String]) -> anyhow::Result<CliCommand> {
    match args.get(1).map(|value| value.as_str()) {
        Some("analyze") => Ok(CliCommand::Analyze(parse_analyze_args(&args[2..])?)),
        Some("schema") => Ok(CliCommand::Schema),
        None | Some("--help") | Some("-h") | Some("help") => Ok(CliCommand::Help),
        Some(other) => Err(anyhow!("Unknown command: {other}\n{}", usage())),
    }
}

async fn run_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let portrait = match &args.image {
        Some(path) => Some(PortraitImage::load(path).await?),
        None => None,
    };
    let intake = IntakeForm {
        name: args.name,
        date_of_birth: args.dob,
        occupation: args.job,
        style_preference: args.style,
        has_prior_tattoo: args.prior_tattoo,
        portrait,
    }
    .submit()?;

    info!(
        "Starting consultation for {} (preference={}, prior_tattoo={})",
        intake.name, intake.style_preference, intake.has_prior_tattoo
    );
    let mut timer = start_submission_timer(&intake.name, intake.has_prior_tattoo);
    let client = GeminiClient::from_config(&CONFIG);

    let result = match analyze_profile(&client, &intake, Some(CONFIG.response_language.as_str())).await {
        Ok(result) => result,
        Err(err) => {
            complete_submission_timer(&mut timer, "error", Some(err.to_string()));
            return Err(err.into());
        }
    };

    let generated = result
        .brow_styles
        .iter()
        .filter(|style| style.image_url.is_some())
        .count();
    complete_submission_timer(
        &mut timer,
        "success",
        Some(format!("images={}/{}", generated, result.brow_styles.len())),
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", consult::report::render_text(&result));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let analyze_args = match parse_cli_args(&args)? {
        CliCommand::Help => {
            println!("{}", usage());
            return Ok(());
        }
        CliCommand::Schema => {
            println!("{}", serde_json::to_string_pretty(&analysis_schema())?);
            return Ok(());
        }
        CliCommand::Analyze(analyze_args) => analyze_args,
    };

    let _guards = init_logging(&CONFIG.log_level, &CONFIG.log_dir);
    run_analyze(analyze_args).await
}
