use caption_press::bank::ContentBank;
use caption_press::config::{self, Credentials, PressConfig};
use caption_press::render::{FontPathResolver, PicsumSource, RenderParams, create_quote_image};
use caption_press::pipeline::{self, RunEvent};
use caption_press::{generator, output};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "caption-press")]
#[command(about = "Generate captions in bulk and publish them as quote images")]
#[command(long_about = "\
Generate captions in bulk and publish them as quote images

Two steps share a line-delimited JSON file (the content bank):

  caption-press generate   ask the language model for a batch of captions
                           and append them to the bank
  caption-press post       pop the first caption, render it over a stock
                           photo, and upload it to the page

Schedule them so they never run at the same time; the bank is not locked.

Secrets come from the environment (a .env file in the working directory is
loaded first):

  OPENROUTER_API_KEY           needed by generate
  FACEBOOK_PAGE_ACCESS_TOKEN   needed by post
  FACEBOOK_PAGE_ID             needed by post

Run 'caption-press gen-config' to print a documented caption-press.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Content bank file (overrides bank.path)
    #[arg(long, global = true)]
    bank: Option<PathBuf>,

    /// Show debug diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Request a batch of captions and append them to the bank
    Generate {
        /// Number of posts to request (overrides generator.count)
        #[arg(long)]
        count: Option<u32>,
    },
    /// Publish the next caption in the bank
    Post,
    /// Render a caption to a JPEG without publishing or touching the bank
    Render {
        caption: String,
        /// Output file (overrides render.output)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show how many captions are queued
    Status,
    /// Print a stock caption-press.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    dotenv().ok();
    init_tracing(cli.verbose);

    let command = match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(ExitCode::SUCCESS);
        }
        other => other,
    };

    let mut press = config::load_config(&cli.config)?;
    if let Some(bank) = cli.bank {
        press.bank.path = bank;
    }
    let bank = ContentBank::new(&press.bank.path);
    let credentials = Credentials::from_env();

    let code = match command {
        Command::Generate { count } => {
            if let Some(n) = count {
                press.generator.count = n;
                press.validate()?;
            }
            run_generate(&press, &credentials, &bank)
        }
        Command::Post => {
            let source = PicsumSource::new(&press.stock)?;
            let resolver = FontPathResolver::new(press.render.fonts.clone());
            let outcome = pipeline::post_once(
                &press,
                &credentials,
                &bank,
                &source,
                &resolver,
                &mut output::print_run_event,
            );
            outcome.exit_code(press.publish.fail_on_error)
        }
        Command::Render { caption, output } => run_render(&press, &caption, output),
        Command::Status => {
            let entries = bank.len()?;
            println!(
                "{}",
                output::format_status(bank.path(), entries, bank.path().exists())
            );
            0
        }
        Command::GenConfig => 0,
    };

    Ok(ExitCode::from(code))
}

fn run_render(press: &PressConfig, caption: &str, output: Option<PathBuf>) -> u8 {
    let mut params = RenderParams::from_config(&press.render);
    if let Some(path) = output {
        params.output = path;
    }
    let resolver = FontPathResolver::new(params.fonts.clone());
    let rendered = PicsumSource::new(&press.stock)
        .and_then(|source| create_quote_image(&source, &resolver, caption, &params));
    match rendered {
        Ok(img) => {
            output::print_run_event(&RunEvent::Rendered(img));
            0
        }
        Err(e) => {
            output::print_run_event(&RunEvent::RenderFailed {
                message: e.to_string(),
            });
            1
        }
    }
}

fn run_generate(press: &PressConfig, credentials: &Credentials, bank: &ContentBank) -> u8 {
    println!("{}", output::format_generate_start(press.generator.count));
    match generator::generate_bulk(&press.generator, credentials, bank) {
        Ok(report) => {
            output::print_generate_report(&report, bank.path());
            0
        }
        Err(e) => {
            output::print_generate_error(&e);
            if press.generator.fail_on_error { 1 } else { 0 }
        }
    }
}

/// Diagnostics go to stderr so stdout stays the progress log.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .init();
}
