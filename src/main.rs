use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

mod build;
mod commands;
mod config;
mod logging;
mod preview;
mod util;

use crate::config::{Config, Overrides, Placement};
use crate::preview::SystemPreviewer;

/// Render a Markdown file to sanitized HTML and open it in the browser.
///
/// The path of the generated file is printed on stdout.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Markdown file to preview
    #[arg(short, long, value_name = "PATH")]
    file: PathBuf,

    /// Skip auto-preview; the generated file is kept
    #[arg(short, long, default_value = "false")]
    skip_preview: bool,

    /// Alternate template file, with `{{ title }}` and `{{ body }}` fields
    #[arg(short, long, value_name = "PATH")]
    template: Option<PathBuf>,

    /// Write the HTML to this path instead of a temporary file
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Where to put the HTML when no output path is given
    #[arg(long, value_enum)]
    placement: Option<Placement>,

    /// Document title
    #[arg(long)]
    title: Option<String>,

    /// The path to the configuration file (defaults to mdp.yaml if present)
    #[arg(short, long, value_name = "PATH")]
    config_file: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), anyhow::Error> {
    logging::init(args.verbose)?;

    let config = Config::load_from_arg(args.config_file.as_deref())?.with_overrides(Overrides {
        title: args.title,
        template: args.template,
        placement: args.placement,
        output: args.output,
        skip_preview: args.skip_preview,
    });

    let mut stdout = std::io::stdout().lock();
    commands::preview::run(&config, &args.file, &mut stdout, &SystemPreviewer::new()).await?;

    Ok(())
}
