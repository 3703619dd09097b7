use anyhow::Result;
use argnote::{
    cli::{Cli, Commands},
    core::AnnotateError,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ARGNOTE_LOG=debug shows formatted signatures; stderr keeps stdout parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ARGNOTE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .init();

    // Build a context once, pass everywhere
    let ctx = cli.context();

    let result = match cli.command {
        Commands::Check(args) => {
            let fail = args.fail_on_findings;
            let count = argnote::check_run(args, &ctx)?;
            if fail && count > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Fix(args) => argnote::core::fix_run(args, &ctx),
        Commands::Annotate(args) => argnote::core::annotate_run(args, &ctx),
        Commands::Template(args) => argnote::core::template::run(args, &ctx),
        Commands::Rules => argnote::core::check::rules(&ctx),
        Commands::Init(args) => argnote::infra::config::init(args, &ctx),
        Commands::Completions(args) => argnote::completion::run(args, &ctx),
    };

    // Cursor failures render as labelled diagnostics
    match result {
        Err(err) if err.is::<AnnotateError>() => {
            if let Ok(annotate) = err.downcast::<AnnotateError>() {
                eprintln!("{:?}", miette::Report::new(annotate));
            }
            std::process::exit(2);
        }
        other => other,
    }
}
