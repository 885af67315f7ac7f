use std::process::ExitCode;

use clap::Parser;

mod cache;
mod cli;
mod exec;
mod prompt;
mod resolver;
mod update;

const MAX_PARALLEL_DOWNLOADS: usize = 10;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let app = cli::App::parse();
    match app.cmd {
        cli::Commands::Update => {
            let layout = cache::CacheLayout::from_user_cache()?;
            update::update(&layout)?;
            Ok(ExitCode::SUCCESS)
        }
        cli::Commands::Exec(args) => {
            let cli::ExecArgs { source, executable, anchor, rest } = args;
            match cli::interpret_exec(anchor, rest)? {
                cli::ExecInvocation::CompletionProbe => Ok(ExitCode::FAILURE),
                cli::ExecInvocation::Run { cache_root, args } => {
                    let layout = cache::CacheLayout::new(cache_root);
                    exec::run(&source, &executable, &layout, args)
                }
            }
        }
    }
}
