use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use javapad_core::{CompileOutcome, DirFetcher, PlaygroundSession};

/// Headless front-end for the javapad playground: initializes the compiler
/// engine from a local asset directory, compiles one Java source, and prints
/// the program output.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(
        long,
        value_name = "DIR",
        help = "Directory containing compiler.wasm and the class-library archives"
    )]
    assets: PathBuf,

    #[arg(short, long, help = "Java source file (reads stdin when omitted)")]
    input: Option<String>,

    #[arg(short, long, help = "Write the generated wasm artifact to this path")]
    output: Option<String>,

    #[arg(long, help = "Print the console log to stderr after compilation")]
    show_console: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let fetcher = DirFetcher::new(&cli.assets);
    let mut session = PlaygroundSession::new();
    if let Err(err) = session.initialize(&fetcher) {
        let available = fetcher.available();
        bail!(
            "{err} (assets under {}: [{}])",
            cli.assets.display(),
            available.join(", ")
        );
    }

    let source = match cli.input {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read input file {path}"))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    session.set_source(source);

    let outcome = session.compile();
    if cli.show_console {
        eprint!("{}", session.console_log());
    }
    eprintln!("{}", session.status());

    match outcome {
        CompileOutcome::Executed | CompileOutcome::ExecutedSilently => {
            print!("{}", session.output());
            if let Some(path) = cli.output {
                let artifact = session
                    .artifact()
                    .context("no artifact was retained for this compilation")?;
                write_output(&path, artifact)?;
            }
            Ok(())
        }
        CompileOutcome::NoArtifact => {
            print!("{}", session.output());
            if cli.output.is_some() {
                bail!("compilation produced no artifact to write");
            }
            Ok(())
        }
        CompileOutcome::CompileFailed => {
            bail!("compilation failed:\n{}", session.console_log())
        }
        CompileOutcome::GenerationFailed | CompileOutcome::Failed => {
            bail!("{}\n{}", session.status(), session.console_log())
        }
        CompileOutcome::NotReady => bail!("compiler engine is not ready"),
    }
}

fn write_output(path: &str, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = PathBuf::from(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("failed to write output file {path}"))?;
    Ok(())
}
