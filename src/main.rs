use std::io::{BufRead, IsTerminal, Write};

use miette::{Context, IntoDiagnostic, Result};
use scribe_commit::git::{find_repo_root, GitCli};
use scribe_commit::pipeline::CommitPipeline;
use scribe_core::ScribeConfig;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cwd = std::env::current_dir().into_diagnostic()?;
    let repo_root = find_repo_root(&cwd)
        .wrap_err("This command must be run inside a git repository")?;

    let config = ScribeConfig::load(&repo_root)?;
    let verbose = config.commit.verbose;
    let interactive = config.commit.interactive;
    if verbose {
        eprintln!("Found git repository at: {}", repo_root.display());
    }

    let git = GitCli::new(&repo_root);
    let changes = git.staged_changes()?;
    if changes.is_empty() {
        println!("No staged changes found. Stage changes first with 'git add'.");
        return Ok(());
    }

    if config.llm.api_key.is_none() {
        miette::bail!(miette::miette!(
            help = "export SCRIBE_OPENROUTER_API_KEY=... (or OPENROUTER_API_KEY), or set [llm] api_key in .scribe.toml",
            "No API key configured for the LLM endpoint"
        ));
    }

    let pipeline = CommitPipeline::new(config)?;
    let prepared = pipeline.prepare(&changes)?;
    if verbose {
        eprintln!("{}", prepared.stats);
    }

    let spinner = if std::io::stderr().is_terminal() {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
        );
        pb.set_message("Generating commit message...");
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let generated = pipeline.generate(prepared).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let generated = generated.wrap_err("Failed to generate commit message")?;

    println!("Generated commit message:");
    println!("---");
    println!("{}", generated.message);
    println!("---");

    if !interactive {
        if verbose {
            eprintln!("Non-interactive mode: message generated but not committed.");
        }
        return Ok(());
    }

    if confirm("Press Enter to commit with this message (or any key to abort): ")? {
        if verbose {
            eprintln!("Committing changes with the generated message...");
        }
        let output = git.commit(&generated.message)?;
        if verbose {
            eprintln!("Commit successful:\n{}", output.trim_end());
        } else {
            println!("Changes committed successfully!");
        }
    } else {
        println!("Commit aborted.");
    }

    Ok(())
}

/// `true` only for an empty line; anything else, or end of input, declines.
fn confirm(question: &str) -> Result<bool> {
    print!("{question}");
    std::io::stdout().flush().into_diagnostic()?;

    let mut answer = String::new();
    let read = std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .into_diagnostic()?;
    if read == 0 {
        println!();
        return Ok(false);
    }
    Ok(answer.trim().is_empty())
}
