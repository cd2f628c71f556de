use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell as CompShell};
use owo_colors::OwoColorize;
use std::path::PathBuf;

use stampede::commands::{run, validate};

#[derive(Parser)]
#[command(name = "stampede")]
#[command(version = "0.1.0")]
#[command(about = "Scenario-driven HTTP load testing that lives in git")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a load scenario
    Run {
        /// Scenario file (built-in stress profile when omitted)
        scenario: Option<PathBuf>,
        /// Override the scenario's base URL
        #[arg(long = "base-url")]
        base_url: Option<String>,
        /// Run report output file (JSON)
        #[arg(long = "output")]
        output: Option<PathBuf>,
        /// Progress report interval during the run
        #[arg(long = "report-interval", default_value = "5s")]
        report_interval: String,
        /// Per-request timeout
        #[arg(long = "timeout", default_value = "60s")]
        timeout: String,
        /// Skip SSL verification
        #[arg(long = "insecure")]
        insecure: bool,
        /// CI mode (no animations)
        #[arg(long = "ci")]
        ci: bool,
    },
    /// Validate a scenario file and print its profile
    Validate {
        /// Scenario file to validate
        scenario: PathBuf,
    },
    /// Generate shell completions (internal)
    #[command(hide = true)]
    Completions {
        /// Shell: bash, zsh, fish
        shell: String,
    },
    /// Generate man page (internal)
    #[command(hide = true)]
    Man,
}

pub fn print_banner() {
    let banner = r#"
    ███████╗████████╗ █████╗ ███╗   ███╗██████╗ ███████╗██████╗ ███████╗
    ██╔════╝╚══██╔══╝██╔══██╗████╗ ████║██╔══██╗██╔════╝██╔══██╗██╔════╝
    ███████╗   ██║   ███████║██╔████╔██║██████╔╝█████╗  ██║  ██║█████╗
    ╚════██║   ██║   ██╔══██║██║╚██╔╝██║██╔═══╝ ██╔══╝  ██║  ██║██╔══╝
    ███████║   ██║   ██║  ██║██║ ╚═╝ ██║██║     ███████╗██████╔╝███████╗
    ╚══════╝   ╚═╝   ╚═╝  ╚═╝╚═╝     ╚═╝╚═╝     ╚══════╝╚═════╝ ╚══════╝
    stampede v0.1.0 — HTTP load scenarios that live in git
"#;

    if atty::is(atty::Stream::Stdout) {
        println!("{}", banner.cyan());
    } else {
        println!("stampede v0.1.0 — HTTP load scenarios that live in git");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Print banner for user-facing commands only
    if !matches!(cli.command, Commands::Completions { .. } | Commands::Man) {
        print_banner();
    }

    match cli.command {
        Commands::Run {
            scenario,
            base_url,
            output,
            report_interval,
            timeout,
            insecure,
            ci,
        } => {
            run::handle_run(run::RunOptions {
                scenario,
                base_url,
                output,
                report_interval,
                timeout,
                insecure,
                ci,
            })
            .await?;
        }
        Commands::Validate { scenario } => {
            validate::handle_validate(scenario).await?;
        }
        Commands::Completions { shell } => {
            // Generate completions to stdout for the requested shell
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            let sh = match shell.as_str() {
                "bash" => CompShell::Bash,
                "zsh" => CompShell::Zsh,
                "fish" => CompShell::Fish,
                "powershell" | "pwsh" => CompShell::PowerShell,
                "elvish" => CompShell::Elvish,
                other => {
                    eprintln!(
                        "Unsupported shell: {} (use bash|zsh|fish|powershell|elvish)",
                        other
                    );
                    std::process::exit(2);
                }
            };
            generate(sh, &mut cmd, name, &mut std::io::stdout());
        }
        Commands::Man => {
            // Generate a man page to stdout using clap_mangen
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            man.render(&mut std::io::stdout())?;
        }
    }

    Ok(())
}
