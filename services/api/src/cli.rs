use crate::commands::{run_evaluate, run_rules_show, EvaluateArgs, RulesShowArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use eligibility_engine::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "eligibility-api",
    about = "Serve and run governed eligibility decisions from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate one request file against a ruleset and print the decision
    Evaluate(EvaluateArgs),
    /// Inspect rulesets
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RulesCommand {
    /// Validate a ruleset and list its rules
    Show(RulesShowArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => tokio::task::spawn_blocking(move || run_evaluate(args)).await?,
        Command::Rules {
            command: RulesCommand::Show(args),
        } => run_rules_show(args),
    }
}
