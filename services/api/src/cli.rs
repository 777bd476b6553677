use crate::demo::{run_decode, run_demo, run_questions, run_score, DecodeArgs, DemoArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use healthspan::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Healthspan Assessment",
    about = "Score, share and serve the four-week healthspan self-assessment",
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
    /// Score an answers file and print the text summary and share link
    Score(ScoreArgs),
    /// Work with share tokens
    Share {
        #[command(subcommand)]
        command: ShareCommand,
    },
    /// Print the question catalog grouped by system
    Questions,
    /// Walk through scoring, sharing and reopening a sample assessment
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ShareCommand {
    /// Decode a share token (or a full share link) into its anonymized summary
    Decode(DecodeArgs),
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
        Command::Score(args) => run_score(args).await,
        Command::Share {
            command: ShareCommand::Decode(args),
        } => run_decode(args),
        Command::Questions => run_questions(),
        Command::Demo(args) => run_demo(args),
    }
}
