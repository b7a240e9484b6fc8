use crate::demo::{run_demo, run_export, run_suggest, DemoArgs, ExportArgs, SuggestArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use peer_review::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Peer Review",
    about = "Score, review, and grade peer evaluations from the command line",
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
    /// Print quality suggestions for an evaluation stored as JSON
    Suggest(SuggestArgs),
    /// Write graded evaluations from the configured store as CSV
    ExportGrades(ExportArgs),
    /// Seed sample evaluations and walk through review, grading, and analytics
    Demo(DemoArgs),
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
        Command::Suggest(args) => run_suggest(args),
        Command::ExportGrades(args) => run_export(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["peer-review-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn suggest_accepts_input_and_grade_flag() {
        let cli = Cli::try_parse_from([
            "peer-review-api",
            "suggest",
            "--input",
            "draft.json",
            "--grade",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Suggest(args)) => {
                assert_eq!(args.input, std::path::PathBuf::from("draft.json"));
                assert!(args.grade);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn export_grades_uses_kebab_case() {
        let cli = Cli::try_parse_from([
            "peer-review-api",
            "export-grades",
            "--output",
            "grades.csv",
        ])
        .expect("parses");
        assert!(matches!(cli.command, Some(Command::ExportGrades(_))));
    }
}
