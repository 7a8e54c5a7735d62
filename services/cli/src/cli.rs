use crate::commands::{
    run_calculate, run_evolution, run_legacy, run_validate_bands, CalculateArgs, EvolutionArgs,
    LegacyArgs, ValidateBandsArgs,
};
use crate::demo::{run_demo, DemoArgs};
use clap::{Parser, Subcommand};
use maturity_diagnostic::config::AppConfig;
use maturity_diagnostic::error::AppError;
use maturity_diagnostic::telemetry;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "Maturity Diagnostic",
    about = "Score maturity quizzes, chart their evolution and export legacy rows",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score one submission against a band catalog and print the result as JSON
    Calculate(CalculateArgs),
    /// Compute evolution analytics for a stored diagnostic history
    Evolution(EvolutionArgs),
    /// Score one submission and write its legacy export row as CSV
    Legacy(LegacyArgs),
    /// Check that every band set partitions its score range
    ValidateBands(ValidateBandsArgs),
    /// Run a built-in walkthrough over three months of submissions (default command)
    Demo(DemoArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    debug!(environment = ?config.environment, "configuration loaded");

    let command = cli.command.unwrap_or(Command::Demo(DemoArgs::default()));

    match command {
        Command::Calculate(args) => run_calculate(args, &config),
        Command::Evolution(args) => run_evolution(args, &config),
        Command::Legacy(args) => run_legacy(args, &config),
        Command::ValidateBands(args) => run_validate_bands(args),
        Command::Demo(args) => run_demo(args, &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_falls_back_to_demo() {
        let cli = Cli::try_parse_from(["maturity-diagnostic"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn calculate_requires_catalog_and_answers() {
        let err = Cli::try_parse_from(["maturity-diagnostic", "calculate", "--catalog", "c.json"])
            .expect_err("answers missing");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
