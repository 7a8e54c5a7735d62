mod cli;
mod commands;
mod demo;
mod infra;

use maturity_diagnostic::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
