use crate::infra::{
    build_service, load_json, CatalogFixture, HistoryFixture, InMemoryHistoryStore,
    SubmissionFixture,
};
use chrono::Utc;
use clap::Args;
use maturity_diagnostic::config::AppConfig;
use maturity_diagnostic::diagnostic::{
    validate_coverage, BandScope, CoverageIssue, CsvLegacyWriter, EvolutionAnalyzer,
    LegacyRecord, LegacyWriter, ScoringBand, SubmissionOutcome,
};
use maturity_diagnostic::error::AppError;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub(crate) struct CalculateArgs {
    /// Band catalog fixture (levels, bands and optional answer texts)
    #[arg(long)]
    pub(crate) catalog: PathBuf,
    /// Submission fixture (answers plus optional subject, timestamp and profile)
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Emit single-line JSON
    #[arg(long)]
    pub(crate) compact: bool,
}

#[derive(Args, Debug)]
pub(crate) struct EvolutionArgs {
    /// Diagnostic history fixture
    #[arg(long)]
    pub(crate) history: PathBuf,
    /// Band catalog fixture; when given, points carry their level rank
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Override DIAGNOSTIC_TREND_MONTHS
    #[arg(long, value_parser = parse_window)]
    pub(crate) trend_months: Option<usize>,
    /// Override DIAGNOSTIC_TOP_CATEGORIES
    #[arg(long, value_parser = parse_window)]
    pub(crate) top_categories: Option<usize>,
    /// Emit single-line JSON
    #[arg(long)]
    pub(crate) compact: bool,
}

#[derive(Args, Debug)]
pub(crate) struct LegacyArgs {
    /// Band catalog fixture (levels, bands and optional answer texts)
    #[arg(long)]
    pub(crate) catalog: PathBuf,
    /// Submission fixture (answers plus optional subject, timestamp and profile)
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Write the CSV row to this file instead of stdout
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ValidateBandsArgs {
    /// Band catalog fixture to check
    #[arg(long)]
    pub(crate) catalog: PathBuf,
    /// Upper bound of the general score range (defaults to the highest general band)
    #[arg(long)]
    pub(crate) general_max: Option<u32>,
    /// Upper bound of every category score range (defaults to each set's highest band)
    #[arg(long)]
    pub(crate) category_max: Option<u32>,
}

pub(crate) fn run_calculate(args: CalculateArgs, config: &AppConfig) -> Result<(), AppError> {
    let catalog: CatalogFixture = load_json(&args.catalog)?;
    let submission: SubmissionFixture = load_json(&args.answers)?;

    let outcome = submit(&catalog, &submission, config)?;
    print_json(&outcome.calculation, args.compact)
}

pub(crate) fn run_evolution(args: EvolutionArgs, config: &AppConfig) -> Result<(), AppError> {
    let HistoryFixture {
        subject,
        diagnostics,
    } = load_json(&args.history)?;

    let mut config = config.clone();
    if let Some(months) = args.trend_months {
        config.diagnostic.evolution.trend_months = months;
    }
    if let Some(limit) = args.top_categories {
        config.diagnostic.evolution.top_categories = limit;
    }

    let count = diagnostics.len();
    let evolution = match args.catalog {
        Some(path) => {
            let catalog: CatalogFixture = load_json(&path)?;
            let history = Arc::new(InMemoryHistoryStore::seeded(subject.clone(), diagnostics));
            build_service(&catalog, history, &config).evolution(&subject)?
        }
        None => EvolutionAnalyzer::new(config.diagnostic.evolution).analyze(&diagnostics),
    };
    info!(%subject, diagnostics = count, "evolution computed");

    print_json(&evolution, args.compact)
}

pub(crate) fn run_legacy(args: LegacyArgs, config: &AppConfig) -> Result<(), AppError> {
    let catalog: CatalogFixture = load_json(&args.catalog)?;
    let submission: SubmissionFixture = load_json(&args.answers)?;
    let outcome = submit(&catalog, &submission, config)?;

    match args.out {
        Some(path) => {
            write_legacy_csv(File::create(&path)?, &outcome.legacy)?;
            info!(path = %path.display(), diagnostic = %outcome.snapshot.id.0, "legacy row written");
        }
        None => write_legacy_csv(io::stdout().lock(), &outcome.legacy)?,
    }
    Ok(())
}

pub(crate) fn run_validate_bands(args: ValidateBandsArgs) -> Result<(), AppError> {
    let fixture: CatalogFixture = load_json(&args.catalog)?;
    let catalog = fixture.scoring_catalog();

    let mut category_ids: Vec<_> = catalog.category_bands.keys().copied().collect();
    category_ids.sort();

    let mut scopes = vec![(BandScope::General, args.general_max)];
    scopes.extend(
        category_ids
            .into_iter()
            .map(|id| (BandScope::Category(id), args.category_max)),
    );

    let mut defective_scopes = 0;
    for (scope, max) in scopes {
        let bands = catalog.bands_for(scope);
        let max_score = max.unwrap_or_else(|| highest_band(bands));
        let report = validate_coverage(bands, max_score);

        if report.is_partition() {
            println!("{scope}: ok (0-{max_score}, {} bands)", bands.len());
            continue;
        }
        defective_scopes += 1;
        println!("{scope}: {} issue(s) over 0-{max_score}", report.issues.len());
        for issue in &report.issues {
            println!("  - {}", describe_issue(issue));
        }
    }

    if defective_scopes > 0 {
        warn!(defective_scopes, "band catalog has coverage defects");
        return Err(AppError::Coverage { defective_scopes });
    }
    Ok(())
}

pub(crate) fn submit(
    catalog: &CatalogFixture,
    submission: &SubmissionFixture,
    config: &AppConfig,
) -> Result<SubmissionOutcome, AppError> {
    let service = build_service(catalog, Arc::new(InMemoryHistoryStore::default()), config);
    let performed_at = submission.performed_at.unwrap_or_else(Utc::now);

    Ok(service.submit(
        &submission.subject,
        &submission.answers,
        &submission.profile,
        performed_at,
    )?)
}

pub(crate) fn write_legacy_csv<W: Write>(out: W, record: &LegacyRecord) -> Result<(), AppError> {
    let mut writer = CsvLegacyWriter::new(out);
    writer.write(record)?;
    writer.finish()?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<(), AppError> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{rendered}");
    Ok(())
}

fn highest_band(bands: &[ScoringBand]) -> u32 {
    bands.iter().map(|band| band.max_score).max().unwrap_or(0)
}

fn describe_issue(issue: &CoverageIssue) -> String {
    match issue {
        CoverageIssue::Gap { from, to } => format!("gap: scores {from}-{to} match no band"),
        CoverageIssue::Overlap {
            first,
            second,
            from,
            to,
        } => format!("overlap: bands #{first} and #{second} both match {from}-{to}"),
        CoverageIssue::Inverted {
            index,
            min_score,
            max_score,
        } => format!("inverted: band #{index} has min {min_score} above max {max_score}"),
    }
}

fn parse_window(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(format!("'{raw}' is not a positive integer")),
    }
}
