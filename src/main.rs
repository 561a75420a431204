//! Premium Time Series CLI
//!
//! Runs month-end premium observations for a set of positions and writes
//! them to CSV

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use premium_timeseries::agreement::{AgreementProduct, AgreementRecord, AgreementRegistry, AgreementVersion};
use premium_timeseries::domain::{AgreementId, Kroner, Percentage, PositionId, PremiumStatus};
use premium_timeseries::periodize::load_positions;
use premium_timeseries::premium::{PercentRates, RateTable};
use premium_timeseries::publish::{CollectingPublisher, CsvPublisher, LogFailures};
use premium_timeseries::timeseries::{MeasureRules, Publisher};
use premium_timeseries::wages::{PayGrade, WageGradeRecord, WageGradeTable};
use premium_timeseries::{
    Observation, PipelineConfig, PositionHistory, PositionRecord, Product, TimeSeriesOrchestrator,
    TimeSeriesRunner,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "premium_timeseries", about = "Month-end pension premium observations")]
struct Args {
    /// JSON pipeline config (first_year, last_year, parallel)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Position records CSV; a built-in demo set is used when absent
    #[arg(short, long, value_name = "FILE")]
    positions: Option<PathBuf>,

    /// Output CSV
    #[arg(short, long, value_name = "FILE", default_value = "premium_timeseries.csv")]
    output: PathBuf,

    #[arg(long)]
    first_year: Option<i32>,

    #[arg(long)]
    last_year: Option<i32>,

    /// Process positions on all cores
    #[arg(long)]
    parallel: bool,
}

/// Forwards every observation to both publishers
struct Tee {
    csv: Arc<CsvPublisher<BufWriter<File>>>,
    collected: Arc<CollectingPublisher>,
}

impl Publisher for Tee {
    fn publish(&self, observation: Observation) -> premium_timeseries::Result<()> {
        self.csv.publish(observation.clone())?;
        self.collected.publish(observation)
    }
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).with_context(|| format!("invalid date {}-{}-{}", year, month, day))
}

fn percent_rates(employer: u32, member: u32, admin_fee: &str) -> Result<RateTable> {
    Ok(RateTable::Percent(PercentRates {
        employer: Percentage::percent(employer),
        member: Percentage::percent(member),
        admin_fee: Percentage::percent(admin_fee.parse::<rust_decimal::Decimal>()?),
    }))
}

fn demo_agreements() -> Result<AgreementRegistry> {
    let start = date(2000, 1, 1)?;
    let mut records = Vec::new();
    for (agreement, employer) in [(100, 20), (200, 12)] {
        records.push(AgreementRecord::Version(AgreementVersion {
            agreement: AgreementId(agreement),
            from: start,
            to: None,
            version: 1,
        }));
        records.push(AgreementRecord::Product(AgreementProduct {
            agreement: AgreementId(agreement),
            product: Product::Pension,
            from: start,
            to: None,
            rates: percent_rates(employer, 2, "0.25")?,
        }));
        records.push(AgreementRecord::Product(AgreementProduct {
            agreement: AgreementId(agreement),
            product: Product::Disability,
            from: start,
            to: None,
            rates: percent_rates(1, 0, "0")?,
        }));
    }
    records.push(AgreementRecord::Product(AgreementProduct {
        agreement: AgreementId(100),
        product: Product::SupplementaryPension,
        from: start,
        to: None,
        rates: percent_rates(3, 0, "0")?,
    }));
    Ok(AgreementRegistry::from_records(records))
}

fn demo_wage_grades() -> Result<WageGradeTable> {
    let scale = [(40, 420_000), (45, 480_000), (50, 560_000)];
    let mut rows = Vec::new();
    for (from, to, raise) in [(date(2011, 1, 1)?, Some(date(2012, 4, 30)?), 0), (date(2012, 5, 1)?, None, 12_000)] {
        for (grade, salary) in scale {
            rows.push(WageGradeRecord {
                grade: PayGrade(grade),
                from,
                to,
                annual_salary: Kroner::new(salary + raise),
            });
        }
    }
    Ok(WageGradeTable::from_records(rows))
}

fn demo_positions() -> Result<Vec<PositionHistory>> {
    let active = PremiumStatus("active".to_string());
    Ok(vec![
        // Terminated at the end of May 2012
        PositionHistory::new(
            PositionId(1001),
            vec![
                PositionRecord::new(date(2010, 8, 1)?, Some(date(2012, 5, 31)?), AgreementId(100), Percentage::FULL)
                    .with_salary(Kroner::new(366_000)),
            ],
        ),
        // Changes agreement mid-year
        PositionHistory::new(
            PositionId(1002),
            vec![
                PositionRecord::new(date(2011, 3, 1)?, Some(date(2012, 6, 30)?), AgreementId(100), Percentage::FULL)
                    .with_pay_grade(PayGrade(45)),
                PositionRecord::new(date(2012, 7, 1)?, None, AgreementId(200), Percentage::percent(80))
                    .with_pay_grade(PayGrade(50)),
            ],
        )
        .with_premium_status(active.clone()),
        // Part time, starts in March
        PositionHistory::new(
            PositionId(1003),
            vec![PositionRecord::new(date(2012, 3, 15)?, None, AgreementId(200), Percentage::percent(60))
                .with_pay_grade(PayGrade(40))],
        )
        .with_premium_status(active),
    ])
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("Premium Time Series v0.1.0");
    println!("==========================\n");

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(year) = args.first_year {
        config.first_year = year;
    }
    if let Some(year) = args.last_year {
        config.last_year = year;
    }
    config.parallel |= args.parallel;
    config.validate()?;

    let histories = match &args.positions {
        Some(path) => load_positions(path).with_context(|| format!("loading positions {}", path.display()))?,
        None => demo_positions()?,
    };
    println!("Positions: {}", histories.len());
    println!("  Window: {}-{}", config.first_year, config.last_year);
    println!("  Parallel: {}", config.parallel);
    println!();

    let file = File::create(&args.output).with_context(|| format!("creating {}", args.output.display()))?;
    let csv = Arc::new(CsvPublisher::new(BufWriter::new(file)));
    let collected = Arc::new(CollectingPublisher::new());
    let publisher = Arc::new(Tee {
        csv: csv.clone(),
        collected: collected.clone(),
    });

    let orchestrator = TimeSeriesOrchestrator::new(MeasureRules::default(), publisher, Arc::new(LogFailures));
    let runner = TimeSeriesRunner::new(
        config,
        Arc::new(demo_wage_grades()?),
        Arc::new(demo_agreements()?),
        orchestrator,
    )?;
    let summary = runner.run(&histories);
    csv.flush()?;

    let mut observations = collected.drain();
    observations.sort_by_key(|o| (o.position, o.observation_date, o.agreement));

    println!("Year-end observations:");
    println!(
        "{:>8} {:>9} {:>10} {:>14} {:>8} {:>12} {:>12} {:>12}",
        "Position", "Agreement", "Date", "MachineBasis", "ManYrs", "PEN", "UFO", "Total"
    );
    println!("{}", "-".repeat(94));
    for o in observations.iter().filter(|o| o.observation_date.format("%m-%d").to_string() == "12-31") {
        println!(
            "{:>8} {:>9} {:>10} {:>14.2} {:>8.4} {:>12} {:>12} {:>12}",
            o.position.0,
            o.agreement.0,
            o.observation_date,
            o.machine_basis.value(),
            o.man_years,
            o.premium(Product::Pension).total()?.value(),
            o.premium(Product::Disability).total()?.value(),
            o.total_premium()?.value(),
        );
    }

    println!("\nFull results written to: {}", args.output.display());

    println!("\nSummary:");
    println!("  Positions: {}", summary.positions);
    println!("  Succeeded: {}", summary.succeeded());
    println!("  Failed: {}", summary.failed);
    println!("  Observations: {}", summary.observations);
    println!("  Publish failures: {}", summary.publish_failures);

    Ok(())
}
