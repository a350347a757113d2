// src/main.rs
//
// Operator CLI: loads attendance and reference sheets as row-of-cells
// tables, runs the allowance engines, writes the generated files, and keeps
// the archive store. Calculation stays pure and synchronous; the repository
// and archive file I/O are the only await points.

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::io::{BufRead, Write as IoWrite};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod adk;
mod adk_tukin;
mod archive;
mod attendance;
mod employee;
mod period;
mod rates;
mod reference_data;
mod sheet;
mod tunjangan;
mod uang_makan;

mod attendance_tests;

use archive::{
    save_or_conflict, ArchiveKind, ArchiveOutcome, ArchivePayload, ArchiveStore, JsonArchiveStore,
    NewArchive,
};
use employee::{EmployeeType, ExclusionList};
use period::Period;
use rates::RateSchedule;
use reference_data::{
    baselines_from_sheet, grades_from_sheet, BaselineRepository, GradeRepository,
    JsonBaselineRepository, JsonGradeRepository,
};
use sheet::Sheet;

// --- Configuration ---

#[derive(Debug, Deserialize)]
struct AppConfig {
    /// Directory holding the reference lists and the archive file.
    data_dir: Option<PathBuf>,
}

impl AppConfig {
    fn from_env() -> Result<Self, envy::Error> {
        envy::from_env::<AppConfig>()
    }

    fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| PathBuf::from("data"))
    }
}

// --- CLI ---

#[derive(Parser)]
#[command(
    name = "tunkin-core",
    about = "Uang makan and tunjangan kinerja calculation from attendance sheets"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EmployeeTypeArg {
    Cpns,
    Pns,
    Pppk,
}

impl From<EmployeeTypeArg> for EmployeeType {
    fn from(value: EmployeeTypeArg) -> Self {
        match value {
            EmployeeTypeArg::Cpns => EmployeeType::Cpns,
            EmployeeTypeArg::Pns => EmployeeType::Pns,
            EmployeeTypeArg::Pppk => EmployeeType::Pppk,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScheduleArg {
    Standard,
    Viewer,
}

impl From<ScheduleArg> for RateSchedule {
    fn from(value: ScheduleArg) -> Self {
        match value {
            ScheduleArg::Standard => RateSchedule::Standard,
            ScheduleArg::Viewer => RateSchedule::Viewer,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Compute meal allowances from an attendance sheet.
    UangMakan {
        /// Attendance sheet (CSV; NAMA/NIP plus day-of-month columns).
        #[arg(long)]
        sheet: PathBuf,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        year: Option<i32>,
        /// Output path for the result sheet.
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "standard")]
        schedule: ScheduleArg,
    },
    /// Generate the ADK UM disbursement extract for one employment category.
    AdkUm {
        #[arg(long)]
        sheet: PathBuf,
        #[arg(long, value_enum)]
        employee_type: EmployeeTypeArg,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        year: Option<i32>,
        /// Directory the extract file is written into.
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Overwrite a duplicate archive entry without prompting.
        #[arg(long)]
        replace: bool,
        /// Generate and write the file but skip the archive entirely.
        #[arg(long)]
        no_archive: bool,
    },
    /// Aggregate check-in rows and apply tunjangan kinerja deductions.
    Tunjangan {
        /// Check-in export (CSV; NAMA, NIP_BARU, TANGGAL_WITA, ...).
        #[arg(long)]
        checkins: PathBuf,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        replace: bool,
        #[arg(long)]
        no_archive: bool,
    },
    /// Merge post-confirmation amounts into an ADK Tukin template.
    AdkTukin {
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        post_confirmation: PathBuf,
        /// Employment-category label, e.g. "PNS" or "CPNS Mandiri".
        #[arg(long)]
        label: String,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        replace: bool,
        #[arg(long)]
        no_archive: bool,
    },
    /// Search the raw check-in export by employee name or NIP.
    Cari {
        #[arg(long)]
        checkins: PathBuf,
        #[arg(long)]
        term: String,
    },
    /// Browse or prune the archive.
    Arsip {
        #[command(subcommand)]
        action: ArsipAction,
    },
    /// Load an employee grade reference sheet into the data directory.
    ImportGrades {
        #[arg(long)]
        sheet: PathBuf,
    },
    /// Load a tunjangan kinerja baseline sheet into the data directory.
    ImportBaselines {
        #[arg(long)]
        sheet: PathBuf,
    },
}

#[derive(Subcommand)]
enum ArsipAction {
    List {
        #[arg(long, value_enum)]
        kind: Option<ArchiveKindArg>,
    },
    Delete {
        #[arg(long)]
        id: u64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ArchiveKindArg {
    AdkUm,
    Tunjangan,
    AdkTukin,
}

impl From<ArchiveKindArg> for ArchiveKind {
    fn from(value: ArchiveKindArg) -> Self {
        match value {
            ArchiveKindArg::AdkUm => ArchiveKind::AdkUangMakan,
            ArchiveKindArg::Tunjangan => ArchiveKind::TunjanganKinerja,
            ArchiveKindArg::AdkTukin => ArchiveKind::AdkTukin,
        }
    }
}

// --- Entry point ---

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting tracing subscriber failed")?;

    let config = AppConfig::from_env().context("Reading configuration from environment")?;
    let data_dir = config.data_dir();

    let grades = JsonGradeRepository::new(data_dir.join("employee_grades.json"));
    let baselines = JsonBaselineRepository::new(data_dir.join("tunjangan_kinerja.json"));
    let archives = JsonArchiveStore::new(data_dir.join("archives.json"));

    let cli = Cli::parse();
    match cli.command {
        Command::UangMakan {
            sheet,
            month,
            year,
            out,
            schedule,
        } => {
            let period = resolve_period(month, year)?;
            run_uang_makan(&sheet, period, out, schedule.into(), &grades).await
        }
        Command::AdkUm {
            sheet,
            employee_type,
            month,
            year,
            out_dir,
            replace,
            no_archive,
        } => {
            let period = resolve_period(month, year)?;
            run_adk_um(
                &sheet,
                employee_type.into(),
                period,
                out_dir,
                ArchiveMode::new(replace, no_archive),
                &grades,
                &archives,
            )
            .await
        }
        Command::Tunjangan {
            checkins,
            month,
            year,
            out,
            replace,
            no_archive,
        } => {
            let period = resolve_period(month, year)?;
            run_tunjangan(
                &checkins,
                period,
                out,
                ArchiveMode::new(replace, no_archive),
                &baselines,
                &archives,
            )
            .await
        }
        Command::AdkTukin {
            template,
            post_confirmation,
            label,
            month,
            year,
            out,
            replace,
            no_archive,
        } => {
            let period = resolve_period(month, year)?;
            run_adk_tukin(
                &template,
                &post_confirmation,
                &label,
                period,
                out,
                ArchiveMode::new(replace, no_archive),
                &archives,
            )
            .await
        }
        Command::Cari { checkins, term } => run_cari(&checkins, &term),
        Command::Arsip { action } => run_arsip(action, &archives).await,
        Command::ImportGrades { sheet } => run_import_grades(&sheet, &grades).await,
        Command::ImportBaselines { sheet } => run_import_baselines(&sheet, &baselines).await,
    }
}

/// Defaults to the current month when the operator gives no period.
fn resolve_period(month: Option<u32>, year: Option<i32>) -> Result<Period> {
    let today = Local::now().date_naive();
    let period = Period::new(
        year.unwrap_or_else(|| today.year()),
        month.unwrap_or_else(|| today.month()),
    )?;
    Ok(period)
}

#[derive(Clone, Copy)]
struct ArchiveMode {
    replace: bool,
    skip: bool,
}

impl ArchiveMode {
    fn new(replace: bool, skip: bool) -> Self {
        Self { replace, skip }
    }
}

/// Interactive replace-or-cancel gate for duplicate archive periods. The
/// generated file is already on disk at this point; only the archive write
/// waits on the answer.
fn confirm_replace(existing_file: &str) -> Result<bool> {
    print!(
        "An archive entry already exists ({}). Replace it? [y/N] ",
        existing_file
    );
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

async fn archive_with_confirmation(
    store: &dyn ArchiveStore,
    new: NewArchive,
    mode: ArchiveMode,
) -> Result<()> {
    if mode.skip {
        info!("Archive step skipped (--no-archive)");
        return Ok(());
    }
    match save_or_conflict(store, new).await? {
        ArchiveOutcome::Saved(record) => {
            info!("Saved to archive as {} (id {})", record.file_name, record.id);
        }
        ArchiveOutcome::Conflict { existing, pending } => {
            if mode.replace || confirm_replace(&existing.file_name)? {
                let record = store.replace(existing.id, pending).await?;
                info!("Archive entry replaced with {}", record.file_name);
            } else {
                warn!("Archive not updated; generated file kept on disk only");
            }
        }
    }
    Ok(())
}

fn source_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sheet".to_string())
}

// --- Command handlers ---

async fn run_uang_makan(
    sheet_path: &Path,
    period: Period,
    out: Option<PathBuf>,
    schedule: RateSchedule,
    grades: &impl GradeRepository,
) -> Result<()> {
    let sheet = Sheet::read_csv(sheet_path)
        .with_context(|| format!("Reading attendance sheet {}", sheet_path.display()))?;
    sheet.validate_meal_header()?;

    let grade_list = grades.all().await.context("Loading employee grades")?;
    let results = uang_makan::calculate_uang_makan(Some(&sheet), &grade_list, schedule);
    info!(
        "Calculated uang makan for {} employees (period {})",
        results.len(),
        period
    );

    let out_path = out.unwrap_or_else(|| {
        PathBuf::from(format!(
            "uang_makan_calculation_{}_{}.csv",
            period.ym_compact(),
            Local::now().date_naive()
        ))
    });
    uang_makan::result_sheet(&results).write_csv(&out_path)?;
    info!("Result sheet written to {}", out_path.display());
    Ok(())
}

async fn run_adk_um(
    sheet_path: &Path,
    employee_type: EmployeeType,
    period: Period,
    out_dir: Option<PathBuf>,
    mode: ArchiveMode,
    grades: &impl GradeRepository,
    archives: &JsonArchiveStore,
) -> Result<()> {
    let sheet = Sheet::read_csv(sheet_path)
        .with_context(|| format!("Reading attendance sheet {}", sheet_path.display()))?;
    sheet.validate_meal_header()?;
    if sheet.is_empty() {
        warn!("No data available to generate the WFO extract");
        return Ok(());
    }

    let extract = adk::generate_extract(
        &sheet,
        employee_type,
        period,
        &ExclusionList::adk_extract(),
    );
    let file_name = adk::extract_file_name(employee_type, period, &source_stem(sheet_path));

    let out_dir = out_dir.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)?;
    let out_path = out_dir.join(&file_name);
    std::fs::write(&out_path, &extract)?;
    info!(
        "Extract with {} lines written to {}",
        if extract.is_empty() { 0 } else { extract.lines().count() },
        out_path.display()
    );

    // The archived snapshot carries the calculation slice for this category.
    let grade_list = grades.all().await.context("Loading employee grades")?;
    let results =
        uang_makan::calculate_uang_makan(Some(&sheet), &grade_list, RateSchedule::Standard);
    let snapshot = adk::scoped_results(&results, employee_type);

    archive_with_confirmation(
        archives,
        NewArchive {
            kind: ArchiveKind::AdkUangMakan,
            employee_type: Some(employee_type.as_str().to_string()),
            period,
            file_name,
            payload: ArchivePayload::Text(extract),
            calculation_results: serde_json::to_value(&snapshot)?,
        },
        mode,
    )
    .await
}

async fn run_tunjangan(
    checkins_path: &Path,
    period: Period,
    out: Option<PathBuf>,
    mode: ArchiveMode,
    baselines: &impl BaselineRepository,
    archives: &JsonArchiveStore,
) -> Result<()> {
    let sheet = Sheet::read_csv(checkins_path)
        .with_context(|| format!("Reading check-in export {}", checkins_path.display()))?;
    let rows = attendance::checkin_rows_from_sheet(&sheet);
    let records = attendance::aggregate_attendance(&rows);

    let baseline_list = baselines.all().await.context("Loading baselines")?;
    let records = tunjangan::apply_deductions(records, &baseline_list);
    if let (Some(start), Some(end)) = (period.first_day(), period.last_day()) {
        info!(
            "Processed attendance for {} employees ({} to {})",
            records.len(),
            start,
            end
        );
    }

    let exclusions = ExclusionList::reporting();
    let out_path = out.unwrap_or_else(|| {
        PathBuf::from(format!(
            "tunjangan_kinerja_calculation_{}_{}.csv",
            period.ym_compact(),
            Local::now().date_naive()
        ))
    });
    let result = tunjangan::result_sheet(&records, &exclusions);
    result.write_csv(&out_path)?;
    info!("Result sheet written to {}", out_path.display());

    let filtered: Vec<_> = records
        .iter()
        .filter(|r| !exclusions.is_excluded(&r.nip))
        .collect();
    let file_name = out_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tunjangan_kinerja_calculation.csv".to_string());

    archive_with_confirmation(
        archives,
        NewArchive {
            kind: ArchiveKind::TunjanganKinerja,
            employee_type: None,
            period,
            file_name,
            payload: ArchivePayload::Rows(result.rows().to_vec()),
            calculation_results: serde_json::to_value(&filtered)?,
        },
        mode,
    )
    .await
}

async fn run_adk_tukin(
    template_path: &Path,
    post_confirmation_path: &Path,
    label: &str,
    period: Period,
    out: Option<PathBuf>,
    mode: ArchiveMode,
    archives: &JsonArchiveStore,
) -> Result<()> {
    let template = Sheet::read_csv(template_path)
        .with_context(|| format!("Reading ADK Tukin template {}", template_path.display()))?;
    let post_sheet = Sheet::read_csv(post_confirmation_path).with_context(|| {
        format!(
            "Reading post-confirmation sheet {}",
            post_confirmation_path.display()
        )
    })?;

    let post_rows = adk_tukin::post_confirmation_from_sheet(&post_sheet);
    let reconciled = adk_tukin::reconcile_template(&template, &post_rows, period)?;

    let file_name = format!("{}.csv", adk_tukin::tukin_file_name(label, period));
    let out_path = out.unwrap_or_else(|| PathBuf::from(&file_name));
    reconciled.write_csv(&out_path)?;
    info!("Reconciled template written to {}", out_path.display());

    let mut payload_rows = vec![reconciled.headers().to_vec()];
    payload_rows.extend(reconciled.rows().iter().cloned());

    archive_with_confirmation(
        archives,
        NewArchive {
            kind: ArchiveKind::AdkTukin,
            employee_type: Some(label.to_string()),
            period,
            file_name,
            payload: ArchivePayload::Rows(payload_rows),
            calculation_results: serde_json::Value::Null,
        },
        mode,
    )
    .await
}

fn run_cari(checkins_path: &Path, term: &str) -> Result<()> {
    let sheet = Sheet::read_csv(checkins_path)
        .with_context(|| format!("Reading check-in export {}", checkins_path.display()))?;
    match attendance::search_rows(&sheet, term) {
        Some(found) => {
            println!("{}", found.headers().join("\t"));
            for row in found.rows() {
                println!("{}", row.join("\t"));
            }
            info!("{} rows matched '{}'", found.rows().len(), term);
        }
        None => println!("No attendance rows match '{}'.", term),
    }
    Ok(())
}

async fn run_arsip(action: ArsipAction, archives: &JsonArchiveStore) -> Result<()> {
    match action {
        ArsipAction::List { kind } => {
            let records = archives.list(kind.map(Into::into)).await?;
            if records.is_empty() {
                println!("Archive is empty.");
                return Ok(());
            }
            for record in records {
                println!(
                    "#{:<4} {:?} {:>7} {}  {}",
                    record.id,
                    record.kind,
                    record.employee_type.as_deref().unwrap_or("-"),
                    record.period,
                    record.file_name
                );
            }
        }
        ArsipAction::Delete { id } => {
            if archives.delete(id).await? {
                info!("Deleted archive record {}", id);
            } else {
                warn!("No archive record with id {}", id);
            }
        }
    }
    Ok(())
}

async fn run_import_grades(sheet_path: &Path, grades: &impl GradeRepository) -> Result<()> {
    let sheet = Sheet::read_csv(sheet_path)
        .with_context(|| format!("Reading grade sheet {}", sheet_path.display()))?;
    let imported = grades_from_sheet(&sheet);
    let count = imported.len();
    for grade in imported {
        grades.upsert(grade).await?;
    }
    grades.refresh().await?;
    info!("Imported {} employee grades", count);
    Ok(())
}

async fn run_import_baselines(
    sheet_path: &Path,
    baselines: &impl BaselineRepository,
) -> Result<()> {
    let sheet = Sheet::read_csv(sheet_path)
        .with_context(|| format!("Reading baseline sheet {}", sheet_path.display()))?;
    let imported = baselines_from_sheet(&sheet);
    let count = imported.len();
    for baseline in imported {
        baselines.upsert(baseline).await?;
    }
    baselines.refresh().await?;
    info!("Imported {} tunjangan kinerja baselines", count);
    Ok(())
}
