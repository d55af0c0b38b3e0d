use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod aggregate;
mod alerts;
mod calendar;
mod db;
mod live;
mod models;
mod normalize;
mod report;
mod session;

use models::YearMonth;
use session::Session;

#[derive(Parser)]
#[command(name = "intern-attendance")]
#[command(about = "Attendance tracking for the internship program", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Record a check-in for the signed-in intern
    CheckIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Record the day as absent instead of present
        #[arg(long)]
        absent: bool,
    },
    /// Weekly attendance overview (admin or moderator)
    Week {
        #[arg(long)]
        email: String,
        /// Any date inside the week to view; defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Monthly attendance overview (admin or moderator)
    Month {
        #[arg(long)]
        email: String,
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// Browse the intern directory
    Roster {
        #[arg(long)]
        email: String,
    },
    /// Record the minutes-of-meeting note for a week (admin or moderator)
    Note {
        #[arg(long)]
        email: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        text: String,
    },
    /// Live weekly overview, reprinted whenever the store changes
    Watch {
        #[arg(long)]
        email: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Generate a markdown report
    #[command(group(
        ArgGroup::new("period")
            .args(["date", "month"])
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        email: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        month: Option<YearMonth>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Import attendance rows from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
}

async fn signed_in_reviewer(pool: &PgPool, email: &str) -> anyhow::Result<Session> {
    let session = Session::sign_in(pool, email).await?;
    if !session.can_view_reports() {
        anyhow::bail!("access restricted: requires an admin or moderator role");
    }
    Ok(session)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the portal's Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::CheckIn { email, date, absent } => {
            let session = Session::sign_in(&pool, &email).await?;
            let date = date.unwrap_or_else(calendar::today);
            if db::check_in(&pool, &session.uid, date, !absent).await? {
                println!("Checked in {} for {date}.", session.name);
            } else {
                println!("{} already has a record for {date}.", session.name);
            }
            session.sign_out();
        }
        Commands::Week { email, date } => {
            let session = signed_in_reviewer(&pool, &email).await?;
            let week_start = calendar::week_start(date.unwrap_or_else(calendar::today));
            let records = db::fetch_attendance(&pool).await?;
            let roster = db::fetch_roster(&pool, db::ROSTER_ROLE).await?;
            let notes = db::fetch_notes(&pool).await?;
            print!("{}", report::week_overview(&roster, &records, &notes, week_start));
            session.sign_out();
        }
        Commands::Month { email, month } => {
            let session = signed_in_reviewer(&pool, &email).await?;
            let month = month.unwrap_or_else(|| YearMonth::of(calendar::today()));
            let records = db::fetch_attendance(&pool).await?;
            let roster = db::fetch_roster(&pool, db::ROSTER_ROLE).await?;
            print!("{}", report::month_overview(&roster, &records, month));
            session.sign_out();
        }
        Commands::Roster { email } => {
            let session = Session::sign_in(&pool, &email).await?;
            let roster = db::fetch_roster(&pool, db::ROSTER_ROLE).await?;
            print!("{}", report::roster_overview(&roster));
            session.sign_out();
        }
        Commands::Note { email, date, text } => {
            let session = signed_in_reviewer(&pool, &email).await?;
            let week_start = calendar::week_start(date);
            db::upsert_note(&pool, week_start, &text).await?;
            println!("Note recorded for week of {week_start}.");
            session.sign_out();
        }
        Commands::Watch { email, date } => {
            let session = signed_in_reviewer(&pool, &email).await?;
            let week_start = calendar::week_start(date.unwrap_or_else(calendar::today));

            let session = Rc::new(RefCell::new(session));
            let mut binder = live::LiveBinder::new(pool.clone(), db::ROSTER_ROLE);
            let watcher = Rc::clone(&session);
            let observer = binder.subscribe(move |snapshot| {
                let mut session = watcher.borrow_mut();
                session.refresh_role(&snapshot.roster);
                if !session.can_view_reports() {
                    log::warn!("access revoked for {}; suppressing output", session.email);
                    return;
                }
                println!(
                    "{}",
                    report::week_overview(
                        &snapshot.roster,
                        &snapshot.attendance,
                        &snapshot.notes,
                        week_start,
                    )
                );
            });

            binder.run().await?;
            binder.unsubscribe(observer);
            drop(binder);
            if let Ok(session) = Rc::try_unwrap(session) {
                session.into_inner().sign_out();
            }
        }
        Commands::Report {
            email,
            date,
            month,
            out,
        } => {
            let session = signed_in_reviewer(&pool, &email).await?;
            let period = match month {
                Some(ym) => report::ReportPeriod::Month(ym),
                None => report::ReportPeriod::Week(calendar::week_start(
                    date.unwrap_or_else(calendar::today),
                )),
            };
            let records = db::fetch_attendance(&pool).await?;
            let roster = db::fetch_roster(&pool, db::ROSTER_ROLE).await?;
            let notes = db::fetch_notes(&pool).await?;
            let report = report::build_report(&roster, &records, &notes, period);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
            session.sign_out();
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} attendance records from {}.", csv.display());
        }
    }

    Ok(())
}
