use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use multicare_core::access::Actor;
use multicare_core::auth::{Signup, signup};
use multicare_core::config::token_ttl_from_env_value;
use multicare_core::db::current_schema_version;
use multicare_core::model::{NewBed, NewStaff, Role};
use multicare_core::reporting::{ipd_active, opd_by_date};
use multicare_core::repositories::users;
use multicare_core::workflow::{add_bed, add_staff, high_priority_alerts, list_doctors};
use multicare_core::{
    Connection, CoreConfig, DEFAULT_DATABASE_PATH, DEFAULT_UPLOAD_DIR, EmailAddress, NonEmptyText,
    Store,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multicare")]
#[command(about = "Multicare hospital backend operator CLI")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "DATABASE_PATH", default_value = DEFAULT_DATABASE_PATH)]
    database: PathBuf,
    /// Root directory for uploaded documents
    #[arg(long, global = true, env = "UPLOAD_DIR", default_value = DEFAULT_UPLOAD_DIR)]
    upload_dir: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate,
    /// Create a login account (doctor, nurse or patient)
    CreateUser {
        email: String,
        /// Full name; staff accounts need a first and last name
        full_name: String,
        /// doctor, nurse or patient
        role: String,
        #[arg(long, env = "MULTICARE_PASSWORD")]
        password: String,
        #[arg(long)]
        specialization: Option<String>,
    },
    /// Add a staff directory entry without a login
    AddStaff {
        first_name: String,
        last_name: String,
        /// doctor or nurse
        role: String,
        #[arg(long)]
        specialization: Option<String>,
        /// Email of the staff account performing the change
        #[arg(long = "as")]
        acting_as: String,
    },
    /// Add a bed
    AddBed {
        bed_number: String,
        #[arg(long)]
        ward: Option<String>,
        #[arg(long = "as")]
        acting_as: String,
    },
    /// List doctors
    Doctors,
    /// Patients triaged Resuscitation or Emergency
    Alerts {
        #[arg(long = "as")]
        acting_as: String,
    },
    /// Outpatient appointments for one day
    Opd {
        /// Day to list (YYYY-MM-DD)
        date: NaiveDate,
        #[arg(long = "as")]
        acting_as: String,
    },
    /// Currently admitted patients
    Ipd {
        #[arg(long = "as")]
        acting_as: String,
    },
}

/// Resolves `--as` to the account it names. The CLI acts with that account's role.
fn acting_user(conn: &Connection, email: &str) -> anyhow::Result<Actor> {
    let email = EmailAddress::parse(email)?;
    match users::find_by_email(conn, &email)? {
        Some(user) => Ok(user.into()),
        None => bail!("no account registered for {email}"),
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'multicare --help' for commands");
        return Ok(());
    };

    let token_ttl = token_ttl_from_env_value(std::env::var("TOKEN_TTL_MINUTES").ok())?;
    let cfg = CoreConfig::new(cli.database.clone(), cli.upload_dir.clone(), token_ttl)?;
    let store = Store::open(cfg.database_path())
        .with_context(|| format!("opening {}", cfg.database_path().display()))?;
    let mut conn = store.connection()?;

    match command {
        Commands::Migrate => {
            cfg.prepare_upload_dir()?;
            println!(
                "Database {} is at schema version {}",
                cfg.database_path().display(),
                current_schema_version(&conn)
            );
        }
        Commands::CreateUser {
            email,
            full_name,
            role,
            password,
            specialization,
        } => {
            let user = signup(
                &mut conn,
                &cfg,
                Signup {
                    email: EmailAddress::parse(&email)?,
                    password,
                    full_name: NonEmptyText::new(&full_name)?,
                    role: role.parse()?,
                    specialization: NonEmptyText::optional(specialization),
                },
            )?;
            println!("Created {} account {} ({})", user.role, user.email, user.id);
        }
        Commands::AddStaff {
            first_name,
            last_name,
            role,
            specialization,
            acting_as,
        } => {
            let actor = acting_user(&conn, &acting_as)?;
            let staff = add_staff(
                &mut conn,
                &actor,
                NewStaff {
                    first_name: NonEmptyText::new(&first_name)?,
                    last_name: NonEmptyText::new(&last_name)?,
                    role: role.parse::<Role>()?,
                    specialization: NonEmptyText::optional(specialization),
                },
            )?;
            println!("Added {} {} ({})", staff.role, staff.display_name(), staff.id);
        }
        Commands::AddBed {
            bed_number,
            ward,
            acting_as,
        } => {
            let actor = acting_user(&conn, &acting_as)?;
            let bed = add_bed(
                &mut conn,
                &actor,
                NewBed {
                    bed_number: NonEmptyText::new(&bed_number)?,
                    ward: NonEmptyText::optional(ward),
                },
            )?;
            println!("Added bed {} ({})", bed.bed_number, bed.id);
        }
        Commands::Doctors => {
            let doctors = list_doctors(&conn)?;
            if doctors.is_empty() {
                println!("No doctors registered.");
            }
            for doctor in doctors {
                let specialization = doctor
                    .specialization
                    .as_ref()
                    .map(|s| s.as_str())
                    .unwrap_or("-");
                println!("{}  {}  {}", doctor.id, doctor.display_name(), specialization);
            }
        }
        Commands::Alerts { acting_as } => {
            let actor = acting_user(&conn, &acting_as)?;
            let patients = high_priority_alerts(&conn, &actor)?;
            if patients.is_empty() {
                println!("No high-priority patients.");
            }
            for patient in patients {
                let level = patient
                    .triage_level
                    .map(|l| l.to_string())
                    .unwrap_or_default();
                println!("{}  {}  {}", patient.id, level, patient.display_name());
            }
        }
        Commands::Opd { date, acting_as } => {
            let actor = acting_user(&conn, &acting_as)?;
            for row in opd_by_date(&conn, &actor, date)? {
                println!(
                    "{}  {}  {} with {}",
                    row.appointment_time.format("%H:%M"),
                    row.status,
                    row.patient_name,
                    row.doctor_name
                );
            }
        }
        Commands::Ipd { acting_as } => {
            let actor = acting_user(&conn, &acting_as)?;
            for row in ipd_active(&conn, &actor)? {
                println!(
                    "{}  room {}  {} (Dr {}) since {}",
                    row.admission_id,
                    row.room_number,
                    row.patient_name,
                    row.doctor_name,
                    row.admission_date.format("%Y-%m-%d %H:%M")
                );
            }
        }
    }

    Ok(())
}
