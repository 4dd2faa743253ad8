use api_shared::dto::IntakeReq;
use clap::{Parser, Subcommand};
use clinic_core::{
    db::{current_version, open_database},
    resolve_principal, CoreConfig, FulfilmentService, PatientService, PrescriptionDetail,
    PrescriptionStatus,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic front desk and pharmacy CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database if needed and apply pending migrations
    Migrate,
    /// Register a patient at the front desk
    Intake {
        /// Queue ticket, e.g. A-025
        queue_number: String,
        /// Patient name
        name: String,
        #[arg(long)]
        age: Option<i64>,
        #[arg(long)]
        phone: Option<String>,
        /// Presenting complaint
        #[arg(long)]
        complaint: Option<String>,
        /// Appointment time (RFC 3339)
        #[arg(long)]
        appointment_time: Option<String>,
    },
    /// List patients
    List {
        /// Only patients with this status
        #[arg(long)]
        status: Option<String>,
    },
    /// List prescriptions, newest first
    Prescriptions {
        /// pending, preparing or ready
        #[arg(long)]
        status: Option<String>,
    },
    /// Show a prescription with its patient, diagnosis and items
    ShowPrescription {
        /// Prescription number, e.g. R-20261016-0001
        number: String,
    },
    /// Start preparing a pending prescription
    Preparing {
        number: String,
        /// Acting pharmacist's user id
        #[arg(long)]
        user_id: String,
    },
    /// Mark a prescription ready for collection
    Ready {
        number: String,
        /// Acting pharmacist's user id
        #[arg(long)]
        user_id: String,
    },
}

fn config_from_env() -> anyhow::Result<Arc<CoreConfig>> {
    Ok(Arc::new(CoreConfig::from_env_values(
        std::env::var("CLINIC_DATABASE_PATH").ok(),
        std::env::var("CLINIC_PRESCRIPTION_PREFIX").ok(),
        std::env::var("CLINIC_BUSY_TIMEOUT_MS").ok(),
    )?))
}

fn print_detail(detail: &PrescriptionDetail) {
    println!("Prescription: {}", detail.prescription_number);
    println!("Status:       {}", detail.status);
    println!("Patient:      {}", detail.patient_name);
    println!("Doctor:       {}", detail.doctor_name);
    println!("Diagnosis:    {}", detail.diagnosis);
    println!("Created:      {}", detail.created_at);
    for item in &detail.items {
        println!(
            "  {}. {} {} x{}{}",
            item.position + 1,
            item.medicine_name,
            item.dosage,
            item.quantity,
            item.instructions
                .as_deref()
                .map(|i| format!(" ({})", i))
                .unwrap_or_default()
        );
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Migrate) => {
            let cfg = config_from_env()?;
            let conn = open_database(&cfg)?;
            println!(
                "Database {} is at schema version {}",
                cfg.database_path().display(),
                current_version(&conn)
            );
        }
        Some(Commands::Intake {
            queue_number,
            name,
            age,
            phone,
            complaint,
            appointment_time,
        }) => {
            let request = IntakeReq {
                queue_number,
                name,
                age,
                phone,
                complaint,
                appointment_time,
            };
            let patient = PatientService::new(config_from_env()?).intake(request.into_new_patient()?)?;
            println!(
                "Registered {} (queue {}) with ID: {}",
                patient.name, patient.queue_number, patient.id
            );
        }
        Some(Commands::List { status }) => {
            let patients = PatientService::new(config_from_env()?).list(status.as_deref())?;
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                for patient in patients {
                    println!(
                        "ID: {}, Queue: {}, Name: {}, Status: {}, Created: {}",
                        patient.id,
                        patient.queue_number,
                        patient.name,
                        patient.status.as_deref().unwrap_or("-"),
                        patient.created_at
                    );
                }
            }
        }
        Some(Commands::Prescriptions { status }) => {
            let status = status
                .as_deref()
                .map(str::parse::<PrescriptionStatus>)
                .transpose()?;
            let prescriptions = FulfilmentService::new(config_from_env()?).list_prescriptions(status)?;
            if prescriptions.is_empty() {
                println!("No prescriptions found.");
            } else {
                for p in prescriptions {
                    println!(
                        "{} [{}] {} by {}, {} item(s), {}",
                        p.prescription_number,
                        p.status,
                        p.patient_name,
                        p.doctor_name,
                        p.item_count,
                        p.created_at
                    );
                }
            }
        }
        Some(Commands::ShowPrescription { number }) => {
            let detail = FulfilmentService::new(config_from_env()?).prescription_detail(&number)?;
            print_detail(&detail);
        }
        Some(Commands::Preparing { number, user_id }) => {
            let cfg = config_from_env()?;
            let pharmacist = resolve_principal(&cfg, &user_id)?;
            let detail = FulfilmentService::new(cfg).start_preparing(&pharmacist, &number)?;
            print_detail(&detail);
        }
        Some(Commands::Ready { number, user_id }) => {
            let cfg = config_from_env()?;
            let pharmacist = resolve_principal(&cfg, &user_id)?;
            let detail = FulfilmentService::new(cfg).mark_ready(&pharmacist, &number)?;
            print_detail(&detail);
        }
        None => {
            println!("Use 'clinic --help' for commands");
        }
    }

    Ok(())
}
