use clap::{Parser, Subcommand};
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clinic_core::constants::DEFAULT_PAGE_SIZE;
use clinic_core::export::{
    to_csv, LAB_ORDER_HEADERS, LAB_RESULT_HEADERS, PRESCRIPTION_HEADERS, STOCK_ITEM_HEADERS,
};
use clinic_core::lab::{LabOrderQuery, LabOrderRow, OrderStatusFilter};
use clinic_core::{paginate, ClinicError, ClinicResult, ClinicServices, EmrConfig, EmrUuid};
use openmrs::FulfillerStatus;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic front end over an OpenMRS EMR")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Show the logged-in user and session location
    Session,
    /// Search patients by name or identifier
    Patients {
        /// At least two characters
        query: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List the lab worklist
    LabOrders {
        /// `pending` or a fulfiller status such as IN_PROGRESS
        #[arg(long)]
        status: Option<String>,
        /// Patient uuid
        #[arg(long)]
        patient: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
        /// Print every matching order as CSV instead of one page
        #[arg(long)]
        csv: bool,
    },
    /// Show the results recorded for a lab order
    OrderResults {
        uuid: String,
        #[arg(long)]
        csv: bool,
    },
    /// Move a lab order to a new fulfiller status
    SetStatus {
        uuid: String,
        /// RECEIVED, IN_PROGRESS, COMPLETED, EXCEPTION, ...
        status: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// List a patient's active prescriptions
    Prescriptions {
        /// Patient uuid
        patient: String,
        #[arg(long)]
        csv: bool,
    },
    /// List stock items
    StockItems {
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        csv: bool,
    },
}

fn order_line(row: &LabOrderRow) -> String {
    format!(
        "{}  {}  {}  [{}]  {}",
        row.order_number, row.patient_name, row.test_name, row.status_label, row.uuid
    )
}

async fn run(services: &ClinicServices, command: Commands) -> ClinicResult<()> {
    match command {
        Commands::Session => {
            let profile = services.session.profile().await?;
            println!("User: {} ({})", profile.display, profile.username);
            match profile.session_location {
                Some(location) => println!("Location: {} ({})", location.name, location.uuid),
                None => println!("Location: not set"),
            }
        }
        Commands::Patients { query, limit } => {
            let patients = services.patients.search(&query, limit).await?;
            if patients.is_empty() {
                println!("No patients found.");
            }
            for patient in patients {
                println!(
                    "{}  {}  {}  {}",
                    patient.identifier, patient.name, patient.gender, patient.uuid
                );
            }
        }
        Commands::LabOrders {
            status,
            patient,
            page,
            page_size,
            csv,
        } => {
            let query = LabOrderQuery {
                patient: patient.as_deref().map(EmrUuid::parse).transpose()?,
                status: status
                    .as_deref()
                    .map(OrderStatusFilter::from_str)
                    .transpose()?,
                ..LabOrderQuery::default()
            };
            let rows = services.lab.list_orders(&query).await?;
            if csv {
                print!("{}", to_csv(&LAB_ORDER_HEADERS, &rows)?);
                return Ok(());
            }
            let page = paginate(rows, page, page_size)?;
            for row in &page.items {
                println!("{}", order_line(row));
            }
            println!(
                "Page {} of {} ({} orders)",
                page.page, page.total_pages, page.total_items
            );
        }
        Commands::OrderResults { uuid, csv } => {
            let results = services.lab.get_order_results(&EmrUuid::parse(&uuid)?).await?;
            if csv {
                print!("{}", to_csv(&LAB_RESULT_HEADERS, &results.rows)?);
                return Ok(());
            }
            println!("{}", order_line(&results.order));
            if results.needs_review {
                println!("Results could not be tied to this order; showing the whole encounter.");
            }
            for row in &results.rows {
                let flag = if row.critical { "  CRITICAL" } else { "" };
                println!(
                    "{}  {}: {} {}  ({}){}",
                    row.panel, row.test_name, row.value, row.units, row.reference_range, flag
                );
            }
        }
        Commands::SetStatus {
            uuid,
            status,
            comment,
        } => {
            let next = FulfillerStatus::from_str(&status)?;
            let row = services
                .lab
                .update_status(&EmrUuid::parse(&uuid)?, next, comment)
                .await?;
            println!("Order {} is now {}", row.order_number, row.status_label);
        }
        Commands::Prescriptions { patient, csv } => {
            let rows = services
                .pharmacy
                .active_prescriptions(&EmrUuid::parse(&patient)?)
                .await?;
            if csv {
                print!("{}", to_csv(&PRESCRIPTION_HEADERS, &rows)?);
                return Ok(());
            }
            if rows.is_empty() {
                println!("No active prescriptions.");
            }
            for row in rows {
                println!(
                    "{}  {}  {}  (by {}, {})",
                    row.medication, row.dosage, row.quantity, row.prescriber, row.date_written
                );
            }
        }
        Commands::StockItems { query, csv } => {
            let rows = services.stock.list_items(query.as_deref()).await?;
            if csv {
                print!("{}", to_csv(&STOCK_ITEM_HEADERS, &rows)?);
                return Ok(());
            }
            for row in rows {
                println!("{}  {}  {}", row.name, row.category, row.uuid);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'clinic --help' for commands");
        return Ok(());
    };

    let config = EmrConfig::from_lookup(|key| std::env::var(key).ok())?;
    let services = ClinicServices::from_config(config)?;
    if let Err(e) = run(&services, command).await {
        if matches!(e, ClinicError::Unauthorized) {
            eprintln!("The EMR rejected the configured credentials (EMR_USERNAME/EMR_PASSWORD).");
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
