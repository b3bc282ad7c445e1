//! Crewboard CLI: browse a tenant's people and run the full dashboard load.
//!
//! Reads STORE_BACKEND, STORE_URL, and STORE_API_KEY (see `Config::from_env`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use crewboard_cli::{
    connect, follow_progress, init_tracing, load_settings, print_json, print_query_stats,
    save_settings, tenant_selector, truncate_string,
};
use crewboard_core::models::{EnrollmentState, PersonOverview};
use crewboard_db::{ClientRepository, PeopleFilter};
use crewboard_services::{DashboardLoader, LoadOutcome, PageInfo, PaginationController};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crewboard", about = "Crewboard onboarding dashboard CLI")]
struct Cli {
    /// Settings file (defaults to SETTINGS_PATH)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Print store call counts when done
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the staged dashboard load for a tenant
    Dashboard {
        /// Client code or id; defaults to the saved selection
        #[arg(long)]
        client: Option<String>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List one page of a tenant's people
    People {
        /// Client code or id; defaults to the saved selection
        #[arg(long)]
        client: Option<String>,
        /// 0-based page number
        #[arg(long, default_value = "0")]
        page: u32,
        /// Page size (defaults to PAGE_SIZE)
        #[arg(long)]
        page_size: Option<u32>,
        /// Substring search over names, employee id, and email
        #[arg(long)]
        search: Option<String>,
        /// Equality filter, e.g. --filter department=Engineering
        #[arg(long = "filter", value_name = "COLUMN=VALUE")]
        filters: Vec<String>,
        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save the selected tenant
    Select {
        /// Client code or id
        client: String,
    },
    /// Show saved settings
    Settings,
}

fn parse_filters(search: Option<&str>, filters: &[String]) -> anyhow::Result<PeopleFilter> {
    let mut filter = PeopleFilter::search(search.unwrap_or_default());
    for raw in filters {
        let (column, value) = raw
            .split_once('=')
            .with_context(|| format!("Filter {:?} is not COLUMN=VALUE", raw))?;
        filter = filter.with_eq(column, value);
    }
    Ok(filter.normalized())
}

fn enrollment_label(state: &EnrollmentState) -> String {
    match state.as_enrollment() {
        Some(enrollment) => format!("{:>3}%", enrollment.completion_percentage),
        None => "  -".to_string(),
    }
}

fn print_people_table(people: &[PersonOverview], info: &PageInfo) {
    println!(
        "{:<16} {:<28} {:<18} {:<8} {:>5} {:>5} {:>5}",
        "EMPLOYEE", "NAME", "DEPARTMENT", "STATUS", "ONB", "DOCS", "TASKS"
    );
    for entry in people {
        let person = &entry.person;
        println!(
            "{:<16} {:<28} {:<18} {:<8} {:>5} {:>5} {:>5}",
            truncate_string(&person.person_code, 16),
            truncate_string(&person.full_name, 28),
            truncate_string(&person.department, 18),
            person.status.to_string(),
            enrollment_label(&entry.enrollment),
            format!("{}/{}", entry.verified_documents(), entry.documents.len()),
            format!("{}/{}", entry.completed_tasks(), entry.tasks.len()),
        );
    }
    println!(
        "Page {} of {} ({} people)",
        if info.total_pages == 0 { 0 } else { info.current_page + 1 },
        info.total_pages,
        info.total_count
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let (config, store) = connect().await?;
    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.settings_path));
    let mut settings = load_settings(&settings_path)?;

    match cli.command {
        Commands::Dashboard { client, json } => {
            let selector = tenant_selector(client.as_deref(), &settings, &config);
            let loader = DashboardLoader::new(store.clone(), config.page_size);

            let printer = tokio::spawn(follow_progress(
                loader.state().progress.subscribe(),
                |update| {
                    eprintln!(
                        "[{}/{}] {:<18} {}",
                        update.current, update.total, update.stage.label(), update.message
                    )
                },
            ));

            let outcome = loader.load_client_data(&selector).await;
            // Dropping the loader closes the progress channel; the printer drains the
            // last update and exits
            drop(loader);
            printer.await.context("Progress printer failed")?;

            match outcome.context("Dashboard load failed")? {
                LoadOutcome::Completed(summary) => {
                    if settings.select_client(&summary.client.code) {
                        save_settings(&settings_path, &settings)?;
                    }
                    if json {
                        print_json(&summary)?;
                    } else {
                        println!("Client:        {} ({})", summary.client.name, summary.client.code);
                        println!("Applications:  {}", summary.applications);
                        println!("Invitations:   {}", summary.invitations);
                        println!(
                            "People:        {} loaded of {} ({} enrolled)",
                            summary.people_loaded, summary.total_people, summary.report.enrolled
                        );
                        if summary.report.anomalies() > 0 {
                            println!("Anomalies:     {:?}", summary.report);
                        }
                    }
                }
                LoadOutcome::Superseded => println!("Load was superseded"),
            }
        }
        Commands::People {
            client,
            page,
            page_size,
            search,
            filters,
            json,
        } => {
            let selector = tenant_selector(client.as_deref(), &settings, &config);
            let tenant = ClientRepository::new(store.clone())
                .resolve(&selector)
                .await
                .context("Failed to resolve client")?;
            let filter = parse_filters(search.as_deref(), &filters)?;
            let controller =
                PaginationController::new(store.clone(), page_size.unwrap_or(config.page_size));

            // Page 0 first so the total is known before jumping
            let first = controller
                .load_page(&tenant.id.to_string(), 0, &filter)
                .await?
                .context("Page load was ignored")?;
            let result = if page == 0 {
                Some(first)
            } else {
                controller.goto_page(page).await?
            };

            match result {
                Some(result) if json => print_json(&serde_json::json!({
                    "client": tenant.client_code,
                    "pageInfo": result.info,
                    "people": result.people,
                }))?,
                Some(result) => print_people_table(&result.people, &result.info),
                None => {
                    let info = controller.info();
                    anyhow::bail!(
                        "Page {} is out of range; {} has {} pages",
                        page,
                        tenant.client_code,
                        info.total_pages
                    );
                }
            }
        }
        Commands::Select { client } => {
            let resolved = ClientRepository::new(store.clone())
                .resolve(&client)
                .await
                .context("Failed to resolve client")?;
            settings.select_client(&resolved.client_code);
            save_settings(&settings_path, &settings)?;
            println!("Selected {}", resolved.client_code);
        }
        Commands::Settings => print_json(&settings)?,
    }

    if cli.stats {
        print_query_stats(&store);
    }
    Ok(())
}
