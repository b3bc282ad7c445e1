use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crewboard_cli::{
    connect, ensure_client, init_tracing, load_settings, print_json, print_query_stats,
    remove_settings, save_settings,
};
use crewboard_db::{
    ApplicationRepository, ClientRepository, DocumentRepository, EnrollmentRepository,
    InvitationRepository, PeopleFilter, PersonRepository, TaskRepository, DEMO_CLIENT_CODES,
};
use crewboard_services::{DemoGenerator, GenerationPlan, GeneratorOptions};
use crewboard_store::RemoteStore;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "setup_demo")]
#[command(about = "Create a demo tenant and fill it with generated people")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the tenant and generate people
    Run {
        /// Client code (defaults to DEFAULT_CLIENT_CODE, then ACME_CORP)
        #[arg(long)]
        client: Option<String>,
        /// Target number of people (defaults to GENERATOR_TARGET_COUNT)
        #[arg(long)]
        count: Option<usize>,
        /// Rows per insert (defaults to GENERATOR_BATCH_SIZE)
        #[arg(long)]
        batch_size: Option<usize>,
        /// Regenerate even when the tenant already has the target number of people,
        /// rewriting existing generated rows
        #[arg(long)]
        force: bool,
        /// Resume after the people that already exist instead of starting at batch 1
        #[arg(long)]
        keep_existing: bool,
        /// Remove the local settings file before selecting the demo tenant
        #[arg(long)]
        reset_files: bool,
        /// Only generate people, no enrollments, documents, or tasks
        #[arg(long)]
        no_related: bool,
        /// Settings file (defaults to SETTINGS_PATH)
        #[arg(long)]
        settings: Option<PathBuf>,
    },
    /// Show the tenant and its row counts without changing anything
    Status {
        /// Client code or id (defaults to DEFAULT_CLIENT_CODE, then the demo fallback)
        #[arg(long)]
        client: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct TenantStatus {
    client_code: String,
    client_id: String,
    name: String,
    applications: usize,
    people: u64,
    enrollments: u64,
    documents: u64,
    tasks: u64,
    invitations: u64,
}

async fn tenant_status(store: Arc<dyn RemoteStore>, selector: &str) -> Result<TenantStatus> {
    let client = ClientRepository::new(store.clone())
        .resolve(selector)
        .await
        .context("Failed to resolve client")?;
    let id = client.id;

    let application_repo = ApplicationRepository::new(store.clone());
    let person_repo = PersonRepository::new(store.clone());
    let people_filter = PeopleFilter::default();
    let enrollment_repo = EnrollmentRepository::new(store.clone());
    let document_repo = DocumentRepository::new(store.clone());
    let task_repo = TaskRepository::new(store.clone());
    let invitation_repo = InvitationRepository::new(store.clone());
    let (applications, people, enrollments, documents, tasks, invitations) = tokio::try_join!(
        application_repo.list_for_client(id),
        person_repo.count(id, &people_filter),
        enrollment_repo.count_for_client(id),
        document_repo.count_for_client(id),
        task_repo.count_for_client(id),
        invitation_repo.count_for_client(id),
    )?;

    Ok(TenantStatus {
        client_code: client.client_code,
        client_id: id.to_string(),
        name: client.name.unwrap_or_default(),
        applications: applications.len(),
        people,
        enrollments,
        documents,
        tasks,
        invitations,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let (config, store) = connect().await?;
    let default_code = config
        .default_client_code
        .clone()
        .unwrap_or_else(|| DEMO_CLIENT_CODES[0].to_string());

    match args.command {
        Command::Run {
            client,
            count,
            batch_size,
            force,
            keep_existing,
            reset_files,
            no_related,
            settings,
        } => {
            let code = client.unwrap_or(default_code);
            let target = count.unwrap_or(config.generator_target_count);
            let batch_size = batch_size.unwrap_or(config.generator_batch_size);

            let settings_path = settings.unwrap_or_else(|| PathBuf::from(&config.settings_path));
            if reset_files && remove_settings(&settings_path)? {
                println!("Removed {}", settings_path.display());
            }

            let tenant = ensure_client(store.clone(), &code).await?;
            let existing = PersonRepository::new(store.clone())
                .count(tenant.id, &PeopleFilter::default())
                .await
                .context("Failed to count existing people")?;
            let existing = usize::try_from(existing).unwrap_or(usize::MAX);

            if existing >= target && !force {
                println!(
                    "{} already has {} people (target {}); use --force to regenerate",
                    tenant.client_code, existing, target
                );
            } else {
                let mut plan = GenerationPlan::new(target, batch_size);
                if keep_existing {
                    plan = plan.resume_from(existing);
                }
                let application_id = ApplicationRepository::new(store.clone())
                    .list_for_client(tenant.id)
                    .await?
                    .first()
                    .map(|app| app.id);
                let generator = DemoGenerator::new(
                    store.clone(),
                    GeneratorOptions {
                        with_related: !no_related,
                        application_id,
                        overwrite: force,
                        ..GeneratorOptions::default()
                    },
                );

                let report = generator
                    .run(&tenant, &plan, |progress| {
                        println!(
                            "Batch {}/{}: {} inserted, {}/{} committed",
                            progress.batch,
                            progress.batches,
                            progress.inserted,
                            progress.committed,
                            progress.target
                        );
                    })
                    .await
                    .with_context(|| format!("Demo data generation for {} failed", tenant.client_code))?;

                println!(
                    "{} {} people, {} enrollments, {} documents, {} tasks for {} in {} batches",
                    if force { "Wrote" } else { "Generated" },
                    report.people_inserted,
                    report.enrollments_inserted,
                    report.documents_inserted,
                    report.tasks_inserted,
                    report.client_code,
                    report.batches_run
                );
            }

            let mut saved = load_settings(&settings_path)?;
            if saved.select_client(&tenant.client_code) {
                save_settings(&settings_path, &saved)?;
                println!("Selected {} in {}", tenant.client_code, settings_path.display());
            }
        }
        Command::Status { client, json } => {
            let selector = client.unwrap_or(default_code);
            let status = tenant_status(store.clone(), &selector).await?;
            if json {
                print_json(&status)?;
            } else {
                println!("Client:       {} ({})", status.name, status.client_code);
                println!("Id:           {}", status.client_id);
                println!("Applications: {}", status.applications);
                println!("People:       {}", status.people);
                println!("Enrollments:  {}", status.enrollments);
                println!("Documents:    {}", status.documents);
                println!("Tasks:        {}", status.tasks);
                println!("Invitations:  {}", status.invitations);
            }
            print_query_stats(&store);
        }
    }

    Ok(())
}
