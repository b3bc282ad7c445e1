use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crewboard_cli::{connect, init_tracing, print_json};
use crewboard_db::ClientRepository;
use crewboard_services::{DemoGenerator, GenerationPlan, GeneratorOptions};

#[derive(Parser, Debug)]
#[command(name = "generate_people")]
#[command(about = "Insert generated people for an existing tenant in batches")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate and insert people
    Run {
        /// Client code of an existing tenant
        #[arg(long)]
        client: String,
        /// Target number of people (defaults to GENERATOR_TARGET_COUNT)
        #[arg(long)]
        count: Option<usize>,
        /// Rows per insert (defaults to GENERATOR_BATCH_SIZE)
        #[arg(long)]
        batch_size: Option<usize>,
        /// 1-based batch to start at, e.g. the batch a failed run reported
        #[arg(long, default_value = "1")]
        start_batch: usize,
        /// Seed for the generated rows; the same seed reproduces the same people
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Only generate people, no enrollments, documents, or tasks
        #[arg(long)]
        no_related: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let (config, store) = connect().await?;

    match args.command {
        Command::Run {
            client,
            count,
            batch_size,
            start_batch,
            seed,
            no_related,
            json,
        } => {
            let tenant = ClientRepository::new(store.clone())
                .get_by_code(&client)
                .await?
                .with_context(|| format!("Client {} does not exist; run setup_demo first", client))?;

            let mut plan = GenerationPlan::new(
                count.unwrap_or(config.generator_target_count),
                batch_size.unwrap_or(config.generator_batch_size),
            );
            plan.start_batch = start_batch.saturating_sub(1).min(plan.batch_count());

            let generator = DemoGenerator::new(
                store.clone(),
                GeneratorOptions {
                    seed,
                    with_related: !no_related,
                    ..GeneratorOptions::default()
                },
            );
            let report = generator
                .run(&tenant, &plan, |progress| {
                    if !json {
                        println!(
                            "Batch {}/{}: {} inserted, {}/{} committed",
                            progress.batch,
                            progress.batches,
                            progress.inserted,
                            progress.committed,
                            progress.target
                        );
                    }
                })
                .await
                .context("People generation failed")?;

            if json {
                print_json(&report)?;
            } else {
                println!(
                    "Inserted {} people into {} ({} of {} rows committed)",
                    report.people_inserted, report.client_code, report.committed, plan.target
                );
            }
        }
    }

    Ok(())
}
