//! Demo data generator
//!
//! Synthesizes people (and optionally their enrollments, documents, and tasks) for a
//! tenant and inserts them in fixed-size batches. Never builds the whole target as one
//! payload.
//!
//! Every row is derived from `(seed, index)`, and every insert is keyed on the row's
//! natural key, so re-running a batch reproduces the same rows and inserts nothing twice.
//! With [`GeneratorOptions::overwrite`] existing rows are rewritten instead of skipped. A failed run reports the index range of the failed batch and how many rows
//! precede it; [`GenerationPlan::resume_from`] continues from there.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use crewboard_core::{
    models::{ClientRow, NewDocument, NewEnrollment, NewPerson, NewTask, PersonRow},
    AppError,
};
use crewboard_db::{
    DocumentRepository, EnrollmentRepository, PersonRepository, TaskRepository, WriteMode,
};
use crewboard_store::RemoteStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use uuid::Uuid;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Grace", "Alan", "Linus", "Margaret", "Dennis", "Barbara", "Ken", "Radia", "Edsger",
    "Frances", "Donald", "Hedy", "John", "Katherine", "Tim",
];
const LAST_NAMES: &[&str] = &[
    "Lovelace", "Hopper", "Turing", "Torvalds", "Hamilton", "Ritchie", "Liskov", "Thompson",
    "Perlman", "Dijkstra", "Allen", "Knuth", "Lamarr", "Backus", "Johnson", "Berners-Lee",
];
const DEPARTMENTS: &[(&str, &[&str])] = &[
    ("Engineering", &["Software Engineer", "Senior Engineer", "Engineering Manager"]),
    ("Sales", &["Account Executive", "Sales Manager"]),
    ("Marketing", &["Marketing Specialist", "Content Strategist"]),
    ("Finance", &["Accountant", "Financial Analyst"]),
    ("Human Resources", &["HR Generalist", "Recruiter"]),
    ("Operations", &["Operations Analyst", "Office Manager"]),
];
const LOCATIONS: &[&str] = &["London", "New York", "Berlin", "Toronto", "Singapore", "Sydney"];
const CLEARANCES: &[&str] = &["none", "confidential", "secret"];
const EMPLOYMENT_TYPES: &[&str] = &["full_time", "part_time", "contractor"];
const WORK_LOCATIONS: &[&str] = &["office", "remote", "hybrid"];
const SKILLS: &[&str] = &[
    "Rust", "SQL", "Negotiation", "Excel", "Public Speaking", "Design", "Kubernetes", "Writing",
];
const LANGUAGES: &[&str] = &["French", "German", "Spanish", "Mandarin", "Japanese"];
const DOCUMENTS: &[(&str, &str)] = &[
    ("contract", "Employment Contract"),
    ("id_verification", "ID Verification"),
    ("tax_form", "Tax Form"),
    ("gdpr_consent", "GDPR Consent"),
];
const DOCUMENT_STATUSES: &[&str] = &["pending", "uploaded", "verified", "rejected"];
const TASKS: &[(&str, &str)] = &[
    ("Sign employment contract", "paperwork"),
    ("Complete tax forms", "paperwork"),
    ("Set up workstation", "equipment"),
    ("Security awareness training", "training"),
];
const TASK_STATUSES: &[&str] = &["not_started", "in_progress", "completed"];
const TASK_PRIORITIES: &[&str] = &["low", "medium", "high", "urgent"];

/// Batch layout of one generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationPlan {
    pub target: usize,
    pub batch_size: usize,
    /// 0-based batch to start from
    pub start_batch: usize,
}

impl GenerationPlan {
    pub fn new(target: usize, batch_size: usize) -> Self {
        Self {
            target,
            batch_size: batch_size.max(1),
            start_batch: 0,
        }
    }

    /// Skip the batches fully covered by `existing` rows. A partially covered batch is
    /// re-run; its existing rows are ignored on insert.
    pub fn resume_from(mut self, existing: usize) -> Self {
        self.start_batch = (existing / self.batch_size).min(self.batch_count());
        self
    }

    pub fn batch_count(&self) -> usize {
        self.target.div_ceil(self.batch_size)
    }

    /// Row index range of 0-based batch `batch`
    pub fn batch_range(&self, batch: usize) -> Range<usize> {
        let start = (batch * self.batch_size).min(self.target);
        let end = (start + self.batch_size).min(self.target);
        start..end
    }

    /// Remaining batches as `(batch, rows)` pairs
    pub fn batches(&self) -> impl Iterator<Item = (usize, Range<usize>)> + '_ {
        (self.start_batch..self.batch_count()).map(|batch| (batch, self.batch_range(batch)))
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub seed: u64,
    /// Also insert enrollments, documents, and tasks for each people batch
    pub with_related: bool,
    /// Share of people that get an enrollment
    pub enrollment_ratio: f64,
    pub application_id: Option<Uuid>,
    /// Rewrite rows that already exist with freshly generated values instead of skipping them
    pub overwrite: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            with_related: true,
            enrollment_ratio: 0.9,
            application_id: None,
            overwrite: false,
        }
    }
}

/// Reported after each committed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    /// 1-based
    pub batch: usize,
    pub batches: usize,
    /// People written by this batch. Rows that already existed count only when overwriting.
    pub inserted: usize,
    /// Rows `[0, committed)` are in the store
    pub committed: usize,
    pub target: usize,
}

/// Rows written per table; rewritten rows are included when overwriting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub client_code: String,
    pub batches_run: usize,
    pub people_inserted: usize,
    pub enrollments_inserted: usize,
    pub documents_inserted: usize,
    pub tasks_inserted: usize,
    pub committed: usize,
}

#[derive(Debug, Default)]
struct RelatedCounts {
    enrollments: usize,
    documents: usize,
    tasks: usize,
}

fn pick<'a, R: Rng>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

fn rng_for(seed: u64, index: usize, stream: u64) -> StdRng {
    let mixed = seed
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(index as u64)
        .wrapping_add(stream.wrapping_mul(0xD1B5_4A32_D192_ED03));
    StdRng::seed_from_u64(mixed)
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 4).unwrap_or_default()
}

fn base_time() -> DateTime<Utc> {
    base_date()
        .and_hms_opt(9, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or_default()
}

fn email_domain(client: &ClientRow) -> String {
    client
        .domain
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}.example.com", client.client_code.to_lowercase().replace('_', "-")))
}

/// Natural key of the person generated at `index`
pub fn employee_id(client_code: &str, index: usize) -> String {
    format!("{}-{:05}", client_code, index)
}

/// The person at `index`; identical for identical `(seed, index)`
pub fn synthesize_person(client: &ClientRow, seed: u64, index: usize) -> NewPerson {
    let mut rng = rng_for(seed, index, 0);
    let first_name = pick(&mut rng, FIRST_NAMES);
    let last_name = pick(&mut rng, LAST_NAMES);
    let (department, positions) = DEPARTMENTS[rng.random_range(0..DEPARTMENTS.len())];
    let position = pick(&mut rng, positions);

    let roll = rng.random_range(0..100);
    let (employment_status, associate_status) = match roll {
        0..=79 => ("active", None),
        80..=89 => ("future", Some("onboarding".to_string())),
        _ => ("former", Some("offboarded".to_string())),
    };
    let start_offset = match employment_status {
        "future" => 1_460 + rng.random_range(0..90),
        _ => rng.random_range(0..1_400),
    };

    let mut skills: Vec<String> = Vec::new();
    for _ in 0..rng.random_range(1..=3) {
        let skill = pick(&mut rng, SKILLS).to_string();
        if !skills.contains(&skill) {
            skills.push(skill);
        }
    }
    let mut languages = vec!["English".to_string()];
    if rng.random_bool(0.4) {
        languages.push(pick(&mut rng, LANGUAGES).to_string());
    }
    let manager = if rng.random_bool(0.85) {
        Some(format!("{} {}", pick(&mut rng, FIRST_NAMES), pick(&mut rng, LAST_NAMES)))
    } else {
        None
    };

    NewPerson {
        client_id: client.id,
        employee_id: employee_id(&client.client_code, index),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        full_name: format!("{} {}", first_name, last_name),
        email: format!(
            "{}.{}.{}@{}",
            first_name.to_lowercase(),
            last_name.to_lowercase(),
            index,
            email_domain(client)
        ),
        department: department.to_string(),
        position: position.to_string(),
        location: pick(&mut rng, LOCATIONS).to_string(),
        manager,
        employment_status: employment_status.to_string(),
        associate_status,
        security_clearance: pick(&mut rng, CLEARANCES).to_string(),
        employment_type: pick(&mut rng, EMPLOYMENT_TYPES).to_string(),
        work_location: pick(&mut rng, WORK_LOCATIONS).to_string(),
        skills,
        languages,
        start_date: base_date() + Duration::days(start_offset),
    }
}

/// Inserts generated demo data in batches
#[derive(Clone)]
pub struct DemoGenerator {
    people: PersonRepository,
    enrollments: EnrollmentRepository,
    documents: DocumentRepository,
    tasks: TaskRepository,
    options: GeneratorOptions,
}

impl DemoGenerator {
    pub fn new(store: Arc<dyn RemoteStore>, options: GeneratorOptions) -> Self {
        Self {
            people: PersonRepository::new(store.clone()),
            enrollments: EnrollmentRepository::new(store.clone()),
            documents: DocumentRepository::new(store.clone()),
            tasks: TaskRepository::new(store),
            options,
        }
    }

    fn mode(&self) -> WriteMode {
        if self.options.overwrite {
            WriteMode::Overwrite
        } else {
            WriteMode::SkipExisting
        }
    }

    /// Generate and insert the remaining batches of `plan` for `client`.
    ///
    /// `on_batch` is called after each batch commits. On failure returns
    /// [`AppError::BatchInsertFailed`] naming the 1-based batch and its row range; every
    /// row before the range is committed.
    #[tracing::instrument(skip(self, client, on_batch), fields(client_code = %client.client_code))]
    pub async fn run(
        &self,
        client: &ClientRow,
        plan: &GenerationPlan,
        mut on_batch: impl FnMut(&BatchProgress),
    ) -> Result<GenerationReport, AppError> {
        let batches = plan.batch_count();
        let mut report = GenerationReport {
            client_code: client.client_code.clone(),
            committed: plan.batch_range(plan.start_batch).start,
            ..GenerationReport::default()
        };

        tracing::info!(
            target = plan.target,
            batch_size = plan.batch_size,
            overwrite = self.options.overwrite,
            start_batch = plan.start_batch + 1,
            batches,
            "Starting demo data generation"
        );

        for (batch, rows) in plan.batches() {
            let failed = |err: AppError| {
                let err = AppError::BatchInsertFailed {
                    batch: batch + 1,
                    start: rows.start,
                    end: rows.end,
                    committed: rows.start,
                    message: err.to_string(),
                };
                tracing::warn!(error = %err, "Demo data batch failed");
                err
            };

            let people: Vec<NewPerson> = rows
                .clone()
                .map(|index| synthesize_person(client, self.options.seed, index))
                .collect();
            let inserted = self.people.insert_batch(&people, self.mode()).await.map_err(failed)?;

            if self.options.with_related {
                let related = self.insert_related(client, rows.start, &people).await.map_err(failed)?;
                report.enrollments_inserted += related.enrollments;
                report.documents_inserted += related.documents;
                report.tasks_inserted += related.tasks;
            }

            report.batches_run += 1;
            report.people_inserted += inserted.len();
            report.committed = rows.end;

            let progress = BatchProgress {
                batch: batch + 1,
                batches,
                inserted: inserted.len(),
                committed: rows.end,
                target: plan.target,
            };
            tracing::info!(
                batch = progress.batch,
                batches,
                inserted = progress.inserted,
                committed = progress.committed,
                "Committed demo data batch"
            );
            on_batch(&progress);
        }

        Ok(report)
    }

    /// Insert related rows for a committed people batch starting at row `first_index`.
    ///
    /// People are re-read by natural key so rows inserted by an earlier, interrupted run
    /// get their related data too.
    async fn insert_related(
        &self,
        client: &ClientRow,
        first_index: usize,
        people: &[NewPerson],
    ) -> Result<RelatedCounts, AppError> {
        let employee_ids: Vec<String> = people.iter().map(|p| p.employee_id.clone()).collect();
        let stored = self.people.find_by_employee_ids(client.id, &employee_ids).await?;
        let by_employee_id: HashMap<&str, (usize, &NewPerson)> = people
            .iter()
            .enumerate()
            .map(|(offset, person)| (person.employee_id.as_str(), (first_index + offset, person)))
            .collect();

        let mut enrollments = Vec::new();
        let mut documents = Vec::new();
        let mut tasks = Vec::new();
        for row in &stored {
            let Some((index, person)) = row
                .employee_id
                .as_deref()
                .and_then(|id| by_employee_id.get(id))
            else {
                continue;
            };
            if let Some(enrollment) = self.synthesize_enrollment(row, *index) {
                enrollments.push(enrollment);
            }
            documents.extend(self.synthesize_documents(row, person, *index));
            tasks.extend(self.synthesize_tasks(row, person, *index));
        }

        Ok(RelatedCounts {
            enrollments: self.enrollments.insert_batch(&enrollments, self.mode()).await?.len(),
            documents: self.documents.insert_batch(&documents, self.mode()).await?.len(),
            tasks: self.tasks.insert_batch(&tasks, self.mode()).await?.len(),
        })
    }

    fn synthesize_enrollment(&self, person: &PersonRow, index: usize) -> Option<NewEnrollment> {
        let mut rng = rng_for(self.options.seed, index, 1);
        if !rng.random_bool(self.options.enrollment_ratio.clamp(0.0, 1.0)) {
            return None;
        }
        let completed = rng.random_bool(0.3);
        let completion_percentage = if completed {
            100.0
        } else {
            f64::from(rng.random_range(0..100u32))
        };
        Some(NewEnrollment {
            person_id: person.id,
            client_id: person.client_id,
            application_id: self.options.application_id,
            onboarding_completed: completed,
            completion_percentage,
            last_activity: base_time() + Duration::hours(rng.random_range(0..24 * 1_400)),
        })
    }

    fn synthesize_documents(&self, person: &PersonRow, source: &NewPerson, index: usize) -> Vec<NewDocument> {
        let mut rng = rng_for(self.options.seed, index, 2);
        DOCUMENTS
            .iter()
            .map(|(document_type, label)| {
                let status = pick(&mut rng, DOCUMENT_STATUSES);
                let uploaded_at = (status != "pending")
                    .then(|| base_time() + Duration::hours(rng.random_range(0..24 * 1_400)));
                let reviewed = matches!(status, "verified" | "rejected");
                NewDocument {
                    person_id: person.id,
                    client_id: person.client_id,
                    document_name: format!("{} - {}", source.full_name, label),
                    document_type: document_type.to_string(),
                    status: status.to_string(),
                    uploaded_at,
                    reviewed_at: uploaded_at.filter(|_| reviewed).map(|at| at + Duration::days(2)),
                    reviewed_by: reviewed.then(|| "HR Team".to_string()),
                }
            })
            .collect()
    }

    fn synthesize_tasks(&self, person: &PersonRow, source: &NewPerson, index: usize) -> Vec<NewTask> {
        let mut rng = rng_for(self.options.seed, index, 3);
        TASKS
            .iter()
            .enumerate()
            .map(|(position, (title, category))| NewTask {
                person_id: person.id,
                client_id: person.client_id,
                title: title.to_string(),
                description: format!("{} for {}", title, source.full_name),
                category: category.to_string(),
                status: pick(&mut rng, TASK_STATUSES).to_string(),
                priority: pick(&mut rng, TASK_PRIORITIES).to_string(),
                assigned_to: source.manager.clone(),
                due_date: Some(source.start_date + Duration::days(7 * (position as i64 + 1))),
            })
            .collect()
    }
}
