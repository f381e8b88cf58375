use anyhow::{Result, bail};
use chrono::Local;
use clap::{Args, Subcommand};
use client::AppContext;
use shared::models::{JobApplication, JobDraft, JobStatus};

use super::require_session;

#[derive(Subcommand, Debug)]
pub enum JobsCommand {
    /// List job applications, optionally filtered
    List(ListArgs),
    /// Show one job application
    Show { id: String },
    /// Record a new job application
    Add(AddArgs),
    /// Edit fields of an existing job application
    Update(UpdateArgs),
    /// Move one or more job applications to a new status
    Status {
        #[arg(value_parser = parse_status)]
        status: JobStatus,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Delete one or more job applications
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// List the companies you have applied to
    Companies,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive text matched against title and company
    #[arg(long, short, default_value = "")]
    pub search: String,

    #[arg(long, value_parser = parse_status)]
    pub status: Option<JobStatus>,

    /// Exact company name
    #[arg(long, default_value = "")]
    pub company: String,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long, short)]
    pub title: String,

    #[arg(long)]
    pub company: String,

    #[arg(long, short, value_parser = parse_status)]
    pub status: Option<JobStatus>,

    /// Date applied (YYYY-MM-DD); defaults to today
    #[arg(long, short)]
    pub date: Option<String>,

    #[arg(long, short)]
    pub link: Option<String>,

    #[arg(long, short)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: String,

    #[arg(long, short)]
    pub title: Option<String>,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long, short, value_parser = parse_status)]
    pub status: Option<JobStatus>,

    #[arg(long, short)]
    pub date: Option<String>,

    /// New posting link; pass an empty string to remove it
    #[arg(long, short)]
    pub link: Option<String>,

    /// New notes; pass an empty string to remove them
    #[arg(long, short)]
    pub notes: Option<String>,
}

fn parse_status(value: &str) -> Result<JobStatus, String> {
    value.parse().map_err(|err: shared::models::FieldError| err.message)
}

pub async fn run(context: &AppContext, command: JobsCommand) -> Result<()> {
    require_session(context).await?;
    let jobs = context.jobs();

    match command {
        JobsCommand::List(args) => {
            let status = args.status.map(|s| s.to_string()).unwrap_or_default();
            let listed = jobs.filter(args.search, status, args.company);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&listed)?);
            } else {
                print_table(&listed);
                println!("{} of {} job applications", listed.len(), jobs.all_jobs().len());
            }
        }
        JobsCommand::Show { id } => {
            let job = jobs.get(&id).await?;
            print_details(&job);
        }
        JobsCommand::Add(args) => {
            let draft = JobDraft {
                title: args.title,
                company: args.company,
                status: args.status,
                date_applied: args
                    .date
                    .unwrap_or_else(|| Local::now().date_naive().format("%Y-%m-%d").to_string()),
                application_link: args.link,
                notes: args.notes,
            };
            let job = jobs.create(&draft).await?;
            println!("Created {}", job.id);
            print_details(&job);
        }
        JobsCommand::Update(args) => {
            let Some(existing) = jobs.all_jobs().into_iter().find(|job| job.id == args.id) else {
                bail!("job {} not found", args.id);
            };
            let mut draft = JobDraft::from(&existing);
            if let Some(title) = args.title {
                draft.title = title;
            }
            if let Some(company) = args.company {
                draft.company = company;
            }
            if args.status.is_some() {
                draft.status = args.status;
            }
            if let Some(date) = args.date {
                draft.date_applied = date;
            }
            if let Some(link) = args.link {
                draft.application_link = Some(link);
            }
            if let Some(notes) = args.notes {
                draft.notes = Some(notes);
            }
            let job = jobs.update(&args.id, &draft).await?;
            println!("Updated {}", job.id);
            print_details(&job);
        }
        JobsCommand::Status { status, ids } => {
            if let [id] = ids.as_slice() {
                let job = jobs.update_status(id, status).await?;
                println!("{} is now {}", job.id, job.status);
            } else {
                let response = jobs.bulk_update_status(&ids, status).await?;
                println!("{}", response.message);
            }
        }
        JobsCommand::Delete { ids } => {
            if let [id] = ids.as_slice() {
                jobs.delete(id).await?;
                println!("Deleted {id}");
            } else {
                let response = jobs.bulk_delete(&ids).await?;
                println!("{}", response.message);
            }
        }
        JobsCommand::Companies => {
            for company in jobs.companies() {
                println!("{company}");
            }
        }
    }

    Ok(())
}

fn print_table(jobs: &[JobApplication]) {
    for job in jobs {
        println!(
            "{:<10} {:<10} {:<10} {} | {}",
            job.id, job.status, job.date_applied, job.company, job.title
        );
    }
}

fn print_details(job: &JobApplication) {
    println!("{} at {}", job.title, job.company);
    println!("  Status:  {}", job.status);
    println!("  Applied: {}", job.date_applied);
    if let Some(link) = &job.application_link {
        println!("  Link:    {link}");
    }
    if let Some(notes) = &job.notes {
        println!("  Notes:   {notes}");
    }
}
