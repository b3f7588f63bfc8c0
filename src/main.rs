use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand, ValueEnum};

use quanskill_portal::api::{self, ApiClient};
use quanskill_portal::browse;
use quanskill_portal::config::{ConnectionArgs, Settings};
use quanskill_portal::error::ApiError;
use quanskill_portal::logging;
use quanskill_portal::models::{
    Cohort, CohortStudent, Course, Enrollment, Faq, FaqPayload, Lecturer, MeetingLink, NewPerson,
    NewSchedule, Post, Schedule, Student, WaitlistEntry,
};
use quanskill_portal::resources::{self, Resource};
use quanskill_portal::session::Session;
use quanskill_portal::table::export::export_records;
use quanskill_portal::table::render::render;
use quanskill_portal::table::{DateRange, PageSize, SortDirection};

#[derive(Parser)]
#[command(name = "quanskill-portal")]
#[command(about = "Admin console for the Quanskill student portal", long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,
    /// Log debug detail to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResourceKind {
    Cohorts,
    Courses,
    Lecturers,
    Students,
    Schedules,
    Posts,
    Faqs,
    Waitlist,
    /// Roster entries of a cohort not yet enrolled (needs --cohort)
    UnenrolledStudents,
}

#[derive(Args)]
struct ListArgs {
    resource: ResourceKind,
    /// Cohort id (required for schedules and unenrolled-students)
    #[arg(long)]
    cohort: Option<String>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    status: Option<String>,
    /// Start of the date filter (YYYY-MM-DD); needs --to
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,
    /// End of the date filter (YYYY-MM-DD); needs --from
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,
    /// Sort key as COLUMN or COLUMN:desc; repeat for tie-breakers
    #[arg(long, value_parser = parse_sort_key)]
    sort: Vec<(String, SortDirection)>,
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[arg(long, default_value_t = 10)]
    page_size: usize,
    /// Write the filtered rows to a .xlsx or .csv file
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Args)]
struct PersonArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long, default_value = "male")]
    gender: String,
}

impl From<PersonArgs> for NewPerson {
    fn from(args: PersonArgs) -> Self {
        NewPerson {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone: args.phone,
            gender: args.gender,
        }
    }
}

fn parse_sort_key(raw: &str) -> Result<(String, SortDirection), String> {
    match raw.rsplit_once(':') {
        Some((column, "desc")) => Ok((column.to_string(), SortDirection::Descending)),
        Some((column, "asc")) => Ok((column.to_string(), SortDirection::Ascending)),
        Some((_, other)) => Err(format!("unknown sort direction `{other}` (use asc or desc)")),
        None => Ok((raw.to_string(), SortDirection::Ascending)),
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|err| format!("expected HH:MM: {err}"))
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session token
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long, env = "QUANSKILL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    SignOut,
    /// Show dashboard counters
    Analytics,
    /// Print one page of a resource table
    List(ListArgs),
    /// Browse a resource table interactively
    Browse {
        resource: ResourceKind,
        #[arg(long)]
        cohort: Option<String>,
    },
    /// Delete one row by id
    Delete {
        resource: ResourceKind,
        id: String,
        /// Cohort id, to show the updated schedule table
        #[arg(long)]
        cohort: Option<String>,
    },
    /// Create a lecturer account
    AddLecturer(PersonArgs),
    /// Create a student account
    AddStudent(PersonArgs),
    /// Replace a student's profile
    UpdateStudent {
        id: String,
        #[command(flatten)]
        person: PersonArgs,
    },
    /// Create an FAQ entry
    AddFaq {
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: String,
    },
    /// Replace an FAQ entry
    UpdateFaq {
        id: String,
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: String,
    },
    /// Enroll a student in a cohort
    Enroll {
        #[arg(long)]
        cohort: String,
        #[arg(long)]
        student: String,
    },
    /// Remove a student from a cohort
    Disenroll {
        #[arg(long)]
        cohort: String,
        #[arg(long)]
        student: String,
    },
    /// Schedule a session for a cohort
    AddSchedule {
        #[arg(long)]
        cohort: String,
        /// Course topic id
        #[arg(long)]
        topic: String,
        #[arg(long, default_value = "live")]
        session_type: String,
        /// Session date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Start time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,
    },
    /// Attach a meeting link to a schedule
    SetMeetingLink {
        /// Schedule id
        id: String,
        #[arg(long)]
        url: reqwest::Url,
        /// Cohort id, to show the updated schedule table
        #[arg(long)]
        cohort: Option<String>,
    },
}

macro_rules! with_resource {
    ($kind:expr, $run:ident ( $($arg:expr),* $(,)? )) => {
        match $kind {
            ResourceKind::Cohorts => $run::<Cohort>($($arg),*).await,
            ResourceKind::Courses => $run::<Course>($($arg),*).await,
            ResourceKind::Lecturers => $run::<Lecturer>($($arg),*).await,
            ResourceKind::Students => $run::<Student>($($arg),*).await,
            ResourceKind::Schedules => $run::<Schedule>($($arg),*).await,
            ResourceKind::Posts => $run::<Post>($($arg),*).await,
            ResourceKind::Faqs => $run::<Faq>($($arg),*).await,
            ResourceKind::Waitlist => $run::<WaitlistEntry>($($arg),*).await,
            ResourceKind::UnenrolledStudents => $run::<CohortStudent>($($arg),*).await,
        }
    };
}

fn connect(settings: &Settings) -> anyhow::Result<ApiClient> {
    let session = settings
        .session()
        .context("failed to read the stored session")?
        .context("not signed in; run `quanskill-portal sign-in` or pass --token")?;
    ApiClient::new(&settings.api_url, &session, settings.timeout)
        .context("failed to create the API client")
}

fn report_message(message: Option<String>, fallback: &str) {
    println!("{}", message.unwrap_or_else(|| fallback.to_string()));
}

/// Re-fetches a resource after a change and prints its first page.
async fn reload<R: Resource>(client: &ApiClient, scope: Option<&str>) -> anyhow::Result<()> {
    match resources::fetch_all::<R>(client, scope).await {
        Ok(data) => {
            println!("{}", render(&resources::new_table(data)));
            Ok(())
        }
        Err(ApiError::MissingScope { resource }) => {
            println!("Pass --cohort to show the updated {resource} table.");
            Ok(())
        }
        Err(err) => Err(err).with_context(|| format!("failed to reload {}", R::NAME)),
    }
}

async fn list<R: Resource>(client: &ApiClient, args: ListArgs) -> anyhow::Result<()> {
    let page_size = PageSize::try_from(args.page_size)?;
    let data = resources::fetch_all::<R>(client, args.cohort.as_deref())
        .await
        .with_context(|| format!("failed to fetch {}", R::NAME))?;

    let mut table = resources::new_table(data);
    if let Some(search) = args.search {
        table.set_free_text(search);
    }
    if let Some(status) = args.status {
        table.set_status(status);
    }
    table.set_date_range(DateRange::new(args.from, args.to));
    for (position, (column, direction)) in args.sort.iter().enumerate() {
        let sorted = if position == 0 {
            table.set_sort(column, *direction)
        } else {
            table.then_sort_by(column, *direction)
        };
        if !sorted {
            anyhow::bail!("column `{column}` of {} cannot be sorted", R::NAME);
        }
    }
    table.set_page_size(page_size);
    table.go_to_page(args.page.saturating_sub(1));

    println!("{}", render(&table));

    if let Some(path) = args.export {
        let rows = table.filtered_rows();
        let summary = export_records(&rows, R::SHEET, &path)
            .with_context(|| format!("failed to export to {}", path.display()))?;
        println!("Exported {} row(s) to {}.", summary.records, path.display());
    }
    Ok(())
}

async fn browse_resource<R: Resource>(client: &ApiClient, cohort: Option<&str>) -> anyhow::Result<()> {
    browse::run::<R>(client, cohort).await
}

async fn delete_row<R: Resource>(client: &ApiClient, id: &str, cohort: Option<&str>) -> anyhow::Result<()> {
    let message = resources::delete::<R>(client, id)
        .await
        .with_context(|| format!("failed to delete {id} from {}", R::NAME))?;
    report_message(message, "Deleted.");
    reload::<R>(client, cohort).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    let settings = Settings::from(cli.connection);

    match cli.command {
        Commands::SignIn { email, password } => {
            let session = api::sign_in(&settings.api_url, &email, &password, settings.timeout)
                .await
                .context("sign-in failed")?;
            session
                .save(&settings.session_file)
                .context("failed to store the session")?;
            match &session.user {
                Some(user) => println!("Signed in as {} ({}).", user.name, user.email),
                None => println!("Signed in."),
            }
        }
        Commands::SignOut => {
            if Session::clear(&settings.session_file).context("failed to remove the session")? {
                println!("Signed out.");
            } else {
                println!("No stored session.");
            }
        }
        Commands::Analytics => {
            let client = connect(&settings)?;
            let analytics = resources::fetch_analytics(&client)
                .await
                .context("failed to fetch analytics")?;
            println!("Students: {}", analytics.students);
            println!(
                "Lecturers: {} ({} active, {} inactive)",
                analytics.lecturers, analytics.active_lecturers, analytics.inactive_lecturers
            );
            println!("Admins: {}", analytics.admins);
            if let Some(cohorts) = analytics.cohorts {
                println!(
                    "Cohorts: {} ({} open, {} active, {} completed)",
                    cohorts,
                    analytics.open_cohorts.unwrap_or(0),
                    analytics.active_cohorts.unwrap_or(0),
                    analytics.completed_cohorts.unwrap_or(0)
                );
            }
            println!(
                "Posts: {} ({} published, {} drafts)",
                analytics.posts, analytics.published_posts, analytics.draft_posts
            );
            println!("FAQs: {}", analytics.faqs);
            println!("Waitlist: {}", analytics.waitlist);
        }
        Commands::List(args) => {
            let client = connect(&settings)?;
            let kind = args.resource;
            with_resource!(kind, list(&client, args))?;
        }
        Commands::Browse { resource, cohort } => {
            let client = connect(&settings)?;
            with_resource!(resource, browse_resource(&client, cohort.as_deref()))?;
        }
        Commands::Delete { resource, id, cohort } => {
            let client = connect(&settings)?;
            with_resource!(resource, delete_row(&client, &id, cohort.as_deref()))?;
        }
        Commands::AddLecturer(person) => {
            let client = connect(&settings)?;
            let message = resources::create_lecturer(&client, &person.into())
                .await
                .context("failed to create lecturer")?;
            report_message(message, "Lecturer created.");
            reload::<Lecturer>(&client, None).await?;
        }
        Commands::AddStudent(person) => {
            let client = connect(&settings)?;
            let message = resources::create_student(&client, &person.into())
                .await
                .context("failed to create student")?;
            report_message(message, "Student created.");
            reload::<Student>(&client, None).await?;
        }
        Commands::UpdateStudent { id, person } => {
            let client = connect(&settings)?;
            let message = resources::update_student(&client, &id, &person.into())
                .await
                .with_context(|| format!("failed to update student {id}"))?;
            report_message(message, "Student updated.");
            reload::<Student>(&client, None).await?;
        }
        Commands::AddFaq { question, answer } => {
            let client = connect(&settings)?;
            let payload = FaqPayload {
                faq_question: question,
                faq_answer: answer,
            };
            let message = resources::create_faq(&client, &payload)
                .await
                .context("failed to create FAQ")?;
            report_message(message, "FAQ created.");
            reload::<Faq>(&client, None).await?;
        }
        Commands::UpdateFaq {
            id,
            question,
            answer,
        } => {
            let client = connect(&settings)?;
            let payload = FaqPayload {
                faq_question: question,
                faq_answer: answer,
            };
            let message = resources::update_faq(&client, &id, &payload)
                .await
                .with_context(|| format!("failed to update FAQ {id}"))?;
            report_message(message, "FAQ updated.");
            reload::<Faq>(&client, None).await?;
        }
        Commands::Enroll { cohort, student } => {
            let client = connect(&settings)?;
            let enrollment = Enrollment {
                cohort_id: cohort,
                student_id: student,
            };
            let message = resources::enroll_student(&client, &enrollment)
                .await
                .context("failed to enroll student")?;
            report_message(message, "Student enrolled.");
            reload::<CohortStudent>(&client, Some(enrollment.cohort_id.as_str())).await?;
        }
        Commands::Disenroll { cohort, student } => {
            let client = connect(&settings)?;
            let message = resources::disenroll_student(&client, &cohort, &student)
                .await
                .context("failed to disenroll student")?;
            report_message(message, "Student disenrolled.");
            reload::<CohortStudent>(&client, Some(cohort.as_str())).await?;
        }
        Commands::AddSchedule {
            cohort,
            topic,
            session_type,
            date,
            time,
        } => {
            let client = connect(&settings)?;
            let schedule = NewSchedule {
                course_topic_id: topic,
                session_type,
                date: date.format("%Y-%m-%d").to_string(),
                time: time.format("%H:%M").to_string(),
            };
            let message = resources::add_schedule(&client, &cohort, &schedule)
                .await
                .context("failed to add schedule")?;
            report_message(message, "Schedule added.");
            reload::<Schedule>(&client, Some(cohort.as_str())).await?;
        }
        Commands::SetMeetingLink { id, url, cohort } => {
            let client = connect(&settings)?;
            let link = MeetingLink { url: url.to_string() };
            let message = resources::set_meeting_link(&client, &id, &link)
                .await
                .with_context(|| format!("failed to set the meeting link of schedule {id}"))?;
            report_message(message, "Meeting link saved.");
            reload::<Schedule>(&client, cohort.as_deref()).await?;
        }
    }

    Ok(())
}
