//! Row types bound to their endpoints and column sets.

use std::borrow::Cow;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::format;
use crate::models::{
    Analytics, Cohort, CohortStudent, Course, Enrollment, Faq, FaqPayload, Lecturer, MeetingLink,
    NewPerson, NewSchedule, Post, Schedule, Student, WaitlistEntry,
};
use crate::table::{CellValue, Column, DataTable, RowId, TableRow, VIEW_ALL};

/// Upper bound on followed `next_page_url` links for one listing.
const MAX_PAGES: u32 = 200;

pub trait Resource: TableRow + DeserializeOwned + Serialize + Sized {
    /// Command-line name, also the default export file stem.
    const NAME: &'static str;
    const TITLE: &'static str;
    const SHEET: &'static str;
    /// Choices offered by the status selector, sentinel first.
    const STATUS_OPTIONS: &'static [&'static str];
    /// Response key holding the rows. Only `data` listings are paginated.
    const LIST_KEY: &'static str = "data";

    fn list_path(scope: Option<&str>) -> Result<String, ApiError>;

    /// Endpoint that deletes one row. Read-only listings return an error.
    fn delete_path(id: &str) -> Result<String, ApiError>;

    fn columns() -> Vec<Column<Self>>;

    /// Whether a fetched row belongs in the table.
    fn is_listed(&self) -> bool {
        true
    }
}

fn with_page(path: &str, page: u32) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}page={page}")
}

/// Fetches every row of a resource, following server-side pagination.
pub async fn fetch_all<R: Resource>(client: &ApiClient, scope: Option<&str>) -> Result<Arc<[R]>, ApiError> {
    let path = R::list_path(scope)?;
    let mut rows = if R::LIST_KEY == "data" {
        fetch_pages::<R>(client, &path, MAX_PAGES).await?
    } else {
        client.get_field::<Vec<R>>(&path, R::LIST_KEY).await?
    };
    rows.retain(R::is_listed);

    tracing::info!(resource = R::NAME, rows = rows.len(), "fetched rows");
    Ok(rows.into())
}

async fn fetch_pages<R: Resource>(client: &ApiClient, path: &str, max_pages: u32) -> Result<Vec<R>, ApiError> {
    let mut envelope = client.get_envelope::<Vec<R>>(path).await?;
    let mut rows = std::mem::take(&mut envelope.data);

    let mut page = 1;
    while let Some(pagination) = envelope.pagination.as_ref() {
        if pagination.next_page_url.is_none() {
            break;
        }
        if page >= max_pages {
            tracing::warn!(resource = R::NAME, pages = page, "stopped following pagination");
            break;
        }
        page = pagination.current_page.max(page) + 1;
        envelope = client.get_envelope::<Vec<R>>(&with_page(path, page)).await?;
        rows.append(&mut envelope.data);
    }
    Ok(rows)
}

pub async fn delete<R: Resource>(client: &ApiClient, id: &str) -> Result<Option<String>, ApiError> {
    let message = client.delete(&R::delete_path(id)?).await?;
    tracing::info!(resource = R::NAME, id, "row deleted");
    Ok(message)
}

pub fn new_table<R: Resource>(data: Arc<[R]>) -> DataTable<R> {
    DataTable::new(R::TITLE, R::columns(), data)
}

pub async fn fetch_analytics(client: &ApiClient) -> Result<Analytics, ApiError> {
    client.get("analytics").await
}

pub async fn create_lecturer(client: &ApiClient, person: &NewPerson) -> Result<Option<String>, ApiError> {
    client.post("lecturer", person).await
}

pub async fn create_student(client: &ApiClient, person: &NewPerson) -> Result<Option<String>, ApiError> {
    client.post("user/create-student", person).await
}

pub async fn create_faq(client: &ApiClient, faq: &FaqPayload) -> Result<Option<String>, ApiError> {
    client.post("faq", faq).await
}

pub async fn update_faq(client: &ApiClient, id: &str, faq: &FaqPayload) -> Result<Option<String>, ApiError> {
    client.put(&format!("faq/{id}"), faq).await
}

pub async fn enroll_student(client: &ApiClient, enrollment: &Enrollment) -> Result<Option<String>, ApiError> {
    client.post("cohort/enroll-student", enrollment).await
}

pub async fn update_student(client: &ApiClient, id: &str, person: &NewPerson) -> Result<Option<String>, ApiError> {
    client.post(&format!("user/update-student/{id}"), person).await
}

pub async fn disenroll_student(
    client: &ApiClient,
    cohort_id: &str,
    student_id: &str,
) -> Result<Option<String>, ApiError> {
    client
        .delete(&format!("cohort/disenroll-student/{cohort_id}/{student_id}"))
        .await
}

pub async fn add_schedule(
    client: &ApiClient,
    cohort_id: &str,
    schedule: &NewSchedule,
) -> Result<Option<String>, ApiError> {
    client.post(&format!("cohort/add-schedule/{cohort_id}"), schedule).await
}

pub async fn set_meeting_link(
    client: &ApiClient,
    schedule_id: &str,
    link: &MeetingLink,
) -> Result<Option<String>, ApiError> {
    client.put(&format!("cohort/add-url/{schedule_id}"), link).await
}

fn active_status(active: bool) -> Option<Cow<'static, str>> {
    Some(Cow::Borrowed(if active { "active" } else { "inactive" }))
}

impl TableRow for Cohort {
    fn row_id(&self) -> RowId {
        self.id.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }

    fn status(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.status.as_str()))
    }

    fn filter_date(&self) -> Option<&str> {
        Some(self.created_at.as_str())
    }
}

impl Resource for Cohort {
    const NAME: &'static str = "cohorts";
    const TITLE: &'static str = "Cohort Management";
    const SHEET: &'static str = "Cohorts";
    const STATUS_OPTIONS: &'static [&'static str] = &[VIEW_ALL, "Open", "Closed"];

    fn list_path(_scope: Option<&str>) -> Result<String, ApiError> {
        Ok("cohort".to_string())
    }

    fn delete_path(id: &str) -> Result<String, ApiError> {
        Ok(format!("cohort/{id}"))
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("name", "Name", |c: &Cohort| CellValue::text(c.name.as_str())).sortable(),
            Column::new("amount", "Amount", |c: &Cohort| CellValue::numeric_text(&c.amount))
                .sortable()
                .render_with(|c| format::currency(&c.amount)),
            Column::new("capacity", "Capacity", |c: &Cohort| {
                CellValue::Number(c.enrollment_capacity as f64)
            })
            .sortable(),
            Column::new("start_date", "Start Date", |c: &Cohort| CellValue::text(c.start_date.as_str()))
                .sortable()
                .render_with(|c| format::long_date(&c.start_date)),
            Column::new("end_date", "End Date", |c: &Cohort| CellValue::text(c.end_date.as_str()))
                .sortable()
                .render_with(|c| format::long_date(&c.end_date)),
            Column::new("status", "Status", |c: &Cohort| CellValue::text(c.status.as_str())),
        ]
    }
}

impl TableRow for Course {
    fn row_id(&self) -> RowId {
        self.id.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        if let Some(category) = &self.category {
            fields.push(category.name.as_str());
        }
        fields
    }

    fn filter_date(&self) -> Option<&str> {
        self.created_at.as_deref()
    }
}

impl Resource for Course {
    const NAME: &'static str = "courses";
    const TITLE: &'static str = "Course Management";
    const SHEET: &'static str = "Courses";
    const STATUS_OPTIONS: &'static [&'static str] = &[VIEW_ALL];

    fn list_path(_scope: Option<&str>) -> Result<String, ApiError> {
        Ok("course".to_string())
    }

    fn delete_path(id: &str) -> Result<String, ApiError> {
        Ok(format!("course/{id}"))
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("title", "Title", |c: &Course| CellValue::text(c.title.as_str())).sortable(),
            Column::new("category", "Category", |c: &Course| {
                CellValue::optional_text(c.category.as_ref().map(|category| category.name.as_str()))
            })
            .sortable(),
            Column::new("level", "Level", |c: &Course| CellValue::optional_text(c.level.as_deref()))
                .sortable(),
            Column::new("amount", "Amount", |c: &Course| match &c.amount {
                Some(amount) => CellValue::numeric_text(amount),
                None => CellValue::Empty,
            })
            .sortable()
            .render_with(|c| c.amount.as_deref().map(format::currency).unwrap_or_default()),
            Column::new("created_at", "Date Created", |c: &Course| {
                CellValue::optional_text(c.created_at.as_deref())
            })
            .sortable()
            .render_with(|c| c.created_at.as_deref().map(format::long_date).unwrap_or_default()),
        ]
    }
}

impl TableRow for Lecturer {
    fn row_id(&self) -> RowId {
        self.id.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
        ]
    }

    fn status(&self) -> Option<Cow<'_, str>> {
        active_status(self.status)
    }

    fn filter_date(&self) -> Option<&str> {
        Some(self.created_at.as_str())
    }
}

impl Resource for Lecturer {
    const NAME: &'static str = "lecturers";
    const TITLE: &'static str = "Lecturer Management";
    const SHEET: &'static str = "Lecturers";
    const STATUS_OPTIONS: &'static [&'static str] = &[VIEW_ALL, "Active", "Inactive"];

    fn list_path(_scope: Option<&str>) -> Result<String, ApiError> {
        Ok("lecturer".to_string())
    }

    fn delete_path(id: &str) -> Result<String, ApiError> {
        Ok(format!("lecturer/{id}"))
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("name", "Name", |l: &Lecturer| CellValue::text(l.full_name())).sortable(),
            Column::new("email", "Email", |l: &Lecturer| CellValue::text(l.email.as_str())).sortable(),
            Column::new("phone", "Phone", |l: &Lecturer| CellValue::optional_text(l.phone.as_deref())),
            Column::new("specialization", "Specialization", |l: &Lecturer| {
                CellValue::optional_text(l.specialization.as_deref())
            }),
            Column::new("status", "Status", |l: &Lecturer| CellValue::Flag(l.status))
                .sortable()
                .render_with(|l| format::active_label(l.status).to_string()),
        ]
    }
}

impl TableRow for Student {
    fn row_id(&self) -> RowId {
        self.id.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
        ]
    }

    fn status(&self) -> Option<Cow<'_, str>> {
        active_status(self.is_active)
    }

    fn filter_date(&self) -> Option<&str> {
        Some(self.created_at.as_str())
    }
}

impl Resource for Student {
    const NAME: &'static str = "students";
    const TITLE: &'static str = "Student Management";
    const SHEET: &'static str = "Students";
    const STATUS_OPTIONS: &'static [&'static str] = &[VIEW_ALL, "Active", "Inactive"];

    fn list_path(_scope: Option<&str>) -> Result<String, ApiError> {
        Ok("user/role/students".to_string())
    }

    fn delete_path(id: &str) -> Result<String, ApiError> {
        Ok(format!("user/delete/{id}"))
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("name", "Name", |s: &Student| CellValue::text(s.full_name())).sortable(),
            Column::new("email", "Email", |s: &Student| CellValue::text(s.email.as_str())).sortable(),
            Column::new("phone", "Phone", |s: &Student| CellValue::optional_text(s.phone.as_deref())),
            Column::new("created_at", "Date Joined", |s: &Student| CellValue::text(s.created_at.as_str()))
                .sortable()
                .render_with(|s| format::long_date(&s.created_at)),
            Column::new("status", "Status", |s: &Student| CellValue::Flag(s.is_active))
                .sortable()
                .render_with(|s| format::active_label(s.is_active).to_string()),
        ]
    }
}

impl TableRow for CohortStudent {
    fn row_id(&self) -> RowId {
        self.id.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
        ]
    }

    fn status(&self) -> Option<Cow<'_, str>> {
        active_status(self.is_active)
    }

    fn filter_date(&self) -> Option<&str> {
        Some(self.created_at.as_str())
    }
}

/// Students of a cohort's roster who are not enrolled yet.
impl Resource for CohortStudent {
    const NAME: &'static str = "unenrolled-students";
    const TITLE: &'static str = "Unenrolled Students";
    const SHEET: &'static str = "Unenrolled Students";
    const STATUS_OPTIONS: &'static [&'static str] = &[VIEW_ALL, "Active", "Inactive"];
    const LIST_KEY: &'static str = "students";

    fn list_path(scope: Option<&str>) -> Result<String, ApiError> {
        match scope {
            Some(cohort_id) => Ok(format!("cohort/all-students-with-status/{cohort_id}")),
            None => Err(ApiError::MissingScope {
                resource: Self::NAME,
            }),
        }
    }

    fn delete_path(_id: &str) -> Result<String, ApiError> {
        Err(ApiError::ReadOnly {
            resource: Self::NAME,
        })
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("name", "Name", |s: &CohortStudent| CellValue::text(s.full_name())).sortable(),
            Column::new("email", "Email", |s: &CohortStudent| CellValue::text(s.email.as_str())).sortable(),
            Column::new("phone", "Phone", |s: &CohortStudent| CellValue::optional_text(s.phone.as_deref())),
            Column::new("gender", "Gender", |s: &CohortStudent| CellValue::optional_text(s.gender.as_deref())),
            Column::new("status", "Status", |s: &CohortStudent| CellValue::Flag(s.is_active))
                .sortable()
                .render_with(|s| format::active_label(s.is_active).to_string()),
        ]
    }

    fn is_listed(&self) -> bool {
        !self.is_enrolled
    }
}

impl TableRow for WaitlistEntry {
    fn row_id(&self) -> RowId {
        self.id.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.email.as_str()];
        if let Some(name) = &self.full_name {
            fields.push(name.as_str());
        }
        fields
    }

    fn filter_date(&self) -> Option<&str> {
        Some(self.created_at.as_str())
    }
}

impl Resource for WaitlistEntry {
    const NAME: &'static str = "waitlist";
    const TITLE: &'static str = "Waitlist";
    const SHEET: &'static str = "Waitlist";
    const STATUS_OPTIONS: &'static [&'static str] = &[VIEW_ALL];

    fn list_path(_scope: Option<&str>) -> Result<String, ApiError> {
        Ok("waitlist".to_string())
    }

    fn delete_path(_id: &str) -> Result<String, ApiError> {
        Err(ApiError::ReadOnly {
            resource: Self::NAME,
        })
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("name", "Name", |w: &WaitlistEntry| CellValue::optional_text(w.full_name.as_deref()))
                .sortable(),
            Column::new("email", "Email", |w: &WaitlistEntry| CellValue::text(w.email.as_str())).sortable(),
            Column::new("phone", "Phone", |w: &WaitlistEntry| {
                CellValue::optional_text(w.phone_number.as_deref())
            }),
            Column::new("country", "Country", |w: &WaitlistEntry| CellValue::optional_text(w.country.as_deref()))
                .sortable(),
            Column::new("created_at", "Date Joined", |w: &WaitlistEntry| CellValue::text(w.created_at.as_str()))
                .sortable()
                .render_with(|w| format::long_date(&w.created_at)),
        ]
    }
}

impl TableRow for Schedule {
    fn row_id(&self) -> RowId {
        self.id.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.session_type.as_str()];
        if let Some(topic) = &self.course_topic {
            fields.push(topic.title.as_str());
        }
        fields
    }

    fn filter_date(&self) -> Option<&str> {
        Some(self.date.as_str())
    }
}

impl Resource for Schedule {
    const NAME: &'static str = "schedules";
    const TITLE: &'static str = "Cohort Schedule";
    const SHEET: &'static str = "Schedules";
    const STATUS_OPTIONS: &'static [&'static str] = &[VIEW_ALL];

    fn list_path(scope: Option<&str>) -> Result<String, ApiError> {
        match scope {
            Some(cohort_id) => Ok(format!("cohort/fetch-schedule/{cohort_id}")),
            None => Err(ApiError::MissingScope {
                resource: Self::NAME,
            }),
        }
    }

    fn delete_path(id: &str) -> Result<String, ApiError> {
        Ok(format!("cohort/delete-schedule/{id}"))
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("topic", "Topic", |s: &Schedule| {
                CellValue::optional_text(s.course_topic.as_ref().map(|topic| topic.title.as_str()))
            })
            .sortable(),
            Column::new("session_type", "Session", |s: &Schedule| {
                CellValue::text(s.session_type.as_str())
            })
            .sortable(),
            Column::new("date", "Date", |s: &Schedule| CellValue::text(s.date.as_str()))
                .sortable()
                .render_with(|s| format::long_date(&s.date)),
            Column::new("url", "Meeting Link", |s: &Schedule| CellValue::optional_text(s.url.as_deref())),
        ]
    }
}

impl TableRow for Post {
    fn row_id(&self) -> RowId {
        self.id.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.post_title.as_str()];
        if let Some(author) = &self.post_author {
            fields.push(author.as_str());
        }
        fields
    }

    fn status(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.post_status.as_str()))
    }

    fn filter_date(&self) -> Option<&str> {
        Some(self.created_at.as_str())
    }
}

impl Resource for Post {
    const NAME: &'static str = "posts";
    const TITLE: &'static str = "Posts";
    const SHEET: &'static str = "Posts";
    const STATUS_OPTIONS: &'static [&'static str] = &[VIEW_ALL, "Draft", "Published"];

    fn list_path(_scope: Option<&str>) -> Result<String, ApiError> {
        Ok("post".to_string())
    }

    fn delete_path(id: &str) -> Result<String, ApiError> {
        Ok(format!("post/{id}"))
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("title", "Title", |p: &Post| CellValue::text(p.post_title.as_str())).sortable(),
            Column::new("author", "Author", |p: &Post| CellValue::optional_text(p.post_author.as_deref()))
                .sortable(),
            Column::new("status", "Status", |p: &Post| CellValue::text(p.post_status.as_str())).sortable(),
            Column::new("created_at", "Created", |p: &Post| CellValue::text(p.created_at.as_str()))
                .sortable()
                .render_with(|p| format::long_date(&p.created_at)),
        ]
    }
}

impl TableRow for Faq {
    fn row_id(&self) -> RowId {
        self.id.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.question.as_str(), self.answer.as_str()]
    }

    fn filter_date(&self) -> Option<&str> {
        Some(self.created_at.as_str())
    }
}

impl Resource for Faq {
    const NAME: &'static str = "faqs";
    const TITLE: &'static str = "FAQs";
    const SHEET: &'static str = "FAQs";
    const STATUS_OPTIONS: &'static [&'static str] = &[VIEW_ALL];

    fn list_path(_scope: Option<&str>) -> Result<String, ApiError> {
        Ok("faq".to_string())
    }

    fn delete_path(id: &str) -> Result<String, ApiError> {
        Ok(format!("faq/{id}"))
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("question", "Question", |f: &Faq| CellValue::text(f.question.as_str())).sortable(),
            Column::new("answer", "Answer", |f: &Faq| CellValue::text(f.answer.as_str())),
        ]
    }
}
