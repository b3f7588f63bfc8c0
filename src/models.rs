use serde::{Deserialize, Deserializer, Serialize};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawAmount> for String {
    fn from(raw: RawAmount) -> Self {
        match raw {
            RawAmount::Text(text) => text,
            RawAmount::Number(number) => number.to_string(),
        }
    }
}

/// Amounts arrive as `"1200.00"` or `1200`.
fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawAmount::deserialize(deserializer).map(String::from)
}

fn optional_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawAmount>::deserialize(deserializer)?.map(String::from))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Int(i64),
}

/// Flags arrive as booleans or as `0`/`1`.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match RawFlag::deserialize(deserializer)? {
        RawFlag::Bool(value) => value,
        RawFlag::Int(value) => value != 0,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "amount")]
    pub amount: String,
    pub enrollment_capacity: i64,
    pub cover_image: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "optional_amount")]
    pub amount: Option<String>,
    pub overview: Option<String>,
    pub level: Option<String>,
    pub cover_image: Option<String>,
    pub category_id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lecturer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub pic: Option<String>,
    pub gender: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub status: bool,
    pub created_at: String,
    pub updated_at: String,
    pub specialization: Option<String>,
    pub skills: Option<Vec<String>>,
    pub institution_of_work: Option<String>,
    pub department: Option<String>,
    pub academic_qualification: Option<String>,
    pub short_bio: Option<String>,
}

impl Lecturer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub pic: Option<String>,
    pub email_verified_at: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Student row from `cohort/all-students-with-status/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortStudent {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_enrolled: bool,
    pub created_at: String,
}

impl CohortStudent {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: String,
    pub full_name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub country: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseTopic {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub cohort_id: String,
    pub course_topic_id: Option<String>,
    pub session_type: String,
    pub date: String,
    pub url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub course_topic: Option<CourseTopic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub post_title: String,
    pub post_body: String,
    pub post_image: Option<String>,
    pub post_status: String,
    pub post_author: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub id: String,
    #[serde(rename = "faq_question", alias = "question")]
    pub question: String,
    #[serde(rename = "faq_answer", alias = "answer")]
    pub answer: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Dashboard counters from `GET analytics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub waitlist: u64,
    pub faqs: u64,
    pub posts: u64,
    pub draft_posts: u64,
    pub published_posts: u64,
    pub lecturers: u64,
    pub active_lecturers: u64,
    pub inactive_lecturers: u64,
    pub admins: u64,
    pub students: u64,
    pub cohorts: Option<u64>,
    pub open_cohorts: Option<u64>,
    pub active_cohorts: Option<u64>,
    pub completed_cohorts: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pic: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub token: Option<String>,
    pub data: Option<SignInUser>,
}

/// Payload for creating a lecturer or a student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPerson {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaqPayload {
    pub faq_question: String,
    pub faq_answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSchedule {
    pub course_topic_id: String,
    pub session_type: String,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingLink {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enrollment {
    pub cohort_id: String,
    pub student_id: String,
}
