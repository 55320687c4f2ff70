//! Wire types for the portal API

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Role of a portal account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
    #[serde(other)]
    Other,
}

/// Reference to a related record: either its primary key or a display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Related {
    Id(u64),
    Name(String),
}

/// Profile of the authenticated user (`/api/users/me/`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub group: Option<Related>,
    #[serde(default)]
    pub course: Option<Related>,
}

impl UserData {
    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    /// "First Last", falling back to the username
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Course teacher as returned by the API.
///
/// The server nests the teacher's profile; older payloads carry an id or a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TeacherRef {
    Profile(Box<UserData>),
    Id(u64),
    Name(String),
}

/// Catalog course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub img: Option<String>,
    pub teacher: TeacherRef,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub info_file: Option<String>,
}

/// Course topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub course: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Course task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub course: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub min_words: u32,
    /// Minutes reserved for the defense of this task
    #[serde(default)]
    pub expected_defense_time: u32,
}

/// Query parameters accepted by `/api/courses/`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilter {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub min_hours: Option<u32>,
    pub max_hours: Option<u32>,
    pub teacher: Option<u64>,
}

impl CourseFilter {
    /// Render the filter as query pairs
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(id) = self.id {
            query.push(("id".to_string(), id.to_string()));
        }
        if let Some(title) = &self.title {
            query.push(("title".to_string(), title.clone()));
        }
        if let Some(description) = &self.description {
            query.push(("description".to_string(), description.clone()));
        }
        if let Some(min) = self.min_hours {
            query.push(("min_hours".to_string(), min.to_string()));
        }
        if let Some(max) = self.max_hours {
            query.push(("max_hours".to_string(), max.to_string()));
        }
        if let Some(teacher) = self.teacher {
            query.push(("teacher".to_string(), teacher.to_string()));
        }
        query
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub access: String,
    /// Present when the server rotates refresh tokens
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VerifyRequest<'a> {
    pub token: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_parsing() {
        let teacher: Role = serde_json::from_value(json!("teacher")).unwrap();
        let student: Role = serde_json::from_value(json!("student")).unwrap();
        let admin: Role = serde_json::from_value(json!("admin")).unwrap();
        assert_eq!(teacher, Role::Teacher);
        assert_eq!(student, Role::Student);
        assert_eq!(admin, Role::Other);
    }

    #[test]
    fn test_user_profile_with_foreign_keys() {
        let user: UserData = serde_json::from_value(json!({
            "id": 1,
            "username": "alice",
            "email": "alice@example.com",
            "role": "teacher",
            "first_name": "Alice",
            "last_name": "Smith",
            "phone": null,
            "group": 4,
            "course": null,
            "is_staff": false
        }))
        .unwrap();

        assert!(user.is_teacher());
        assert!(!user.is_student());
        assert_eq!(user.group, Some(Related::Id(4)));
        assert_eq!(user.course, None);
        assert_eq!(user.display_name(), "Alice Smith");
    }

    #[test]
    fn test_course_teacher_variants() {
        let nested: Course = serde_json::from_value(json!({
            "id": 7,
            "title": "Databases",
            "description": "Relational modelling",
            "hours": 72,
            "img": null,
            "teacher": {"id": 1, "username": "alice", "role": "teacher"},
            "date": "2024-09-01"
        }))
        .unwrap();
        assert!(matches!(nested.teacher, TeacherRef::Profile(ref p) if p.username == "alice"));
        assert_eq!(nested.date, NaiveDate::from_ymd_opt(2024, 9, 1));

        let named: Course = serde_json::from_value(json!({
            "id": 8,
            "title": "Networks",
            "teacher": "Bob",
            "info_file": "/media/networks.pdf"
        }))
        .unwrap();
        assert_eq!(named.teacher, TeacherRef::Name("Bob".into()));
        assert_eq!(named.hours, 0);
    }

    #[test]
    fn test_course_filter_query() {
        let filter = CourseFilter {
            title: Some("data".into()),
            min_hours: Some(10),
            ..CourseFilter::default()
        };
        assert_eq!(
            filter.to_query(),
            vec![
                ("title".to_string(), "data".to_string()),
                ("min_hours".to_string(), "10".to_string()),
            ]
        );
        assert!(CourseFilter::default().to_query().is_empty());
    }
}
