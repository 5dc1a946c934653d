//! Record types for the three resource collections.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::collection::Collection;
use crate::store::Tables;

/// One of the resource collections exposed over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Courses,
    Students,
    Enrollments,
}

impl ResourceKind {
    /// All resources, in snapshot order.
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Courses,
        ResourceKind::Students,
        ResourceKind::Enrollments,
    ];

    /// Path segment and snapshot key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Courses => "courses",
            ResourceKind::Students => "students",
            ResourceKind::Enrollments => "enrollments",
        }
    }

    /// Name of a single record, used in error messages.
    pub fn singular(&self) -> &'static str {
        match self {
            ResourceKind::Courses => "Course",
            ResourceKind::Students => "Student",
            ResourceKind::Enrollments => "Enrollment",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "courses" => Ok(ResourceKind::Courses),
            "students" => Ok(ResourceKind::Students),
            "enrollments" => Ok(ResourceKind::Enrollments),
            other => Err(format!("unknown resource '{}'", other)),
        }
    }
}

/// Foreign key held by a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference<'a> {
    /// Wire name of the referencing field
    pub field: &'static str,
    /// Collection the id must exist in
    pub target: ResourceKind,
    /// Referenced id
    pub id: &'a str,
}

/// A record stored in one of the collections.
///
/// `Draft` is the body accepted by create and replace (every field except
/// `id`), `Patch` the body accepted by merge (every field optional).
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Draft: DeserializeOwned;
    type Patch: DeserializeOwned;

    /// Collection this record type lives in.
    const KIND: ResourceKind;

    /// Required wire fields, excluding `id`.
    const FIELDS: &'static [&'static str];

    fn id(&self) -> &str;

    fn from_draft(id: String, draft: Self::Draft) -> Self;

    fn apply_patch(&mut self, patch: Self::Patch);

    /// Foreign keys that must resolve when the record is written.
    fn references(&self) -> Vec<Reference<'_>> {
        Vec::new()
    }

    fn collection(tables: &Tables) -> &Collection<Self>;

    fn collection_mut(tables: &mut Tables) -> &mut Collection<Self>;
}

/// Fixture files written by other tools often use numeric ids.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

/// A course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub teacher: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub teacher: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub teacher: Option<String>,
}

impl Record for Course {
    type Draft = CourseDraft;
    type Patch = CoursePatch;

    const KIND: ResourceKind = ResourceKind::Courses;
    const FIELDS: &'static [&'static str] = &["title", "description", "teacher"];

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: CourseDraft) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            teacher: draft.teacher,
        }
    }

    fn apply_patch(&mut self, patch: CoursePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(teacher) = patch.teacher {
            self.teacher = teacher;
        }
    }

    fn collection(tables: &Tables) -> &Collection<Self> {
        &tables.courses
    }

    fn collection_mut(tables: &mut Tables) -> &mut Collection<Self> {
        &mut tables.courses
    }
}

/// A student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentDraft {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Record for Student {
    type Draft = StudentDraft;
    type Patch = StudentPatch;

    const KIND: ResourceKind = ResourceKind::Students;
    const FIELDS: &'static [&'static str] = &["name", "email"];

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: StudentDraft) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
        }
    }

    fn apply_patch(&mut self, patch: StudentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
    }

    fn collection(tables: &Tables) -> &Collection<Self> {
        &tables.students
    }

    fn collection_mut(tables: &mut Tables) -> &mut Collection<Self> {
        &mut tables.students
    }
}

/// A student's enrollment in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub student_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub course_id: String,
    /// ISO date, kept verbatim
    pub date: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentDraft {
    pub student_id: String,
    pub course_id: String,
    pub date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentPatch {
    pub student_id: Option<String>,
    pub course_id: Option<String>,
    pub date: Option<String>,
}

impl Record for Enrollment {
    type Draft = EnrollmentDraft;
    type Patch = EnrollmentPatch;

    const KIND: ResourceKind = ResourceKind::Enrollments;
    const FIELDS: &'static [&'static str] = &["studentId", "courseId", "date"];

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: EnrollmentDraft) -> Self {
        Self {
            id,
            student_id: draft.student_id,
            course_id: draft.course_id,
            date: draft.date,
        }
    }

    fn apply_patch(&mut self, patch: EnrollmentPatch) {
        if let Some(student_id) = patch.student_id {
            self.student_id = student_id;
        }
        if let Some(course_id) = patch.course_id {
            self.course_id = course_id;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
    }

    fn references(&self) -> Vec<Reference<'_>> {
        vec![
            Reference {
                field: "studentId",
                target: ResourceKind::Students,
                id: &self.student_id,
            },
            Reference {
                field: "courseId",
                target: ResourceKind::Courses,
                id: &self.course_id,
            },
        ]
    }

    fn collection(tables: &Tables) -> &Collection<Self> {
        &tables.enrollments
    }

    fn collection_mut(tables: &mut Tables) -> &mut Collection<Self> {
        &mut tables.enrollments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_kind_round_trips_path_segment() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
        assert!("teachers".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_enrollment_uses_camel_case_on_the_wire() {
        let enrollment = Enrollment {
            id: "1".to_string(),
            student_id: "2".to_string(),
            course_id: "3".to_string(),
            date: "2025-01-01".to_string(),
        };
        let value = serde_json::to_value(&enrollment).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": "1", "studentId": "2", "courseId": "3", "date": "2025-01-01"})
        );
    }

    #[test]
    fn test_numeric_fixture_ids_are_normalised() {
        let enrollment: Enrollment = serde_json::from_value(serde_json::json!({
            "id": 7, "studentId": 1, "courseId": "2", "date": "2025-01-01"
        }))
        .unwrap();
        assert_eq!(enrollment.id, "7");
        assert_eq!(enrollment.student_id, "1");
    }

    #[test]
    fn test_apply_patch_only_touches_supplied_fields() {
        let mut course = Course {
            id: "1".to_string(),
            title: "Rust".to_string(),
            description: "Systems".to_string(),
            teacher: "Old".to_string(),
        };
        course.apply_patch(CoursePatch {
            teacher: Some("New Teacher".to_string()),
            ..Default::default()
        });
        assert_eq!(course.teacher, "New Teacher");
        assert_eq!(course.title, "Rust");
        assert_eq!(course.description, "Systems");
    }
}
