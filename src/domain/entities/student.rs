//! Student entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A gym member. `email` is unique across students.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub weight: f64,
    pub height: f64,
    pub created_at: DateTime<Utc>,
}

/// Input data for registering a student.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub age: i32,
    pub weight: f64,
    pub height: f64,
}

/// Partial update for a student. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
}

impl StudentPatch {
    pub fn apply(&self, student: &Student) -> Student {
        Student {
            name: self.name.clone().unwrap_or_else(|| student.name.clone()),
            email: self.email.clone().unwrap_or_else(|| student.email.clone()),
            age: self.age.unwrap_or(student.age),
            weight: self.weight.unwrap_or(student.weight),
            height: self.height.unwrap_or(student.height),
            ..student.clone()
        }
    }
}
