//! Operator accounts that act as request principals.

use chrono::{DateTime, Utc};

/// A user of the management API.
///
/// Only users with `administrator = true` may mutate plans, students or
/// enrollments.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub administrator: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub administrator: bool,
}

/// Identifier of the authenticated caller, resolved from its API token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Principal(pub i64);

impl Principal {
    pub fn id(&self) -> i64 {
        self.0
    }
}
