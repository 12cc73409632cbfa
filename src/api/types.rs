use serde::{Deserialize, Serialize};

use crate::models::{Astronaut, User};

/// Response envelope. Only populated fields are serialized.
#[derive(Debug, Default, Serialize)]
pub struct ApiResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub astronaut: Option<Astronaut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub astronauts: Option<Vec<Astronaut>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ApiResponse {
    #[must_use]
    pub fn user(user: User) -> Self {
        Self {
            user: Some(user),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn users(users: Vec<User>) -> Self {
        Self {
            users: Some(users),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn astronaut(astronaut: Astronaut) -> Self {
        Self {
            astronaut: Some(astronaut),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn astronauts(astronauts: Vec<Astronaut>) -> Self {
        Self {
            astronauts: Some(astronauts),
            ..Self::default()
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            error: Some("validation failed".to_string()),
            errors,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub uptime_seconds: u64,
}
