use serde::{Deserialize, Serialize};

use crate::domain::{OwnerId, TaskId, DEFAULT_OWNER_ID};

fn default_owner() -> OwnerId {
    DEFAULT_OWNER_ID
}

/// A `/todos` record as the placeholder API returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTask {
    pub id: TaskId,
    #[serde(default = "default_owner")]
    pub user_id: OwnerId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub user_id: OwnerId,
    pub title: String,
    pub completed: bool,
}

impl CreateTaskRequest {
    /// The placeholder API always receives new tasks as not completed.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            user_id: DEFAULT_OWNER_ID,
            title: title.into(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub user_id: OwnerId,
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
}

impl UpdateTaskRequest {
    pub fn new(id: TaskId, title: impl Into<String>, completed: bool) -> Self {
        Self {
            user_id: DEFAULT_OWNER_ID,
            id,
            title: title.into(),
            completed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomUserResponse {
    pub results: Vec<RandomUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomUser {
    pub login: RandomUserLogin,
    pub name: RandomUserName,
    pub email: String,
    pub picture: RandomUserPicture,
    pub location: RandomUserLocation,
    #[serde(default)]
    pub phone: String,
}

impl RandomUser {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name.first, self.name.last)
    }

    pub fn location_label(&self) -> String {
        format!("{}, {}", self.location.city, self.location.country)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomUserLogin {
    pub uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomUserName {
    pub first: String,
    pub last: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomUserPicture {
    pub medium: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomUserLocation {
    pub city: String,
    pub country: String,
}
