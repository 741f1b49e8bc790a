use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(TaskId);
id_newtype!(OwnerId);

/// Owner id the placeholder API expects on every write.
pub const DEFAULT_OWNER_ID: OwnerId = OwnerId(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: OwnerId,
    pub title: String,
    pub completed: bool,
    pub description: String,
}

impl Task {
    pub fn status_label(&self) -> &'static str {
        if self.completed {
            "Completed"
        } else {
            "Pending"
        }
    }

    pub fn with_completed(&self, completed: bool) -> Self {
        Self {
            completed,
            ..self.clone()
        }
    }
}

/// Field set shared by the create and edit forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub completed: bool,
}

impl TaskForm {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            completed: task.completed,
        }
    }

    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => f.write_str("asc"),
            Self::Descending => f.write_str("desc"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    ProjectManager,
    Developer,
    Designer,
    QaEngineer,
    DevOps,
    Marketing,
    ProductOwner,
    UxResearcher,
}

impl MemberRole {
    pub const ALL: [MemberRole; 8] = [
        MemberRole::ProjectManager,
        MemberRole::Developer,
        MemberRole::Designer,
        MemberRole::QaEngineer,
        MemberRole::DevOps,
        MemberRole::Marketing,
        MemberRole::ProductOwner,
        MemberRole::UxResearcher,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::ProjectManager => "Project Manager",
            Self::Developer => "Developer",
            Self::Designer => "Designer",
            Self::QaEngineer => "QA Engineer",
            Self::DevOps => "DevOps",
            Self::Marketing => "Marketing",
            Self::ProductOwner => "Product Owner",
            Self::UxResearcher => "UX Researcher",
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub location: String,
    pub phone: String,
    pub role: Option<MemberRole>,
    pub online: bool,
}

impl TeamMember {
    pub fn role_label(&self) -> &'static str {
        self.role.map(MemberRole::label).unwrap_or("Team Member")
    }
}
