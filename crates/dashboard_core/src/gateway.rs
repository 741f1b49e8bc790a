//! Gateways to the two remote data sources and their HTTP implementations.

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::TaskId,
    error::GatewayError,
    protocol::{CreateTaskRequest, RandomUser, RandomUserResponse, RemoteTask, UpdateTaskRequest},
};
use tracing::debug;
use url::Url;

pub const DEFAULT_TASK_API_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DEFAULT_DIRECTORY_API_URL: &str = "https://randomuser.me/api";

#[async_trait]
pub trait TaskGateway: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<RemoteTask>, GatewayError>;
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<RemoteTask, GatewayError>;
    async fn update_task(
        &self,
        id: TaskId,
        request: &UpdateTaskRequest,
    ) -> Result<RemoteTask, GatewayError>;
    async fn delete_task(&self, id: TaskId) -> Result<(), GatewayError>;
}

#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    async fn random_users(&self, count: usize) -> Result<Vec<RandomUser>, GatewayError>;
}

fn network(operation: &'static str) -> impl Fn(reqwest::Error) -> GatewayError {
    move |err| GatewayError::network(operation, err.to_string())
}

fn normalize_base_url(raw: &str) -> Result<String, url::ParseError> {
    let parsed = Url::parse(raw.trim())?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

pub struct HttpTaskGateway {
    http: Client,
    base_url: String,
}

impl HttpTaskGateway {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn todos_url(&self) -> String {
        format!("{}/todos", self.base_url)
    }

    fn todo_url(&self, id: TaskId) -> String {
        format!("{}/todos/{}", self.base_url, id.0)
    }
}

#[async_trait]
impl TaskGateway for HttpTaskGateway {
    async fn list_tasks(&self) -> Result<Vec<RemoteTask>, GatewayError> {
        const OP: &str = "list tasks";
        let url = self.todos_url();
        debug!(%url, "tasks: GET");
        self.http
            .get(&url)
            .send()
            .await
            .map_err(network(OP))?
            .error_for_status()
            .map_err(network(OP))?
            .json()
            .await
            .map_err(network(OP))
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<RemoteTask, GatewayError> {
        const OP: &str = "create task";
        let url = self.todos_url();
        debug!(%url, "tasks: POST");
        self.http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(network(OP))?
            .error_for_status()
            .map_err(network(OP))?
            .json()
            .await
            .map_err(network(OP))
    }

    async fn update_task(
        &self,
        id: TaskId,
        request: &UpdateTaskRequest,
    ) -> Result<RemoteTask, GatewayError> {
        const OP: &str = "update task";
        let url = self.todo_url(id);
        debug!(%url, "tasks: PUT");
        self.http
            .put(&url)
            .json(request)
            .send()
            .await
            .map_err(network(OP))?
            .error_for_status()
            .map_err(network(OP))?
            .json()
            .await
            .map_err(network(OP))
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), GatewayError> {
        const OP: &str = "delete task";
        let url = self.todo_url(id);
        debug!(%url, "tasks: DELETE");
        self.http
            .delete(&url)
            .send()
            .await
            .map_err(network(OP))?
            .error_for_status()
            .map_err(network(OP))?;
        Ok(())
    }
}

pub struct HttpDirectoryGateway {
    http: Client,
    base_url: String,
}

impl HttpDirectoryGateway {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DirectoryGateway for HttpDirectoryGateway {
    async fn random_users(&self, count: usize) -> Result<Vec<RandomUser>, GatewayError> {
        const OP: &str = "fetch team members";
        let url = format!("{}/", self.base_url);
        debug!(%url, count, "directory: GET");
        let response: RandomUserResponse = self
            .http
            .get(&url)
            .query(&[("results", count)])
            .send()
            .await
            .map_err(network(OP))?
            .error_for_status()
            .map_err(network(OP))?
            .json()
            .await
            .map_err(network(OP))?;
        Ok(response.results)
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
