/*
[INPUT]:  Task identifiers, input text and status/result updates
[OUTPUT]: Typed Task values from the backend
[POS]:    HTTP layer - task resource endpoints (require bearer auth)
[UPDATE]: When adding task endpoints or changing the envelope format
*/

use reqwest::Method;

use crate::http::{RequestContext, Result, TaskpadClient, TaskpadError};
use crate::types::{CreateTaskRequest, DataEnvelope, Task, UpdateTaskRequest};

impl TaskpadClient {
    /// Create a task
    ///
    /// POST /api/tasks
    pub async fn create_task(&self, input_text: &str) -> Result<Task> {
        if input_text.trim().is_empty() {
            return Err(TaskpadError::Validation("input text is required".to_string()));
        }
        let body = CreateTaskRequest {
            input_text: input_text.to_string(),
        };
        let builder = self.request(Method::POST, "/api/tasks")?.json(&body);
        let envelope: DataEnvelope<Task> = self.send_json(builder, RequestContext::new()).await?;
        Ok(envelope.data)
    }

    /// List the caller's tasks
    ///
    /// GET /api/tasks
    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let builder = self.request(Method::GET, "/api/tasks")?;
        let envelope: DataEnvelope<Vec<Task>> =
            self.send_json(builder, RequestContext::new()).await?;
        Ok(envelope.data)
    }

    /// Fetch one task
    ///
    /// GET /api/tasks/{id}
    pub async fn get_task(&self, id: &str) -> Result<Task> {
        let builder = self.request(Method::GET, &task_endpoint(id)?)?;
        let envelope: DataEnvelope<Task> = self.send_json(builder, RequestContext::new()).await?;
        Ok(envelope.data)
    }

    /// Update status and result of a task
    ///
    /// PUT /api/tasks/{id}
    pub async fn update_task(&self, id: &str, update: &UpdateTaskRequest) -> Result<Task> {
        let builder = self.request(Method::PUT, &task_endpoint(id)?)?.json(update);
        let envelope: DataEnvelope<Task> = self.send_json(builder, RequestContext::new()).await?;
        Ok(envelope.data)
    }

    /// Delete a task
    ///
    /// DELETE /api/tasks/{id}
    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &task_endpoint(id)?)?;
        self.send_empty(builder, RequestContext::new()).await
    }
}

fn task_endpoint(id: &str) -> Result<String> {
    let id = id.trim();
    if id.is_empty() || id.contains('/') {
        return Err(TaskpadError::Validation(format!("invalid task id: {id:?}")));
    }
    Ok(format!("/api/tasks/{id}"))
}
