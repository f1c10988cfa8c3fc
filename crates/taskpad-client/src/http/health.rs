/*
[INPUT]:  None
[OUTPUT]: Raw JSON liveness reports
[POS]:    HTTP layer - health probe endpoints (no auth required)
[UPDATE]: When the backend adds probes
*/

use reqwest::Method;

use crate::http::{RequestContext, Result, TaskpadClient};

impl TaskpadClient {
    /// GET /api/health
    pub async fn health(&self) -> Result<serde_json::Value> {
        let builder = self.request(Method::GET, "/api/health")?;
        self.send_json(builder, RequestContext::new()).await
    }

    /// GET /api/health/db
    pub async fn health_db(&self) -> Result<serde_json::Value> {
        let builder = self.request(Method::GET, "/api/health/db")?;
        self.send_json(builder, RequestContext::new()).await
    }
}
