/*
[INPUT]:  Parsed subcommands, session manager, layered CLI configuration
[OUTPUT]: Backend calls, worker runs and terminal output
[POS]:    Command layer - the flows behind each `taskpad` subcommand
[UPDATE]: When adding subcommands or changing the task processing flow
*/

use anyhow::{Context, Result, anyhow, bail};
use console::style;
use dialoguer::{Input, Password, theme::ColorfulTheme};
use taskpad_client::{
    SessionManager, Task, TaskStatus, TaskpadClient, UpdateTaskRequest, WorkerEvent,
    WorkerRequest, WorkerSlot,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::CliConfig;

/// Log in with configured credentials, prompting for whatever is missing.
pub async fn sign_in(
    session: &SessionManager,
    config: &CliConfig,
    email_override: Option<&str>,
) -> Result<()> {
    let theme = ColorfulTheme::default();
    let email = match email_override.or(config.email.as_deref()) {
        Some(email) => email.to_string(),
        None => Input::with_theme(&theme)
            .with_prompt("Email")
            .interact_text()
            .context("read email")?,
    };
    let password = match config.password.as_deref() {
        Some(password) => password.to_string(),
        None => Password::with_theme(&theme)
            .with_prompt("Password")
            .interact()
            .context("read password")?,
    };

    let outcome = session.login(&email, &password).await;
    if !outcome.success {
        bail!(outcome.error.unwrap_or_else(|| "Login failed".to_string()));
    }
    info!(email = %email, "signed in");
    Ok(())
}

/// Create an account and start a session for it.
pub async fn register(
    session: &SessionManager,
    config: &CliConfig,
    email_override: Option<&str>,
) -> Result<()> {
    let theme = ColorfulTheme::default();

    let mut name_prompt = Input::<String>::with_theme(&theme).with_prompt("Name");
    if let Some(name) = config.name.as_deref() {
        name_prompt = name_prompt.default(name.to_string());
    }
    let name = name_prompt.interact_text().context("read name")?;

    let mut email_prompt = Input::<String>::with_theme(&theme).with_prompt("Email");
    if let Some(email) = email_override.or(config.email.as_deref()) {
        email_prompt = email_prompt.default(email.to_string());
    }
    let email = email_prompt.interact_text().context("read email")?;

    let password = Password::with_theme(&theme)
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .context("read password")?;

    let outcome = session.register(&name, &email, &password).await;
    if !outcome.success {
        bail!(
            outcome
                .error
                .unwrap_or_else(|| "Registration failed".to_string())
        );
    }
    println!("{} registered {}", style("ok:").green().bold(), email);
    Ok(())
}

/// Run the worker on a task that still lacks a result, store the result and
/// return the task as the backend now reports it.
///
/// Completed tasks and tasks that already carry a result are returned as
/// fetched. Cancelling `shutdown` terminates the worker and nothing is saved.
pub async fn process_task<F>(
    client: &TaskpadClient,
    id: &str,
    shutdown: &CancellationToken,
    mut on_progress: F,
) -> Result<Task>
where
    F: FnMut(u8, &str),
{
    let task = client.get_task(id).await.context("fetch task")?;
    if !task.needs_processing() {
        debug!(task_id = %task.id, status = %task.status, "task needs no processing");
        return Ok(task);
    }

    let mut slot = WorkerSlot::new();
    let worker = slot.start(WorkerRequest::new(task.input_text.clone()));

    let result = loop {
        let event = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            event = worker.next_event() => event,
        };

        match event {
            Some(WorkerEvent::Progress { value, step }) => on_progress(value, &step),
            Some(WorkerEvent::Done { result }) => break result,
            Some(WorkerEvent::Error { message }) => bail!("processing failed: {message}"),
            None => {
                worker.terminate();
                if shutdown.is_cancelled() {
                    bail!("processing cancelled");
                }
                bail!("worker stopped before completing");
            }
        }
    };

    let update = UpdateTaskRequest {
        status: TaskStatus::Completed,
        result: serde_json::to_string_pretty(&result).context("serialize worker result")?,
    };
    client
        .update_task(&task.id, &update)
        .await
        .context("save task result")?;
    info!(task_id = %task.id, "task processed");

    client.get_task(&task.id).await.context("reload task")
}

/// Stream every worker message for `text` as one JSON line each.
pub async fn worker_probe<F>(text: &str, shutdown: &CancellationToken, mut emit: F) -> Result<()>
where
    F: FnMut(String),
{
    let mut slot = WorkerSlot::new();
    let worker = slot.start(WorkerRequest::new(text));

    loop {
        let event = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            event = worker.next_event() => event,
        };
        let Some(event) = event else {
            worker.terminate();
            return Err(anyhow!("worker terminated"));
        };

        emit(serde_json::to_string(&event).context("serialize worker event")?);
        if event.is_terminal() {
            return Ok(());
        }
    }
}

pub fn format_task(task: &Task) -> String {
    let status = match task.status {
        TaskStatus::Completed => style(task.status.as_str()).green(),
        TaskStatus::Processing => style(task.status.as_str()).yellow(),
        TaskStatus::Pending => style(task.status.as_str()).dim(),
    };
    format!("{}  [{}]  {}", style(&task.id).bold(), status, task.input_text)
}

pub fn format_task_detail(task: &Task) -> String {
    let mut lines = vec![
        format!("id:         {}", task.id),
        format!("status:     {}", task.status),
        format!("input:      {}", task.input_text),
    ];
    if let Some(created) = task.created_at.as_deref() {
        lines.push(format!("created:    {created}"));
    }
    if let Some(updated) = task.updated_at.as_deref() {
        lines.push(format!("updated:    {updated}"));
    }
    match task.result.as_deref().filter(|result| !result.is_empty()) {
        Some(result) => {
            lines.push("result:".to_string());
            lines.push(result.to_string());
        }
        None => lines.push("result:     (none)".to_string()),
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(result: Option<&str>) -> Task {
        serde_json::from_value(serde_json::json!({
            "_id": "t1",
            "inputText": "hello",
            "status": "pending",
            "result": result,
        }))
        .unwrap()
    }

    #[test]
    fn test_format_task_detail() {
        let detail = format_task_detail(&task(None));
        assert!(detail.contains("id:         t1"));
        assert!(detail.contains("result:     (none)"));

        let detail = format_task_detail(&task(Some("{\"ok\":true}")));
        assert!(detail.ends_with("{\"ok\":true}"));
    }

    #[tokio::test]
    async fn test_worker_probe_emits_json_lines() {
        let mut lines = Vec::new();
        worker_probe("ab", &CancellationToken::new(), |line| lines.push(line))
            .await
            .unwrap();

        assert_eq!(lines.len(), 6);
        assert!(lines[0].contains("\"type\":\"progress\""));
        assert!(lines[5].contains("\"type\":\"done\""));
    }

    #[tokio::test]
    async fn test_worker_probe_stops_on_cancel() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let err = worker_probe("ab", &shutdown, |_| {}).await.unwrap_err();
        assert!(err.to_string().contains("terminated"));
    }
}
