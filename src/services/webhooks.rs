use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::domain::{ModelType, Result, WatcherError, Webhook};
use crate::trello::BoardClient;

/// Builds the deterministic callback URL for a watched model: `{scheme}://{host}/{type}/{id}`.
pub fn callback_url(scheme: &str, host: &str, model_type: ModelType, model_id: &str) -> Result<String> {
    let mut url = url::Url::parse(&format!("{}://{}", scheme, host)).map_err(|e| {
        WatcherError::Configuration(format!("Invalid callback base {}://{}: {}", scheme, host, e))
    })?;
    url.set_path(&format!("/{}/{}", model_type, model_id));
    Ok(url.to_string())
}

/// Owns the webhook registry: at most one webhook per watched model id.
///
/// Webhooks are created on demand and toggled, never deleted. Toggling a model that has
/// no registered webhook is a silent no-op.
pub struct WebhookManager {
    client: Arc<dyn BoardClient>,
    scheme: String,
    host: String,
    registry: RwLock<Vec<Webhook>>,
    /// Open `suspended` scopes per model id. Only the first scope to open switches the
    /// webhook off and only the last to close switches it back on.
    suspensions: Mutex<HashMap<String, usize>>,
}

impl WebhookManager {
    pub fn new(
        client: Arc<dyn BoardClient>,
        scheme: impl Into<String>,
        host: impl Into<String>,
        webhooks: Vec<Webhook>,
    ) -> Self {
        Self {
            client,
            scheme: scheme.into(),
            host: host.into(),
            registry: RwLock::new(webhooks),
            suspensions: Mutex::new(HashMap::new()),
        }
    }

    /// Seeds the registry with every webhook already registered for the token.
    pub async fn load(
        client: Arc<dyn BoardClient>,
        scheme: impl Into<String>,
        host: impl Into<String>,
    ) -> Result<Self> {
        let webhooks = client.webhooks().await?;
        tracing::info!(count = webhooks.len(), "Loaded registered webhooks");
        Ok(Self::new(client, scheme, host, webhooks))
    }

    pub fn callback_url(&self, model_type: ModelType, model_id: &str) -> Result<String> {
        callback_url(&self.scheme, &self.host, model_type, model_id)
    }

    pub async fn find(&self, model_id: &str) -> Option<Webhook> {
        self.registry
            .read()
            .await
            .iter()
            .find(|hook| hook.model_id == model_id)
            .cloned()
    }

    pub async fn snapshot(&self) -> Vec<Webhook> {
        self.registry.read().await.clone()
    }

    /// Returns the model's webhook, registering a new one if none exists yet.
    pub async fn ensure(&self, model_type: ModelType, model_id: &str) -> Result<Webhook> {
        // Held across the create so two events cannot register the same model twice.
        let mut registry = self.registry.write().await;
        if let Some(existing) = registry.iter().find(|hook| hook.model_id == model_id) {
            return Ok(existing.clone());
        }

        let callback = self.callback_url(model_type, model_id)?;
        let description = format!("{}: {}", model_type, model_id);
        let webhook = self
            .client
            .create_webhook(&description, &callback, model_id)
            .await?;

        tracing::info!(
            webhook_id = webhook.id,
            model_id,
            callback_url = callback,
            "Registered webhook"
        );
        registry.push(webhook.clone());
        Ok(webhook)
    }

    pub async fn activate(&self, model_id: &str) -> Result<()> {
        self.set_active(model_id, true).await
    }

    pub async fn deactivate(&self, model_id: &str) -> Result<()> {
        self.set_active(model_id, false).await
    }

    pub async fn ensure_active(&self, model_type: ModelType, model_id: &str) -> Result<Webhook> {
        let webhook = self.ensure(model_type, model_id).await?;
        self.activate(model_id).await?;
        Ok(Webhook {
            active: true,
            ..webhook
        })
    }

    async fn set_active(&self, model_id: &str, active: bool) -> Result<()> {
        let Some(webhook) = self.find(model_id).await else {
            tracing::debug!(model_id, active, "No webhook registered; nothing to toggle");
            return Ok(());
        };

        self.client.set_webhook_active(&webhook.id, active).await?;

        let mut registry = self.registry.write().await;
        if let Some(hook) = registry.iter_mut().find(|hook| hook.id == webhook.id) {
            hook.active = active;
        }
        tracing::debug!(webhook_id = webhook.id, model_id, active, "Toggled webhook");
        Ok(())
    }

    /// Runs `work` with the model's notifications switched off, switching them back on
    /// afterwards whether or not `work` succeeded.
    ///
    /// Scopes on the same model nest: while any of them is still running the webhook
    /// stays off.
    pub async fn suspended<T, F>(&self, model_id: &str, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.suspend(model_id).await?;
        let outcome = work.await;
        let restored = self.resume(model_id).await;

        match (outcome, restored) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(restore_err)) => {
                tracing::error!(
                    model_id,
                    error = %restore_err,
                    "Failed to reactivate webhook after failed operation"
                );
                Err(err)
            }
        }
    }

    async fn suspend(&self, model_id: &str) -> Result<()> {
        // Held across the toggle so a second scope cannot start work before the first
        // has actually switched the webhook off.
        let mut suspensions = self.suspensions.lock().await;
        let open = suspensions.get(model_id).copied().unwrap_or(0);
        if open == 0 {
            self.deactivate(model_id).await?;
        }
        suspensions.insert(model_id.to_string(), open + 1);
        Ok(())
    }

    async fn resume(&self, model_id: &str) -> Result<()> {
        let mut suspensions = self.suspensions.lock().await;
        let remaining = suspensions
            .get(model_id)
            .copied()
            .unwrap_or(1)
            .saturating_sub(1);
        if remaining > 0 {
            tracing::debug!(model_id, remaining, "Webhook stays suspended");
            suspensions.insert(model_id.to_string(), remaining);
            return Ok(());
        }
        suspensions.remove(model_id);
        self.activate(model_id).await
    }
}
