//! HTTP transport for admin-ajax actions.
//!
//! DESIGN
//! ======
//! Every feature speaks through one seam: [`Ajax::post`], a single
//! form-encoded POST to `/wp-admin/admin-ajax.php` that injects the
//! `action` and `nonce` fields and decodes the `{success, data}`
//! envelope. Production uses [`HttpAjax`] over reqwest; tests script
//! responses with `test_support::MockAjax` and never open a socket.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::BotkitConfig;
use crate::envelope::AjaxEnvelope;
use crate::error::ClientError;

/// One admin-ajax round trip, decoded through the envelope.
#[async_trait]
pub trait Ajax: Send + Sync {
    /// POST `action` with the given form fields and return the
    /// envelope's success payload.
    async fn post(&self, action: &str, fields: &[(&str, String)]) -> Result<Value, ClientError>;
}

/// Production transport over a pooled reqwest client.
pub struct HttpAjax {
    http: reqwest::Client,
    base_url: String,
    ajax_url: String,
    nonce: String,
}

impl HttpAjax {
    pub fn new(config: &BotkitConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            ajax_url: config.ajax_url(),
            nonce: config.nonce.clone(),
        })
    }

    /// Fetch a finished artifact (a PDF download URL) as raw bytes.
    ///
    /// Artifact URLs are plain files, not ajax actions, so there is no
    /// envelope to decode here. Site-relative URLs are resolved against
    /// the configured base.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let url = resolve(&self.base_url, url);
        let response =
            self.http.get(url).send().await.map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http { status: status.as_u16(), body });
        }
        let bytes = response.bytes().await.map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Ajax for HttpAjax {
    async fn post(&self, action: &str, fields: &[(&str, String)]) -> Result<Value, ClientError> {
        let form = assemble(action, &self.nonce, fields);

        let response = self
            .http
            .post(&self.ajax_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| ClientError::Transport(e.to_string()))?;
        if status != 200 {
            return Err(ClientError::Http { status, body: text });
        }

        let envelope: AjaxEnvelope =
            serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))?;
        envelope.into_result().map_err(|message| ClientError::Api { message })
    }
}

/// Resolve a possibly site-relative artifact URL against the site root.
fn resolve(base_url: &str, url: &str) -> String {
    if url.starts_with('/') { format!("{base_url}{url}") } else { url.to_owned() }
}

/// Prepend the routing fields WordPress expects on every ajax POST.
fn assemble<'a>(
    action: &'a str,
    nonce: &'a str,
    fields: &'a [(&'a str, String)],
) -> Vec<(&'a str, &'a str)> {
    let mut form = Vec::with_capacity(fields.len() + 2);
    form.push(("action", action));
    form.push(("nonce", nonce));
    for (key, value) in fields {
        form.push((*key, value.as_str()));
    }
    form
}

// =============================================================================
// TEST SUPPORT
// =============================================================================


#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
