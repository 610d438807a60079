//! Kroki HTTP engine.
//!
//! Each diagram is a `POST {url}/{endpoint}/png` with the source as body.
//! The agent keeps connections pooled for the lifetime of one session.

use std::time::Duration;

use ureq::Agent;

use crate::error::DiagramError;
use crate::language::DiagramLanguage;
use crate::renderer::{Diagram, DiagramRenderer, RendererLauncher};

/// Launches [`KrokiRenderer`]s against one server.
#[derive(Debug, Clone)]
pub struct KrokiLauncher {
    server_url: String,
    timeout: Duration,
}

impl KrokiLauncher {
    #[must_use]
    pub fn new(server_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_owned(),
            timeout,
        }
    }
}

impl RendererLauncher for KrokiLauncher {
    fn launch(&self) -> Result<Box<dyn DiagramRenderer>, DiagramError> {
        tracing::debug!(url = %self.server_url, "starting kroki renderer");
        Ok(Box::new(KrokiRenderer {
            agent: create_agent(self.timeout),
            server_url: self.server_url.clone(),
        }))
    }
}

/// HTTP agent with a global timeout; status codes are inspected manually.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

pub struct KrokiRenderer {
    agent: Agent,
    server_url: String,
}

impl DiagramRenderer for KrokiRenderer {
    fn render(&self, diagram: &Diagram<'_>) -> Result<Vec<u8>, DiagramError> {
        let endpoint = diagram.language.kroki_endpoint();
        let url = format!("{}/{endpoint}/png", self.server_url);

        let mut request = self
            .agent
            .post(&url)
            .config()
            .timeout_global(Some(diagram.timeout))
            .build()
            .header("Content-Type", "text/plain");
        if diagram.language == DiagramLanguage::Mermaid && diagram.theme != "default" {
            request = request.header("Kroki-Diagram-Options-Theme", diagram.theme);
        }

        let response = request
            .send(diagram.source.as_bytes())
            .map_err(|e| match e {
                ureq::Error::Timeout(_) => DiagramError::Timeout(diagram.timeout),
                other => DiagramError::Http(other.to_string()),
            })?;

        let status = response.status().as_u16();
        let mut body = response.into_body();
        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            return Err(DiagramError::Http(format!("HTTP {status}: {error_body}")));
        }

        body.read_to_vec()
            .map_err(|e| DiagramError::Http(e.to_string()))
    }
}
