//! Persona style rewriting through a text generation model.

pub mod openrouter;
pub mod prompt;

pub use openrouter::OpenRouterRewriter;

use crate::error::{Result, ToneTwistError};
use crate::persona::PersonaProfile;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Rewrites a transcript in a persona's speaking style.
#[async_trait::async_trait]
pub trait StyleRewriter: Send + Sync {
    /// Returns cleaned, non-empty styled text.
    async fn rewrite(&self, text: &str, persona: &PersonaProfile) -> Result<String>;

    /// Name of the generation backend
    fn name(&self) -> &str;
}

#[async_trait::async_trait]
impl<T: StyleRewriter> StyleRewriter for Arc<T> {
    async fn rewrite(&self, text: &str, persona: &PersonaProfile) -> Result<String> {
        (**self).rewrite(text, persona).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Mock rewriter for testing
#[derive(Debug, Default)]
pub struct MockRewriter {
    response: Option<String>,
    should_fail: bool,
    calls: AtomicUsize,
}

impl MockRewriter {
    /// Create a mock that prefixes the input with the persona key
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to return a fixed response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = Some(response.to_string());
        self
    }

    /// Configure the mock to fail with an upstream error
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StyleRewriter for MockRewriter {
    async fn rewrite(&self, text: &str, persona: &PersonaProfile) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(ToneTwistError::Upstream {
                provider: "OpenRouter",
                status: 500,
                message: "mock rewrite failure".to_string(),
            });
        }
        Ok(match &self.response {
            Some(response) => response.clone(),
            None => format!("[{}] {}", persona.key, text),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::get_persona;

    #[tokio::test]
    async fn mock_rewriter_tags_text_with_persona() {
        let rewriter = MockRewriter::new();
        let persona = get_persona("cowboy").unwrap();

        let styled = rewriter.rewrite("howdy", persona).await.unwrap();

        assert_eq!(styled, "[cowboy] howdy");
        assert_eq!(rewriter.calls(), 1);
    }

    #[tokio::test]
    async fn mock_rewriter_failure_is_upstream_error() {
        let rewriter: Box<dyn StyleRewriter> = Box::new(MockRewriter::new().with_failure());
        let persona = get_persona("robot").unwrap();

        let err = rewriter.rewrite("beep", persona).await.unwrap_err();

        assert!(matches!(err, ToneTwistError::Upstream { status: 500, .. }));
    }
}
