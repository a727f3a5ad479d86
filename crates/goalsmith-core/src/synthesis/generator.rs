//! The `TextGenerator` trait -- the seam between the pipeline and whatever
//! hosted model produces text.

use async_trait::async_trait;

/// Errors a text generator can report. All of them count as a failed
/// attempt; none of them reach the HTTP caller.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: String,
        source: reqwest::Error,
    },

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("could not decode {provider} response: {reason}")]
    Decode { provider: String, reason: String },

    #[error("{provider} returned no text")]
    Empty { provider: String },

    #[error("{0}")]
    Other(String),
}

/// A hosted model that turns a rendered prompt into free text.
///
/// Object safe so the pipeline can hold an `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short provider name used in logs (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send one prompt and return the model's raw text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

// If this compiles, `TextGenerator` can be used as `dyn TextGenerator`.
const _: () = {
    fn _assert_object_safe(_: &dyn TextGenerator) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            Ok(prompt.to_string())
        }
    }

    #[tokio::test]
    async fn trait_object_dispatch() {
        let generator: Box<dyn TextGenerator> = Box::new(EchoGenerator);
        assert_eq!(generator.name(), "echo");
        assert_eq!(generator.generate("hi").await.unwrap(), "hi");
    }

    #[test]
    fn error_messages_name_the_provider() {
        let err = GenerationError::Status {
            provider: "gemini".to_string(),
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "gemini returned HTTP 503: overloaded");

        let err = GenerationError::Empty {
            provider: "gemini".to_string(),
        };
        assert_eq!(err.to_string(), "gemini returned no text");
    }
}
