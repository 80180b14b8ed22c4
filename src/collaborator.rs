//! AI text-generation boundary.
//!
//! The engine's contract with the outside AI is purely textual: a prompt
//! goes out, a string comes back. Which model or provider answers is not
//! this crate's concern; provider wrappers implement [`TextGenerator`]
//! and live elsewhere.

use crate::error::CollaboratorError;

/// External text-generation collaborator.
///
/// Calls are synchronous and blocking from the caller's perspective.
/// Cancellation and timeout belong to the implementing provider wrapper.
pub trait TextGenerator: Send + Sync {
    /// Generates text for a prompt, bounded by `max_tokens`.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError::Generation`] when the underlying call
    /// fails. Parse-level problems with otherwise-successful responses are
    /// the caller's concern.
    fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: the trait must stay object-safe.
    fn _assert_object_safe(_: &dyn TextGenerator) {}

    struct Canned(&'static str);

    impl TextGenerator for Canned {
        fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, CollaboratorError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn trait_usable_through_dyn() {
        let gen: Box<dyn TextGenerator> = Box::new(Canned("ok"));
        assert_eq!(gen.generate("prompt", 100).unwrap(), "ok");
    }
}
