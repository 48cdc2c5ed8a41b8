//! Generative-text port definition.

/// Port for the external text model.
///
/// Implementations never fail across this boundary: transport errors,
/// non-success responses and malformed payloads all surface as an empty string.
pub trait TextGenerator {
    /// Send `prompt` and return the generated text, or `""` on failure.
    fn generate(&self, prompt: &str) -> String;
}

