//! vanguard-ai — Boundary to the hosted multimodal model.
//!
//! Document OCR, face-similarity scoring, and assistant chat all go
//! through the [`RecognitionClient`] trait so the kiosk can substitute
//! a scripted client in tests. Provider error shapes are translated to
//! a single [`AiError`] taxonomy at this boundary; in particular every
//! quota/rate-limit signature becomes [`AiError::QuotaExhausted`].

pub mod client;
pub mod error;
pub mod gemini;
pub mod simulate;

pub use client::{DocumentScan, FaceComparison, RecognitionClient};
pub use error::AiError;
pub use gemini::GeminiClient;
