//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`EmberError`] covers all failure modes including:
//! - GPU initialization failures
//! - Render target validation failures
//! - Image loading and decoding errors
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, EmberError>`. Initialization errors are fatal:
//! the renderer refuses to enter the frame loop when any render target
//! fails completeness validation. Resource-load errors are recoverable:
//! they are logged and leave the affected resource in a not-ready state
//! that downstream passes check before sampling.

use thiserror::Error;

/// The main error type for the Ember engine.
#[derive(Error, Debug)]
pub enum EmberError {
    // ========================================================================
    // GPU & Rendering Errors (fatal at initialization)
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceRequestFailed(#[from] wgpu::RequestDeviceError),

    /// A render target failed completeness validation during pipeline setup.
    ///
    /// The pipeline cannot proceed to frame rendering in this state.
    #[error("Render target '{name}' is incomplete: {reason}")]
    IncompleteRenderTarget {
        /// Label of the offending target
        name: &'static str,
        /// Which completeness rule was violated
        reason: String,
    },

    // ========================================================================
    // Resource-Load Errors (recovered locally)
    // ========================================================================
    /// Image decoding error (environment HDR, material textures).
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for EmberError {
    fn from(err: image::ImageError) -> Self {
        EmberError::ImageDecode(err.to_string())
    }
}

/// Alias for `Result<T, EmberError>`.
pub type Result<T> = std::result::Result<T, EmberError>;
