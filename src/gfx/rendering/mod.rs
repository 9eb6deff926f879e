//! Core rendering functionality
//!
//! Handles render pipelines, GPU resource management, and frame rendering.

pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use pipeline_manager::{DepthConfig, PipelineConfig, PipelineManager, PipelineStats};
pub use render_engine::RenderEngine;

/// Output surface that follows the window size
pub trait RenderSurface {
    /// Resizes the output to exactly `width` x `height` pixels
    fn resize(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);
}
