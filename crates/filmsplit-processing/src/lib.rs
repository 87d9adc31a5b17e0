//! filmsplit processing library
//!
//! The frame-extraction pipeline: stage the source video locally, run the frame
//! extractor over it, pick out this job's frames and upload them.

pub mod frames;

pub use frames::{
    FfmpegExtractor, FrameExtractor, FrameOrchestrator, JobReport, StagingArea,
};
