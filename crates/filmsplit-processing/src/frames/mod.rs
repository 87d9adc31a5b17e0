//! Frame extraction module

pub mod extractor;
pub mod naming;
pub mod orchestration;
pub mod staging;

pub use extractor::{frame_extraction_args, FfmpegExtractor, FrameExtractor};
pub use naming::{frame_file_name, frame_index, is_job_output, output_pattern};
pub use orchestration::{FrameOrchestrator, JobReport};
pub use staging::StagingArea;
