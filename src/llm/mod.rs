//! Local model inference: model management, prompt assembly, and the two
//! inference engines (summarizer and generator).

pub mod device;
pub mod generator;
pub mod model_manager;
pub mod prompts;
pub mod summarizer;
