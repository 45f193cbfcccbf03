//! # PaperLab Core
//!
//! Critiques a research paper and grows new research hypotheses out of
//! it, by running a fixed sequence of prompts against one hosted model:
//!
//! evaluate → summarize → branch → mature → criticize → debate → summarize → judge
//!
//! ## Architecture
//!
//! - `gateway/` - The single request/response model call (Anthropic, OpenAI-compatible)
//! - `models` - Provider and model selection
//! - `skills/` - One prompt-and-parse skill per agent
//! - `state/` - Report records and the run archive
//! - `swarm/` - Coordinator, pipeline stages and progress events
//!
//! ## Usage
//!
//! ```rust,ignore
//! use paperlab_core::swarm::{Coordinator, CoordinatorConfig};
//!
//! let mut coordinator = Coordinator::from_config(CoordinatorConfig::default())?;
//! let report = coordinator.run(&paper_text).await?;
//! println!("{}", report.to_markdown());
//! ```

pub mod error;
pub mod gateway;
pub mod models;
pub mod skills;
pub mod state;
pub mod swarm;

pub use error::{ParseError, PipelineError, Step};
