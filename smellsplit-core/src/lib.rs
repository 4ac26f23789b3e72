//! smellsplit core library: builds labelled code-smell datasets.
//!
//! The entry point is [`pipeline::DatasetPipeline`], which pins each candidate
//! repository to its analysed revision, decomposes it into class and method
//! units, and partitions those units into positive/negative buckets using
//! labels from a [`store::LabelStore`].

pub mod checkout;
pub mod config;
pub mod dataset;
pub mod decompose;
pub mod error;
pub mod labels;
pub mod partition;
pub mod pipeline;
pub mod progress;
pub mod repository;
pub mod store;
pub mod workdir;
