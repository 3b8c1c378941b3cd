#![doc = "repo-scribe-core: analysis and pipeline library for repo-scribe."]

//! This crate holds every piece of repo-scribe that carries decision logic: the repository
//! snapshot builder, the stage contract shared by deployment derivation and documentation
//! sections, the sequential pipeline orchestrator and the document assembler.
//!
//! External collaborators (the generative text service, the template engine and the output
//! sink) are reached only through the traits in [`contract`], so the whole pipeline can be
//! driven by mocks in tests.
//!
//! # Usage
//! The binary crate wires a live [`contract::Generator`] to [`pipeline::generate_documentation`]
//! together with [`template::TemplateEngine`] and [`persist::FileSink`].

pub mod analyze;
pub mod assemble;
pub mod config;
pub mod contract;
pub mod deployment;
pub mod error;
pub mod history;
pub mod manifests;
pub mod persist;
pub mod pipeline;
pub mod sections;
pub mod snapshot;
pub mod stage;
pub mod template;
pub mod walk;

pub use error::{ErrorClass, ScribeError};
