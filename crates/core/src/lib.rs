//! Core of the follower scout: domain types, the live filter store, layered
//! configuration, the status reporter and the collection pipeline.
//!
//! Platform adapters live in sibling crates: `scout-vendor` implements
//! [`collect::SocialDataApi`] over HTTP and `scout-telegram` implements
//! [`status::StatusChannel`] for the chat.

pub mod collect;
pub mod config;
pub mod domain;
pub mod errors;
pub mod filters;
pub mod status;

pub use collect::{
    AnalysisReport, CollectionPipeline, FetchOutcome, PipelineSettings, RunStage, SocialDataApi,
};
pub use domain::account::{AccountId, TargetHandle};
pub use domain::follower::{FollowerRecord, PostSummary, ViewStats};
pub use domain::result::{extract_emails, ResultRow, MISSING_VALUE};
pub use errors::AnalysisError;
pub use filters::{FilterConfig, FilterParam, FilterStore, FilterUpdate, FilterUpdateError};
pub use status::{MessageHandle, StatusChannel, StatusChannelError, StatusReporter};
