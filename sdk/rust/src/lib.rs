//! Client for the ad service HTTP API.

pub mod client;

pub use client::{
    AdDescriptor, AdRequest, AdResponse, AdServiceClient, ClientError, HealthStatus,
    TracePropagationReport,
};
