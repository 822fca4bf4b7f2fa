//! Ad request domain.
//!
//! # Data Flow
//! ```text
//! POST /ads/request body
//!     → orchestrator.rs (parse, root span)
//!         → analytics lookup  ─┐ failure → fallback.rs
//!         → bid calculation   ─┘
//!     → AdResponse
//! GET /ads → catalog.rs
//! ```

pub mod catalog;
pub mod fallback;
pub mod orchestrator;
pub mod types;

pub use orchestrator::{AdOrchestrator, AdRequestError, SUCCESS_MESSAGE};
pub use types::{AdDescriptor, AdRequest, AdResponse, BidResponse, UserAnalytics};
