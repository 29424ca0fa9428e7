//! Bloglist E2E Test Suite
//!
//! This crate provides a Rust-controlled browser test suite that:
//! - Resets server-side state and seeds fixture users over the admin API
//! - Drives the application UI through a WebDriver session
//! - Wraps repeated interaction sequences as reusable helpers
//! - Asserts on user-observable state with bounded waits
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Scenario suite (tests/)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario                                                   │
//! │    ├── ApiClient  -> reset state, seed {name, username,     │
//! │    │                 password} fixtures                     │
//! │    └── Session    -> navigate, locate by test id / label /  │
//! │                      button name, fill, click, wait         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Helpers                                                    │
//! │    ├── login / logout / create_blog                         │
//! │    └── expand_blog_by_title -> BlogCard                     │
//! │          ├── likes, like_once (exact +1)                    │
//! │          └── remove_accepting_dialog, remove visibility     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every interaction and assertion is a suspend point with a bounded wait;
//! a timeout fails the owning scenario only. The application front end, its
//! REST backend, and the WebDriver endpoint are external collaborators.

pub mod error;
pub mod fixtures;
pub mod harness;
pub mod helpers;
pub mod session;

pub use error::{E2eError, E2eResult};
pub use fixtures::{ApiClient, Blog, User};
pub use harness::{Scenario, ScenarioConfig};
pub use session::{Session, SessionConfig};
