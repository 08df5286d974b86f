//! Math Master · arithmetic quiz backend.
//!
//! The quiz engine (question generation, round composition, scoring and the
//! round session state machine) plus the service around it: player and
//! leaderboard persistence, coaching suggestions, and the HTTP/WebSocket API.

pub mod config;
pub mod domain;
pub mod logic;
pub mod openai;
pub mod protocol;
pub mod question;
pub mod rng;
pub mod round;
pub mod routes;
pub mod scoring;
pub mod session;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod util;
