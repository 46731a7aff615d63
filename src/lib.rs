//! Sentiment analysis across several inference providers.
//!
//! Text comes from a file, URL or image ([`input`]), goes to one or more
//! providers ([`provider`], [`client`]), and each answer is reduced to a
//! readable summary ([`normalize`]). [`compare`] runs the providers side by
//! side and collects a [`outcome::ComparisonReport`].

pub mod app;
pub mod client;
pub mod compare;
pub mod config;
pub mod error;
pub mod input;
pub mod normalize;
pub mod outcome;
pub mod provider;
pub mod sentiment;
pub mod server;
pub mod stats;
pub mod transport;
