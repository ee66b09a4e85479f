//! Momentum API - Backend for the Momentum productivity extension
//!
//! This crate provides the REST API for Momentum, enabling:
//! - OAuth sign-in (Google, GitHub) with rotating refresh tokens
//! - Per-user productivity resources (tasks, habits, pomodoro, and more)
//! - Stripe-backed Pro subscriptions with webhook reconciliation

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
