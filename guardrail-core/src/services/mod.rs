//! Service layer for protection logic
//!
//! This module contains the concrete service implementation that encapsulates
//! attempt tracking, lockout escalation, and guarded execution.

pub mod brute_force;

pub use brute_force::BruteForceProtectionService;
