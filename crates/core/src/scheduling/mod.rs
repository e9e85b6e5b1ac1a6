//! Slot math: expanding recurring availability into concrete slots and
//! detecting temporal conflicts.
//!
//! Everything in this module is pure computation over already-fetched data;
//! the only I/O is behind the [`crate::booking::ports::SessionRepository`]
//! port used by the conflict filter.

pub mod conflict;
pub mod generator;
