// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! # Coinvest
//! Core engine of a coin-backed investment marketplace.
//!
//! Users buy platform coins whose value is backed by real project
//! outcomes: when a project completes, the pool share of its profit is
//! spread over every coin in circulation and the global coin value
//! rises; revenue events instead pay the project's investors directly,
//! proportionally to their stake. A three-level referral engine pays
//! commissions on coin purchases and promotes ranks from the lifetime
//! direct-referral counters.
//!
//! All state lives in a [`store::LedgerBackend`]; every operation
//! stages its writes and commits them as one atomic batch.

pub mod codec;
pub mod marketplace;
pub mod mlm;
pub mod primitives;
pub mod rules;
pub mod settings;
pub mod store;
