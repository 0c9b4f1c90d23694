// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use coinvest::marketplace::{self, MarketConfig};
use coinvest::settings::SETTINGS;
use coinvest::store::disk::create_rocksdb_ledger;
use coinvest::store::{DiskBackend, LedgerBackend, MemoryBackend};
use log::*;

fn main() {
    pretty_env_logger::init();

    let cfg = MarketConfig::from_settings();
    if SETTINGS.store.memory_only {
        warn!("running memory only, the ledger will not survive a restart");
        report(&MemoryBackend::new(), &cfg);
    } else {
        let db = create_rocksdb_ledger();
        report(&DiskBackend::new(db), &cfg);
    }
}

fn report<B: LedgerBackend>(backend: &B, cfg: &MarketConfig) {
    match marketplace::platform_stats(backend, cfg) {
        Ok(stats) => {
            info!(
                "instance {}: {} users ({} investors), {} coins outstanding at {} (dynamic {})",
                SETTINGS.store.instance_name,
                stats.total_users,
                stats.total_investors,
                stats.coins_outstanding,
                stats.coin_value.value,
                stats.dynamic_coin_value
            );
            info!(
                "{} projects ({} completed), {} profit distributed, {} pending buybacks",
                stats.total_projects,
                stats.completed_projects,
                stats.total_profit_distributed,
                stats.pending_buybacks
            );
        }
        Err(err) => error!("could not read platform stats: {err}"),
    }
}
