// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use config::{Config, ConfigError, File};
use lazy_static::*;
use log::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{metadata, File as FsFile};
use std::io::Write;
use struct_field_names_as_array::FieldNamesAsArray;

lazy_static! {
    pub static ref SETTINGS: Settings = Settings::new().unwrap();
}

#[derive(Debug, Serialize, Deserialize, Default, FieldNamesAsArray)]
pub struct Settings {
    /// Ledger store settings.
    pub store: Store,

    /// Marketplace settings.
    pub marketplace: Marketplace,

    /// Referral engine settings.
    pub mlm: Mlm,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut config_path = dirs::config_dir().unwrap();
        config_path.push("Coinvest");
        config_path.push("config.toml");
        let default_settings = Settings::default();
        if metadata(config_path.clone()).is_err() {
            // Create default configuration
            let settings_str = toml::ser::to_string_pretty(&default_settings).unwrap();

            match FsFile::create(config_path.clone()) {
                Ok(mut file) => {
                    file.write_all(settings_str.as_bytes()).unwrap_or(());
                }
                Err(err) => {
                    // If this fails, do nothing and fall back to environment variables
                    error!("Failed to create configuration! Reason: {:#?}", err);
                }
            }
        }

        let prefix = "coinvest";
        let env_source: Vec<_> = std::env::vars().collect();
        let mut s = Config::builder().add_source(
            File::with_name(&config_path.into_os_string().into_string().unwrap()).required(false),
        );

        // Set defaults
        let defaults: HashMap<String, HashMap<String, DynamicConfVal>> =
            serde_yaml::from_value(serde_yaml::to_value(&default_settings).unwrap()).unwrap();
        for (k1, inner) in &defaults {
            for (k2, v) in inner {
                match v {
                    DynamicConfVal::String(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), v.as_str())?;
                    }

                    DynamicConfVal::Bool(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), v.to_string())?;
                    }

                    DynamicConfVal::U32(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), v.to_string())?;
                    }
                }
            }
        }

        // Make sure to list these in order
        let settings_modules: Vec<_> = vec![
            Store::FIELD_NAMES_AS_ARRAY,
            Marketplace::FIELD_NAMES_AS_ARRAY,
            Mlm::FIELD_NAMES_AS_ARRAY,
        ];

        // Gather all possible settings keys
        let possible_keys: HashMap<String, &str> = Settings::FIELD_NAMES_AS_ARRAY
            .iter()
            .enumerate()
            .flat_map(|(i, field)| {
                settings_modules[i].iter().map(|nested| {
                    (
                        format!(
                            "{}_{}_{}",
                            prefix,
                            field.to_owned(),
                            nested.split('_').collect::<Vec<_>>().join("")
                        ),
                        *nested,
                    )
                })
            })
            .collect();

        // Parse env vars manually and set overrides if they exist as the
        // config package `Environment` module seems to behave poorly.
        for (k, v) in env_source.iter() {
            let k = k.to_lowercase();

            if let Some(k_postfix) = possible_keys.get(&k) {
                let mut k: Vec<_> = k.split('_').filter(|x| x != &prefix).collect();
                *k.last_mut().unwrap() = k_postfix;
                let k = k.join(".");

                // Filter empty values
                if v.as_str() == "" {
                    continue;
                }

                s = s.set_override(k, v.as_str())?;
            }
        }

        s.build()?.try_deserialize()
    }
}

#[derive(Debug, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Store {
    /// Name of this deployment. Part of the on-disk path, so two
    /// instances can share a data dir.
    #[serde(alias = "instancename")]
    pub instance_name: String,

    /// Ledger data directory
    #[serde(alias = "datadir")]
    pub data_dir: String,

    /// If specified, the ledger is kept in memory and lost on shutdown.
    #[serde(alias = "memoryonly")]
    pub memory_only: bool,
}

impl Default for Store {
    fn default() -> Self {
        let mut path = dirs::config_dir().unwrap();
        path.push("Coinvest");

        Self {
            instance_name: "main".to_owned(),
            data_dir: path.into_os_string().into_string().unwrap(),
            memory_only: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Marketplace {
    /// Coin value before the first distribution.
    #[serde(alias = "basecoinvalue")]
    pub base_coin_value: Decimal,

    /// Smallest accepted coin purchase.
    #[serde(alias = "minbuycoins")]
    pub min_buy_coins: Decimal,

    /// Share of profit and revenue routed to investors, in basis points.
    #[serde(alias = "poolsharebps")]
    pub pool_share_bps: u32,
}

impl Default for Marketplace {
    fn default() -> Self {
        Self {
            base_coin_value: crate::rules::BASE_COIN_VALUE.inner(),
            min_buy_coins: crate::rules::MIN_BUY_COINS.inner(),
            pool_share_bps: crate::rules::POOL_SHARE_BPS,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Mlm {
    /// Level 1 commission rate in basis points.
    #[serde(alias = "level1ratebps")]
    pub level_1_rate_bps: u32,

    /// Level 2 commission rate in basis points.
    #[serde(alias = "level2ratebps")]
    pub level_2_rate_bps: u32,

    /// Level 3 commission rate in basis points.
    #[serde(alias = "level3ratebps")]
    pub level_3_rate_bps: u32,

    /// Direct referrals required for the partner rank.
    #[serde(alias = "partnerthreshold")]
    pub partner_threshold: u32,

    /// Direct referrals required for the director rank.
    #[serde(alias = "directorthreshold")]
    pub director_threshold: u32,

    /// Direct referrals required for the executive rank.
    #[serde(alias = "executivethreshold")]
    pub executive_threshold: u32,
}

impl Default for Mlm {
    fn default() -> Self {
        Self {
            level_1_rate_bps: crate::rules::COMMISSION_RATES_BPS[0],
            level_2_rate_bps: crate::rules::COMMISSION_RATES_BPS[1],
            level_3_rate_bps: crate::rules::COMMISSION_RATES_BPS[2],
            partner_threshold: crate::rules::PARTNER_DIRECT_REFERRALS,
            director_threshold: crate::rules::DIRECTOR_DIRECT_REFERRALS,
            executive_threshold: crate::rules::EXECUTIVE_DIRECT_REFERRALS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DynamicConfVal {
    String(String),
    Bool(bool),
    U32(u32),
}
