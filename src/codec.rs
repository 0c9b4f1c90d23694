// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use rust_decimal::Decimal;

pub const CODEC_BYTES_LIMIT: usize = 1_000_000;

pub fn encode_to_vec<T: bincode::Encode>(val: &T) -> Result<Vec<u8>, bincode::error::EncodeError> {
    let config = bincode::config::standard()
        .with_little_endian()
        .with_variable_int_encoding()
        .with_limit::<CODEC_BYTES_LIMIT>();

    bincode::encode_to_vec(val, config)
}

pub fn decode<T: bincode::Decode>(bytes: &[u8]) -> Result<T, bincode::error::DecodeError> {
    let config = bincode::config::standard()
        .with_little_endian()
        .with_variable_int_encoding()
        .with_limit::<CODEC_BYTES_LIMIT>();

    bincode::decode_from_slice(bytes, config).map(|r| r.0)
}

/// Encodes a `Decimal` as its fixed 16 byte representation.
#[inline]
pub fn encode_decimal<E: bincode::enc::Encoder>(
    d: &Decimal,
    encoder: &mut E,
) -> core::result::Result<(), bincode::error::EncodeError> {
    bincode::Encode::encode(&d.serialize(), encoder)
}

/// Decodes a `Decimal` from its fixed 16 byte representation.
#[inline]
pub fn decode_decimal<D: bincode::de::Decoder>(
    decoder: &mut D,
) -> Result<Decimal, bincode::error::DecodeError> {
    let v: [u8; 16] = bincode::Decode::decode(decoder)?;
    Ok(Decimal::deserialize(v))
}
