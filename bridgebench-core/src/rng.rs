// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Deterministic byte generator.
//!
//! `JavaRandom` reproduces the 48-bit linear congruential stream of
//! `java.util.Random`, so a driver written in any language can regenerate the
//! exact payload the callee produces for a given seed. It implements
//! [`rand::RngCore`] and can be handed to anything in the `rand` ecosystem.

use rand::RngCore;

use crate::types::Seed;

const MULTIPLIER: u64 = 0x5_DEEC_E66D;
const ADDEND: u64 = 0xB;
const MASK: u64 = (1 << 48) - 1;

/// Seeded linear congruential generator compatible with `java.util.Random`.
#[derive(Debug, Clone)]
pub struct JavaRandom {
    state: u64,
}

impl JavaRandom {
    /// Create a generator with the given seed.
    pub fn new(seed: i64) -> Self {
        Self {
            state: (seed as u64 ^ MULTIPLIER) & MASK,
        }
    }

    /// Advance the stream and return its top `bits` bits (1..=32).
    pub fn next_bits(&mut self, bits: u32) -> i32 {
        debug_assert!((1..=32).contains(&bits));
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(ADDEND) & MASK;
        (self.state >> (48 - bits)) as i32
    }

    pub fn next_i32(&mut self) -> i32 {
        self.next_bits(32)
    }

    pub fn next_i64(&mut self) -> i64 {
        let high = i64::from(self.next_bits(32));
        let low = i64::from(self.next_bits(32));
        (high << 32).wrapping_add(low)
    }
}

impl RngCore for JavaRandom {
    fn next_u32(&mut self) -> u32 {
        self.next_i32() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_i64() as u64
    }

    /// One 32-bit draw per four bytes, lowest byte first. Unused bytes of the
    /// final draw are dropped, so two short fills differ from one long fill.
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let mut rnd = self.next_i32();
            for byte in chunk {
                *byte = rnd as u8;
                rnd >>= 8;
            }
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Payload source for byte-size benchmarks.
#[derive(Debug, Clone)]
pub struct ByteGenerator {
    seed: Seed,
    random: JavaRandom,
}

impl ByteGenerator {
    pub fn new(seed: Seed) -> Self {
        Self {
            seed,
            random: JavaRandom::new(seed.value()),
        }
    }

    /// The seed this generator was created with.
    pub fn seed(&self) -> Seed {
        self.seed
    }

    /// Return exactly `length` bytes from the seeded stream.
    pub fn get_bytes(&mut self, length: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; length];
        self.random.fill_bytes(&mut bytes);
        bytes
    }
}
