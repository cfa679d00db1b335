//! Randomness sources.
//!
//! Every generator draws from a [`RandomSource`] passed in explicitly. Two
//! implementations are provided: [`RngSource`], a seeded PRNG, and
//! [`ByteSource`], which consumes a fuzzer-provided byte slice and degrades to
//! zero values once the input runs out.

use arbitrary::Unstructured;
use chrono::{DateTime, Utc};
use protofuzz_core::GeneratorConfig;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::ops::RangeInclusive;

/// Lowercase ASCII, the alphabet of field path segments.
pub const LOWERCASE: &[RangeInclusive<char>] = &['a'..='z'];

/// Printable ASCII, Latin-1 supplement through IPA extensions, and CJK
/// unified ideographs.
pub const DEFAULT_STRING_RANGES: &[RangeInclusive<char>] = &[
    ' '..='~',
    '\u{00a0}'..='\u{02af}',
    '\u{4e00}'..='\u{9fff}',
];

/// Seconds in 1000 years of 365 days.
const MAX_DATETIME_SECS: u64 = 1000 * 365 * 24 * 60 * 60;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Size limits applied by the generic draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_string_len: usize,
    pub min_elements: usize,
    pub max_elements: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self::from(&GeneratorConfig::default())
    }
}

impl From<&GeneratorConfig> for Limits {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            max_string_len: config.max_string_len,
            min_elements: config.min_elements,
            max_elements: config.max_elements.max(config.min_elements),
        }
    }
}

/// Supplier of primitive random values.
///
/// Implementors provide raw 64-bit draws and bounded integer draws; every
/// other value is derived from those two.
pub trait RandomSource {
    /// A uniformly distributed 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// A uniform integer in `[0, n)`. Returns 0 when `n` is 0.
    fn below(&mut self, n: u64) -> u64;

    fn limits(&self) -> &Limits;

    /// Whether the underlying stream has run out. Exhausted sources keep
    /// returning zero values.
    fn is_exhausted(&self) -> bool {
        false
    }

    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn boolean(&mut self) -> bool {
        self.below(2) == 1
    }

    /// A uniform float in `[0, 1)`.
    fn unit_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// A standard normal float. Always finite.
    fn normal_f64(&mut self) -> f64 {
        // Box-Muller; 1 - u keeps the logarithm argument in (0, 1]
        let u1 = 1.0 - self.unit_f64();
        let u2 = self.unit_f64();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    /// Length for a repeated field, map or path list.
    fn seq_len(&mut self) -> usize {
        let Limits {
            min_elements,
            max_elements,
            ..
        } = *self.limits();
        let span = (max_elements.saturating_sub(min_elements) as u64).saturating_add(1);
        min_elements + self.below(span) as usize
    }

    /// A string over [`DEFAULT_STRING_RANGES`].
    fn string(&mut self) -> String {
        self.string_from(DEFAULT_STRING_RANGES)
    }

    /// A string with length in `[0, max_string_len)` whose characters are
    /// drawn from `ranges`, picking a range per character.
    fn string_from(&mut self, ranges: &[RangeInclusive<char>]) -> String {
        if ranges.is_empty() {
            return String::new();
        }
        let max_len = self.limits().max_string_len as u64;
        let len = self.below(max_len);
        let mut out = String::with_capacity(len as usize);
        for _ in 0..len {
            let range = &ranges[self.below(ranges.len() as u64) as usize];
            let start = *range.start() as u32;
            let span = (*range.end() as u32).saturating_sub(start) as u64 + 1;
            let code = start + self.below(span) as u32;
            out.push(char::from_u32(code).unwrap_or(*range.start()));
        }
        out
    }

    /// A byte string with length in `[0, max_string_len)`.
    fn bytes(&mut self) -> Vec<u8> {
        let max_len = self.limits().max_string_len as u64;
        let len = self.below(max_len);
        (0..len).map(|_| self.below(256) as u8).collect()
    }

    /// A calendar instant within roughly 1000 years after the epoch, with a
    /// nanosecond component carried into seconds.
    fn datetime(&mut self) -> DateTime<Utc> {
        let secs = self.below(MAX_DATETIME_SECS) as i64;
        let nanos = (self.next_u64() >> 1) as i64;
        let secs = secs + nanos.div_euclid(NANOS_PER_SEC);
        let nanos = nanos.rem_euclid(NANOS_PER_SEC) as u32;
        DateTime::from_timestamp(secs, nanos).unwrap_or_default()
    }
}

/// A [`RandomSource`] backed by a PRNG.
#[derive(Debug, Clone)]
pub struct RngSource<R = StdRng> {
    rng: R,
    limits: Limits,
}

impl RngSource<StdRng> {
    /// Create a reproducible source from a seed.
    pub fn seeded(seed: u64, limits: Limits) -> Self {
        Self::new(StdRng::seed_from_u64(seed), limits)
    }
}

impl<R: RngCore> RngSource<R> {
    pub fn new(rng: R, limits: Limits) -> Self {
        Self { rng, limits }
    }
}

impl<R: RngCore> RandomSource for RngSource<R> {
    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn below(&mut self, n: u64) -> u64 {
        if n == 0 {
            0
        } else {
            self.rng.gen_range(0..n)
        }
    }

    fn limits(&self) -> &Limits {
        &self.limits
    }
}

/// A [`RandomSource`] consuming raw bytes, typically from a fuzzer.
///
/// Once the input is consumed every draw returns zero.
pub struct ByteSource<'a> {
    data: Unstructured<'a>,
    limits: Limits,
}

impl<'a> ByteSource<'a> {
    pub fn new(data: &'a [u8], limits: Limits) -> Self {
        Self {
            data: Unstructured::new(data),
            limits,
        }
    }
}

impl RandomSource for ByteSource<'_> {
    fn next_u64(&mut self) -> u64 {
        self.data.arbitrary::<u64>().unwrap_or(0)
    }

    fn below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        self.data.int_in_range(0..=n - 1).unwrap_or(0)
    }

    fn limits(&self) -> &Limits {
        &self.limits
    }

    fn is_exhausted(&self) -> bool {
        self.data.is_empty()
    }
}
