//! Finite-field Diffie-Hellman.
//!
//! The relay generates domain parameters once per pairing. Each peer then
//! draws a private salt `x`, publishes `g^x mod p`, and raises the partner's
//! public salt to `x` to reach the shared secret. All exponentiation goes
//! through `modpow`.
//!
//! # Parameter strategies
//!
//! - [`ParameterStrategy::SafePrime`]: `p = 2q + 1` with both `q` and `p`
//!   prime, `g = 2`. The default. Slow at 2048 bits.
//! - [`ParameterStrategy::SmallestPrimitiveRoot`]: random prime `p`, `g` is the
//!   smallest primitive root found by factoring `p - 1`. Only usable on small
//!   moduli.

use std::fmt;

use glass_pumpkin::{prime, safe_prime};
use num_bigint::BigUint;
use num_traits::One;
use rand::{RngCore, rngs::OsRng};

use crate::{error::DhError, primitive_root};

/// Fixed generator for the safe-prime construction.
pub const GENERATOR: u32 = 2;

/// Default modulus width.
pub const DEFAULT_MODULUS_BITS: usize = 2048;

/// Narrowest modulus any strategy accepts.
pub const MIN_MODULUS_BITS: usize = 16;

/// Widest modulus the primitive-root search will factor.
pub const MAX_FACTORABLE_BITS: usize = 96;

/// glass_pumpkin refuses to generate primes narrower than this.
const PUMPKIN_MIN_BITS: usize = 128;

/// How the relay picks `p` and `g`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterStrategy {
    /// Safe prime `p = 2q + 1` with `q` prime, `g = 2`
    #[default]
    SafePrime,
    /// Random prime `p` with its smallest primitive root as `g`
    SmallestPrimitiveRoot,
}

/// Diffie-Hellman domain parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainParameters {
    /// Modulus
    pub p: BigUint,
    /// Generator
    pub g: BigUint,
}

impl DomainParameters {
    /// Bundle a modulus and generator.
    ///
    /// # Errors
    ///
    /// `DegenerateModulus` if `p <= 3`, which leaves no valid private salt
    /// range.
    pub fn new(p: BigUint, g: BigUint) -> Result<Self, DhError> {
        if p <= BigUint::from(3u32) {
            return Err(DhError::DegenerateModulus);
        }
        Ok(Self { p, g })
    }

    /// Reject partner salts that would force a trivial shared secret.
    ///
    /// Valid salts lie strictly between `1` and `p - 1`.
    pub fn check_public_salt(&self, salt: &BigUint) -> Result<(), DhError> {
        let upper = &self.p - 1u32;
        if *salt <= BigUint::one() || *salt >= upper {
            return Err(DhError::PublicSaltOutOfRange);
        }
        Ok(())
    }
}

/// Secret exponent. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateSalt(BigUint);

impl PrivateSalt {
    /// Wrap a known exponent. Mostly useful for reproducing an exchange.
    pub fn from_biguint(value: BigUint) -> Self {
        Self(value)
    }

    /// Exponent value.
    pub fn value(&self) -> &BigUint {
        &self.0
    }
}

impl fmt::Debug for PrivateSalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateSalt([REDACTED])")
    }
}

/// Domain parameter generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DhEngine {
    modulus_bits: usize,
    strategy: ParameterStrategy,
}

impl DhEngine {
    /// Create an engine producing `modulus_bits`-wide moduli.
    pub fn new(modulus_bits: usize, strategy: ParameterStrategy) -> Result<Self, DhError> {
        if modulus_bits < MIN_MODULUS_BITS {
            return Err(DhError::ModulusTooSmall { bits: modulus_bits, min: MIN_MODULUS_BITS });
        }
        if strategy == ParameterStrategy::SmallestPrimitiveRoot
            && modulus_bits > MAX_FACTORABLE_BITS
        {
            return Err(DhError::ModulusTooLarge { bits: modulus_bits, max: MAX_FACTORABLE_BITS });
        }
        Ok(Self { modulus_bits, strategy })
    }

    /// Modulus width in bits.
    pub fn modulus_bits(&self) -> usize {
        self.modulus_bits
    }

    /// Parameter strategy.
    pub fn strategy(&self) -> ParameterStrategy {
        self.strategy
    }

    /// Generate fresh domain parameters.
    pub fn generate_domain_parameters(&self) -> Result<DomainParameters, DhError> {
        match self.strategy {
            ParameterStrategy::SafePrime => {
                let p = random_safe_prime(self.modulus_bits)?;
                DomainParameters::new(p, BigUint::from(GENERATOR))
            },
            ParameterStrategy::SmallestPrimitiveRoot => {
                let p = random_prime(self.modulus_bits)?;
                let g = primitive_root::smallest_primitive_root(&p)?;
                DomainParameters::new(p, BigUint::from(g))
            },
        }
    }
}

impl Default for DhEngine {
    fn default() -> Self {
        Self { modulus_bits: DEFAULT_MODULUS_BITS, strategy: ParameterStrategy::SafePrime }
    }
}

/// Draw a private salt uniformly from `[1, p - 1]`.
pub fn generate_private_salt(p: &BigUint) -> Result<PrivateSalt, DhError> {
    if *p <= BigUint::one() {
        return Err(DhError::DegenerateModulus);
    }
    let bound = p - 1u32;
    Ok(PrivateSalt(random_below(&bound)? + 1u32))
}

/// `g^x mod p`.
pub fn public_salt(p: &BigUint, g: &BigUint, private: &PrivateSalt) -> BigUint {
    g.modpow(&private.0, p)
}

/// `peer_public^x mod p`.
pub fn compute_shared_secret(p: &BigUint, peer_public: &BigUint, private: &PrivateSalt) -> BigUint {
    peer_public.modpow(&private.0, p)
}

/// Uniform integer in `[0, bound)` by rejection sampling.
fn random_below(bound: &BigUint) -> Result<BigUint, DhError> {
    let bits = bound.bits() as usize;
    if bits == 0 {
        return Err(DhError::DegenerateModulus);
    }
    let len = bits.div_ceil(8);
    let excess = len * 8 - bits;

    let mut buf = vec![0u8; len];
    loop {
        fill_random(&mut buf)?;
        buf[0] &= 0xFF >> excess;
        let candidate = BigUint::from_bytes_be(&buf);
        if candidate < *bound {
            return Ok(candidate);
        }
    }
}

/// Random odd integer with exactly `bits` bits.
fn random_odd(bits: usize) -> Result<BigUint, DhError> {
    let len = bits.div_ceil(8);
    let excess = len * 8 - bits;

    let mut buf = vec![0u8; len];
    fill_random(&mut buf)?;
    buf[0] &= 0xFF >> excess;

    let top = BigUint::one() << (bits - 1);
    Ok(BigUint::from_bytes_be(&buf) | top | BigUint::one())
}

fn random_prime(bits: usize) -> Result<BigUint, DhError> {
    if bits >= PUMPKIN_MIN_BITS {
        return prime::new(bits).map_err(|e| DhError::Randomness(format!("{e:?}")));
    }
    loop {
        let candidate = random_odd(bits)?;
        if primitive_root::is_prime(&candidate) {
            return Ok(candidate);
        }
    }
}

fn random_safe_prime(bits: usize) -> Result<BigUint, DhError> {
    if bits >= PUMPKIN_MIN_BITS {
        return safe_prime::new(bits).map_err(|e| DhError::Randomness(format!("{e:?}")));
    }
    loop {
        let q = random_prime(bits - 1)?;
        let p = (q << 1usize) + 1u32;
        if primitive_root::is_prime(&p) {
            return Ok(p);
        }
    }
}

fn fill_random(buf: &mut [u8]) -> Result<(), DhError> {
    OsRng.try_fill_bytes(buf).map_err(|e| DhError::Randomness(e.to_string()))
}
