//! Smallest primitive root search.
//!
//! `g` is a primitive root modulo prime `p` iff `g^((p-1)/q) != 1 (mod p)` for
//! every distinct prime factor `q` of `p - 1`. Factoring `p - 1` is the
//! expensive part: small factors fall out of trial division, the rest are
//! split with Pollard's rho.

use glass_pumpkin::prime;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};

use crate::error::DhError;

/// Candidates are tried in `[2, MAX_PRIMITIVE_ROOT)`.
pub(crate) const MAX_PRIMITIVE_ROOT: u32 = 100;

const TRIAL_DIVISION_LIMIT: u32 = 1000;

/// Smallest primitive root modulo the prime `p`.
pub(crate) fn smallest_primitive_root(p: &BigUint) -> Result<u32, DhError> {
    if *p <= BigUint::from(3u32) {
        return Err(DhError::DegenerateModulus);
    }
    let phi = p - 1u32;
    let factors = unique_prime_factors(&phi);
    let one = BigUint::one();

    for candidate in 2..MAX_PRIMITIVE_ROOT {
        let a = BigUint::from(candidate);
        if a >= *p {
            break;
        }
        if factors.iter().all(|q| a.modpow(&(&phi / q), p) != one) {
            return Ok(candidate);
        }
    }
    Err(DhError::NoPrimitiveRoot(MAX_PRIMITIVE_ROOT))
}

/// Distinct prime factors of `n`, ascending.
pub(crate) fn unique_prime_factors(n: &BigUint) -> Vec<BigUint> {
    let one = BigUint::one();
    let mut factors = Vec::new();
    let mut rest = n.clone();

    let mut d = 2u32;
    while d < TRIAL_DIVISION_LIMIT && BigUint::from(d) * d <= rest {
        if (&rest % d).is_zero() {
            factors.push(BigUint::from(d));
            while (&rest % d).is_zero() {
                rest /= d;
            }
        }
        d += if d == 2 { 1 } else { 2 };
    }

    let mut pending = Vec::new();
    if rest > one {
        pending.push(rest);
    }
    while let Some(m) = pending.pop() {
        if m == one {
            continue;
        }
        if is_prime(&m) {
            factors.push(m);
            continue;
        }
        let divisor = pollard_rho(&m);
        pending.push(&m / &divisor);
        pending.push(divisor);
    }

    factors.sort();
    factors.dedup();
    factors
}

/// Primality test. Exact below 2^32, probabilistic above.
pub(crate) fn is_prime(n: &BigUint) -> bool {
    match n.to_u64() {
        Some(small) if small < (1 << 32) => is_prime_u64(small),
        _ => prime::check(n),
    }
}

fn is_prime_u64(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3u64;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Non-trivial factor of the composite `n`.
fn pollard_rho(n: &BigUint) -> BigUint {
    let one = BigUint::one();
    if n.is_even() {
        return BigUint::from(2u32);
    }

    let mut c = BigUint::one();
    loop {
        let step = |x: &BigUint| (x * x + &c) % n;
        let mut x = BigUint::from(2u32);
        let mut y = x.clone();
        let mut d = one.clone();

        while d == one {
            x = step(&x);
            y = step(&step(&y));
            let diff = if x > y { &x - &y } else { &y - &x };
            d = diff.gcd(n);
        }
        if d != *n {
            return d;
        }
        c += 1u32;
    }
}
