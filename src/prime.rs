//! Prime helpers used to pick candidate table sizes.

/// Returns whether `n` is prime, by trial division over odd divisors.
pub fn is_prime(n: usize) -> bool {
    if n <= 1 {
        return false;
    }
    if n == 2 {
        return true;
    }
    if n & 1 == 0 {
        return false;
    }
    let mut i = 3;
    while i <= n / i {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// Returns the smallest odd prime `>= n`.
///
/// Even inputs are bumped to the next odd number first, so `next_prime(2)`
/// is `3`.
pub fn next_prime(n: usize) -> usize {
    let mut n = n | 1;
    while !is_prime(n) {
        n += 2;
    }
    n
}
