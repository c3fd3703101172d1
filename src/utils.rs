//! Exact combinatorial helpers used by the moment formulas and the summation
//! routines.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

/// Binomial coefficient `C(n, k)`.
///
/// ```text
/// C(n, k) = n! / (k! * (n - k)!)
/// ```
pub fn binomial(n: u32, k: u32) -> BigInt {
    num_integer::binomial(BigInt::from(n), BigInt::from(k))
}

/// Double factorial `n!! = n * (n - 2) * (n - 4) * ...`, with `0!! = (-1)!! = 1`.
pub fn double_factorial(n: i64) -> BigInt {
    let mut result = BigInt::one();
    let mut i = n;
    while i > 1 {
        result *= BigInt::from(i);
        i -= 2;
    }
    result
}

/// Bernoulli numbers `B_0, ..., B_m` with the `B_1 = -1/2` convention.
///
/// ```text
/// B_m = -1/(m+1) * sum_{k=0}^{m-1} C(m+1, k) * B_k
/// ```
pub fn bernoulli_numbers(m: u32) -> Vec<BigRational> {
    let mut numbers: Vec<BigRational> = Vec::with_capacity(m as usize + 1);
    numbers.push(BigRational::one());
    for i in 1..=m {
        let mut acc = BigRational::zero();
        for (k, b) in numbers.iter().enumerate() {
            acc += BigRational::from_integer(binomial(i + 1, k as u32)) * b;
        }
        numbers.push(-acc / BigRational::from_integer(BigInt::from(i + 1)));
    }
    numbers
}

/// Coefficients of the power sum `S_m(n) = sum_{j=0}^{n-1} j^m` as a
/// polynomial in `n`, indexed by the power of `n`.
///
/// Faulhaber's formula:
///
/// ```text
/// S_m(n) = 1/(m+1) * sum_{k=0}^{m} C(m+1, k) * B_k * n^(m+1-k)
/// ```
pub fn power_sum_coefficients(m: u32) -> Vec<BigRational> {
    let bernoulli = bernoulli_numbers(m);
    let mut coefficients = vec![BigRational::zero(); m as usize + 2];
    let scale = BigRational::from_integer(BigInt::from(m + 1));
    for (k, b) in bernoulli.iter().enumerate() {
        let power = (m + 1) as usize - k;
        coefficients[power] = BigRational::from_integer(binomial(m + 1, k as u32)) * b / &scale;
    }
    coefficients
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn test_binomial() {
        // n\k  0  1  2  3  4
        // ------------------
        // 0    1
        // 1    1  1
        // 2    1  2  1
        // 3    1  3  3  1
        // 4    1  4  6  4  1
        assert_eq!(binomial(0, 0), BigInt::from(1));
        assert_eq!(binomial(3, 1), BigInt::from(3));
        assert_eq!(binomial(4, 2), BigInt::from(6));
        assert_eq!(binomial(4, 4), BigInt::from(1));
        assert_eq!(binomial(2, 3), BigInt::from(0));
        assert_eq!(binomial(30, 15), BigInt::from(155117520));
    }

    #[test]
    fn test_double_factorial() {
        assert_eq!(double_factorial(-1), BigInt::from(1));
        assert_eq!(double_factorial(0), BigInt::from(1));
        assert_eq!(double_factorial(1), BigInt::from(1));
        assert_eq!(double_factorial(5), BigInt::from(15));
        assert_eq!(double_factorial(6), BigInt::from(48));
    }

    #[test]
    fn test_bernoulli() {
        let b = bernoulli_numbers(6);
        assert_eq!(b[0], q(1, 1));
        assert_eq!(b[1], q(-1, 2));
        assert_eq!(b[2], q(1, 6));
        assert_eq!(b[3], q(0, 1));
        assert_eq!(b[4], q(-1, 30));
        assert_eq!(b[6], q(1, 42));
    }

    #[test]
    fn test_power_sums() {
        // sum_{j<n} 1 = n
        assert_eq!(power_sum_coefficients(0), vec![q(0, 1), q(1, 1)]);
        // sum_{j<n} j = n^2/2 - n/2
        assert_eq!(power_sum_coefficients(1), vec![q(0, 1), q(-1, 2), q(1, 2)]);
        // sum_{j<n} j^2 = n^3/3 - n^2/2 + n/6
        assert_eq!(
            power_sum_coefficients(2),
            vec![q(0, 1), q(1, 6), q(-1, 2), q(1, 3)]
        );
    }

    #[test]
    fn test_power_sums_agree_with_direct_summation() {
        for m in 0..6u32 {
            let coefficients = power_sum_coefficients(m);
            for n in 0..8i64 {
                let direct: BigInt = (0..n).map(|j| BigInt::from(j).pow(m)).sum();
                let formula: BigRational = coefficients
                    .iter()
                    .enumerate()
                    .map(|(i, c)| c * BigRational::from_integer(BigInt::from(n).pow(i as u32)))
                    .sum();
                assert_eq!(formula, BigRational::from_integer(direct), "m={} n={}", m, n);
            }
        }
    }
}
