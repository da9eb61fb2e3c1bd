//! Small numeric and naming helpers shared across the crate.

/// Test whether `n` is prime.
///
/// Levels in experimental designs are tiny, so trial division is enough.
///
/// # Examples
///
/// ```
/// use confound::utils::is_prime;
///
/// assert!(is_prime(2));
/// assert!(is_prime(7));
/// assert!(!is_prime(1));
/// assert!(!is_prime(9));
/// ```
#[must_use]
pub fn is_prime(n: u32) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3u32;
    while d.saturating_mul(d) <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Generate all k-combinations of indices 0..n in lexicographic order.
///
/// # Examples
///
/// ```
/// use confound::utils::combinations;
///
/// let combos: Vec<Vec<usize>> = combinations(4, 2).collect();
/// assert_eq!(combos.len(), 6);
/// assert_eq!(combos[0], vec![0, 1]);
/// assert_eq!(combos[5], vec![2, 3]);
/// ```
pub fn combinations(n: usize, k: usize) -> impl Iterator<Item = Vec<usize>> {
    Combinations {
        n,
        k,
        indices: (0..k).collect(),
        finished: k > n,
    }
}

struct Combinations {
    n: usize,
    k: usize,
    indices: Vec<usize>,
    finished: bool,
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let current = self.indices.clone();

        // Advance the rightmost index that still has room.
        let mut i = self.k;
        loop {
            if i == 0 {
                self.finished = true;
                break;
            }
            i -= 1;
            if self.indices[i] < self.n - self.k + i {
                self.indices[i] += 1;
                for j in (i + 1)..self.k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                break;
            }
        }
        Some(current)
    }
}

/// Default name of the factor in column `index`: `A`..`Z`, then `F27`, `F28`, ...
///
/// # Examples
///
/// ```
/// use confound::utils::factor_name;
///
/// assert_eq!(factor_name(0), "A");
/// assert_eq!(factor_name(3), "D");
/// assert_eq!(factor_name(26), "F27");
/// ```
#[must_use]
pub fn factor_name(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => format!("F{}", index + 1),
    }
}

/// Format a cell value for display: integral values without a decimal point.
#[must_use]
pub fn format_value(value: f64) -> String {
    // Adding +0.0 turns -0.0 into 0.0.
    let value = value + 0.0;
    if value.is_nan() {
        "NA".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}
