//! Zentrale Bitbreiten-Berechnung (Spec 7.1.9, 7.2, 7.3).
//!
//! Berechnet `⌈log₂(n)⌉` — die Anzahl Bits um `n` unterschiedliche Werte
//! zu codieren. Wird von Enumerations (7.2), NBit-Integern (7.1.9) und
//! String Tables (7.3) verwendet.

/// Berechnet die Anzahl Bits fuer `n` unterschiedliche Werte: `⌈log₂(n)⌉`.
///
/// - `n = 0` oder `n = 1`: 0 Bits (kein Bit noetig)
/// - `n = 2`: 1 Bit
/// - `n = 3..4`: 2 Bits
/// - `n = 5..8`: 3 Bits
/// - usw.
#[inline]
pub fn for_count(n: usize) -> u8 {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as u8
    }
}

/// Wie [`for_count`], aber ueber einen `u64`-Wertebereich (NBit-Integer,
/// Spec 7.1.9): Bits fuer `range + 1` unterschiedliche Werte.
#[inline]
pub fn for_range(range: u64) -> u8 {
    if range == 0 {
        0
    } else {
        (u64::BITS - range.leading_zeros()) as u8
    }
}
