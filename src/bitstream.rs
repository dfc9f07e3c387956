//! Bit-packed stream primitives (Spec 7.1, 7.1.9).
//!
//! EXI values are packed MSB-first into a contiguous bit stream with no
//! padding between values. [`BitWriter`] appends bits to a growing byte
//! buffer; [`BitReader`] consumes them in the same order. Both carry a
//! 64-bit accumulator so multi-bit operations touch the byte buffer at most
//! once per 8 bits.
//!
//! The stream position is monotonic: neither side ever rewinds. A read that
//! would exceed the remaining bits fails with
//! [`Error::PrematureEndOfStream`] and leaves the logical position
//! unchanged.

use crate::{Error, Result};

/// Writes bits MSB-first into a growing byte buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    /// Pending bits, right-aligned. Only the low `accum_bits` bits are live.
    accum: u64,
    accum_bits: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buf: Vec::with_capacity(bytes),
            accum: 0,
            accum_bits: 0,
        }
    }

    /// Writes a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u64, 1);
    }

    /// Writes the low `n` bits of `value`, most significant first (Spec 7.1.9).
    ///
    /// Bits of `value` above `n` are ignored. `n = 0` writes nothing.
    ///
    /// # Panics
    ///
    /// Panics if `n > 64`.
    pub fn write_bits(&mut self, value: u64, n: u8) {
        assert!(n <= 64, "bit count must be 0..=64, got {n}");
        if n == 0 {
            return;
        }
        let value = if n == 64 { value } else { value & ((1u64 << n) - 1) };
        if n == 64 || self.accum_bits + n > 64 {
            // Accumulator würde überlaufen: in zwei Hälften schreiben.
            self.write_bits(value >> 32, n - 32);
            self.write_bits(value & 0xFFFF_FFFF, 32);
            return;
        }
        self.accum = (self.accum << n) | value;
        self.accum_bits += n;
        while self.accum_bits >= 8 {
            self.accum_bits -= 8;
            self.buf.push((self.accum >> self.accum_bits) as u8);
        }
    }

    /// Writes a full octet. Falls auf Byte-Grenze: direkter Buffer-Push.
    #[inline]
    pub fn write_byte_aligned(&mut self, byte: u8) {
        if self.accum_bits == 0 {
            self.buf.push(byte);
        } else {
            self.write_bits(u64::from(byte), 8);
        }
    }

    /// Writes a run of octets. Bulk copy when on a byte boundary.
    pub fn write_bytes_aligned(&mut self, bytes: &[u8]) {
        if self.accum_bits == 0 {
            self.buf.extend_from_slice(bytes);
        } else {
            for &b in bytes {
                self.write_bits(u64::from(b), 8);
            }
        }
    }

    /// Number of bits written so far.
    pub fn bit_position(&self) -> usize {
        self.buf.len() * 8 + usize::from(self.accum_bits)
    }

    /// Finishes the stream, padding the final partial octet with zero bits.
    pub fn into_vec(mut self) -> Vec<u8> {
        if self.accum_bits > 0 {
            let pad = 8 - self.accum_bits;
            self.buf.push(((self.accum << pad) & 0xFF) as u8);
            self.accum_bits = 0;
        }
        self.buf
    }
}

/// Reads bits MSB-first from a byte slice.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Next byte to load into the accumulator.
    byte_pos: usize,
    /// Loaded but unconsumed bits, right-aligned. Only the low `accum_bits`
    /// bits are live.
    accum: u64,
    accum_bits: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            accum: 0,
            accum_bits: 0,
        }
    }

    /// Number of unconsumed bits.
    pub fn remaining_bits(&self) -> usize {
        (self.data.len() - self.byte_pos) * 8 + usize::from(self.accum_bits)
    }

    #[inline]
    fn refill(&mut self) {
        while self.accum_bits <= 56 && self.byte_pos < self.data.len() {
            self.accum = (self.accum << 8) | u64::from(self.data[self.byte_pos]);
            self.byte_pos += 1;
            self.accum_bits += 8;
        }
    }

    /// Reads a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Reads `n` bits as an unsigned integer, most significant first
    /// (Spec 7.1.9). `n = 0` yields 0 without consuming anything.
    ///
    /// Fails with [`Error::PrematureEndOfStream`] if fewer than `n` bits
    /// remain; the stream position is then unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `n > 64`.
    pub fn read_bits(&mut self, n: u8) -> Result<u64> {
        assert!(n <= 64, "bit count must be 0..=64, got {n}");
        if n == 0 {
            return Ok(0);
        }
        if self.remaining_bits() < usize::from(n) {
            return Err(Error::PrematureEndOfStream);
        }
        if n > 32 {
            let hi = self.read_bits(n - 32)?;
            let lo = self.read_bits(32)?;
            return Ok((hi << 32) | lo);
        }
        self.refill();
        // Verfügbarkeit oben geprüft; nach refill gilt accum_bits >= n.
        self.accum_bits -= n;
        Ok((self.accum >> self.accum_bits) & ((1u64 << n) - 1))
    }

    /// Reads a full octet. Direkter Slice-Zugriff wenn der Akkumulator leer ist.
    #[inline]
    pub fn read_byte_aligned(&mut self) -> Result<u8> {
        if self.accum_bits == 0 {
            match self.data.get(self.byte_pos) {
                Some(&b) => {
                    self.byte_pos += 1;
                    Ok(b)
                }
                None => Err(Error::PrematureEndOfStream),
            }
        } else {
            Ok(self.read_bits(8)? as u8)
        }
    }

    /// Reads `len` octets into a fresh buffer.
    pub fn read_bytes_aligned(&mut self, len: usize) -> Result<Vec<u8>> {
        if self.remaining_bits() < len.saturating_mul(8) {
            return Err(Error::PrematureEndOfStream);
        }
        if self.realign() {
            let out = self.data[self.byte_pos..self.byte_pos + len].to_vec();
            self.byte_pos += len;
            return Ok(out);
        }
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.read_bits(8)? as u8);
        }
        Ok(out)
    }

    /// Returns the next `len` octets without consuming them, or `None` if the
    /// logical position is not on a byte boundary or fewer octets remain.
    pub fn peek_aligned_bytes(&mut self, len: usize) -> Option<&[u8]> {
        if !self.realign() {
            return None;
        }
        self.data.get(self.byte_pos..self.byte_pos + len)
    }

    /// Consumes `len` octets previously seen via [`peek_aligned_bytes`].
    ///
    /// [`peek_aligned_bytes`]: Self::peek_aligned_bytes
    pub fn skip_aligned_bytes(&mut self, len: usize) {
        debug_assert_eq!(self.accum_bits, 0, "skip requires byte alignment");
        debug_assert!(self.byte_pos + len <= self.data.len());
        self.byte_pos += len;
    }

    /// Drains whole bytes out of the accumulator back into `byte_pos` so the
    /// underlying slice can be accessed directly. Succeeds only when the
    /// logical position is a byte boundary.
    ///
    /// The unconsumed accumulator suffix is exactly the most recently loaded
    /// bytes, so rewinding `byte_pos` is lossless.
    fn realign(&mut self) -> bool {
        if self.accum_bits % 8 != 0 {
            return false;
        }
        self.byte_pos -= usize::from(self.accum_bits / 8);
        self.accum_bits = 0;
        true
    }
}
