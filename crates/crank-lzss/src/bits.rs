//! MSB-first bit packing that can suspend between any two bits.

/// Accumulates tokens and hands them out a byte at a time.
#[derive(Debug, Clone, Default)]
pub(crate) struct BitWriter {
    acc: u64,
    count: u32,
}

impl BitWriter {
    /// Append the low `width` bits of `value`.
    #[inline]
    pub fn push(&mut self, value: u32, width: u32) {
        debug_assert!(width <= 32 && self.count + width <= 64);
        let mask = (1u64 << width) - 1;
        self.acc = (self.acc << width) | (value as u64 & mask);
        self.count += width;
    }

    /// Check if a whole byte is ready.
    #[inline]
    pub fn has_byte(&self) -> bool {
        self.count >= 8
    }

    /// Take the oldest whole byte. Call only when [`has_byte`](Self::has_byte).
    #[inline]
    pub fn pop_byte(&mut self) -> u8 {
        self.count -= 8;
        let byte = (self.acc >> self.count) as u8;
        self.acc &= (1u64 << self.count) - 1;
        byte
    }

    /// Zero-fill up to the next byte boundary.
    #[inline]
    pub fn pad(&mut self) {
        let partial = self.count % 8;
        if partial != 0 {
            self.push(0, 8 - partial);
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.acc = 0;
        self.count = 0;
    }
}

/// Reads fields from a byte slice, keeping the partly used byte between calls.
#[derive(Debug, Clone, Default)]
pub(crate) struct BitReader {
    current: u8,
    bits_left: u32,
}

impl BitReader {
    /// Read a `width`-bit field from `input[*pos..]`.
    ///
    /// Returns `None` without consuming anything when fewer than `width`
    /// bits are available.
    pub fn read(&mut self, width: u32, input: &[u8], pos: &mut usize) -> Option<u16> {
        debug_assert!(width <= 16);
        let available = self.bits_left as usize + 8 * (input.len() - *pos);
        if available < width as usize {
            return None;
        }

        let mut value = 0u16;
        for _ in 0..width {
            if self.bits_left == 0 {
                self.current = input[*pos];
                *pos += 1;
                self.bits_left = 8;
            }
            self.bits_left -= 1;
            value = (value << 1) | ((self.current >> self.bits_left) & 1) as u16;
        }
        Some(value)
    }

    #[inline]
    pub fn clear(&mut self) {
        self.current = 0;
        self.bits_left = 0;
    }
}
