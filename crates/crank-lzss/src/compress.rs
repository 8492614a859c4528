//! LZSS encoder transducer.

use crank_core::{Error, FinishStatus, PollStatus, Result, Role, Transducer};

use crate::bits::BitWriter;
use crate::config::{alloc_zeroed, LzssConfig, LITERAL_BITS};

/// Incremental LZSS encoder.
///
/// Working memory is one window of history plus one window of input, both
/// fixed at construction. A position is encoded only once a full lookahead
/// is buffered, or once [`finish`](Transducer::finish) has been called.
#[derive(Debug)]
pub struct LzssEncoder {
    config: LzssConfig,
    /// `[history | input]`, each half `window_size` bytes.
    buffer: Box<[u8]>,
    /// Valid history bytes, right-aligned against the input half.
    history_len: usize,
    /// Valid input bytes.
    input_len: usize,
    /// Input bytes already encoded.
    scan: usize,
    bits: BitWriter,
    finishing: bool,
}

impl LzssEncoder {
    /// Create an encoder, validating `config` and allocating its window.
    pub fn new(config: LzssConfig) -> Result<Self> {
        config.validate()?;
        let buffer = alloc_zeroed(2 * config.window_size())?;

        Ok(Self {
            config,
            buffer,
            history_len: 0,
            input_len: 0,
            scan: 0,
            bits: BitWriter::default(),
            finishing: false,
        })
    }

    /// Get the encoder parameters.
    pub fn config(&self) -> &LzssConfig {
        &self.config
    }

    /// Bytes of state held by this encoder, heap included.
    pub fn memory_footprint(&self) -> usize {
        core::mem::size_of::<Self>() + self.buffer.len()
    }

    /// Move encoded input into history and unencoded input to the front.
    fn compact(&mut self) {
        if self.scan == 0 {
            return;
        }

        let window = self.config.window_size();
        let start = window - self.history_len;
        let end = window + self.scan;
        let keep = (end - start).min(window);
        self.buffer.copy_within(end - keep..end, window - keep);
        self.history_len = keep;

        self.buffer
            .copy_within(window + self.scan..window + self.input_len, window);
        self.input_len -= self.scan;
        self.scan = 0;
    }

    /// Longest match for the bytes at `pos`, as (offset, length).
    fn find_match(&self, pos: usize, max_len: usize) -> (usize, usize) {
        let window = self.config.window_size();
        let earliest = (window - self.history_len).max(pos.saturating_sub(window));
        let needle = &self.buffer[pos..pos + max_len];

        let mut best = (0, 0);
        for candidate in (earliest..pos).rev() {
            let len = self.buffer[candidate..]
                .iter()
                .zip(needle)
                .take_while(|(a, b)| a == b)
                .count();
            if len > best.1 {
                best = (pos - candidate, len);
                if len == max_len {
                    break;
                }
            }
        }
        best
    }

    /// Encode the next position, if enough input is buffered.
    ///
    /// Returns the token bits and their width.
    fn next_token(&mut self) -> Option<(u32, u32)> {
        let pending = self.input_len - self.scan;
        let max_match = self.config.max_match();
        if pending == 0 || (!self.finishing && pending < max_match) {
            return None;
        }

        let pos = self.config.window_size() + self.scan;
        let (offset, len) = self.find_match(pos, pending.min(max_match));

        if len >= self.config.min_match() {
            self.scan += len;
            // Leading tag bit is 0
            let value = ((offset - 1) << self.config.lookahead_bits) | (len - 1);
            Some((value as u32, self.config.backref_bits()))
        } else {
            let literal = self.buffer[pos];
            self.scan += 1;
            Some((0x100 | literal as u32, LITERAL_BITS))
        }
    }
}

impl Transducer for LzssEncoder {
    fn role(&self) -> Role {
        Role::Encode
    }

    fn reset(&mut self) {
        self.history_len = 0;
        self.input_len = 0;
        self.scan = 0;
        self.bits.clear();
        self.finishing = false;
    }

    fn sink(&mut self, input: &[u8]) -> Result<usize> {
        if self.finishing {
            return Err(Error::InvalidState {
                expected: "accepting input",
                actual: "finishing",
            });
        }

        self.compact();

        let window = self.config.window_size();
        let n = input.len().min(window - self.input_len);
        let at = window + self.input_len;
        self.buffer[at..at + n].copy_from_slice(&input[..n]);
        self.input_len += n;

        Ok(n)
    }

    fn poll(&mut self, output: &mut [u8]) -> Result<(usize, PollStatus)> {
        if output.is_empty() {
            return Err(Error::InvalidState {
                expected: "output space",
                actual: "empty output buffer",
            });
        }

        let mut written = 0;
        loop {
            while self.bits.has_byte() {
                if written == output.len() {
                    return Ok((written, PollStatus::More));
                }
                output[written] = self.bits.pop_byte();
                written += 1;
            }

            if let Some((value, width)) = self.next_token() {
                self.bits.push(value, width);
                continue;
            }

            if self.finishing && !self.bits.is_empty() {
                self.bits.pad();
                continue;
            }

            return Ok((written, PollStatus::Empty));
        }
    }

    fn finish(&mut self) -> Result<FinishStatus> {
        self.finishing = true;
        if self.scan == self.input_len && self.bits.is_empty() {
            Ok(FinishStatus::Done)
        } else {
            Ok(FinishStatus::More)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive the encoder by hand with a tiny output slice.
    fn encode_all(encoder: &mut LzssEncoder, input: &[u8], out_chunk: usize) -> Vec<u8> {
        encoder.reset();
        let mut output = Vec::new();
        let mut chunk = vec![0u8; out_chunk];
        let mut sunk = 0;

        while sunk < input.len() {
            sunk += encoder.sink(&input[sunk..]).unwrap();
            if sunk == input.len() {
                assert_eq!(encoder.finish().unwrap(), FinishStatus::More);
            }
            loop {
                let (n, status) = encoder.poll(&mut chunk).unwrap();
                output.extend_from_slice(&chunk[..n]);
                if status == PollStatus::Empty {
                    break;
                }
            }
        }
        assert_eq!(encoder.finish().unwrap(), FinishStatus::Done);
        output
    }

    #[test]
    fn test_single_literal() {
        let mut encoder = LzssEncoder::new(LzssConfig::default()).unwrap();
        // tag 1 + 'A' (0x41) + 7 bits padding
        assert_eq!(encode_all(&mut encoder, b"A", 4), vec![0xa0, 0x80]);
    }

    #[test]
    fn test_run_becomes_backref() {
        let mut encoder = LzssEncoder::new(LzssConfig::default()).unwrap();
        let compressed = encode_all(&mut encoder, &[0u8; 17], 1);

        // literal (9 bits) + backref offset 1 length 16 (13 bits) = 22 bits
        assert_eq!(compressed.len(), 3);
        assert_eq!(compressed, vec![0x80, 0x00, 0x3c]);
    }

    #[test]
    fn test_output_chunk_size_does_not_change_stream() {
        let input: Vec<u8> = b"abcabcabcabd, abcabcabcabd; abcabcabcabd."
            .iter()
            .cycle()
            .take(700)
            .copied()
            .collect();
        let mut encoder = LzssEncoder::new(LzssConfig::default()).unwrap();

        let whole = encode_all(&mut encoder, &input, 4096);
        let bytewise = encode_all(&mut encoder, &input, 1);

        assert_eq!(whole, bytewise);
        assert!(whole.len() < input.len());
    }

    #[test]
    fn test_sink_after_finish_is_misuse() {
        let mut encoder = LzssEncoder::new(LzssConfig::default()).unwrap();
        encoder.sink(b"abc").unwrap();
        encoder.finish().unwrap();
        assert!(matches!(
            encoder.sink(b"d"),
            Err(Error::InvalidState { .. })
        ));
    }

    #[test]
    fn test_poll_without_space_is_misuse() {
        let mut encoder = LzssEncoder::new(LzssConfig::default()).unwrap();
        assert!(encoder.poll(&mut []).is_err());
    }

    #[test]
    fn test_sink_bounded_by_window() {
        let mut encoder = LzssEncoder::new(LzssConfig::new(4, 3)).unwrap();
        assert_eq!(encoder.sink(&[1u8; 64]).unwrap(), 16);
        assert_eq!(encoder.sink(&[1u8; 64]).unwrap(), 0);
    }

    #[test]
    fn test_double_reset_matches_single() {
        let input = b"the quick brown fox jumps over the quick brown dog";
        let mut once = LzssEncoder::new(LzssConfig::default()).unwrap();
        let mut twice = LzssEncoder::new(LzssConfig::default()).unwrap();

        // Leave some state behind first
        twice.sink(b"garbage garbage").unwrap();
        twice.reset();

        let a = encode_all(&mut once, input, 8);
        twice.reset();
        let b = encode_all(&mut twice, input, 8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(LzssEncoder::new(LzssConfig::new(2, 1)).is_err());
    }
}
