//! LZSS decoder transducer.

use crank_core::{Error, FinishStatus, PollStatus, Result, Role, Transducer};

use crate::bits::BitReader;
use crate::config::{alloc_zeroed, LzssConfig};

/// Where the decoder is inside the current token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Tag,
    Literal,
    BackrefIndex,
    BackrefCount { offset: usize },
    YieldLiteral(u8),
    YieldBackref { offset: usize, remaining: usize },
}

/// Incremental LZSS decoder.
///
/// Suspends between any two bits of input and any two bytes of output.
/// Corrupt input never panics: references past the written history read
/// the zero-initialised window.
#[derive(Debug)]
pub struct LzssDecoder {
    config: LzssConfig,
    input: Box<[u8]>,
    input_len: usize,
    input_pos: usize,
    reader: BitReader,
    /// Ring of the last `window_size` output bytes.
    window: Box<[u8]>,
    head: usize,
    state: State,
    /// Input arrived since the last poll that ran dry.
    unpolled: bool,
}

impl LzssDecoder {
    /// Create a decoder, validating `config` and allocating its buffers.
    pub fn new(config: LzssConfig) -> Result<Self> {
        config.validate()?;
        let input = alloc_zeroed(config.input_buffer_size)?;
        let window = alloc_zeroed(config.window_size())?;

        Ok(Self {
            config,
            input,
            input_len: 0,
            input_pos: 0,
            reader: BitReader::default(),
            window,
            head: 0,
            state: State::Tag,
            unpolled: false,
        })
    }

    /// Get the decoder parameters.
    pub fn config(&self) -> &LzssConfig {
        &self.config
    }

    /// Bytes of state held by this decoder, heap included.
    pub fn memory_footprint(&self) -> usize {
        core::mem::size_of::<Self>() + self.input.len() + self.window.len()
    }

    fn read_bits(&mut self, width: u8) -> Option<u16> {
        let Self {
            reader,
            input,
            input_len,
            input_pos,
            ..
        } = self;
        reader.read(width as u32, &input[..*input_len], input_pos)
    }

    /// The current field cannot complete from buffered input.
    fn starved(&mut self, written: usize) -> Result<(usize, PollStatus)> {
        self.unpolled = false;
        Ok((written, PollStatus::Empty))
    }

    #[inline]
    fn emit(&mut self, byte: u8, output: &mut [u8], written: &mut usize) {
        output[*written] = byte;
        *written += 1;
        self.window[self.head] = byte;
        self.head = (self.head + 1) % self.window.len();
    }
}

impl Transducer for LzssDecoder {
    fn role(&self) -> Role {
        Role::Decode
    }

    fn reset(&mut self) {
        self.input_len = 0;
        self.input_pos = 0;
        self.reader.clear();
        self.window.fill(0);
        self.head = 0;
        self.state = State::Tag;
        self.unpolled = false;
    }

    fn sink(&mut self, input: &[u8]) -> Result<usize> {
        if self.input_pos > 0 {
            self.input.copy_within(self.input_pos..self.input_len, 0);
            self.input_len -= self.input_pos;
            self.input_pos = 0;
        }

        let n = input.len().min(self.input.len() - self.input_len);
        self.input[self.input_len..self.input_len + n].copy_from_slice(&input[..n]);
        self.input_len += n;
        self.unpolled |= n > 0;

        Ok(n)
    }

    fn poll(&mut self, output: &mut [u8]) -> Result<(usize, PollStatus)> {
        if output.is_empty() {
            return Err(Error::InvalidState {
                expected: "output space",
                actual: "empty output buffer",
            });
        }

        let window_bits = self.config.window_bits;
        let lookahead_bits = self.config.lookahead_bits;
        let window_size = self.window.len();
        let mut written = 0;

        loop {
            match self.state {
                State::Tag => match self.read_bits(1) {
                    None => return self.starved(written),
                    Some(1) => self.state = State::Literal,
                    Some(_) => self.state = State::BackrefIndex,
                },
                State::Literal => match self.read_bits(8) {
                    None => return self.starved(written),
                    Some(byte) => self.state = State::YieldLiteral(byte as u8),
                },
                State::BackrefIndex => match self.read_bits(window_bits) {
                    None => return self.starved(written),
                    Some(index) => {
                        self.state = State::BackrefCount {
                            offset: index as usize + 1,
                        }
                    }
                },
                State::BackrefCount { offset } => match self.read_bits(lookahead_bits) {
                    None => return self.starved(written),
                    Some(count) => {
                        self.state = State::YieldBackref {
                            offset,
                            remaining: count as usize + 1,
                        }
                    }
                },
                State::YieldLiteral(byte) => {
                    if written == output.len() {
                        return Ok((written, PollStatus::More));
                    }
                    self.emit(byte, output, &mut written);
                    self.state = State::Tag;
                }
                State::YieldBackref {
                    offset,
                    mut remaining,
                } => {
                    while remaining > 0 {
                        if written == output.len() {
                            self.state = State::YieldBackref { offset, remaining };
                            return Ok((written, PollStatus::More));
                        }
                        let byte = self.window[(self.head + window_size - offset) % window_size];
                        self.emit(byte, output, &mut written);
                        remaining -= 1;
                    }
                    self.state = State::Tag;
                }
            }
        }
    }

    /// Bits left over once a poll has run dry are padding, or the tail of
    /// a truncated stream; either way no further output can come from them.
    fn finish(&mut self) -> Result<FinishStatus> {
        let yielding = matches!(
            self.state,
            State::YieldLiteral(_) | State::YieldBackref { .. }
        );
        if !self.unpolled && !yielding {
            Ok(FinishStatus::Done)
        } else {
            Ok(FinishStatus::More)
        }
    }
}
