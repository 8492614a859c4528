//! # Crank LZSS
//!
//! Heatshrink-style LZSS encoder and decoder, written as incremental
//! [`Transducer`](crank_core::Transducer)s with working memory fixed at
//! construction.
//!
//! ## Bitstream
//!
//! Tokens are packed MSB-first:
//!
//! - **Literal**: tag bit `1`, then the byte.
//! - **Back-reference**: tag bit `0`, then `offset - 1` in `window_bits`
//!   bits, then `length - 1` in `lookahead_bits` bits.
//!
//! The final partial byte is zero-padded. Padding is always shorter than
//! any token, so a decoder never mistakes it for data.
//!
//! ## Example
//!
//! ```ignore
//! use crank_lzss::{LzssCodec, LzssConfig};
//! use crank_stream::{BufferSizing, Pump};
//!
//! let codec = LzssCodec::new(LzssConfig::default())?;
//! let mut compressed = BufferSizing::default().allocate_for(data.len())?;
//! Pump::new(codec.encoder()?).run(data, &mut compressed)?;
//! ```

mod bits;
pub mod codec;
pub mod compress;
pub mod config;
pub mod decompress;

// Re-export main types
pub use codec::LzssCodec;
pub use compress::LzssEncoder;
pub use config::LzssConfig;
pub use decompress::LzssDecoder;
