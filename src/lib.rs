//! # Scalable Block Image Codec
//!
//! A lossy codec for 4:2:0 YCbCr frames built from small, replaceable parts:
//!
//! - `encode::rice`: bit I/O, Rice codes, zero-run and run-length coders
//! - `encode::wavelet` / `encode::hadamard`: the two block transforms with
//!   their quantizers
//! - `encode::partition`, `encode::predict`, `encode::rate`: macroblock
//!   layouts, closed-loop DC prediction and virtual-buffer rate control
//! - `encode::encoder` / `encode::decoder` / `encode::layered`: the
//!   single-layer and multi-resolution pipelines
//! - `encode::dictionary`: the caller-owned DC pair table
//! - `container`: the big-endian stream layout
//! - `image`: planes and frames
//!
//! ```no_run
//! use scalable_codec::{DecoderParams, EncoderParams, Frame, decode, encode};
//!
//! let frame = Frame::filled(64, 48, [120, 128, 128]);
//! let bytes = encode(&frame, EncoderParams::default())?;
//! let back = decode(&bytes, DecoderParams::default())?;
//! assert_eq!(back.width(), 64);
//! # Ok::<(), scalable_codec::CodecError>(())
//! ```

// Re-export commonly used types at the crate root
pub use utils::error::{CodecError, Result};

pub mod utils {
    pub mod error;
}

pub mod image {
    pub mod frame;
    pub mod plane;
}

pub mod container {
    #[allow(clippy::module_inception)]
    pub mod container;
    pub mod layered;
    pub mod tags;
}

pub mod encode;

// Public API exports
pub use container::container::Container;
pub use encode::decoder::decode;
pub use encode::encoder::encode;
pub use encode::{
    CodecVariant, DcDictionary, Decoder, DecoderParams, Encoder, EncoderParams, RateMode, TransformKind,
    decode_layers, decode_layers_with_dictionary,
};
pub use image::frame::{Channel, Frame};
pub use image::plane::Plane;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
