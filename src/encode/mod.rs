// src/encode/mod.rs

pub mod rice {
    pub mod bit_io;
    pub mod golomb;
    pub mod runlength;
}

pub mod wavelet {
    pub mod codec;
    pub mod lifting;
    pub mod quant;
}

pub mod hadamard {
    pub mod codec;
    pub mod tables;
    pub mod wht;
}

pub mod block;
pub mod constants;
pub mod decoder;
pub mod dictionary;
pub mod encoder;
pub mod layered;
pub mod partition;
pub mod predict;
pub mod rate;
pub mod scan;

// Re-export the entry points
pub use block::{BlockCodec, CodecVariant, QuantMode, TransformKind};
pub use decoder::{Decoder, DecoderParams};
pub use dictionary::{DcDictionary, SymbolDictionary};
pub use encoder::{Encoder, EncoderParams, RateMode};
pub use layered::{decode_layers, decode_layers_with_dictionary};
