mod lz4;

pub use lz4::Lz4CompressionModule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// The compressed stream could not be decoded
    Malformed,

    /// The stream decoded to a different amount of bytes than expected
    LengthMismatch { expected: usize, actual: usize },
}

/// A stateless compression codec.
///
/// `decompress(compress(x)) == x` has to hold for every byte sequence `x`.
pub trait CompressionModule {
    fn new() -> Self;

    /// Compresses `src` into a new buffer
    fn compress(&mut self, src: &[u8]) -> Vec<u8>;

    /// Decompresses `src` that was produced by [`CompressionModule::compress`].
    ///
    /// Streams that would decompress to more than `expected_max_len` bytes are rejected.
    fn decompress(&mut self, src: &[u8], expected_max_len: usize) -> Result<Vec<u8>, CodecError>;
}
