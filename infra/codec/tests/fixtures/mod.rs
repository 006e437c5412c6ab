use keepsake_codec::{CipherMode, Codec};

pub const SECRET: &str = "s3cret";

/// Builds a codec over [`SECRET`] in the requested mode.
/// # Panics
/// * If the codec cannot be built.
#[must_use]
pub fn setup_codec(mode: CipherMode) -> Codec {
    Codec::builder().secret(SECRET).mode(mode).build().expect("Codec setup failed")
}

/// Flips one bit of the decoded byte at `index` and re-encodes the blob.
#[must_use]
pub fn flip_decoded_byte(blob: &str, index: usize) -> String {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    let mut raw = STANDARD.decode(blob).expect("fixture blob must be base64");
    raw[index] ^= 0x01;
    STANDARD.encode(raw)
}
