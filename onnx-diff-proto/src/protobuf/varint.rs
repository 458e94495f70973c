//! Read varints from byte slices.
//!
//! Variable length integers (_varints_) are the default encoding of integers
//! in Protocol Buffers messages, including field tags and numbers. `int64`
//! fields such as `TensorShapeProto.Dimension.dim_value` are decoded into a
//! full `u64` so large values are preserved exactly.
//!
//! See <https://protobuf.dev/programming-guides/encoding/#varints>.

/// Maximum number of bytes for an encoded varint.
///
/// A decoded varint is a u64 value. Each byte contains 7 value bits and one
/// continuation bit. Hence we need 9 "full" bytes plus one bit from the 10th byte.
const MAX_VARINT_LEN: usize = 10;

#[derive(Debug, PartialEq)]
pub enum VarintError {
    /// The input is already empty.
    Eof,
    /// The varint length exceeds 64-bits, or the end of the input was reached
    /// before a full varint was read.
    InvalidVarint,
}

/// Read a varint value of up to 64-bits from the start of `src`.
///
/// On success `src` is advanced past the bytes that were read.
pub fn read_varint(src: &mut &[u8]) -> Result<u64, VarintError> {
    if src.is_empty() {
        return Err(VarintError::Eof);
    }

    let mut value = 0;
    for (index, byte) in src.iter().copied().take(MAX_VARINT_LEN).enumerate() {
        // High bit is continuation bit. Low 7 bits are the payload.
        value |= ((byte & 0x7f) as u64) << (index * 7);
        if byte <= 0x7f {
            // Only one value bit from the last byte may be used.
            if index + 1 == MAX_VARINT_LEN && byte > 0x01 {
                break;
            }
            *src = &src[index + 1..];
            return Ok(value);
        }
    }

    Err(VarintError::InvalidVarint)
}

/// Encode `val` as a varint.
pub fn encode_varint(mut val: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(MAX_VARINT_LEN);

    loop {
        let byte = (val & 0x7f) as u8;
        if val <= 0x7f {
            bytes.push(byte);
            break;
        }
        bytes.push(byte | 0x80);
        val >>= 7;
    }

    bytes
}

#[cfg(test)]
mod tests {
    use super::{VarintError, encode_varint, read_varint};

    #[test]
    fn test_read_varint() {
        let mut values: Vec<u64> = (0..1024).collect();
        values.push((1 << 53) + 1);
        values.push(u64::MAX);
        for val in values {
            let buf = encode_varint(val);
            let mut src = buf.as_slice();
            let decoded_val = read_varint(&mut src).unwrap();
            assert_eq!(decoded_val, val);
            assert!(src.is_empty());
        }
    }

    #[test]
    fn test_read_varint_sequence() {
        // Example from https://protobuf.dev/programming-guides/encoding/#simple.
        let buf = [0x08, 0x96, 0x01];
        let mut src = &buf[..];
        assert_eq!(read_varint(&mut src), Ok(8));
        assert_eq!(read_varint(&mut src), Ok(150));
        assert_eq!(read_varint(&mut src), Err(VarintError::Eof));
    }

    #[test]
    fn test_truncated_varint() {
        let buf = [0x96];
        let mut src = &buf[..];
        assert_eq!(read_varint(&mut src), Err(VarintError::InvalidVarint));
    }

    #[test]
    fn test_invalid_varint() {
        let mut buf = encode_varint(u64::MAX);
        assert_eq!(buf.len(), 10);
        buf[9] += 1;
        let decoded = read_varint(&mut buf.as_slice());
        assert_eq!(decoded, Err(VarintError::InvalidVarint));
    }
}
