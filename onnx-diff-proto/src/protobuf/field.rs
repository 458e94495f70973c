use crate::protobuf::errors::{ErrorKind, ProtobufError};
use crate::protobuf::varint::{VarintError, read_varint};

/// Wire-type and associated value of a field.
///
/// See <https://protobuf.dev/programming-guides/encoding/#structure>.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FieldValue<'a> {
    /// Integer value encoded as a varint.
    Varint(u64),

    /// 64-bit fixed-width value.
    I64(i64),

    /// A variable-length value. This holds the bytes of the value, which may
    /// be a string, bytes, an embedded message or a packed repeated field.
    Len(&'a [u8]),

    /// 32-bit fixed-width value.
    I32(i32),
}

/// A single field of a message.
///
/// `Field`s are produced by iterating over fields of a message using
/// [`Fields`].
///
/// # Repeated fields
///
/// Repeated fields with a primitive type may have either a packed or un-packed
/// representation. The `read_repeated_*` methods handle both cases. They
/// return a single value if the field is unpacked, or all values in a packed
/// block if the field is packed.
#[derive(Clone, Debug)]
pub struct Field<'a> {
    number: u64,
    value: FieldValue<'a>,

    /// Debug name of the message type this field belongs to.
    context: Option<&'static str>,
}

impl<'a> Field<'a> {
    /// Return the field number.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Return the field value.
    pub fn value(&self) -> FieldValue<'a> {
        self.value
    }

    /// Return the bytes in this field.
    pub fn read_bytes(&self) -> Result<&'a [u8], ProtobufError> {
        match self.value {
            FieldValue::Len(data) => Ok(data),
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    /// Read the UTF-8 encoded string in this field.
    pub fn read_string(&self) -> Result<String, ProtobufError> {
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|_| self.error(ErrorKind::InvalidUtf8))
    }

    /// Begin reading the embedded message in this field.
    ///
    /// `context` is the name of the embedded message type being read. It is
    /// used to add context to any errors encountered.
    pub fn read_message(
        &self,
        context: Option<&'static str>,
    ) -> Result<Fields<'a>, ProtobufError> {
        let data = self.read_bytes()?;
        Ok(Fields::new(data, context))
    }

    fn get_varint(&self) -> Result<u64, ProtobufError> {
        match self.value {
            FieldValue::Varint(val) => Ok(val),
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    /// Get the value of a field with schema type `int32`.
    pub fn get_int32(&self) -> Result<i32, ProtobufError> {
        self.get_varint().map(|v| v as i32)
    }

    /// Get the value of a field where the schema type is an enum.
    pub fn get_enum(&self) -> Result<i32, ProtobufError> {
        self.get_int32()
    }

    /// Get the value of a field with schema type `int64`.
    pub fn get_int64(&self) -> Result<i64, ProtobufError> {
        self.get_varint().map(|v| v as i64)
    }

    /// Get the value of a field with schema type `float`.
    pub fn get_float(&self) -> Result<f32, ProtobufError> {
        match self.value {
            FieldValue::I32(val) => Ok(f32::from_le_bytes(val.to_le_bytes())),
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    /// Get one or multiple values from a `repeated int32` field.
    pub fn read_repeated_int32(&self) -> Result<Vec<i32>, ProtobufError> {
        self.read_repeated_varint(|x| x as i32)
    }

    /// Get one or multiple values from a `repeated int64` field.
    pub fn read_repeated_int64(&self) -> Result<Vec<i64>, ProtobufError> {
        self.read_repeated_varint(|x| x as i64)
    }

    /// Get one or multiple values from a `repeated uint64` field.
    pub fn read_repeated_uint64(&self) -> Result<Vec<u64>, ProtobufError> {
        self.read_repeated_varint(|x| x)
    }

    /// Get one or multiple values from a `repeated float` field.
    pub fn read_repeated_float(&self) -> Result<Vec<f32>, ProtobufError> {
        match self.value {
            FieldValue::I32(val) => Ok(vec![f32::from_le_bytes(val.to_le_bytes())]),
            FieldValue::Len(data) => {
                let chunks = data.chunks_exact(4);
                if !chunks.remainder().is_empty() {
                    return Err(self.error(ErrorKind::FieldLengthMismatch));
                }
                Ok(chunks
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect())
            }
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    /// Get one or multiple values from a `repeated double` field.
    pub fn read_repeated_double(&self) -> Result<Vec<f64>, ProtobufError> {
        match self.value {
            FieldValue::I64(val) => Ok(vec![f64::from_le_bytes(val.to_le_bytes())]),
            FieldValue::Len(data) => {
                let chunks = data.chunks_exact(8);
                if !chunks.remainder().is_empty() {
                    return Err(self.error(ErrorKind::FieldLengthMismatch));
                }
                Ok(chunks
                    .map(|c| {
                        let mut bytes = [0u8; 8];
                        bytes.copy_from_slice(c);
                        f64::from_le_bytes(bytes)
                    })
                    .collect())
            }
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    /// Get the values of a repeated varint field.
    fn read_repeated_varint<T>(
        &self,
        from_u64: impl Fn(u64) -> T,
    ) -> Result<Vec<T>, ProtobufError> {
        match self.value {
            FieldValue::Varint(val) => Ok(vec![from_u64(val)]),
            FieldValue::Len(mut data) => {
                let mut values = Vec::new();
                while !data.is_empty() {
                    let val = read_varint(&mut data).map_err(|err| {
                        ProtobufError::from(err).with_context(self.context, Some(self.number))
                    })?;
                    values.push(from_u64(val));
                }
                Ok(values)
            }
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    fn error(&self, kind: ErrorKind) -> ProtobufError {
        ProtobufError::new(kind).with_context(self.context, Some(self.number))
    }
}

/// Iterator over fields of a message.
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use onnx_diff_proto::protobuf::Fields;
///
/// // A minimal but valid message.
/// let message = [0x08, 0x96, 0x01];
///
/// for field in Fields::new(&message, None) {
///     let field = field?;
///     assert_eq!(field.number(), 1);
///     assert_eq!(field.get_int64()?, 150);
/// }
/// # Ok(()) }
/// ```
///
/// Iteration stops after the first error.
#[derive(Clone, Debug)]
pub struct Fields<'a> {
    buf: &'a [u8],

    /// Debug name of the message type.
    context: Option<&'static str>,
}

impl<'a> Fields<'a> {
    /// Iterate over the fields of the message encoded in `buf`.
    ///
    /// `context` is the name of the message type being read, for debugging
    /// purposes.
    pub fn new(buf: &'a [u8], context: Option<&'static str>) -> Self {
        Self { buf, context }
    }

    fn read_field(&mut self) -> Result<Field<'a>, ProtobufError> {
        let context = self.context;
        let tag = read_varint(&mut self.buf)
            .map_err(|err| ProtobufError::from(err).with_context(context, None))?;
        let number = tag >> 3;
        let wire_type = tag & 0x7;
        let error = |kind: ErrorKind| ProtobufError::new(kind).with_context(context, Some(number));
        let varint_error =
            |err: VarintError| ProtobufError::from(err).with_context(context, Some(number));

        let value = match wire_type {
            0 => FieldValue::Varint(read_varint(&mut self.buf).map_err(varint_error)?),
            1 => {
                let (bytes, rest) = self
                    .buf
                    .split_first_chunk::<8>()
                    .ok_or_else(|| error(ErrorKind::Eof))?;
                self.buf = rest;
                FieldValue::I64(i64::from_le_bytes(*bytes))
            }
            2 => {
                let len = read_varint(&mut self.buf).map_err(varint_error)?;
                let len = usize::try_from(len).map_err(|_| error(ErrorKind::Eof))?;
                if len > self.buf.len() {
                    return Err(error(ErrorKind::Eof));
                }
                let (data, rest) = self.buf.split_at(len);
                self.buf = rest;
                FieldValue::Len(data)
            }
            5 => {
                let (bytes, rest) = self
                    .buf
                    .split_first_chunk::<4>()
                    .ok_or_else(|| error(ErrorKind::Eof))?;
                self.buf = rest;
                FieldValue::I32(i32::from_le_bytes(*bytes))
            }
            _ => {
                return Err(error(ErrorKind::InvalidWireType));
            }
        };

        Ok(Field {
            number,
            value,
            context,
        })
    }
}

impl<'a> Iterator for Fields<'a> {
    type Item = Result<Field<'a>, ProtobufError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }
        let field = self.read_field();
        if field.is_err() {
            self.buf = &[];
        }
        Some(field)
    }
}

/// Test helper for encoding messages.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MessageWriter {
    buf: Vec<u8>,
}

#[cfg(test)]
impl MessageWriter {
    fn tag(&mut self, number: u64, wire_type: u64) {
        use crate::protobuf::varint::encode_varint;
        self.buf.extend(encode_varint(wire_type | (number << 3)));
    }

    pub fn varint(mut self, number: u64, val: u64) -> Self {
        use crate::protobuf::varint::encode_varint;
        self.tag(number, 0);
        self.buf.extend(encode_varint(val));
        self
    }

    pub fn fixed32(mut self, number: u64, val: [u8; 4]) -> Self {
        self.tag(number, 5);
        self.buf.extend(val);
        self
    }

    pub fn bytes(mut self, number: u64, data: &[u8]) -> Self {
        use crate::protobuf::varint::encode_varint;
        self.tag(number, 2);
        self.buf.extend(encode_varint(data.len() as u64));
        self.buf.extend(data);
        self
    }

    pub fn string(self, number: u64, val: &str) -> Self {
        self.bytes(number, val.as_bytes())
    }

    pub fn message(self, number: u64, msg: MessageWriter) -> Self {
        self.bytes(number, &msg.finish())
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, Fields, MessageWriter};
    use crate::protobuf::ErrorKind;
    use crate::protobuf::varint::encode_varint;

    #[test]
    fn test_read_fields() {
        let buf = MessageWriter::default()
            .varint(1, 150)
            .string(2, "hi")
            .fixed32(3, 1.5f32.to_le_bytes())
            .finish();

        let fields: Vec<_> = Fields::new(&buf, None).map(|f| f.unwrap()).collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].number(), 1);
        assert_eq!(fields[0].get_int64().unwrap(), 150);
        assert_eq!(fields[1].read_string().unwrap(), "hi");
        assert_eq!(fields[2].get_float().unwrap(), 1.5);
    }

    #[test]
    fn test_read_packed_and_unpacked_int64() {
        let packed: Vec<u8> = [1u64, 300, 2].into_iter().flat_map(encode_varint).collect();
        let buf = MessageWriter::default()
            .bytes(1, &packed)
            .varint(1, 7)
            .finish();

        let mut values = Vec::new();
        for field in Fields::new(&buf, None) {
            values.extend(field.unwrap().read_repeated_int64().unwrap());
        }
        assert_eq!(values, [1, 300, 2, 7]);
    }

    #[test]
    fn test_read_packed_float() {
        let packed: Vec<u8> = [1.0f32, -2.5].iter().flat_map(|x| x.to_le_bytes()).collect();
        let buf = MessageWriter::default().bytes(4, &packed).finish();
        let field = Fields::new(&buf, None).next().unwrap().unwrap();
        assert_eq!(field.read_repeated_float().unwrap(), [1.0, -2.5]);

        let buf = MessageWriter::default().bytes(4, &[0, 0, 0]).finish();
        let field = Fields::new(&buf, None).next().unwrap().unwrap();
        let err = field.read_repeated_float().err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::FieldLengthMismatch);
    }

    #[test]
    fn test_type_mismatch() {
        let buf = MessageWriter::default().varint(1, 5).finish();
        let field = Fields::new(&buf, Some("Test")).next().unwrap().unwrap();
        assert_eq!(field.value(), FieldValue::Varint(5));

        let err = field.read_string().err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::FieldTypeMismatch);
        assert_eq!(err.context(), Some("Test"));
        assert_eq!(err.field(), Some(1));
    }

    #[test]
    fn test_truncated_len_field() {
        let mut buf = MessageWriter::default().string(2, "hello").finish();
        buf.truncate(buf.len() - 2);

        let mut fields = Fields::new(&buf, None);
        let err = fields.next().unwrap().err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::Eof);
        assert!(fields.next().is_none());
    }

    #[test]
    fn test_group_wire_type_rejected() {
        // Field 1, wire type 3 (start group).
        let buf = [0x0b];
        let err = Fields::new(&buf, None).next().unwrap().err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::InvalidWireType);
    }

    #[test]
    fn test_invalid_utf8() {
        let buf = MessageWriter::default().bytes(1, &[0xff, 0xfe]).finish();
        let field = Fields::new(&buf, None).next().unwrap().unwrap();
        let err = field.read_string().err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::InvalidUtf8);
    }
}
