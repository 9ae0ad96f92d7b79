use encoding_rs::UTF_16LE;

/// Little-endian view over a block of bytes copied out of the target process.
///
/// All accessors are bounds-checked and return `None` past the end.
#[derive(Debug, Clone, Copy)]
pub struct ByteBuffer<'a> {
    data: &'a [u8],
}

impl<'a> ByteBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn array_at<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        let end = offset.checked_add(N)?;
        self.data.get(offset..end)?.try_into().ok()
    }

    pub fn u8_at(&self, offset: usize) -> Option<u8> {
        self.data.get(offset).copied()
    }

    pub fn i32_at(&self, offset: usize) -> Option<i32> {
        self.array_at::<4>(offset).map(i32::from_le_bytes)
    }

    pub fn i64_at(&self, offset: usize) -> Option<i64> {
        self.array_at::<8>(offset).map(i64::from_le_bytes)
    }

    pub fn u64_at(&self, offset: usize) -> Option<u64> {
        self.array_at::<8>(offset).map(u64::from_le_bytes)
    }
}

/// Decode UTF-16LE code units, replacing malformed sequences with U+FFFD
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let (decoded, _) = UTF_16LE.decode_without_bom_handling(bytes);
    decoded.into_owned()
}
