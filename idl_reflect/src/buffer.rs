/* Zero-copy, bounds-checked readers over a finished buffer */

use crate::builder::{FILE_IDENTIFIER_LENGTH, SOFFSET_SIZE, UOFFSET_SIZE, VOFFSET_SIZE};
use crate::errors::{ReflectError, ReflectResult};
use crate::scalar::Scalar;

#[derive(Debug, Clone, Copy)]
pub struct Buffer<'a> {
    data: &'a [u8],
}

impl<'a> Buffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Buffer { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn out_of_bounds(&self, offset: u64, len: u64) -> ReflectError {
        ReflectError::OutOfBounds {
            offset,
            len,
            size: self.data.len() as u64,
        }
    }

    /* `base + delta`, failing instead of wrapping */
    fn offset_by(&self, base: u64, delta: u64) -> ReflectResult<u64> {
        base.checked_add(delta).ok_or_else(|| self.out_of_bounds(base, delta))
    }

    pub fn bytes(&self, pos: u64, len: u64) -> ReflectResult<&'a [u8]> {
        let end = self.offset_by(pos, len)?;
        if end > self.data.len() as u64 {
            return Err(self.out_of_bounds(pos, len));
        }
        Ok(&self.data[pos as usize..end as usize])
    }

    pub fn read<T: Scalar>(&self, pos: u64) -> ReflectResult<T> {
        Ok(T::read_le(self.bytes(pos, T::SIZE as u64)?))
    }

    /* Follows the forward reference stored at `pos` */
    pub fn indirect(&self, pos: u64) -> ReflectResult<u64> {
        let relative: u64 = self.read(pos)?;
        self.offset_by(pos, relative)
    }

    /* Length-prefixed UTF-8 string starting at `pos` */
    pub fn string_at(&self, pos: u64) -> ReflectResult<&'a str> {
        let len: u64 = self.read(pos)?;
        let bytes = self.bytes(self.offset_by(pos, UOFFSET_SIZE as u64)?, len)?;
        std::str::from_utf8(bytes).map_err(|_| ReflectError::InvalidUtf8 { offset: pos })
    }

    pub fn vector_at(&self, pos: u64) -> ReflectResult<VectorView<'a>> {
        let len: u64 = self.read(pos)?;
        Ok(VectorView {
            buf: *self,
            start: self.offset_by(pos, UOFFSET_SIZE as u64)?,
            len,
        })
    }

    pub fn table_at(&self, pos: u64) -> TableView<'a> {
        TableView { buf: *self, pos }
    }

    pub fn root(&self) -> ReflectResult<TableView<'a>> {
        Ok(self.table_at(self.indirect(0)?))
    }

    pub fn size_prefixed_root(&self) -> ReflectResult<TableView<'a>> {
        Ok(self.table_at(self.indirect(UOFFSET_SIZE as u64)?))
    }

    pub fn has_identifier(&self, ident: &str, size_prefixed: bool) -> bool {
        let at = if size_prefixed { 2 * UOFFSET_SIZE } else { UOFFSET_SIZE } as u64;
        matches!(self.bytes(at, FILE_IDENTIFIER_LENGTH as u64), Ok(found) if found == ident.as_bytes())
    }
}

/* A table: an i64 at `pos` locates its vtable */
#[derive(Debug, Clone, Copy)]
pub struct TableView<'a> {
    pub buf: Buffer<'a>,
    pub pos: u64,
}

impl<'a> TableView<'a> {
    fn vtable(&self) -> ReflectResult<u64> {
        let soffset: i64 = self.buf.read(self.pos)?;
        i64::try_from(self.pos)
            .ok()
            .and_then(|pos| pos.checked_sub(soffset))
            .and_then(|vtable| u64::try_from(vtable).ok())
            .ok_or_else(|| self.buf.out_of_bounds(self.pos, SOFFSET_SIZE as u64))
    }

    /* Offset of the field from the table start; 0 means absent */
    pub fn field_offset(&self, voffset: u16) -> ReflectResult<u64> {
        let vtable = self.vtable()?;
        let vtable_len: u16 = self.buf.read(vtable)?;
        if voffset as usize + VOFFSET_SIZE > vtable_len as usize {
            return Ok(0);
        }
        let entry: u16 = self.buf.read(vtable + voffset as u64)?;
        Ok(entry as u64)
    }

    /* Absolute position of a present field */
    pub fn field_pos(&self, voffset: u16) -> ReflectResult<Option<u64>> {
        let offset = self.field_offset(voffset)?;
        if offset == 0 {
            return Ok(None);
        }
        self.buf.offset_by(self.pos, offset).map(Some)
    }

    pub fn get<T: Scalar>(&self, voffset: u16, default: T) -> ReflectResult<T> {
        match self.field_pos(voffset)? {
            Some(pos) => self.buf.read(pos),
            None => Ok(default),
        }
    }

    pub fn get_optional<T: Scalar>(&self, voffset: u16) -> ReflectResult<Option<T>> {
        self.field_pos(voffset)?.map(|pos| self.buf.read(pos)).transpose()
    }

    pub fn string(&self, voffset: u16) -> ReflectResult<Option<&'a str>> {
        match self.field_pos(voffset)? {
            Some(pos) => Ok(Some(self.buf.string_at(self.buf.indirect(pos)?)?)),
            None => Ok(None),
        }
    }

    pub fn vector(&self, voffset: u16) -> ReflectResult<Option<VectorView<'a>>> {
        match self.field_pos(voffset)? {
            Some(pos) => Ok(Some(self.buf.vector_at(self.buf.indirect(pos)?)?)),
            None => Ok(None),
        }
    }

    pub fn table(&self, voffset: u16) -> ReflectResult<Option<TableView<'a>>> {
        match self.field_pos(voffset)? {
            Some(pos) => Ok(Some(self.buf.table_at(self.buf.indirect(pos)?))),
            None => Ok(None),
        }
    }

    /* Inline fixed struct */
    pub fn struct_at(&self, voffset: u16) -> ReflectResult<Option<StructView<'a>>> {
        Ok(self.field_pos(voffset)?.map(|pos| StructView { buf: self.buf, pos }))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StructView<'a> {
    pub buf: Buffer<'a>,
    pub pos: u64,
}

impl<'a> StructView<'a> {
    pub fn get<T: Scalar>(&self, offset: u64) -> ReflectResult<T> {
        self.buf.read(self.buf.offset_by(self.pos, offset)?)
    }

    pub fn nested(&self, offset: u64) -> StructView<'a> {
        StructView {
            buf: self.buf,
            pos: self.pos + offset,
        }
    }

    pub fn bytes(&self, size: u64) -> ReflectResult<&'a [u8]> {
        self.buf.bytes(self.pos, size)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VectorView<'a> {
    pub buf: Buffer<'a>,
    /* First element */
    pub start: u64,
    pub len: u64,
}

impl<'a> VectorView<'a> {
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn element_pos(&self, index: u64, elem_size: u64) -> ReflectResult<u64> {
        let relative = index.checked_mul(elem_size);
        let pos = relative.and_then(|relative| self.start.checked_add(relative));
        match pos {
            Some(pos) if index < self.len => Ok(pos),
            _ => Err(self.buf.out_of_bounds(self.start, elem_size)),
        }
    }

    pub fn get<T: Scalar>(&self, index: u64) -> ReflectResult<T> {
        self.buf.read(self.element_pos(index, T::SIZE as u64)?)
    }

    pub fn table(&self, index: u64) -> ReflectResult<TableView<'a>> {
        let pos = self.element_pos(index, UOFFSET_SIZE as u64)?;
        Ok(self.buf.table_at(self.buf.indirect(pos)?))
    }

    pub fn string(&self, index: u64) -> ReflectResult<&'a str> {
        let pos = self.element_pos(index, UOFFSET_SIZE as u64)?;
        self.buf.string_at(self.buf.indirect(pos)?)
    }

    /* Target of the reference stored at `index` */
    pub fn indirect(&self, index: u64) -> ReflectResult<u64> {
        let pos = self.element_pos(index, UOFFSET_SIZE as u64)?;
        self.buf.indirect(pos)
    }

    pub fn struct_at(&self, index: u64, size: u64) -> ReflectResult<StructView<'a>> {
        Ok(StructView {
            buf: self.buf,
            pos: self.element_pos(index, size)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{voffset, BufferBuilder};

    #[test]
    fn test_reads_fields_written_by_builder() {
        let mut builder = BufferBuilder::new();
        let name = builder.create_string("orc").unwrap();
        let inventory = builder.create_vector(&[1u8, 2, 3]).unwrap();
        builder.start_table(4).unwrap();
        builder.add_offset(1, name).unwrap();
        builder.add_offset(2, inventory).unwrap();
        builder.add_scalar::<i16>(0, 300, Some(100)).unwrap();
        let root = builder.end_table().unwrap();
        builder.finish(root, Some("MONS"), false).unwrap();

        let buf = Buffer::new(builder.finished_data().unwrap());
        assert!(buf.has_identifier("MONS", false));
        let table = buf.root().unwrap();
        assert_eq!(table.get::<i16>(voffset(0), 100).unwrap(), 300);
        assert_eq!(table.string(voffset(1)).unwrap(), Some("orc"));
        let inv = table.vector(voffset(2)).unwrap().unwrap();
        assert_eq!(inv.len(), 3);
        assert_eq!(inv.get::<u8>(2).unwrap(), 3);
        assert!(inv.get::<u8>(3).is_err());
        assert_eq!(table.get::<i32>(voffset(3), -1).unwrap(), -1);
        assert_eq!(table.get_optional::<i32>(voffset(3)).unwrap(), None);
    }

    #[test]
    fn test_size_prefixed_root() {
        let mut builder = BufferBuilder::new();
        builder.start_table(1).unwrap();
        builder.add_scalar::<u32>(0, 5, None).unwrap();
        let root = builder.end_table().unwrap();
        builder.finish(root, None, true).unwrap();

        let data = builder.finished_data().unwrap();
        let buf = Buffer::new(data);
        assert_eq!(buf.read::<u64>(0).unwrap(), data.len() as u64 - 8);
        assert_eq!(buf.size_prefixed_root().unwrap().get::<u32>(voffset(0), 0).unwrap(), 5);
    }

    #[test]
    fn test_huge_vector_index_is_out_of_bounds() {
        let mut data = u64::MAX.to_le_bytes().to_vec();
        data.extend_from_slice(&[0; 8]);
        let vector = Buffer::new(&data).vector_at(0).unwrap();
        assert!(matches!(vector.get::<u64>(u64::MAX / 2), Err(ReflectError::OutOfBounds { .. })));
        assert!(matches!(vector.table(u64::MAX - 1), Err(ReflectError::OutOfBounds { .. })));
    }

    #[test]
    fn test_overflowing_soffset_is_out_of_bounds() {
        let mut data = vec![0u8; 8];
        data.extend_from_slice(&i64::MIN.to_le_bytes());
        let table = Buffer::new(&data).table_at(8);
        assert!(matches!(table.field_offset(voffset(0)), Err(ReflectError::OutOfBounds { .. })));
    }

    #[test]
    fn test_truncated_buffer_is_an_error() {
        let buf = Buffer::new(&[16, 0, 0]);
        assert!(matches!(buf.root(), Err(ReflectError::OutOfBounds { .. })));
    }
}
