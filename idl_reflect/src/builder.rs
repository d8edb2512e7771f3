/* Back-to-front buffer builder.
 *
 * Bytes are prepended: the used region is `buf[head..]` and every position is
 * tracked as its distance from the end (`offset()`), which never changes once
 * written. Children therefore have to exist before the parent that refers to
 * them. References are forward 64-bit offsets, tables start with a 64-bit
 * signed offset to their vtable, and vtables are 16-bit entries
 * `[vtable bytes, table bytes, field offsets...]`.
 */

use crate::errors::{ReflectError, ReflectResult};
use crate::scalar::Scalar;
use std::collections::HashMap;

pub const UOFFSET_SIZE: usize = 8;
pub const SOFFSET_SIZE: usize = 8;
pub const VOFFSET_SIZE: usize = 2;
pub const FILE_IDENTIFIER_LENGTH: usize = 4;

/* Distance of a written object from the end of the buffer */
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UOffset(pub u64);

impl UOffset {
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/* vtable slot of a field, `4 + 2 * index` */
pub fn voffset(slot: u16) -> u16 {
    (2 + slot) * VOFFSET_SIZE as u16
}

#[derive(Debug)]
pub struct BufferBuilder {
    buf: Vec<u8>,
    head: usize,
    minalign: usize,
    /* Field positions of the open table, 0 when absent */
    fields: Vec<u64>,
    table_start: Option<u64>,
    vector_len: Option<u64>,
    vtables: Vec<(Vec<u16>, u64)>,
    shared_strings: HashMap<String, UOffset>,
    force_defaults: bool,
    finished: bool,
}

impl Default for BufferBuilder {
    fn default() -> Self {
        Self::with_capacity(1024)
    }
}

impl BufferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(16);
        BufferBuilder {
            buf: vec![0; capacity],
            head: capacity,
            minalign: 1,
            fields: Vec::new(),
            table_start: None,
            vector_len: None,
            vtables: Vec::new(),
            shared_strings: HashMap::new(),
            force_defaults: false,
            finished: false,
        }
    }

    /* Write scalars even when they equal their default */
    pub fn force_defaults(&mut self, force: bool) {
        self.force_defaults = force;
    }

    pub fn offset(&self) -> u64 {
        (self.buf.len() - self.head) as u64
    }

    /* Written bytes; only a complete buffer after `finish` */
    pub fn data(&self) -> &[u8] {
        &self.buf[self.head..]
    }

    pub fn finished_data(&self) -> ReflectResult<&[u8]> {
        if !self.finished {
            return Err(ReflectError::BuilderState("buffer has not been finished"));
        }
        Ok(self.data())
    }

    /* ========================================================================
       Raw placement
       ======================================================================== */

    fn ensure_space(&mut self, len: usize) {
        if self.head >= len {
            return;
        }
        let used = self.buf.len() - self.head;
        let new_len = (self.buf.len() * 2).max(used + len);
        let mut grown = vec![0u8; new_len];
        grown[new_len - used..].copy_from_slice(&self.buf[self.head..]);
        self.head = new_len - used;
        self.buf = grown;
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.ensure_space(bytes.len());
        self.head -= bytes.len();
        self.buf[self.head..self.head + bytes.len()].copy_from_slice(bytes);
    }

    pub fn pad(&mut self, len: usize) {
        self.ensure_space(len);
        for _ in 0..len {
            self.head -= 1;
            self.buf[self.head] = 0;
        }
    }

    /* Pads so that after writing `additional` bytes the offset is a multiple of `size` */
    pub fn prep(&mut self, size: usize, additional: usize) {
        let size = size.max(1);
        self.minalign = self.minalign.max(size);
        let used = self.offset() as usize + additional;
        let padding = (size - used % size) % size;
        self.pad(padding);
    }

    pub fn push<T: Scalar>(&mut self, value: T) {
        let mut raw = [0u8; 8];
        value.write_le(&mut raw);
        self.push_bytes(&raw[..T::SIZE]);
    }

    /* Aligned scalar write */
    pub fn add<T: Scalar>(&mut self, value: T) {
        self.prep(T::SIZE, 0);
        self.push(value);
    }

    /* Writes a forward reference to an already written object */
    pub fn add_uoffset(&mut self, target: UOffset) -> ReflectResult<()> {
        self.prep(UOFFSET_SIZE, 0);
        if target.0 > self.offset() {
            return Err(ReflectError::BuilderState("reference to an object not yet written"));
        }
        let relative = self.offset() + UOFFSET_SIZE as u64 - target.0;
        self.push(relative);
        Ok(())
    }

    fn assert_not_nested(&self, what: &'static str) -> ReflectResult<()> {
        if self.table_start.is_some() || self.vector_len.is_some() {
            return Err(ReflectError::BuilderState(what));
        }
        Ok(())
    }

    /* ========================================================================
       Tables
       ======================================================================== */

    pub fn start_table(&mut self, num_fields: usize) -> ReflectResult<()> {
        self.assert_not_nested("tables cannot be nested; build children first")?;
        self.fields = vec![0; num_fields];
        self.table_start = Some(self.offset());
        self.finished = false;
        Ok(())
    }

    fn track_field(&mut self, slot: u16) -> ReflectResult<()> {
        if self.table_start.is_none() {
            return Err(ReflectError::BuilderState("field added outside of a table"));
        }
        let slot = slot as usize;
        if slot >= self.fields.len() {
            self.fields.resize(slot + 1, 0);
        }
        self.fields[slot] = self.offset();
        Ok(())
    }

    /* Scalar field; skipped when equal to `default` unless defaults are forced.
     * `None` marks an optional scalar, which is always written. */
    pub fn add_scalar<T: Scalar>(&mut self, slot: u16, value: T, default: Option<T>) -> ReflectResult<()> {
        if !self.force_defaults && default == Some(value) {
            return Ok(());
        }
        self.add(value);
        self.track_field(slot)
    }

    /* Raw little-endian scalar of the given width, used by the reflective packer */
    pub fn add_scalar_bytes(&mut self, slot: u16, bytes: &[u8], default: Option<&[u8]>) -> ReflectResult<()> {
        if !self.force_defaults && default == Some(bytes) {
            return Ok(());
        }
        self.prep(bytes.len(), 0);
        self.push_bytes(bytes);
        self.track_field(slot)
    }

    pub fn add_offset(&mut self, slot: u16, target: UOffset) -> ReflectResult<()> {
        if target.is_null() {
            return Ok(());
        }
        self.add_uoffset(target)?;
        self.track_field(slot)
    }

    /* The struct must be the last thing written */
    pub fn add_struct(&mut self, slot: u16, target: UOffset) -> ReflectResult<()> {
        if target.0 != self.offset() {
            return Err(ReflectError::NotInline {
                slot,
                expected: self.offset(),
                actual: target.0,
            });
        }
        self.track_field(slot)
    }

    pub fn end_table(&mut self) -> ReflectResult<UOffset> {
        let Some(table_start) = self.table_start else {
            return Err(ReflectError::BuilderState("end_table without start_table"));
        };

        self.prep(SOFFSET_SIZE, 0);
        self.push(0i64);
        let object = self.offset();

        while self.fields.last() == Some(&0) {
            self.fields.pop();
        }
        /* vtable entries are 16 bits wide */
        let entry = |value: u64| u16::try_from(value).map_err(|_| ReflectError::BuilderState("table does not fit a 16-bit vtable"));
        let mut vtable = Vec::with_capacity(self.fields.len() + 2);
        vtable.push(entry(((2 + self.fields.len()) * VOFFSET_SIZE) as u64)?);
        vtable.push(entry(object - table_start)?);
        for &position in &self.fields {
            vtable.push(if position == 0 { 0 } else { entry(object - position)? });
        }

        let existing = self.vtables.iter().find(|(entries, _)| *entries == vtable).map(|(_, at)| *at);
        let vtable_at = match existing {
            Some(at) => at,
            None => {
                for &entry in vtable.iter().rev() {
                    self.push(entry);
                }
                let at = self.offset();
                self.vtables.push((vtable, at));
                at
            }
        };

        /* table position minus vtable position */
        let soffset = vtable_at as i64 - object as i64;
        let index = self.buf.len() - object as usize;
        soffset.write_le(&mut self.buf[index..index + SOFFSET_SIZE]);

        self.fields.clear();
        self.table_start = None;
        Ok(UOffset(object))
    }

    /* Fails when the field at `voffset` of a finished table was never written */
    pub fn required(&self, table: UOffset, voffset: u16, table_name: &str, field: &str) -> ReflectResult<()> {
        let data = self.data();
        let missing = || ReflectError::MissingRequired {
            table: table_name.to_string(),
            field: field.to_string(),
        };
        let table_pos = data.len() as i64 - table.0 as i64;
        if table_pos < 0 || table_pos as usize + SOFFSET_SIZE > data.len() {
            return Err(missing());
        }
        let soffset = i64::read_le(&data[table_pos as usize..]);
        let vtable_pos = table_pos - soffset;
        if vtable_pos < 0 || vtable_pos as usize + 2 * VOFFSET_SIZE > data.len() {
            return Err(missing());
        }
        let vtable_pos = vtable_pos as usize;
        let vtable_len = u16::read_le(&data[vtable_pos..]);
        let entry = vtable_pos + voffset as usize;
        if voffset >= vtable_len || entry + VOFFSET_SIZE > data.len() || u16::read_le(&data[entry..]) == 0 {
            return Err(missing());
        }
        Ok(())
    }

    /* ========================================================================
       Vectors and strings
       ======================================================================== */

    pub fn start_vector(&mut self, elem_size: usize, num_elems: usize, alignment: usize) -> ReflectResult<()> {
        self.assert_not_nested("vectors cannot be started inside a table or vector")?;
        let bytes = elem_size * num_elems;
        self.prep(UOFFSET_SIZE, bytes);
        self.prep(alignment, bytes);
        self.vector_len = Some(num_elems as u64);
        Ok(())
    }

    pub fn end_vector(&mut self) -> ReflectResult<UOffset> {
        let Some(len) = self.vector_len.take() else {
            return Err(ReflectError::BuilderState("end_vector without start_vector"));
        };
        self.add(len);
        Ok(UOffset(self.offset()))
    }

    /* Raw element bytes; elements are pushed last to first */
    pub fn push_element_bytes(&mut self, bytes: &[u8]) {
        self.push_bytes(bytes);
    }

    pub fn create_vector<T: Scalar>(&mut self, items: &[T]) -> ReflectResult<UOffset> {
        self.start_vector(T::SIZE, items.len(), T::SIZE)?;
        for &item in items.iter().rev() {
            self.push(item);
        }
        self.end_vector()
    }

    pub fn create_vector_of_offsets(&mut self, items: &[UOffset]) -> ReflectResult<UOffset> {
        self.start_vector(UOFFSET_SIZE, items.len(), UOFFSET_SIZE)?;
        for &item in items.iter().rev() {
            self.add_uoffset(item)?;
        }
        self.end_vector()
    }

    /* u64 length, bytes, NUL terminator */
    pub fn create_string(&mut self, value: &str) -> ReflectResult<UOffset> {
        self.assert_not_nested("strings cannot be created inside a table or vector")?;
        let bytes = value.as_bytes();
        self.prep(UOFFSET_SIZE, bytes.len() + 1);
        self.push(0u8);
        self.push_bytes(bytes);
        self.add(bytes.len() as u64);
        Ok(UOffset(self.offset()))
    }

    /* Deduplicated against every string created through this method */
    pub fn create_shared_string(&mut self, value: &str) -> ReflectResult<UOffset> {
        if let Some(&existing) = self.shared_strings.get(value) {
            return Ok(existing);
        }
        let offset = self.create_string(value)?;
        self.shared_strings.insert(value.to_string(), offset);
        Ok(offset)
    }

    /* Fixed struct image, written in one piece */
    pub fn create_struct(&mut self, alignment: usize, bytes: &[u8]) -> UOffset {
        self.prep(alignment, bytes.len());
        self.push_bytes(bytes);
        UOffset(self.offset())
    }

    /* ========================================================================
       Finishing
       ======================================================================== */

    pub fn finish(&mut self, root: UOffset, file_identifier: Option<&str>, size_prefixed: bool) -> ReflectResult<()> {
        self.assert_not_nested("finish with an open table or vector")?;
        let ident = match file_identifier {
            Some(ident) if ident.len() != FILE_IDENTIFIER_LENGTH => {
                return Err(ReflectError::InvalidIdentifier(ident.to_string()));
            }
            Some(ident) => ident.as_bytes(),
            None => &[],
        };
        let prefix = if size_prefixed { UOFFSET_SIZE } else { 0 };
        let minalign = self.minalign.max(UOFFSET_SIZE);
        self.prep(minalign, UOFFSET_SIZE + ident.len() + prefix);
        self.push_bytes(ident);
        self.add_uoffset(root)?;
        if size_prefixed {
            let size = self.offset();
            self.push(size);
        }
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u64(data: &[u8], at: usize) -> u64 {
        u64::read_le(&data[at..])
    }

    #[test]
    fn test_string_layout() {
        let mut builder = BufferBuilder::new();
        let s = builder.create_string("hi").unwrap();
        let data = builder.data();
        let pos = data.len() - s.0 as usize;
        assert_eq!(read_u64(data, pos), 2);
        assert_eq!(&data[pos + 8..pos + 11], b"hi\0");
        assert_eq!(pos % 8, 0);
    }

    #[test]
    fn test_vtable_trims_trailing_absent_fields_and_is_shared() {
        let mut builder = BufferBuilder::new();
        builder.start_table(4).unwrap();
        builder.add_scalar::<i16>(0, 7, Some(0)).unwrap();
        builder.add_scalar::<i16>(3, 0, Some(0)).unwrap();
        let first = builder.end_table().unwrap();

        /* same table size needs the same starting alignment */
        builder.prep(8, 0);
        builder.start_table(4).unwrap();
        builder.add_scalar::<i16>(0, 9, Some(0)).unwrap();
        let second = builder.end_table().unwrap();

        let data = builder.data();
        let vtable_of = |table: UOffset| {
            let pos = data.len() - table.0 as usize;
            let soffset = i64::read_le(&data[pos..]);
            (pos as i64 - soffset) as usize
        };
        let vt = vtable_of(first);
        assert_eq!(u16::read_le(&data[vt..]), 6);
        assert_eq!(vtable_of(first), vtable_of(second));
    }

    #[test]
    fn test_required_field_check() {
        let mut builder = BufferBuilder::new();
        let name = builder.create_string("orc").unwrap();
        builder.start_table(2).unwrap();
        builder.add_scalar::<i32>(0, 3, Some(0)).unwrap();
        let without = builder.end_table().unwrap();
        assert_eq!(
            builder.required(without, voffset(1), "Monster", "name"),
            Err(ReflectError::MissingRequired {
                table: "Monster".to_string(),
                field: "name".to_string()
            })
        );

        builder.start_table(2).unwrap();
        builder.add_offset(1, name).unwrap();
        let with = builder.end_table().unwrap();
        assert!(builder.required(with, voffset(1), "Monster", "name").is_ok());
    }

    #[test]
    fn test_struct_must_be_inline() {
        let mut builder = BufferBuilder::new();
        let early = builder.create_struct(4, &[1, 0, 0, 0]);
        builder.start_table(2).unwrap();
        builder.add_scalar::<u8>(0, 1, Some(0)).unwrap();
        assert!(matches!(builder.add_struct(1, early), Err(ReflectError::NotInline { .. })));
    }

    #[test]
    fn test_oversized_table_is_rejected() {
        let mut builder = BufferBuilder::new();
        builder.start_table(2).unwrap();
        let blob = builder.create_struct(8, &vec![7u8; 70_000]);
        builder.add_struct(1, blob).unwrap();
        builder.add_scalar::<u32>(0, 1, None).unwrap();
        assert!(matches!(builder.end_table(), Err(ReflectError::BuilderState(_))));
    }

    #[test]
    fn test_nested_table_is_rejected() {
        let mut builder = BufferBuilder::new();
        builder.start_table(1).unwrap();
        assert!(builder.start_table(1).is_err());
        assert!(builder.create_string("x").is_err());
    }

    #[test]
    fn test_finish_places_identifier_after_root() {
        let mut builder = BufferBuilder::with_capacity(16);
        builder.start_table(1).unwrap();
        builder.add_scalar::<u64>(0, 42, Some(0)).unwrap();
        let root = builder.end_table().unwrap();
        builder.finish(root, Some("MONS"), false).unwrap();

        let data = builder.finished_data().unwrap();
        assert_eq!(&data[8..12], b"MONS");
        let table = read_u64(data, 0) as usize;
        assert_eq!(data.len() - table, root.0 as usize);

        assert!(matches!(
            BufferBuilder::new().finish(UOffset(0), Some("TOOLONG"), false),
            Err(ReflectError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_growth_keeps_written_bytes() {
        let mut builder = BufferBuilder::with_capacity(16);
        let items: Vec<u32> = (0..100).collect();
        let v = builder.create_vector(&items).unwrap();
        let data = builder.data();
        let pos = data.len() - v.0 as usize;
        assert_eq!(read_u64(data, pos), 100);
        assert_eq!(u32::read_le(&data[pos + 8 + 4 * 99..]), 99);
    }
}
