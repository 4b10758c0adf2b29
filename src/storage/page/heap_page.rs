//! Slotted heap page with an occupancy bitmap.
//!
//! Layout of a page of `P` bytes holding tuples of `T` bytes:
//!
//! ```text
//! +----------------------+--------+--------+-----+--------------+
//! | bitmap (ceil(N/8) B) | slot 0 | slot 1 | ... | unused bytes |
//! +----------------------+--------+--------+-----+--------------+
//! ```
//!
//! where `N = floor(P * 8 / (T * 8 + 1))`. Bit `i` of bitmap byte `i / 8`
//! (least significant bit first) is set iff slot `i` holds a tuple. Only the
//! bitmap decides visibility; bytes of empty slots carry no meaning.

use crate::access::schema::Schema;
use crate::access::tuple::{Tuple, TupleId};
use crate::error::{DbError, Result};
use crate::storage::error::StorageError;
use crate::storage::page::PageId;
use crate::transaction::TransactionId;
use bytes::{BufMut, BytesMut};
use std::sync::Arc;

/// Number of tuple slots a page of `page_size` bytes can hold. Each slot
/// costs its tuple bytes plus one header bit.
pub fn slots_per_page(page_size: usize, tuple_size: usize) -> usize {
    (page_size * 8) / (tuple_size * 8 + 1)
}

/// Bytes of occupancy bitmap needed for `num_slots` slots.
pub fn header_size(num_slots: usize) -> usize {
    num_slots.div_ceil(8)
}

#[derive(Debug, Clone)]
pub struct HeapPage {
    page_id: PageId,
    schema: Arc<Schema>,
    page_size: usize,
    header: Vec<u8>,
    slots: Vec<Option<Tuple>>,
    dirtied_by: Option<TransactionId>,
}

impl HeapPage {
    /// A page with every slot free.
    pub fn empty(page_id: PageId, schema: Arc<Schema>, page_size: usize) -> Self {
        let num_slots = slots_per_page(page_size, schema.byte_size());
        Self {
            page_id,
            schema,
            page_size,
            header: vec![0; header_size(num_slots)],
            slots: vec![None; num_slots],
            dirtied_by: None,
        }
    }

    /// Raw bytes of a page with no occupied slots.
    pub fn empty_page_data(page_size: usize) -> Vec<u8> {
        vec![0; page_size]
    }

    /// Decodes a page. The page size is the length of `data`.
    pub fn decode(page_id: PageId, schema: Arc<Schema>, data: &[u8]) -> Result<Self> {
        let mut page = Self::empty(page_id, schema, data.len());
        let tuple_size = page.schema.byte_size();
        let header_len = page.header.len();
        page.header.copy_from_slice(&data[..header_len]);

        for slot in 0..page.slots.len() {
            if !page.is_slot_used(slot) {
                continue;
            }
            let offset = header_len + slot * tuple_size;
            let mut tuple =
                Tuple::read_from(page.schema.clone(), &data[offset..offset + tuple_size])?;
            tuple.set_tuple_id(Some(TupleId::new(page_id, slot as u16)));
            page.slots[slot] = Some(tuple);
        }

        Ok(page)
    }

    /// Encodes the page into exactly `page_size` bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let tuple_size = self.schema.byte_size();
        let mut out = BytesMut::with_capacity(self.page_size);
        out.put_slice(&self.header);

        let mut slot_bytes = Vec::with_capacity(tuple_size);
        for slot in &self.slots {
            match slot {
                Some(tuple) => {
                    slot_bytes.clear();
                    tuple.write_to(&mut slot_bytes)?;
                    out.put_slice(&slot_bytes);
                }
                None => out.put_bytes(0, tuple_size),
            }
        }

        if out.len() > self.page_size {
            return Err(StorageError::InvalidBufferSize {
                expected: self.page_size,
                actual: out.len(),
            }
            .into());
        }
        out.resize(self.page_size, 0);
        Ok(out.to_vec())
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn header_size(&self) -> usize {
        self.header.len()
    }

    pub fn num_empty_slots(&self) -> usize {
        (0..self.slots.len())
            .filter(|&slot| !self.is_slot_used(slot))
            .count()
    }

    pub fn is_slot_used(&self, slot: usize) -> bool {
        slot < self.slots.len() && (self.header[slot / 8] >> (slot % 8)) & 1 == 1
    }

    fn set_slot_used(&mut self, slot: usize, used: bool) {
        let mask = 1u8 << (slot % 8);
        if used {
            self.header[slot / 8] |= mask;
        } else {
            self.header[slot / 8] &= !mask;
        }
    }

    /// Places `tuple` in the lowest free slot and stamps its location.
    pub fn insert_tuple(&mut self, tuple: &mut Tuple) -> Result<TupleId> {
        if **tuple.schema() != *self.schema {
            return Err(DbError::SchemaMismatch {
                expected: self.schema.to_string(),
                actual: tuple.schema().to_string(),
            });
        }
        if let Some(existing) = tuple.tuple_id() {
            if existing.page_id != self.page_id {
                return Err(DbError::TupleNotOnThisPage(self.page_id));
            }
        }

        let slot = (0..self.slots.len())
            .find(|&slot| !self.is_slot_used(slot))
            .ok_or(DbError::PageFull(self.page_id))?;

        let tuple_id = TupleId::new(self.page_id, slot as u16);
        tuple.set_tuple_id(Some(tuple_id));
        self.set_slot_used(slot, true);
        self.slots[slot] = Some(tuple.clone());

        Ok(tuple_id)
    }

    /// Frees the slot `tuple` was read from.
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> Result<()> {
        let tuple_id = tuple
            .tuple_id()
            .filter(|tid| tid.page_id == self.page_id)
            .ok_or(DbError::TupleNotOnThisPage(self.page_id))?;

        let slot = tuple_id.slot_id as usize;
        if !self.is_slot_used(slot) {
            return Err(DbError::TupleNotOnThisPage(self.page_id));
        }

        self.set_slot_used(slot, false);
        self.slots[slot] = None;
        Ok(())
    }

    pub fn tuple(&self, slot: usize) -> Option<&Tuple> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Occupied tuples in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.slots.iter().flatten()
    }

    /// Records whether the page holds changes not yet written to its file,
    /// and by which transaction.
    pub fn mark_dirty(&mut self, dirty: bool, tid: TransactionId) {
        self.dirtied_by = if dirty { Some(tid) } else { None };
    }

    pub fn dirtied_by(&self) -> Option<TransactionId> {
        self.dirtied_by
    }

    pub fn is_dirty(&self) -> bool {
        self.dirtied_by.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::field::{DataType, Field};
    use crate::catalog::TableId;

    const PAGE_SIZE: usize = 4096;

    fn int_schema(columns: usize) -> Arc<Schema> {
        Arc::new(Schema::from_types(vec![DataType::Int32; columns]))
    }

    fn page_id(n: u32) -> PageId {
        PageId::new(TableId(42), n)
    }

    fn row(schema: &Arc<Schema>, values: &[i32]) -> Tuple {
        let fields = values.iter().map(|&v| Field::Int32(v)).collect();
        Tuple::with_fields(schema.clone(), fields).unwrap()
    }

    #[test]
    fn test_capacity_formula() {
        let cases = [
            // (page size, tuple size, expected slots)
            (4096, 8, 504),
            (4096, 4, 992),
            (4096, 132, 31),
            (20, 8, 2),
            (24, 8, 2),
            (17, 8, 2),
            (16, 8, 1),
            (8, 8, 0),
            (4, 8, 0),
            (0, 8, 0),
            (1, 0, 8),
        ];
        for (page_size, tuple_size, expected) in cases {
            assert_eq!(
                slots_per_page(page_size, tuple_size),
                expected,
                "page {} tuple {}",
                page_size,
                tuple_size
            );
            assert_eq!(
                slots_per_page(page_size, tuple_size),
                (page_size * 8) / (tuple_size * 8 + 1)
            );
        }
    }

    #[test]
    fn test_header_size_rounds_up() {
        assert_eq!(header_size(0), 0);
        assert_eq!(header_size(1), 1);
        assert_eq!(header_size(8), 1);
        assert_eq!(header_size(9), 2);
        assert_eq!(header_size(504), 63);
        assert_eq!(header_size(30), 4);
    }

    #[test]
    fn test_empty_page() {
        let page = HeapPage::empty(page_id(0), int_schema(2), PAGE_SIZE);
        assert_eq!(page.num_slots(), 504);
        assert_eq!(page.header_size(), 63);
        assert_eq!(page.num_empty_slots(), 504);
        assert_eq!(page.iter().count(), 0);
        assert!(!page.is_dirty());
    }

    #[test]
    fn test_insert_uses_lowest_free_slot() -> anyhow::Result<()> {
        let schema = int_schema(2);
        let mut page = HeapPage::empty(page_id(3), schema.clone(), PAGE_SIZE);

        let mut t0 = row(&schema, &[1, 10]);
        let mut t1 = row(&schema, &[2, 20]);
        assert_eq!(page.insert_tuple(&mut t0)?, TupleId::new(page_id(3), 0));
        assert_eq!(page.insert_tuple(&mut t1)?, TupleId::new(page_id(3), 1));
        assert_eq!(t1.tuple_id(), Some(TupleId::new(page_id(3), 1)));

        page.delete_tuple(&t0)?;
        let mut t2 = row(&schema, &[3, 30]);
        assert_eq!(page.insert_tuple(&mut t2)?, TupleId::new(page_id(3), 0));
        assert_eq!(page.num_empty_slots(), 502);
        Ok(())
    }

    #[test]
    fn test_insert_into_full_page() -> anyhow::Result<()> {
        let schema = int_schema(2);
        let mut page = HeapPage::empty(page_id(0), schema.clone(), 20);
        page.insert_tuple(&mut row(&schema, &[1, 1]))?;
        page.insert_tuple(&mut row(&schema, &[2, 2]))?;

        let result = page.insert_tuple(&mut row(&schema, &[3, 3]));
        assert!(matches!(result, Err(DbError::PageFull(id)) if id == page_id(0)));
        Ok(())
    }

    #[test]
    fn test_insert_schema_mismatch() {
        let mut page = HeapPage::empty(page_id(0), int_schema(2), PAGE_SIZE);
        let other = int_schema(3);
        let result = page.insert_tuple(&mut row(&other, &[1, 2, 3]));
        assert!(matches!(result, Err(DbError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_insert_tuple_from_another_page() -> anyhow::Result<()> {
        let schema = int_schema(1);
        let mut source = HeapPage::empty(page_id(0), schema.clone(), PAGE_SIZE);
        let mut target = HeapPage::empty(page_id(1), schema.clone(), PAGE_SIZE);

        let mut tuple = row(&schema, &[5]);
        source.insert_tuple(&mut tuple)?;
        let result = target.insert_tuple(&mut tuple);
        assert!(matches!(result, Err(DbError::TupleNotOnThisPage(_))));
        Ok(())
    }

    #[test]
    fn test_delete_errors() -> anyhow::Result<()> {
        let schema = int_schema(1);
        let mut page = HeapPage::empty(page_id(0), schema.clone(), PAGE_SIZE);
        let mut other = HeapPage::empty(page_id(1), schema.clone(), PAGE_SIZE);

        // never placed
        let loose = row(&schema, &[1]);
        assert!(matches!(
            page.delete_tuple(&loose),
            Err(DbError::TupleNotOnThisPage(_))
        ));

        // placed on a different page
        let mut elsewhere = row(&schema, &[2]);
        other.insert_tuple(&mut elsewhere)?;
        assert!(page.delete_tuple(&elsewhere).is_err());

        // already deleted
        let mut tuple = row(&schema, &[3]);
        page.insert_tuple(&mut tuple)?;
        page.delete_tuple(&tuple)?;
        assert!(matches!(
            page.delete_tuple(&tuple),
            Err(DbError::TupleNotOnThisPage(_))
        ));
        Ok(())
    }

    #[test]
    fn test_round_trip_preserves_occupancy_and_bytes() -> anyhow::Result<()> {
        let schema = Arc::new(Schema::from_types([DataType::Int32, DataType::Varchar(6)]));
        let mut page = HeapPage::empty(page_id(7), schema.clone(), 512);

        let mut placed = Vec::new();
        for i in 0..12 {
            let mut tuple = Tuple::with_fields(
                schema.clone(),
                vec![Field::Int32(i), Field::String(format!("r{}", i))],
            )?;
            page.insert_tuple(&mut tuple)?;
            placed.push(tuple);
        }
        // punch holes: slots 0, 3, 4, 11
        for slot in [0, 3, 4, 11] {
            page.delete_tuple(&placed[slot])?;
        }

        let bytes = page.encode()?;
        assert_eq!(bytes.len(), 512);

        let decoded = HeapPage::decode(page_id(7), schema.clone(), &bytes)?;
        let used: Vec<usize> = (0..decoded.num_slots())
            .filter(|&s| decoded.is_slot_used(s))
            .collect();
        assert_eq!(used, vec![1, 2, 5, 6, 7, 8, 9, 10]);

        let original: Vec<&Tuple> = page.iter().collect();
        let restored: Vec<&Tuple> = decoded.iter().collect();
        assert_eq!(original, restored);
        for tuple in decoded.iter() {
            assert_eq!(tuple.tuple_id().map(|t| t.page_id), Some(page_id(7)));
        }
        assert_eq!(decoded.encode()?, bytes);
        Ok(())
    }

    #[test]
    fn test_random_occupancy_survives_round_trip() -> anyhow::Result<()> {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        let schema = int_schema(2);
        for _ in 0..50 {
            let page_size = rng.gen_range(9..300);
            let mut page = HeapPage::empty(page_id(3), schema.clone(), page_size);

            let mut placed = Vec::new();
            for i in 0..page.num_slots() as i32 {
                let mut tuple = row(&schema, &[i, rng.gen()]);
                page.insert_tuple(&mut tuple)?;
                placed.push(tuple);
            }
            let mut expected = Vec::new();
            for (slot, tuple) in placed.iter().enumerate() {
                if rng.gen_bool(0.5) {
                    page.delete_tuple(tuple)?;
                } else {
                    expected.push(slot);
                }
            }

            let bytes = page.encode()?;
            assert_eq!(bytes.len(), page_size);
            let decoded = HeapPage::decode(page_id(3), schema.clone(), &bytes)?;
            let used: Vec<usize> = (0..decoded.num_slots())
                .filter(|&s| decoded.is_slot_used(s))
                .collect();
            assert_eq!(used, expected);
            assert_eq!(
                decoded.iter().collect::<Vec<_>>(),
                page.iter().collect::<Vec<_>>()
            );
            assert_eq!(decoded.encode()?, bytes);
        }
        Ok(())
    }

    #[test]
    fn test_bitmap_is_lsb_first() -> anyhow::Result<()> {
        let schema = int_schema(1);
        let mut page = HeapPage::empty(page_id(0), schema.clone(), 64);
        let mut tuples = Vec::new();
        for i in 0..10 {
            let mut t = row(&schema, &[i]);
            page.insert_tuple(&mut t)?;
            tuples.push(t);
        }
        for slot in [1, 2, 3, 4, 5, 6, 7] {
            page.delete_tuple(&tuples[slot])?;
        }

        let bytes = page.encode()?;
        // slots 0, 8 and 9 remain
        assert_eq!(bytes[0], 0b0000_0001);
        assert_eq!(bytes[1], 0b0000_0011);
        // slot 8's int starts after the 2 header bytes and 8 earlier slots
        let offset = page.header_size() + 8 * 4;
        assert_eq!(&bytes[offset..offset + 4], &[0, 0, 0, 8]);
        Ok(())
    }

    #[test]
    fn test_decode_ignores_bytes_of_empty_slots() -> anyhow::Result<()> {
        let schema = int_schema(1);
        let mut data = vec![0xEE; 64];
        // only slot 1 occupied
        data[0] = 0b0000_0010;
        data[1] = 0;
        let header = header_size(slots_per_page(64, 4));
        data[header + 4..header + 8].copy_from_slice(&[0, 0, 0, 42]);

        let page = HeapPage::decode(page_id(0), schema, &data)?;
        let values: Vec<String> = page.iter().map(|t| t.to_string()).collect();
        assert_eq!(values, vec!["42"]);
        assert_eq!(page.tuple(1).and_then(|t| t.tuple_id()).map(|t| t.slot_id), Some(1));
        Ok(())
    }

    #[test]
    fn test_dirty_flag() {
        let mut page = HeapPage::empty(page_id(0), int_schema(1), PAGE_SIZE);
        let tid = TransactionId::new(9);
        page.mark_dirty(true, tid);
        assert_eq!(page.dirtied_by(), Some(tid));
        page.mark_dirty(false, tid);
        assert!(!page.is_dirty());
    }
}
