//! Symbol dictionaries: replace recurring fixed-size coefficient groups by a
//! 16-bit index into a table kept beside the stream.
//!
//! The table is an ordinary value owned by the caller and filled as blocks
//! are encoded. The same instance (or one read back with
//! [`SymbolDictionary::read_from`]) has to be handed to the decoding side; an
//! index the table never assigned is a corrupt stream.

use crate::utils::error::{CodecError, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::hash::Hash;
use std::io::{Read, Write};

/// Keys that can be stored in a serialized dictionary.
pub trait DictionaryKey: Copy + Eq + Hash {
    fn write_key<W: Write>(&self, out: &mut W) -> Result<()>;
    fn read_key<R: Read>(input: &mut R) -> Result<Self>;
}

/// A pair of quantized DC values.
impl DictionaryKey for [i16; 2] {
    fn write_key<W: Write>(&self, out: &mut W) -> Result<()> {
        for v in self {
            out.write_i16::<BigEndian>(*v)?;
        }
        Ok(())
    }

    fn read_key<R: Read>(input: &mut R) -> Result<Self> {
        Ok([input.read_i16::<BigEndian>()?, input.read_i16::<BigEndian>()?])
    }
}

#[derive(Debug, Clone)]
pub struct SymbolDictionary<K: DictionaryKey> {
    key_index: HashMap<K, u16>,
    index_key: HashMap<u16, K>,
    next_index: u32,
}

/// Table of row-DC pairs used by dictionary-coded Hadamard blocks.
pub type DcDictionary = SymbolDictionary<[i16; 2]>;

impl<K: DictionaryKey> Default for SymbolDictionary<K> {
    fn default() -> Self {
        Self {
            key_index: HashMap::new(),
            index_key: HashMap::new(),
            next_index: 0,
        }
    }
}

impl<K: DictionaryKey> SymbolDictionary<K> {
    /// Number of distinct indices a dictionary can hand out.
    pub const CAPACITY: usize = u16::MAX as usize;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_key.is_empty()
    }

    /// Whether `additional` more new keys would still fit.
    pub fn has_capacity(&self, additional: usize) -> bool {
        self.next_index as usize + additional <= Self::CAPACITY
    }

    /// Index of `key`, assigning the next free one on first sight.
    pub fn add(&mut self, key: K) -> Result<u16> {
        if let Some(&idx) = self.key_index.get(&key) {
            return Ok(idx);
        }
        if !self.has_capacity(1) {
            return Err(CodecError::config(format!(
                "symbol dictionary is full ({} entries)",
                Self::CAPACITY
            )));
        }
        let idx = self.next_index as u16;
        self.next_index += 1;
        self.key_index.insert(key, idx);
        self.index_key.insert(idx, key);
        Ok(idx)
    }

    pub fn get(&self, index: u16) -> Result<K> {
        self.index_key
            .get(&index)
            .copied()
            .ok_or_else(|| CodecError::corrupt(format!("dictionary index {} was never assigned", index)))
    }

    /// Serializes as `u16 count` followed by `(key, u16 index)` entries in
    /// index order.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_u16::<BigEndian>(self.len() as u16)?;
        let mut indices: Vec<u16> = self.index_key.keys().copied().collect();
        indices.sort_unstable();
        for idx in indices {
            self.index_key[&idx].write_key(out)?;
            out.write_u16::<BigEndian>(idx)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(input: &mut R) -> Result<Self> {
        let count = input.read_u16::<BigEndian>()?;
        let mut dict = Self::new();
        for _ in 0..count {
            let key = K::read_key(input)?;
            let idx = input.read_u16::<BigEndian>()?;
            if dict.index_key.insert(idx, key).is_some() {
                return Err(CodecError::corrupt(format!("dictionary index {} listed twice", idx)));
            }
            dict.key_index.insert(key, idx);
            dict.next_index = dict.next_index.max(idx as u32 + 1);
        }
        Ok(dict)
    }
}

/// Replaces each group by its dictionary index.
pub fn encode_symbols<K: DictionaryKey>(dict: &mut SymbolDictionary<K>, groups: &[K]) -> Result<Vec<u16>> {
    groups.iter().map(|&g| dict.add(g)).collect()
}

pub fn decode_symbols<K: DictionaryKey>(dict: &SymbolDictionary<K>, indices: &[u16]) -> Result<Vec<K>> {
    indices.iter().map(|&i| dict.get(i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn repeated_keys_share_an_index() {
        let mut dict = SymbolDictionary::<[i16; 2]>::new();
        assert_eq!(dict.add([1, 2]).unwrap(), 0);
        assert_eq!(dict.add([3, 4]).unwrap(), 1);
        assert_eq!(dict.add([1, 2]).unwrap(), 0);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get(1).unwrap(), [3, 4]);
    }

    #[test]
    fn unknown_index_is_corrupt() {
        let dict = DcDictionary::new();
        assert!(matches!(dict.get(7), Err(CodecError::Corrupt(_))));
    }

    #[test]
    fn separate_tables_do_not_match() {
        // Two independently built tables agree only by accident; decoding must
        // use the table the encoder filled.
        let mut enc = DcDictionary::new();
        let groups = [[12, -3], [0, 0], [12, -3]];
        let indices = encode_symbols(&mut enc, &groups).unwrap();
        assert_eq!(indices, vec![0, 1, 0]);

        let fresh = DcDictionary::new();
        assert!(decode_symbols(&fresh, &indices).is_err());
        assert_eq!(decode_symbols(&enc, &indices).unwrap(), groups.to_vec());
    }

    #[test]
    fn serialization_round_trip() {
        let mut dict = SymbolDictionary::<[i16; 2]>::new();
        for k in [[-5i16, 7], [0, 0], [300, -300]] {
            dict.add(k).unwrap();
        }
        let mut buf = Vec::new();
        dict.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), 2 + 3 * 6);

        let mut back = SymbolDictionary::<[i16; 2]>::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(back.get(2).unwrap(), [300, -300]);
        // new keys continue after the highest stored index
        assert_eq!(back.add([9, 9]).unwrap(), 3);
    }

    #[test]
    fn truncated_dictionary_is_exhaustion() {
        let mut dict = DcDictionary::new();
        dict.add([1, 1]).unwrap();
        let mut buf = Vec::new();
        dict.write_to(&mut buf).unwrap();
        buf.truncate(buf.len() - 1);
        let err = DcDictionary::read_from(&mut Cursor::new(&buf)).unwrap_err();
        assert!(err.is_exhaustion());
    }

    #[test]
    fn capacity_is_enforced() {
        let mut dict = SymbolDictionary::<[i16; 2]>::new();
        for i in 0..SymbolDictionary::<[i16; 2]>::CAPACITY {
            dict.add([(i / 256) as i16, (i % 256) as i16]).unwrap();
        }
        assert!(!dict.has_capacity(1));
        assert!(matches!(dict.add([-1, -1]), Err(CodecError::InvalidConfig(_))));
        // existing keys still resolve
        assert_eq!(dict.add([0, 5]).unwrap(), 5);
    }
}
