//! Sparse byte-granular table, allocated in 64-byte lines
use crate::errors::{DetectorError, Result};
use crate::features::shadow_memory::domain::range_end;
use crate::shared::models::Address;
use rustc_hash::FxHashMap;

pub const LINE_BITS: u32 = 6;
pub const LINE_SIZE: usize = 1 << LINE_BITS;
const OFFSET_MASK: Address = (LINE_SIZE as Address) - 1;

type Line<T> = Box<[Option<T>; LINE_SIZE]>;

/// Byte-granular map from address to `T`
///
/// Lines are created on first write and dropped once a clear empties them
/// completely.
#[derive(Debug, Clone)]
pub struct LineTable<T> {
    lines: FxHashMap<Address, Line<T>>,
    /// Maximum number of lines (0 = unlimited)
    max_lines: usize,
    name: &'static str,
}

impl<T: Clone> LineTable<T> {
    pub fn new(name: &'static str, max_lines: usize) -> Self {
        Self {
            lines: FxHashMap::default(),
            max_lines,
            name,
        }
    }

    #[inline]
    fn split(addr: Address) -> (Address, usize) {
        (addr >> LINE_BITS, (addr & OFFSET_MASK) as usize)
    }

    /// Value stored for one byte
    #[inline]
    pub fn get(&self, addr: Address) -> Option<&T> {
        let (line, offset) = Self::split(addr);
        self.lines.get(&line)?[offset].as_ref()
    }

    /// Store `value` for one byte
    pub fn set(&mut self, addr: Address, value: T) -> Result<()> {
        let (line, offset) = Self::split(addr);
        self.line_mut(line)?[offset] = Some(value);
        Ok(())
    }

    /// Store `value` for every byte of `[addr, addr + size)`
    pub fn set_range(&mut self, addr: Address, size: usize, value: &T) -> Result<()> {
        let end = range_end(addr, size);
        let mut cursor = addr;
        while cursor < end {
            let (line, offset) = Self::split(cursor);
            let stop = (offset + (end - cursor).min(LINE_SIZE as Address) as usize).min(LINE_SIZE);
            let slots = self.line_mut(line)?;
            for slot in &mut slots[offset..stop] {
                *slot = Some(value.clone());
            }
            cursor += (stop - offset) as Address;
        }
        Ok(())
    }

    /// Remove every byte of `[addr, addr + size)`
    pub fn clear_range(&mut self, addr: Address, size: usize) {
        let end = range_end(addr, size);
        let mut cursor = addr;
        while cursor < end {
            let (line, offset) = Self::split(cursor);
            let stop = (offset + (end - cursor).min(LINE_SIZE as Address) as usize).min(LINE_SIZE);
            if offset == 0 && stop == LINE_SIZE {
                self.lines.remove(&line);
            } else if let Some(slots) = self.lines.get_mut(&line) {
                for slot in &mut slots[offset..stop] {
                    *slot = None;
                }
                if slots.iter().all(Option::is_none) {
                    self.lines.remove(&line);
                }
            }
            cursor += (stop - offset) as Address;
        }
    }

    /// Number of allocated lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn line_mut(&mut self, line: Address) -> Result<&mut Line<T>> {
        if self.max_lines != 0 && self.lines.len() >= self.max_lines && !self.lines.contains_key(&line)
        {
            return Err(DetectorError::exhausted(self.name, self.max_lines));
        }
        Ok(self
            .lines
            .entry(line)
            .or_insert_with(|| Box::new(std::array::from_fn(|_| None))))
    }
}
