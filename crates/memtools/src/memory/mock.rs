//! In-memory stand-in for a target process, used by unit tests.

use std::cell::{Cell, RefCell};

use crate::error::{Error, Result};
use crate::memory::{Address, Bitness, RawMemory};

const ALLOCATION_BASE: u64 = 0x7000_0000;
const PAGE_SIZE: u64 = 0x1000;

#[derive(Debug)]
struct Region {
    base: u64,
    data: Vec<u8>,
}

impl Region {
    fn span(&self, address: u64, len: usize) -> Option<std::ops::Range<usize>> {
        let start = address.checked_sub(self.base)? as usize;
        let end = start.checked_add(len)?;
        (end <= self.data.len()).then_some(start..end)
    }
}

/// Sparse fake address space with call counters and a kill switch.
#[derive(Debug)]
pub struct MockMemory {
    bitness: Bitness,
    regions: RefCell<Vec<Region>>,
    alive: Cell<bool>,
    reads: Cell<usize>,
    writes: Cell<usize>,
    next_allocation: Cell<u64>,
}

impl MockMemory {
    pub fn builder(bitness: Bitness) -> MockMemoryBuilder {
        MockMemoryBuilder {
            bitness,
            regions: Vec::new(),
        }
    }

    /// Number of raw reads served so far
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    /// Number of raw writes served so far
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    pub fn reset_counts(&self) {
        self.reads.set(0);
        self.writes.set(0);
    }

    /// Simulate the target process exiting
    pub fn kill(&self) {
        self.alive.set(false);
    }

    /// Write test fixture bytes without touching the counters
    pub fn poke(&self, address: u64, data: &[u8]) {
        let mut regions = self.regions.borrow_mut();
        let region = regions
            .iter_mut()
            .find_map(|r| r.span(address, data.len()).map(|span| (r, span)));
        match region {
            Some((region, span)) => region.data[span].copy_from_slice(data),
            None => panic!("poke outside mapped memory at {:#x}", address),
        }
    }

    /// Read test fixture bytes without touching the counters
    pub fn peek(&self, address: u64, len: usize) -> Vec<u8> {
        let regions = self.regions.borrow();
        regions
            .iter()
            .find_map(|r| r.span(address, len).map(|span| r.data[span].to_vec()))
            .unwrap_or_else(|| panic!("peek outside mapped memory at {:#x}", address))
    }

    /// Store a pointer-sized little-endian value
    pub fn poke_pointer(&self, address: u64, value: u64) {
        match self.bitness {
            Bitness::X86 => self.poke(address, &(value as u32).to_le_bytes()),
            Bitness::X64 => self.poke(address, &value.to_le_bytes()),
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.alive.get() {
            Ok(())
        } else {
            Err(Error::ProcessUnavailable("mock process has exited".to_string()))
        }
    }
}

impl RawMemory for MockMemory {
    fn read_bytes(&self, address: Address, len: usize) -> Result<Vec<u8>> {
        self.ensure_alive()?;
        self.bitness.check_len(len)?;
        self.reads.set(self.reads.get() + 1);

        let regions = self.regions.borrow();
        regions
            .iter()
            .find_map(|r| r.span(address.as_u64(), len).map(|span| r.data[span].to_vec()))
            .ok_or_else(|| Error::MemoryReadFailed {
                address: address.as_u64(),
                message: format!("{} bytes not mapped", len),
            })
    }

    fn write_bytes(&self, address: Address, data: &[u8]) -> Result<()> {
        self.ensure_alive()?;
        self.bitness.check_len(data.len())?;
        self.writes.set(self.writes.get() + 1);

        let mut regions = self.regions.borrow_mut();
        let target = regions
            .iter_mut()
            .find_map(|r| r.span(address.as_u64(), data.len()).map(|span| (r, span)));
        match target {
            Some((region, span)) => {
                region.data[span].copy_from_slice(data);
                Ok(())
            }
            None => Err(Error::MemoryWriteFailed {
                address: address.as_u64(),
                message: format!("{} bytes not mapped", data.len()),
            }),
        }
    }

    fn allocate(&self, len: usize, preferred: Option<Address>) -> Result<Address> {
        self.ensure_alive()?;
        if len == 0 {
            return Err(Error::AllocationFailed {
                len,
                message: "zero-length allocation".to_string(),
            });
        }

        let base = match preferred {
            Some(addr) if !addr.is_null() => addr.as_u64(),
            _ => self.next_allocation.get(),
        };
        let pages = (len as u64).div_ceil(PAGE_SIZE);
        self.next_allocation
            .set(self.next_allocation.get().max(base + pages * PAGE_SIZE));
        self.regions.borrow_mut().push(Region {
            base,
            data: vec![0; len],
        });
        Ok(Address::new(base))
    }

    fn bitness(&self) -> Bitness {
        self.bitness
    }
}

pub struct MockMemoryBuilder {
    bitness: Bitness,
    regions: Vec<Region>,
}

impl MockMemoryBuilder {
    /// Map `data` at `base`
    pub fn region(mut self, base: u64, data: Vec<u8>) -> Self {
        self.regions.push(Region { base, data });
        self
    }

    /// Map `len` zero bytes at `base`
    pub fn zeroed(self, base: u64, len: usize) -> Self {
        self.region(base, vec![0; len])
    }

    pub fn build(self) -> MockMemory {
        MockMemory {
            bitness: self.bitness,
            regions: RefCell::new(self.regions),
            alive: Cell::new(true),
            reads: Cell::new(0),
            writes: Cell::new(0),
            next_allocation: Cell::new(ALLOCATION_BASE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmapped_read_fails() {
        let mem = MockMemory::builder(Bitness::X64).zeroed(0x1000, 0x10).build();
        assert!(mem.read_bytes(Address::new(0x1000), 0x10).is_ok());
        assert!(matches!(
            mem.read_bytes(Address::new(0x1008), 0x10),
            Err(Error::MemoryReadFailed { address: 0x1008, .. })
        ));
    }

    #[test]
    fn test_killed_process_is_unavailable() {
        let mem = MockMemory::builder(Bitness::X86).zeroed(0x1000, 4).build();
        mem.kill();
        let err = mem.read_bytes(Address::new(0x1000), 4).unwrap_err();
        assert!(err.is_process_gone());
        assert!(mem.write_bytes(Address::new(0x1000), &[1]).unwrap_err().is_process_gone());
        assert!(mem.allocate(16, None).unwrap_err().is_process_gone());
    }

    #[test]
    fn test_allocate_maps_zeroed_memory() {
        let mem = MockMemory::builder(Bitness::X64).build();
        let first = mem.allocate(0x10, None).unwrap();
        let second = mem.allocate(0x2000, None).unwrap();
        assert_eq!(first, Address::new(ALLOCATION_BASE));
        assert_eq!(second, Address::new(ALLOCATION_BASE + PAGE_SIZE));
        assert_eq!(mem.read_bytes(second, 0x2000).unwrap(), vec![0; 0x2000]);

        let fixed = mem.allocate(8, Some(Address::new(0x5000_0000))).unwrap();
        assert_eq!(fixed, Address::new(0x5000_0000));
    }
}
