use crate::error::{Error, Result};

use super::ProcessHandle;
use super::region::{QueryRegions, RegionInfo};

/// Raw access to a foreign address space.
///
/// Implementors only need `read_bytes`; the typed reads decode little-endian
/// values on top of it. Every call is independent and may fail on its own.
pub trait ReadMemory {
    /// Read exactly `size` bytes starting at `address`
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    fn read_u8(&self, address: u64) -> Result<u8> {
        read_array::<Self, 1>(self, address).map(|b| b[0])
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        read_array::<Self, 4>(self, address).map(i32::from_le_bytes)
    }

    fn read_i64(&self, address: u64) -> Result<i64> {
        read_array::<Self, 8>(self, address).map(i64::from_le_bytes)
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        read_array::<Self, 8>(self, address).map(u64::from_le_bytes)
    }
}

fn read_array<R: ReadMemory + ?Sized, const N: usize>(reader: &R, address: u64) -> Result<[u8; N]> {
    let bytes = reader.read_bytes(address, N)?;
    bytes.as_slice().try_into().map_err(|_| {
        Error::read_failed(
            address,
            format!("expected {} bytes, got {}", N, bytes.len()),
        )
    })
}

impl<R: ReadMemory + ?Sized> ReadMemory for &R {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }
}

/// Reader backed by a live process handle
pub struct MemoryReader<'a> {
    process: &'a ProcessHandle,
}

impl<'a> MemoryReader<'a> {
    pub fn new(process: &'a ProcessHandle) -> Self {
        Self { process }
    }

    pub fn process(&self) -> &ProcessHandle {
        self.process
    }
}

#[cfg(target_os = "windows")]
impl ReadMemory for MemoryReader<'_> {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        use std::ffi::c_void;
        use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;

        if size == 0 {
            return Ok(Vec::new());
        }

        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0usize;
        // SAFETY: the handle stays open for the lifetime of `self.process`, and
        // the destination buffer is exactly `size` bytes long.
        unsafe {
            ReadProcessMemory(
                self.process.raw(),
                address as *const c_void,
                buffer.as_mut_ptr().cast(),
                size,
                Some(&mut bytes_read),
            )
        }
        .map_err(|e| Error::read_failed(address, e.to_string()))?;

        if bytes_read != size {
            return Err(Error::read_failed(
                address,
                format!("short read ({} of {} bytes)", bytes_read, size),
            ));
        }
        Ok(buffer)
    }
}

#[cfg(not(target_os = "windows"))]
impl ReadMemory for MemoryReader<'_> {
    fn read_bytes(&self, address: u64, _size: usize) -> Result<Vec<u8>> {
        Err(Error::read_failed(
            address,
            "process memory access is only supported on Windows",
        ))
    }
}

#[cfg(target_os = "windows")]
impl QueryRegions for MemoryReader<'_> {
    fn query_region(&self, address: u64) -> Option<RegionInfo> {
        use std::ffi::c_void;
        use windows::Win32::System::Memory::{MEMORY_BASIC_INFORMATION, VirtualQueryEx};

        let mut mbi = MEMORY_BASIC_INFORMATION::default();
        // SAFETY: `mbi` is a properly sized, writable MEMORY_BASIC_INFORMATION.
        let written = unsafe {
            VirtualQueryEx(
                self.process.raw(),
                Some(address as *const c_void),
                &mut mbi,
                std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
            )
        };
        if written == 0 {
            return None;
        }

        Some(RegionInfo {
            base: mbi.BaseAddress as u64,
            size: mbi.RegionSize as u64,
            state: mbi.State.0,
            protect: mbi.Protect.0,
            kind: mbi.Type.0,
        })
    }
}

#[cfg(not(target_os = "windows"))]
impl QueryRegions for MemoryReader<'_> {
    fn query_region(&self, _address: u64) -> Option<RegionInfo> {
        None
    }
}
