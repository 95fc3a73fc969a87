//! Live process access.
//!
//! `ProcessHandle` is the production `RawMemory` implementation. It is only functional on
//! Windows; on other platforms `open` reports the process as unavailable.

use crate::error::{Error, Result};
use crate::memory::{Address, Bitness, RawMemory};

/// An open handle to a target process.
///
/// The handle is closed on `close()` or drop. Every read, write and allocation first checks
/// that the handle is still open and that the process has not exited.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    bitness: Bitness,
    #[cfg(target_os = "windows")]
    handle: Option<windows::Win32::Foundation::HANDLE>,
}

impl ProcessHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }
}

#[cfg(target_os = "windows")]
mod imp {
    use std::ffi::c_void;

    use tracing::{debug, info};
    use windows::Win32::Foundation::{
        BOOL, CloseHandle, ERROR_PARTIAL_COPY, HANDLE, STILL_ACTIVE,
    };
    use windows::Win32::System::Diagnostics::Debug::{ReadProcessMemory, WriteProcessMemory};
    use windows::Win32::System::Memory::{
        MEM_COMMIT, MEM_RESERVE, PAGE_EXECUTE_READWRITE, VirtualAllocEx,
    };
    use windows::Win32::System::Threading::{
        GetCurrentProcess, GetExitCodeProcess, IsWow64Process, OpenProcess, PROCESS_ALL_ACCESS,
    };

    use super::*;

    // SAFETY: a process HANDLE is a kernel object reference that may be used from any thread.
    unsafe impl Send for ProcessHandle {}
    // SAFETY: every operation on the handle is a synchronous kernel call; no interior state.
    unsafe impl Sync for ProcessHandle {}

    fn is_wow64(handle: HANDLE) -> windows::core::Result<bool> {
        let mut emulated = BOOL::default();
        // SAFETY: `handle` is a valid process handle and `emulated` outlives the call.
        unsafe { IsWow64Process(handle, &mut emulated)? };
        Ok(emulated.as_bool())
    }

    /// Work out the target's width. A target that is not emulated is native to the OS, and
    /// the OS is 64-bit when this process is 64-bit or is itself running under WOW64.
    fn detect_bitness(handle: HANDLE) -> windows::core::Result<Bitness> {
        if is_wow64(handle)? {
            return Ok(Bitness::X86);
        }
        let host_is_64 = cfg!(target_pointer_width = "64");
        // SAFETY: GetCurrentProcess returns a pseudo handle that never needs closing.
        let os_is_64 = host_is_64 || is_wow64(unsafe { GetCurrentProcess() })?;
        Ok(Bitness::from_is_64_bit(os_is_64))
    }

    impl ProcessHandle {
        /// Open a process by id with full access and probe its bitness.
        ///
        /// Attaching a 64-bit target from a 32-bit build fails with `BitnessMismatch`; the
        /// handle is closed before the error is returned.
        pub fn open(pid: u32) -> Result<Self> {
            // SAFETY: OpenProcess has no memory-safety preconditions.
            let handle = unsafe { OpenProcess(PROCESS_ALL_ACCESS, false, pid) }
                .map_err(|e| Error::ProcessUnavailable(format!("OpenProcess({pid}): {e}")))?;

            // Construct first so Drop closes the handle on every early return below.
            let mut process = Self {
                pid,
                bitness: Bitness::X86,
                handle: Some(handle),
            };

            process.bitness = detect_bitness(handle)
                .map_err(|e| Error::ProcessUnavailable(format!("IsWow64Process({pid}): {e}")))?;

            if process.bitness.is_64_bit() && cfg!(target_pointer_width = "32") {
                process.close()?;
                return Err(Error::BitnessMismatch);
            }

            info!("Attached to process {} ({})", pid, process.bitness);
            Ok(process)
        }

        /// Whether the handle is open and the process is still running
        pub fn is_alive(&self) -> bool {
            let Some(handle) = self.handle else {
                return false;
            };
            let mut code = 0u32;
            // SAFETY: `handle` is open and `code` outlives the call.
            match unsafe { GetExitCodeProcess(handle, &mut code) } {
                Ok(()) => code == STILL_ACTIVE.0 as u32,
                Err(_) => false,
            }
        }

        /// Close the handle. Subsequent calls are no-ops.
        pub fn close(&mut self) -> Result<()> {
            if let Some(handle) = self.handle.take() {
                debug!("Closing handle to process {}", self.pid);
                // SAFETY: the handle came from OpenProcess and is closed exactly once.
                unsafe { CloseHandle(handle) }
                    .map_err(|e| Error::ProcessUnavailable(format!("CloseHandle: {e}")))?;
            }
            Ok(())
        }

        fn live_handle(&self) -> Result<HANDLE> {
            match self.handle {
                Some(handle) if self.is_alive() => Ok(handle),
                Some(_) => Err(Error::ProcessUnavailable(format!(
                    "process {} has exited",
                    self.pid
                ))),
                None => Err(Error::ProcessUnavailable(format!(
                    "handle to process {} is closed",
                    self.pid
                ))),
            }
        }
    }

    impl RawMemory for ProcessHandle {
        fn read_bytes(&self, address: Address, len: usize) -> Result<Vec<u8>> {
            let handle = self.live_handle()?;
            self.bitness.check_len(len)?;

            let mut buffer = vec![0u8; len];
            let mut copied = 0usize;
            // SAFETY: `buffer` holds `len` writable bytes; the remote address is only
            // dereferenced by the kernel.
            let result = unsafe {
                ReadProcessMemory(
                    handle,
                    address.as_u64() as usize as *const c_void,
                    buffer.as_mut_ptr().cast(),
                    len,
                    Some(&mut copied as *mut usize),
                )
            };

            match result {
                Ok(()) if copied == len => Ok(buffer),
                Ok(()) => Err(Error::PartialCopy {
                    address: address.as_u64(),
                    requested: len,
                    copied,
                }),
                Err(e) if e.code() == ERROR_PARTIAL_COPY.to_hresult() => Err(Error::PartialCopy {
                    address: address.as_u64(),
                    requested: len,
                    copied,
                }),
                Err(e) => Err(Error::MemoryReadFailed {
                    address: address.as_u64(),
                    message: e.to_string(),
                }),
            }
        }

        fn write_bytes(&self, address: Address, data: &[u8]) -> Result<()> {
            let handle = self.live_handle()?;
            self.bitness.check_len(data.len())?;

            let mut copied = 0usize;
            // SAFETY: `data` is readable for its full length for the duration of the call.
            let result = unsafe {
                WriteProcessMemory(
                    handle,
                    address.as_u64() as usize as *const c_void,
                    data.as_ptr().cast(),
                    data.len(),
                    Some(&mut copied as *mut usize),
                )
            };

            match result {
                Ok(()) if copied == data.len() => Ok(()),
                Ok(()) => Err(Error::PartialCopy {
                    address: address.as_u64(),
                    requested: data.len(),
                    copied,
                }),
                Err(e) if e.code() == ERROR_PARTIAL_COPY.to_hresult() => Err(Error::PartialCopy {
                    address: address.as_u64(),
                    requested: data.len(),
                    copied,
                }),
                Err(e) => Err(Error::MemoryWriteFailed {
                    address: address.as_u64(),
                    message: e.to_string(),
                }),
            }
        }

        fn allocate(&self, len: usize, preferred: Option<Address>) -> Result<Address> {
            let handle = self.live_handle()?;
            let preferred = preferred
                .filter(|addr| !addr.is_null())
                .map(|addr| addr.as_u64() as usize as *const c_void);

            // SAFETY: VirtualAllocEx only touches the remote address space.
            let base = unsafe {
                VirtualAllocEx(
                    handle,
                    preferred,
                    len,
                    MEM_COMMIT | MEM_RESERVE,
                    PAGE_EXECUTE_READWRITE,
                )
            };

            if base.is_null() {
                return Err(Error::AllocationFailed {
                    len,
                    message: windows::core::Error::from_win32().to_string(),
                });
            }

            let address = Address::new(base as usize as u64);
            debug!("Allocated {} bytes at {} in process {}", len, address, self.pid);
            Ok(address)
        }

        fn bitness(&self) -> Bitness {
            self.bitness
        }
    }

    impl Drop for ProcessHandle {
        fn drop(&mut self) {
            if let Err(e) = self.close() {
                tracing::warn!("Failed to close process handle: {}", e);
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
impl ProcessHandle {
    pub fn open(pid: u32) -> Result<Self> {
        Err(Error::ProcessUnavailable(format!(
            "cannot open process {pid}: process access is only supported on Windows"
        )))
    }

    pub fn is_alive(&self) -> bool {
        false
    }

    pub fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(not(target_os = "windows"))]
impl RawMemory for ProcessHandle {
    fn read_bytes(&self, _address: Address, _len: usize) -> Result<Vec<u8>> {
        Err(Error::ProcessUnavailable(format!("process {} is not attached", self.pid)))
    }

    fn write_bytes(&self, _address: Address, _data: &[u8]) -> Result<()> {
        Err(Error::ProcessUnavailable(format!("process {} is not attached", self.pid)))
    }

    fn allocate(&self, _len: usize, _preferred: Option<Address>) -> Result<Address> {
        Err(Error::ProcessUnavailable(format!("process {} is not attached", self.pid)))
    }

    fn bitness(&self) -> Bitness {
        self.bitness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_open_is_unavailable_off_windows() {
        let err = ProcessHandle::open(std::process::id()).unwrap_err();
        assert!(err.is_process_gone());
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn test_open_self_and_round_trip() {
        let value = 0x1234_5678u32;
        let address = Address::new(&value as *const u32 as usize as u64);

        let mut process = ProcessHandle::open(std::process::id()).unwrap();
        assert!(process.is_alive());
        assert_eq!(process.bitness().is_64_bit(), cfg!(target_pointer_width = "64"));
        assert_eq!(process.read_bytes(address, 4).unwrap(), value.to_le_bytes());

        process.close().unwrap();
        assert!(!process.is_alive());
        assert!(process.read_bytes(address, 4).unwrap_err().is_process_gone());
    }
}
