use tracing::debug;

use crate::error::{Error, Result};

/// Open handle to the game process
pub struct ProcessHandle {
    pub pid: u32,
    pub name: String,
    #[cfg(target_os = "windows")]
    handle: windows::Win32::Foundation::HANDLE,
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(target_os = "windows")]
impl ProcessHandle {
    /// Find a running process by executable name (case-insensitive) and open it
    /// for reading.
    ///
    /// Returns `Error::ProcessNotFound` when no such process is running.
    pub fn find_by_name(name: &str) -> Result<Self> {
        let pid = find_pid_by_name(name)?.ok_or_else(|| Error::ProcessNotFound(name.to_string()))?;
        debug!("Found {} (PID: {})", name, pid);
        Self::open_named(pid, name.to_string())
    }

    /// Open a process by PID
    pub fn open(pid: u32) -> Result<Self> {
        Self::open_named(pid, String::new())
    }

    fn open_named(pid: u32, name: String) -> Result<Self> {
        use windows::Win32::Foundation::BOOL;
        use windows::Win32::System::Threading::{
            OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
        };

        // SAFETY: OpenProcess has no memory-safety preconditions; failure is
        // reported through the returned Result.
        let handle = unsafe {
            OpenProcess(
                PROCESS_VM_READ | PROCESS_QUERY_INFORMATION,
                BOOL::from(false),
                pid,
            )
        }
        .map_err(|e| Error::ProcessOpenFailed(format!("PID {}: {}", pid, e)))?;

        Ok(Self { pid, name, handle })
    }

    pub(crate) fn raw(&self) -> windows::Win32::Foundation::HANDLE {
        self.handle
    }
}

#[cfg(target_os = "windows")]
impl Drop for ProcessHandle {
    fn drop(&mut self) {
        use windows::Win32::Foundation::CloseHandle;

        // SAFETY: the handle was returned by OpenProcess and is closed exactly once.
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

#[cfg(target_os = "windows")]
fn find_pid_by_name(name: &str) -> Result<Option<u32>> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
        TH32CS_SNAPPROCESS,
    };

    // SAFETY: taking a process snapshot has no preconditions.
    let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
        .map_err(|e| Error::ProcessOpenFailed(format!("process snapshot failed: {}", e)))?;

    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    let mut found = None;
    // SAFETY: `entry.dwSize` is initialized as the API requires.
    let mut more = unsafe { Process32FirstW(snapshot, &mut entry) }.is_ok();
    while more {
        let len = entry
            .szExeFile
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(entry.szExeFile.len());
        let exe = String::from_utf16_lossy(&entry.szExeFile[..len]);
        if exe.eq_ignore_ascii_case(name) {
            found = Some(entry.th32ProcessID);
            break;
        }
        // SAFETY: same snapshot and entry as above.
        more = unsafe { Process32NextW(snapshot, &mut entry) }.is_ok();
    }

    // SAFETY: the snapshot handle is owned here and closed once.
    unsafe {
        let _ = CloseHandle(snapshot);
    }
    Ok(found)
}

#[cfg(not(target_os = "windows"))]
impl ProcessHandle {
    pub fn find_by_name(name: &str) -> Result<Self> {
        debug!("Cannot attach to {}: unsupported platform", name);
        Err(Error::ProcessOpenFailed(
            "process memory access is only supported on Windows".to_string(),
        ))
    }

    pub fn open(pid: u32) -> Result<Self> {
        Err(Error::ProcessOpenFailed(format!(
            "PID {}: process memory access is only supported on Windows",
            pid
        )))
    }
}
