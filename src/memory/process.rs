// Tue Jan 13 2026 - Alex

use crate::memory::{
    Address, MemoryError, MemoryRange, MemoryRegion, Module, Protection, RegionState, TargetMemory,
};
use libc::{c_void, iovec, pid_t};
use std::fs;
use std::path::PathBuf;

const PAGE_SIZE: u32 = 0x1000;
const ADDRESS_SPACE_END: u64 = 1 << 32;

#[derive(Debug, Clone)]
struct MapsEntry {
    start: u64,
    end: u64,
    protection: Protection,
    path: Option<String>,
}

/// A live Linux process, read through `process_vm_readv`.
///
/// Only the low 4 GiB of the address space are visible; mappings above
/// that are ignored.
pub struct ProcessMemory {
    pid: pid_t,
}

impl ProcessMemory {
    pub fn attach(pid: pid_t) -> Result<Self, MemoryError> {
        let maps = format!("/proc/{}/maps", pid);
        if fs::metadata(&maps).is_err() {
            return Err(MemoryError::ProcessNotFound(format!("no such process: {}", pid)));
        }
        let process = Self { pid };
        process.read_maps()?;
        Ok(process)
    }

    pub fn attach_by_name(name: &str) -> Result<Self, MemoryError> {
        let pids = Self::find_processes_by_name(name)?;
        match pids.first() {
            Some(&pid) => Self::attach(pid),
            None => Err(MemoryError::ProcessNotFound(format!("Process '{}' not found", name))),
        }
    }

    pub fn find_processes_by_name(name: &str) -> Result<Vec<pid_t>, MemoryError> {
        let mut pids = Vec::new();
        for entry in fs::read_dir("/proc")? {
            let entry = entry?;
            let pid = match entry.file_name().to_str().and_then(|s| s.parse::<pid_t>().ok()) {
                Some(pid) => pid,
                None => continue,
            };
            if let Ok(comm) = fs::read_to_string(entry.path().join("comm")) {
                if comm.trim() == name {
                    pids.push(pid);
                }
            }
        }
        pids.sort_unstable();
        Ok(pids)
    }

    pub fn pid(&self) -> pid_t {
        self.pid
    }

    fn read_maps(&self) -> Result<Vec<MapsEntry>, MemoryError> {
        let text = fs::read_to_string(format!("/proc/{}/maps", self.pid))?;
        Ok(text.lines().filter_map(parse_maps_line).filter(|e| e.start < ADDRESS_SPACE_END).collect())
    }

    fn exe_path(&self) -> Option<String> {
        fs::read_link(format!("/proc/{}/exe", self.pid))
            .ok()
            .map(|p| p.to_string_lossy().into_owned())
    }
}

fn parse_maps_line(line: &str) -> Option<MapsEntry> {
    let mut parts = line.splitn(6, ' ');
    let (start, end) = parts.next()?.split_once('-')?;
    let perms = parts.next()?.as_bytes();
    let path = parts.nth(3).map(str::trim).filter(|p| !p.is_empty()).map(str::to_string);

    if perms.len() < 3 {
        return None;
    }

    Some(MapsEntry {
        start: u64::from_str_radix(start, 16).ok()?,
        end: u64::from_str_radix(end, 16).ok()?.min(ADDRESS_SPACE_END),
        protection: Protection::from_rwx(perms[0] == b'r', perms[1] == b'w', perms[2] == b'x'),
        path,
    })
}

/// The mapping holding `addr`, or the free gap around it. Space past the
/// last low mapping is one free region reaching the 4 GiB boundary.
fn region_at(maps: &[MapsEntry], addr: Address) -> MemoryRegion {
    let page = addr.align_down(PAGE_SIZE).as_u64();
    let at = addr.as_u64();

    if let Some(entry) = maps.iter().find(|e| e.start <= at && at < e.end) {
        let range = MemoryRange::new(Address::new(page.max(entry.start) as u32), entry.end);
        return MemoryRegion::new(range, RegionState::COMMIT, entry.protection);
    }

    let gap_start = maps.iter().map(|e| e.end).filter(|&end| end <= at).max().unwrap_or(0).max(page);
    let gap_end = maps.iter().map(|e| e.start).filter(|&s| s > at).min().unwrap_or(ADDRESS_SPACE_END);
    MemoryRegion::free(MemoryRange::new(Address::new(gap_start as u32), gap_end))
}

impl TargetMemory for ProcessMemory {
    fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryError> {
        let mut buffer = vec![0u8; len];
        let read = self.read_into(addr, &mut buffer)?;
        if read != len {
            return Err(MemoryError::ReadFailed { address: addr, len });
        }
        Ok(buffer)
    }

    fn read_into(&self, addr: Address, buf: &mut [u8]) -> Result<usize, MemoryError> {
        if buf.is_empty() {
            return Ok(0);
        }
        let local = iovec {
            iov_base: buf.as_mut_ptr() as *mut c_void,
            iov_len: buf.len(),
        };
        let remote = iovec {
            iov_base: addr.as_u32() as usize as *mut c_void,
            iov_len: buf.len(),
        };

        let read = unsafe { libc::process_vm_readv(self.pid, &local, 1, &remote, 1, 0) };
        if read < 0 {
            return Err(MemoryError::ReadFailed { address: addr, len: buf.len() });
        }
        Ok(read as usize)
    }

    fn query_region(&self, addr: Address) -> Result<MemoryRegion, MemoryError> {
        Ok(region_at(&self.read_maps()?, addr))
    }

    fn modules(&self) -> Result<Vec<Module>, MemoryError> {
        let maps = self.read_maps()?;
        let mut modules: Vec<(String, u64, u64)> = Vec::new();

        for entry in maps.iter().filter(|e| e.path.as_deref().map_or(false, |p| p.starts_with('/'))) {
            let path = entry.path.clone().unwrap_or_default();
            match modules.iter_mut().find(|(p, _, _)| *p == path) {
                Some((_, start, end)) => {
                    *start = (*start).min(entry.start);
                    *end = (*end).max(entry.end);
                }
                None => modules.push((path, entry.start, entry.end)),
            }
        }

        if let Some(exe) = self.exe_path() {
            if let Some(idx) = modules.iter().position(|(p, _, _)| *p == exe) {
                let main = modules.remove(idx);
                modules.insert(0, main);
            }
        }

        Ok(modules
            .into_iter()
            .map(|(path, start, end)| {
                Module::new(Address::new(start as u32), (end - start) as u32).with_path(PathBuf::from(path))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_maps_line() {
        let entry = parse_maps_line("08048000-08052000 r-xp 00000000 08:01 1311   /usr/bin/game").unwrap();
        assert_eq!(entry.start, 0x0804_8000);
        assert_eq!(entry.end, 0x0805_2000);
        assert_eq!(entry.protection, Protection::EXECUTE_READ);
        assert_eq!(entry.path.as_deref(), Some("/usr/bin/game"));

        let anon = parse_maps_line("f7f00000-f7f21000 rw-p 00000000 00:00 0").unwrap();
        assert_eq!(anon.protection, Protection::READWRITE);
        assert!(anon.path.is_none());
    }

    #[test]
    fn test_region_at() {
        let maps: Vec<_> = [
            "08048000-08052000 r-xp 00000000 08:01 1311   /usr/bin/game",
            "08060000-08061000 rw-p 00000000 00:00 0",
        ]
        .iter()
        .filter_map(|line| parse_maps_line(line))
        .collect();

        let code = region_at(&maps, Address::new(0x0804_9123));
        assert_eq!(code.base(), Address::new(0x0804_9000));
        assert_eq!(code.end(), 0x0805_2000);
        assert!(code.is_accessible());

        let gap = region_at(&maps, Address::new(0x0805_8000));
        assert_eq!(gap.state(), RegionState::FREE);
        assert_eq!(gap.base(), Address::new(0x0805_8000));
        assert_eq!(gap.end(), 0x0806_0000);

        let tail = region_at(&maps, Address::new(0x0806_1000));
        assert_eq!(tail.state(), RegionState::FREE);
        assert_eq!(tail.base(), Address::new(0x0806_1000));
        assert_eq!(tail.end(), ADDRESS_SPACE_END);
    }

    #[test]
    fn test_attach_self() {
        let pid = std::process::id() as pid_t;
        let process = ProcessMemory::attach(pid).unwrap();
        assert_eq!(process.pid(), pid);
        assert!(process.modules().is_ok());
    }

    #[test]
    fn test_attach_missing_process() {
        assert!(matches!(ProcessMemory::attach(-1), Err(MemoryError::ProcessNotFound(_))));
    }
}
