//! Producer-consumer handshake over a named POSIX shared-memory region.
//!
//! Layout: byte 0 is the flag (producer sets 1, consumer resets to 0), bytes
//! 1..9 are an unaligned little-endian u64 payload length, and the JSON
//! payload starts at byte 9. No other synchronization primitive mediates the
//! region -- correctness relies on the flag write being the producer's last
//! store and the consumer's first store on completion.

use std::fs::OpenOptions;
use std::time::Duration;

use memmap2::{MmapMut, MmapOptions};
use tracing::warn;

use crate::prelude::Error;

const FLAG_OFFSET: usize = 0;
const SIZE_OFFSET: usize = 1;
const DATA_OFFSET: usize = 9;

/// A mapped shared-memory region shaped for the flag/length/payload
/// handshake described above.
pub struct SharedBlockRegion {
    mmap: MmapMut,
    poll_interval: Duration,
}

impl SharedBlockRegion {
    /// Attach to a region the producer already created under `/dev/shm/<name>`.
    pub fn attach(name: &str, region_size_bytes: usize, poll_interval: Duration) -> Result<Self, Error> {
        let path = format!("/dev/shm/{}", name.trim_start_matches('/'));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| Error::shm(format!("opening {path}: {e}")))?;

        // SAFETY: the region is externally owned by the producer process for
        // the program's lifetime; mapping it read-write is the documented
        // contract of this handshake.
        let mmap = unsafe {
            MmapOptions::new()
                .len(region_size_bytes)
                .map_mut(&file)
                .map_err(|e| Error::shm(format!("mmap {path}: {e}")))?
        };

        Ok(Self { mmap, poll_interval })
    }

    fn flag(&self) -> u8 {
        self.mmap[FLAG_OFFSET]
    }

    fn payload_len(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.mmap[SIZE_OFFSET..SIZE_OFFSET + 8]);
        u64::from_le_bytes(bytes)
    }

    /// Block until the producer signals a payload is ready, then return its
    /// bytes. `None` means the declared length exceeds the region: the flag
    /// is reset and the caller should warn and move on to the next poll.
    pub fn wait_for_payload(&mut self) -> Option<&[u8]> {
        loop {
            if self.flag() == 1 {
                break;
            }
            std::thread::sleep(self.poll_interval);
        }

        let len = self.payload_len() as usize;
        let capacity = self.mmap.len() - DATA_OFFSET;
        if len > capacity {
            warn!(len, capacity, "payload length exceeds shared-memory region; skipping");
            self.mark_done();
            return None;
        }

        Some(&self.mmap[DATA_OFFSET..DATA_OFFSET + len])
    }

    /// Reset the flag so the producer can write the next payload.
    pub fn mark_done(&mut self) {
        self.mmap[FLAG_OFFSET] = 0;
    }
}
