//! Region walking: streams a process's readable memory through a callback
//!
//! The walker keeps one cursor and cycles through four steps: acquire the
//! readable region at the cursor, read the next chunk of it, hand the chunk
//! to the callback, and advance. It finishes when no region is left or the
//! callback breaks, and aborts on a hard error from the region enumerator.
//!
//! Chunks never extend past the end of their region. The last chunk of a
//! region is the `buffer_size` bytes that end exactly at the region end, so
//! it may repeat bytes the previous chunk already delivered; a region (or the
//! tail of one, after `start_address`) shorter than `buffer_size` is delivered
//! as one short chunk.
//!
//! A failed chunk read is retried by re-resolving the region at the failing
//! address, up to [`MAX_RETRIES`] times. After that the failure becomes a soft
//! error and the walk skips past the chunk. Every successful read restores
//! the full retry budget.

use crate::core::types::{Address, MemoryError, MemoryRegion, MemoryResult, Outcome};
use crate::memory::access::MemoryAccess;
use std::ops::ControlFlow;
use tracing::{debug, trace, warn};

/// Retry budget for a chunk read before it is degraded to a soft error
pub const MAX_RETRIES: usize = 5;

/// How a walk that did not hit a hard error finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd {
    /// No readable memory was left
    Exhausted,
    /// The callback asked to stop
    Stopped,
}

/// Walks readable memory from `start_address` in non-overlapping chunks of
/// `buffer_size` bytes.
///
/// The callback gets the address of each chunk and its bytes. The slice is
/// only valid during the call; the buffer is reused for the next chunk.
pub fn walk<H, F>(
    access: &H,
    start_address: Address,
    buffer_size: usize,
    visit: F,
) -> Outcome<WalkEnd>
where
    H: MemoryAccess + ?Sized,
    F: FnMut(Address, &[u8]) -> ControlFlow<()>,
{
    Walker::new(access, buffer_size, buffer_size).run(start_address, None, visit)
}

/// Like [`walk`], but consecutive chunks of a region overlap by half of
/// `buffer_size`.
///
/// Any byte sequence of at most `buffer_size / 2` bytes inside a region is
/// therefore seen whole by at least one callback.
pub fn walk_sliding<H, F>(
    access: &H,
    start_address: Address,
    buffer_size: usize,
    visit: F,
) -> Outcome<WalkEnd>
where
    H: MemoryAccess + ?Sized,
    F: FnMut(Address, &[u8]) -> ControlFlow<()>,
{
    Walker::new(access, buffer_size, sliding_stride(buffer_size)).run(start_address, None, visit)
}

/// Sliding walk confined to one region, used by the parallel searches
pub(crate) fn walk_region_sliding<H, F>(
    access: &H,
    region: MemoryRegion,
    buffer_size: usize,
    visit: F,
) -> Outcome<WalkEnd>
where
    H: MemoryAccess + ?Sized,
    F: FnMut(Address, &[u8]) -> ControlFlow<()>,
{
    Walker::new(access, buffer_size, sliding_stride(buffer_size)).run(
        region.address(),
        Some(region.end()),
        visit,
    )
}

fn sliding_stride(buffer_size: usize) -> usize {
    (buffer_size / 2).max(1)
}

enum SpanEnd {
    Completed,
    Stopped,
    ReadFailed {
        address: Address,
        len: usize,
        error: MemoryError,
    },
}

struct Walker<'a, H: ?Sized> {
    access: &'a H,
    buffer_size: usize,
    stride: usize,
    retries: usize,
    soft_errors: Vec<MemoryError>,
}

impl<'a, H: MemoryAccess + ?Sized> Walker<'a, H> {
    fn new(access: &'a H, buffer_size: usize, stride: usize) -> Self {
        Walker {
            access,
            buffer_size,
            stride,
            retries: MAX_RETRIES,
            soft_errors: Vec::new(),
        }
    }

    fn run<F>(mut self, start: Address, limit: Option<Address>, mut visit: F) -> Outcome<WalkEnd>
    where
        F: FnMut(Address, &[u8]) -> ControlFlow<()>,
    {
        if self.buffer_size == 0 {
            return Outcome::err(MemoryError::InvalidArgument(
                "buffer size must be positive".to_string(),
            ));
        }

        debug!(
            pid = self.access.pid(),
            start = %start,
            buffer_size = self.buffer_size,
            stride = self.stride,
            "walking memory"
        );

        let mut buffer = vec![0u8; self.buffer_size];
        let result = self.drive(start, limit, &mut buffer, &mut visit);
        Outcome::new(result, self.soft_errors)
    }

    fn drive<F>(
        &mut self,
        start: Address,
        limit: Option<Address>,
        buffer: &mut [u8],
        visit: &mut F,
    ) -> MemoryResult<WalkEnd>
    where
        F: FnMut(Address, &[u8]) -> ControlFlow<()>,
    {
        let mut cursor = start;

        loop {
            if limit.is_some_and(|limit| cursor >= limit) {
                return Ok(WalkEnd::Exhausted);
            }

            let Some(region) = self
                .access
                .next_readable_region(cursor)
                .collect_into(&mut self.soft_errors)?
            else {
                trace!(cursor = %cursor, "no readable region left");
                return Ok(WalkEnd::Exhausted);
            };

            if region.end() <= cursor {
                return Err(MemoryError::enumeration_failed(
                    self.access.pid(),
                    format!("backend returned {} for a lookup at {}", region, cursor),
                ));
            }

            let span_start = region.address().max(cursor);
            let span_end = limit.map_or(region.end(), |limit| limit.min(region.end()));
            if span_start >= span_end {
                return Ok(WalkEnd::Exhausted);
            }

            match self.walk_span(span_start, span_end, buffer, visit) {
                SpanEnd::Completed => cursor = span_end,
                SpanEnd::Stopped => return Ok(WalkEnd::Stopped),
                SpanEnd::ReadFailed {
                    address,
                    len,
                    error,
                } => {
                    if self.retries > 0 {
                        self.retries -= 1;
                        debug!(
                            address = %address,
                            retries_left = self.retries,
                            error = %error,
                            "chunk read failed, re-resolving region"
                        );
                        cursor = address;
                    } else {
                        warn!(address = %address, len, error = %error, "skipping unreadable chunk");
                        self.soft_errors.push(error);
                        self.retries = MAX_RETRIES;
                        cursor = address.saturating_add(len);
                    }
                }
            }
        }
    }

    /// Delivers `[start, end)` chunk by chunk. `end` is a region end or the
    /// walk limit, so no chunk crosses it.
    fn walk_span<F>(
        &mut self,
        start: Address,
        end: Address,
        buffer: &mut [u8],
        visit: &mut F,
    ) -> SpanEnd
    where
        F: FnMut(Address, &[u8]) -> ControlFlow<()>,
    {
        let mut position = start;
        let mut first = true;

        loop {
            let remaining = position.distance_to(end);
            let (address, len) = if remaining >= self.buffer_size {
                (position, self.buffer_size)
            } else if first {
                (position, remaining)
            } else {
                (end.saturating_sub(self.buffer_size), self.buffer_size)
            };

            let chunk = &mut buffer[..len];
            if let Err(error) = self
                .access
                .copy_memory(address, chunk)
                .collect_into(&mut self.soft_errors)
            {
                return SpanEnd::ReadFailed {
                    address,
                    len,
                    error,
                };
            }
            self.retries = MAX_RETRIES;

            if visit(address, chunk).is_break() {
                return SpanEnd::Stopped;
            }

            let chunk_end = address.saturating_add(len);
            if chunk_end >= end {
                return SpanEnd::Completed;
            }
            first = false;
            position = address.saturating_add(self.stride);
        }
    }
}
