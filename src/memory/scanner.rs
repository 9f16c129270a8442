//! Memory scanning functionality for pattern matching
//!
//! Every search runs the sliding walker and stops at the first chunk that
//! holds a match, so the sequential searches return the lowest matching
//! address at or after the start address. The parallel variants split the
//! work by region and return some match, not necessarily the lowest.

use crate::config::{default_workers, ScannerConfig, DEFAULT_MIN_BUFFER_SIZE};
use crate::core::types::{Address, MemoryError, MemoryRegion, Outcome};
use crate::memory::access::MemoryAccess;
use crate::memory::charsets::{text_runs, Charset};
use crate::memory::regions::readable_regions;
use crate::memory::walker::{walk_region_sliding, walk_sliding};
use memchr::memmem;
use rayon::prelude::*;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Options for memory scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Smallest sliding-walk buffer; literal searches grow it to fit the needle
    pub min_buffer_size: usize,
    /// Threads used by the parallel searches
    pub workers: usize,
    /// Charsets tried by [`MemoryScanner::find_regex_with_charset`] when the
    /// caller passes none
    pub charsets: Vec<Charset>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            min_buffer_size: DEFAULT_MIN_BUFFER_SIZE,
            workers: default_workers(),
            charsets: Charset::DEFAULT_SET.to_vec(),
        }
    }
}

impl From<&ScannerConfig> for ScanOptions {
    fn from(config: &ScannerConfig) -> Self {
        let mut charsets: Vec<Charset> = config
            .charsets
            .iter()
            .filter_map(|tag| match tag.parse() {
                Ok(charset) => Some(charset),
                Err(e) => {
                    warn!(error = %e, "ignoring configured charset");
                    None
                }
            })
            .collect();
        if charsets.is_empty() {
            charsets = Charset::DEFAULT_SET.to_vec();
        }

        ScanOptions {
            min_buffer_size: config.min_buffer_size,
            workers: config.workers.max(1),
            charsets,
        }
    }
}

/// Memory scanner for pattern matching
pub struct MemoryScanner<'a, H: MemoryAccess + ?Sized> {
    access: &'a H,
    options: ScanOptions,
}

impl<'a, H: MemoryAccess + ?Sized> MemoryScanner<'a, H> {
    /// Create a new memory scanner with default options
    pub fn new(access: &'a H) -> Self {
        Self::with_options(access, ScanOptions::default())
    }

    /// Create a memory scanner with explicit options
    pub fn with_options(access: &'a H, options: ScanOptions) -> Self {
        MemoryScanner { access, options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Finds the first occurrence of `needle` at or after `start`.
    ///
    /// The walk buffer is at least twice the needle, so every occurrence
    /// inside a region lies whole in one sliding window.
    pub fn find_bytes(&self, start: Address, needle: &[u8]) -> Outcome<Option<Address>> {
        let buffer_size = match self.needle_buffer_size(needle) {
            Ok(size) => size,
            Err(e) => return Outcome::err(e),
        };
        let finder = memmem::Finder::new(needle);

        self.search(start, buffer_size, |address, chunk| {
            finder.find(chunk).map(|offset| address.saturating_add(offset))
        })
    }

    /// Finds the first match of `pattern` against raw memory bytes.
    ///
    /// Matches longer than half of the buffer may be missed when they
    /// straddle a window boundary.
    pub fn find_regex(&self, start: Address, pattern: &regex::bytes::Regex) -> Outcome<Option<Address>> {
        self.search(start, self.options.min_buffer_size, |address, chunk| {
            pattern
                .find(chunk)
                .map(|m| address.saturating_add(m.start()))
        })
    }

    /// Finds the first match of `pattern` in text decoded from memory.
    ///
    /// Each chunk is decoded with every charset in turn (the configured set
    /// when `charsets` is empty) and the lowest matching address in the chunk
    /// wins. The returned address is that of the first encoded byte of the
    /// match.
    pub fn find_regex_with_charset(
        &self,
        start: Address,
        pattern: &regex::Regex,
        charsets: &[Charset],
    ) -> Outcome<Option<Address>> {
        let charsets = if charsets.is_empty() {
            self.options.charsets.as_slice()
        } else {
            charsets
        };

        self.search(start, self.options.min_buffer_size, |address, chunk| {
            charsets
                .iter()
                .filter_map(|&charset| first_text_match(charset, pattern, chunk, address))
                .min()
        })
    }

    /// [`find_regex_with_charset`](Self::find_regex_with_charset) with
    /// charsets named by tag.
    ///
    /// Unrecognized tags are reported as soft errors and the search goes on
    /// with the rest; it is a hard error only when no tag is usable.
    pub fn find_regex_with_charset_tags<S: AsRef<str>>(
        &self,
        start: Address,
        pattern: &regex::Regex,
        tags: &[S],
    ) -> Outcome<Option<Address>> {
        let mut soft_errors = Vec::new();
        let mut charsets = Vec::new();
        for tag in tags {
            match tag.as_ref().parse::<Charset>() {
                Ok(charset) => charsets.push(charset),
                Err(e) => soft_errors.push(MemoryError::from(e)),
            }
        }
        if charsets.is_empty() && !tags.is_empty() {
            return Outcome::new(
                Err(MemoryError::InvalidArgument(
                    "no recognized charset to search with".to_string(),
                )),
                soft_errors,
            );
        }

        let (result, walk_errors) = self
            .find_regex_with_charset(start, pattern, &charsets)
            .into_parts();
        soft_errors.extend(walk_errors);
        Outcome::new(result, soft_errors)
    }

    fn needle_buffer_size(&self, needle: &[u8]) -> Result<usize, MemoryError> {
        if needle.is_empty() {
            return Err(MemoryError::InvalidPattern("Empty pattern".to_string()));
        }
        let size = self.options.min_buffer_size.max(needle.len().saturating_mul(2));
        // Even, so the sliding stride is exactly half the buffer
        Ok(size.saturating_add(size % 2))
    }

    fn search<M>(&self, start: Address, buffer_size: usize, mut matcher: M) -> Outcome<Option<Address>>
    where
        M: FnMut(Address, &[u8]) -> Option<Address>,
    {
        let mut found = None;
        let outcome = walk_sliding(self.access, start, buffer_size, |address, chunk| {
            match matcher(address, chunk) {
                Some(hit) => {
                    found = Some(hit);
                    ControlFlow::Break(())
                }
                None => ControlFlow::Continue(()),
            }
        });

        if let Some(address) = found {
            debug!(pid = self.access.pid(), address = %address, "match found");
        }
        outcome.map(|_| found)
    }
}

impl<'a, H: MemoryAccess + Sync + ?Sized> MemoryScanner<'a, H> {
    /// Region-parallel [`find_bytes`](Self::find_bytes).
    ///
    /// Whether a match is found is the same as for the sequential search;
    /// which address is returned when several regions match is not fixed.
    pub fn find_bytes_parallel(&self, start: Address, needle: &[u8]) -> Outcome<Option<Address>> {
        let buffer_size = match self.needle_buffer_size(needle) {
            Ok(size) => size,
            Err(e) => return Outcome::err(e),
        };
        let finder = memmem::Finder::new(needle);

        self.search_parallel(start, buffer_size, |address, chunk| {
            finder.find(chunk).map(|offset| address.saturating_add(offset))
        })
    }

    /// Region-parallel [`find_regex`](Self::find_regex), with the same
    /// relaxed ordering as [`find_bytes_parallel`](Self::find_bytes_parallel)
    pub fn find_regex_parallel(
        &self,
        start: Address,
        pattern: &regex::bytes::Regex,
    ) -> Outcome<Option<Address>> {
        self.search_parallel(start, self.options.min_buffer_size, |address, chunk| {
            pattern
                .find(chunk)
                .map(|m| address.saturating_add(m.start()))
        })
    }

    fn search_parallel<M>(&self, start: Address, buffer_size: usize, matcher: M) -> Outcome<Option<Address>>
    where
        M: Fn(Address, &[u8]) -> Option<Address> + Sync,
    {
        let (regions, mut soft_errors) = readable_regions(self.access, start).into_parts();
        let regions: Vec<MemoryRegion> = match regions {
            Ok(regions) => regions
                .into_iter()
                .filter_map(|region| {
                    MemoryRegion::from_bounds(region.address().max(start), region.end())
                })
                .collect(),
            Err(e) => return Outcome::new(Err(e), soft_errors),
        };

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers.max(1))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => return Outcome::new(Err(MemoryError::WorkerPool(e.to_string())), soft_errors),
        };

        debug!(
            pid = self.access.pid(),
            regions = regions.len(),
            workers = self.options.workers,
            "parallel search"
        );

        let stop = AtomicBool::new(false);
        let worker_errors = Mutex::new(Vec::new());
        let hard_error = Mutex::new(None);

        let found = pool.install(|| {
            regions.par_iter().find_map_any(|&region| {
                if stop.load(Ordering::Relaxed) {
                    return None;
                }

                let mut hit = None;
                let outcome = walk_region_sliding(self.access, region, buffer_size, |address, chunk| {
                    if stop.load(Ordering::Relaxed) {
                        return ControlFlow::Break(());
                    }
                    match matcher(address, chunk) {
                        Some(address) => {
                            hit = Some(address);
                            stop.store(true, Ordering::Relaxed);
                            ControlFlow::Break(())
                        }
                        None => ControlFlow::Continue(()),
                    }
                });

                let (result, errors) = outcome.into_parts();
                if let Ok(mut sink) = worker_errors.lock() {
                    sink.extend(errors);
                }
                if let Err(e) = result {
                    stop.store(true, Ordering::Relaxed);
                    if let Ok(mut slot) = hard_error.lock() {
                        if slot.is_none() {
                            *slot = Some(e);
                        }
                    }
                }
                hit
            })
        });

        soft_errors.extend(worker_errors.into_inner().unwrap_or_else(|p| p.into_inner()));
        let hard_error = hard_error.into_inner().unwrap_or_else(|p| p.into_inner());

        let result = match (found, hard_error) {
            (Some(address), _) => Ok(Some(address)),
            (None, Some(e)) => Err(e),
            (None, None) => Ok(None),
        };
        Outcome::new(result, soft_errors)
    }
}

/// Lowest address in `chunk` where `pattern` matches text decoded with `charset`
fn first_text_match(
    charset: Charset,
    pattern: &regex::Regex,
    chunk: &[u8],
    address: Address,
) -> Option<Address> {
    text_runs(charset, chunk, address).find_map(|run| {
        pattern
            .find(&run.text)
            .and_then(|m| run.source_address(m.start()))
    })
}

/// Finds the first occurrence of `needle` at or after `start` with default options
pub fn find_bytes<H: MemoryAccess + ?Sized>(
    access: &H,
    start: Address,
    needle: &[u8],
) -> Outcome<Option<Address>> {
    MemoryScanner::new(access).find_bytes(start, needle)
}

/// Finds the first raw-byte match of `pattern` at or after `start`
pub fn find_regex<H: MemoryAccess + ?Sized>(
    access: &H,
    start: Address,
    pattern: &regex::bytes::Regex,
) -> Outcome<Option<Address>> {
    MemoryScanner::new(access).find_regex(start, pattern)
}

/// Finds the first match of `pattern` in text decoded with `charsets`
/// ([`Charset::DEFAULT_SET`] when empty)
pub fn find_regex_with_charset<H: MemoryAccess + ?Sized>(
    access: &H,
    start: Address,
    pattern: &regex::Regex,
    charsets: &[Charset],
) -> Outcome<Option<Address>> {
    MemoryScanner::new(access).find_regex_with_charset(start, pattern, charsets)
}
