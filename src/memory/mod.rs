//! Memory operations module for walking and searching process memory
//!
//! This module provides:
//! - The [`MemoryAccess`] capability every backend implements
//! - Region enumeration in address order
//! - Chunked and sliding walks with bounded read retries
//! - Literal, regex and charset-aware pattern search

pub mod access;
pub mod charsets;
#[doc(hidden)]
pub mod mock;
pub mod regions;
pub mod scanner;
pub mod walker;

pub use access::MemoryAccess;
pub use charsets::{next_text, text_runs, Charset, CharsetError, DecodedText};
pub use regions::{readable_regions, region_from_mappings, Mapping, RegionEnumerator};
pub use scanner::{find_bytes, find_regex, find_regex_with_charset, MemoryScanner, ScanOptions};
pub use walker::{walk, walk_sliding, WalkEnd, MAX_RETRIES};
