//! Reading the backup extract line by line.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Whether a path names a gzip-compressed file.
pub fn is_gzipped(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Open an input file, decompressing `.gz` files on the fly.
pub fn open_lines(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = if is_gzipped(path) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::new(reader)))
}

/// Numbered lines (1-based) of a reader, optionally skipping a header line.
pub fn numbered_lines<R: BufRead>(
    reader: R,
    skip_header: bool,
) -> impl Iterator<Item = std::io::Result<(usize, String)>> {
    reader
        .lines()
        .enumerate()
        .skip(usize::from(skip_header))
        .map(|(index, line)| line.map(|text| (index + 1, text)))
}
