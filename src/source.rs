//! Minimal FASTA sequence source.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};

use crate::error::{LayoutError, Result};

/// A named, contiguous run of sequence data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub symbols: Vec<u8>,
}

impl Segment {
    pub fn new(name: impl Into<String>, symbols: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            symbols: symbols.into(),
        }
    }

    pub fn len(&self) -> u64 {
        self.symbols.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Read every record of a FASTA file. Symbols are uppercased, whitespace dropped.
pub fn read_fasta(path: &Path) -> Result<Vec<Segment>> {
    info!("Loading sequence file {:?}...", path);
    let file = File::open(path).map_err(|e| LayoutError::io(path, e))?;
    parse_fasta(BufReader::new(file)).map_err(|e| LayoutError::io(path, e))
}

pub fn parse_fasta<R: BufRead>(reader: R) -> std::io::Result<Vec<Segment>> {
    let mut segments: Vec<Segment> = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end();
        if let Some(header) = line.strip_prefix('>') {
            let name = header.split_whitespace().next().unwrap_or("").to_string();
            segments.push(Segment::new(name, Vec::new()));
        } else if !line.is_empty() {
            if segments.is_empty() {
                // headerless file: one anonymous record
                segments.push(Segment::new("", Vec::new()));
            }
            if let Some(current) = segments.last_mut() {
                current.symbols.extend(
                    line.bytes()
                        .filter(|b| !b.is_ascii_whitespace())
                        .map(|b| b.to_ascii_uppercase()),
                );
            }
        }
    }

    let total: usize = segments.iter().map(|s| s.symbols.len()).sum();
    debug!("Read {} records, {} symbols", segments.len(), total);
    Ok(segments)
}

/// Longest first; ties keep file order.
pub fn sort_by_length(segments: &mut [Segment]) {
    segments.sort_by(|a, b| b.symbols.len().cmp(&a.symbols.len()));
}

/// Base name of a path without directories or extension.
pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_records() {
        let text = ">chr1 some description\nACGT\nacgn\n\n>chr2\nTT TT\n";
        let segments = parse_fasta(text.as_bytes()).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].name, "chr1");
        assert_eq!(segments[0].symbols, b"ACGTACGN");
        assert_eq!(segments[1].symbols, b"TTTT");
    }

    #[test]
    fn headerless_input_becomes_one_record() {
        let segments = parse_fasta("ACGT\nGG\n".as_bytes()).unwrap();
        assert_eq!(segments, vec![Segment::new("", b"ACGTGG".to_vec())]);
    }

    #[test]
    fn sorting_is_longest_first_and_stable() {
        let mut segments = vec![
            Segment::new("a", b"AC".to_vec()),
            Segment::new("b", b"ACGT".to_vec()),
            Segment::new("c", b"GG".to_vec()),
        ];
        sort_by_length(&mut segments);
        let names: Vec<&str> = segments.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn display_name_strips_directories_and_extension() {
        assert_eq!(display_name(Path::new("/data/hg38_chr20.fa")), "hg38_chr20");
    }
}
