//! Very thin Fasta reader. Only support batch IO.
use crate::error::{Error, Result};
use crate::observation::SequenceSet;
use std::io::{BufRead, BufReader};
use std::io::{BufWriter, Write};
pub type FASTARecord = (String, Vec<u8>);

/// Write records into the writer
pub fn write_fasta<W: Write>(wtr: &mut BufWriter<W>, records: &[FASTARecord]) -> Result<()> {
    for (id, seq) in records {
        writeln!(wtr, ">{}\n{}", id, String::from_utf8_lossy(seq))?;
    }
    Ok(())
}

/// Read file or stdin, return parsed fasta files.
pub fn read_fasta<P: AsRef<std::path::Path>>(file: &Option<P>) -> Result<Vec<FASTARecord>> {
    let stdin = std::io::stdin();
    let mut reader: Box<dyn BufRead> = match file {
        Some(file) => std::fs::File::open(file)
            .map(BufReader::new)
            .map(Box::new)?,
        None => {
            let lock = stdin.lock();
            Box::new(BufReader::new(lock))
        }
    };
    let mut contents = vec![];
    reader.read_to_end(&mut contents)?;
    parse_fasta(&contents)
}

/// Read DNA records as observations. Return the IDs and the sequences in the same order.
pub fn read_observations<P: AsRef<std::path::Path>>(
    file: &Option<P>,
) -> Result<(Vec<String>, SequenceSet)> {
    let records = read_fasta(file)?;
    let seqs: Vec<&[u8]> = records.iter().map(|(_, seq)| seq.as_slice()).collect();
    let set = SequenceSet::from_dna(&seqs)?;
    let ids = records.into_iter().map(|(id, _)| id).collect();
    Ok((ids, set))
}

/// Inverse of the DNA mapping of [`SequenceSet::from_dna`]. Symbols out of `ACGT` become `N`.
pub fn symbols_to_dna(xs: &[usize]) -> Vec<u8> {
    xs.iter()
        .map(|&x| b"ACGT".get(x).copied().unwrap_or(b'N'))
        .collect()
}

fn parse_fasta(contents: &[u8]) -> Result<Vec<FASTARecord>> {
    let mut contents = contents.split(|&x| x == b'>');
    if let Some(first) = contents.next() {
        if first.iter().any(|x| !x.is_ascii_whitespace()) {
            return Err(Error::parse(1, "a FASTA file should start with '>'"));
        }
    }
    let records = contents
        .filter_map(|record| {
            let mut record = record.splitn(2, |&x| x == b'\n');
            let id = record.next()?.split(|&x| x == b' ').next()?;
            let contents = record.next()?;
            let contents: Vec<_> = contents
                .iter()
                .filter(|x| !x.is_ascii_whitespace())
                .copied()
                .collect();
            Some((String::from_utf8_lossy(id).to_string(), contents))
        })
        .collect();
    Ok(records)
}
