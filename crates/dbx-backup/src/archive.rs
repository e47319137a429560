//! Compression helpers for backup artifacts.
//!
//! These are blocking; async callers wrap them in `spawn_blocking`.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Archive, Builder};

/// Gzip a single file into `dest`.
pub fn gzip_file(src: &Path, dest: &Path) -> io::Result<()> {
    let mut input = BufReader::new(File::open(src)?);
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(dest)?), Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?;
    Ok(())
}

/// Decompress a gzip file into `dest`.
pub fn gunzip_file(src: &Path, dest: &Path) -> io::Result<()> {
    let mut decoder = GzDecoder::new(BufReader::new(File::open(src)?));
    let mut output = BufWriter::new(File::create(dest)?);
    io::copy(&mut decoder, &mut output)?;
    Ok(())
}

/// Pack `src_dir` into a `.tar.gz` at `dest`, rooted at the directory's name.
pub fn tar_gz_dir(src_dir: &Path, dest: &Path) -> io::Result<()> {
    let root = src_dir
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "directory has no name"))?;

    let encoder = GzEncoder::new(BufWriter::new(File::create(dest)?), Compression::default());
    let mut tar = Builder::new(encoder);
    tar.append_dir_all(root, src_dir)?;
    tar.into_inner()?.finish()?;
    Ok(())
}

/// Unpack a `.tar.gz` archive into `dest_dir`.
pub fn untar_gz(archive: &Path, dest_dir: &Path) -> io::Result<()> {
    let decoder = GzDecoder::new(BufReader::new(File::open(archive)?));
    Archive::new(decoder).unpack(dest_dir)
}
