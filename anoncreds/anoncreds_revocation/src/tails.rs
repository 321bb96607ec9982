use std::{
    cell::RefCell,
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, ErrorKind as IoErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use anoncreds_types::cl::{
    Error as ClError, ErrorKind as ClErrorKind, RevocationTailsAccessor, RevocationTailsGenerator,
    Tail,
};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::errors::error::{RevocationError, RevocationResult};

/// Version tag every tails file starts with.
const TAILS_BLOB_TAG: [u8; 2] = [0, 2];
const TAIL_SIZE: usize = Tail::BYTES_REPR_SIZE;

/// Writes tails files into one directory, each named by the base58 SHA-256 of its content.
#[derive(Debug, Clone)]
pub struct TailsFileWriter {
    root_path: PathBuf,
}

impl TailsFileWriter {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }

    /// Drains the generator into a new tails file and returns `(location, hash)`.
    ///
    /// The file is assembled under a temporary name and moved into place only once complete,
    /// so readers never observe a partially written store.
    pub fn write(
        &self,
        generator: &mut RevocationTailsGenerator,
    ) -> RevocationResult<(String, String)> {
        fs::create_dir_all(&self.root_path).map_err(|err| {
            RevocationError::TailsAccess(format!(
                "Cannot create tails directory {:?}: {err}",
                self.root_path
            ))
        })?;

        let mut temp = NamedTempFile::new_in(&self.root_path)?;
        let mut hasher = Sha256::default();
        let mut tails_count = 0usize;
        {
            let mut buf = BufWriter::new(temp.as_file_mut());
            buf.write_all(&TAILS_BLOB_TAG)?;
            hasher.update(TAILS_BLOB_TAG);
            while let Some(tail) = generator.try_next()? {
                let tail_bytes = tail.to_bytes()?;
                buf.write_all(&tail_bytes)?;
                hasher.update(&tail_bytes);
                tails_count += 1;
            }
            buf.flush()?;
        }

        let hash = bs58::encode(hasher.finalize()).into_string();
        let target_path = self.root_path.join(&hash);
        match temp.persist_noclobber(&target_path) {
            Ok(_) => {}
            // Content addressed: an existing file under this name holds the same tails.
            Err(err) if err.error.kind() == IoErrorKind::AlreadyExists => {
                debug!("TailsFileWriter: tails file {target_path:?} already present");
            }
            Err(err) => {
                return Err(RevocationError::TailsAccess(format!(
                    "Cannot move tails file into {target_path:?}: {}",
                    err.error
                )))
            }
        }

        let location = target_path.to_string_lossy().into_owned();
        debug!("TailsFileWriter: wrote {tails_count} tails to {location}");
        Ok((location, hash))
    }
}

/// Read access to a tails file, checked against its published hash when opened.
///
/// Tails are read from the file one at a time as the crypto engine asks for them. Failures
/// while the engine walks the tails are kept so that the caller can report them as tails
/// errors instead of opaque engine failures.
#[derive(Debug)]
pub struct TailsFileReader {
    path: PathBuf,
    file: RefCell<BufReader<File>>,
    len: u64,
    error: RefCell<Option<RevocationError>>,
}

impl TailsFileReader {
    pub fn open(path: impl AsRef<Path>, expected_hash: &str) -> RevocationResult<Self> {
        let path = path.as_ref();
        trace!("TailsFileReader::open >>> path: {path:?}, expected_hash: {expected_hash}");

        let file = File::open(path).map_err(|err| {
            RevocationError::TailsAccess(format!("Cannot open tails file {path:?}: {err}"))
        })?;
        let mut file = BufReader::new(file);

        let mut tag = [0u8; TAILS_BLOB_TAG.len()];
        if file.read_exact(&mut tag).is_err() || tag != TAILS_BLOB_TAG {
            return Err(RevocationError::TailsAccess(format!(
                "Tails file {path:?} does not start with a supported version tag"
            )));
        }
        let mut hasher = Sha256::default();
        hasher.update(tag);
        let mut len = tag.len() as u64;
        loop {
            let chunk = file.fill_buf()?;
            if chunk.is_empty() {
                break;
            }
            hasher.update(chunk);
            let read = chunk.len();
            len += read as u64;
            file.consume(read);
        }

        let hash = bs58::encode(hasher.finalize()).into_string();
        if hash != expected_hash {
            return Err(RevocationError::TailsAccess(format!(
                "Tails hash mismatch for {path:?}: expected {expected_hash}, found {hash}"
            )));
        }
        debug!("TailsFileReader::open: {path:?} holds {len} bytes");
        Ok(Self {
            path: path.to_owned(),
            file: RefCell::new(file),
            len,
            error: RefCell::new(None),
        })
    }

    pub fn tails_count(&self) -> usize {
        (self.len as usize - TAILS_BLOB_TAG.len()) / TAIL_SIZE
    }

    /// Byte-range read relative to the start of the file.
    pub fn read(&self, offset: u64, size: usize) -> RevocationResult<Vec<u8>> {
        if offset.saturating_add(size as u64) > self.len {
            return Err(RevocationError::TailsAccess(format!(
                "Tails read of {size} bytes at offset {offset} is out of bounds ({} bytes)",
                self.len
            )));
        }
        let mut buf = vec![0u8; size];
        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.read_exact(&mut buf))
            .map_err(|err| {
                RevocationError::TailsAccess(format!(
                    "Cannot read tails file {:?} at offset {offset}: {err}",
                    self.path
                ))
            })?;
        Ok(buf)
    }

    pub(crate) fn take_error(&self) -> Option<RevocationError> {
        self.error.borrow_mut().take()
    }
}

impl RevocationTailsAccessor for TailsFileReader {
    fn access_tail(&self, tail_id: u32, accessor: &mut dyn FnMut(&Tail)) -> Result<(), ClError> {
        let offset = (TAIL_SIZE as u64) * u64::from(tail_id) + TAILS_BLOB_TAG.len() as u64;
        let tail_bytes = self.read(offset, TAIL_SIZE).map_err(|err| {
            error!("access_tail: {err}");
            self.error.borrow_mut().replace(err);
            ClError::new(ClErrorKind::InvalidState, "Could not read from tails file")
        })?;
        let tail = Tail::from_bytes(&tail_bytes)?;
        accessor(&tail);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn tails_hash(bytes: &[u8]) -> String {
        bs58::encode(Sha256::digest(bytes)).into_string()
    }

    /// Writes `bytes` into a fresh directory and returns the directory with the file path.
    fn tails_file(bytes: &[u8]) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tails");
        fs::write(&path, bytes).unwrap();
        (dir, path)
    }

    fn tails_bytes(tails: &[&[u8]]) -> Vec<u8> {
        let mut bytes = TAILS_BLOB_TAG.to_vec();
        for tail in tails {
            bytes.extend_from_slice(tail);
        }
        bytes
    }

    #[test]
    fn rejects_missing_version_tag() {
        for bytes in [vec![1u8, 2, 3], vec![0u8]] {
            let (_dir, path) = tails_file(&bytes);
            let err = TailsFileReader::open(&path, &tails_hash(&bytes)).unwrap_err();
            assert!(matches!(err, RevocationError::TailsAccess(_)));
        }
    }

    #[test]
    fn rejects_hash_mismatch() {
        let (_dir, path) = tails_file(&tails_bytes(&[&[7u8; TAIL_SIZE]]));
        let err = TailsFileReader::open(&path, "not-the-hash").unwrap_err();
        assert!(matches!(err, RevocationError::TailsAccess(_)));
    }

    #[test]
    fn serves_byte_ranges_after_tag() {
        let bytes = tails_bytes(&[&[1u8; TAIL_SIZE], &[2u8; TAIL_SIZE]]);
        let (_dir, path) = tails_file(&bytes);
        let reader = TailsFileReader::open(&path, &tails_hash(&bytes)).unwrap();
        assert_eq!(reader.tails_count(), 2);

        let offset = (TAILS_BLOB_TAG.len() + TAIL_SIZE) as u64;
        let second = reader.read(offset, TAIL_SIZE).unwrap();
        assert!(second.iter().all(|b| *b == 2));
        // Reads seek, so an earlier range can follow a later one.
        let first = reader.read(TAILS_BLOB_TAG.len() as u64, TAIL_SIZE).unwrap();
        assert!(first.iter().all(|b| *b == 1));
        assert!(matches!(
            reader.read(offset, TAIL_SIZE + 1),
            Err(RevocationError::TailsAccess(_))
        ));
    }

    #[test]
    fn missing_file_is_a_tails_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TailsFileReader::open(dir.path().join("absent"), "hash").unwrap_err();
        assert!(matches!(err, RevocationError::TailsAccess(_)));
    }

    #[test]
    fn out_of_range_tail_is_recorded() {
        let bytes = tails_bytes(&[]);
        let (_dir, path) = tails_file(&bytes);
        let reader = TailsFileReader::open(&path, &tails_hash(&bytes)).unwrap();
        assert!(reader.access_tail(3, &mut |_| {}).is_err());
        assert!(matches!(
            reader.take_error(),
            Some(RevocationError::TailsAccess(_))
        ));
        assert!(reader.take_error().is_none());
    }
}
