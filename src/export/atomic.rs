use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use super::error::ExportError;

/// Write `path` all-or-nothing.
///
/// `body` writes into a temporary file created next to `path`; only when it
/// returns `Ok` and the buffer flushes is the file renamed over `path`. On any
/// error the temporary file is removed and `path` is left untouched.
pub(crate) fn write_atomically<F, T>(path: &Path, body: F) -> Result<T, ExportError>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<T, ExportError>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".tofcal-")
        .suffix(".tmp")
        .tempfile_in(dir)?;

    let value = {
        let mut writer = BufWriter::new(&mut temp);
        let value = body(&mut writer)?;
        writer.flush()?;
        value
    };
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| ExportError::PersistFailed {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_commits_on_success() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_atomically(&path, |w| {
            w.write_all(b"hello")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_failure_leaves_no_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let result: Result<(), ExportError> = write_atomically(&path, |w| {
            w.write_all(b"partial")?;
            Err(ExportError::ColumnMismatch {
                mass: 1,
                intensity: 2,
            })
        });
        assert!(result.is_err());
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failure_keeps_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "old").unwrap();
        let _ = write_atomically::<_, ()>(&path, |_| {
            Err(ExportError::ColumnMismatch {
                mass: 0,
                intensity: 1,
            })
        });
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
    }
}
