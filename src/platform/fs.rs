// ErrHarvest - platform/fs.rs
//
// Filesystem helpers shared by the tailer and the persistence layer.

use std::io;
use std::path::Path;

/// Read the full content of a file as a string.
///
/// For files with invalid UTF-8, uses lossy conversion so a single bad byte
/// in a log never stalls harvesting.
pub fn read_file_lossy(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Split text into lines, keeping each line's terminator.
///
/// A final line without a trailing newline is still a line. Empty input
/// yields no lines.
pub fn split_lines_keep_ends(content: &str) -> Vec<String> {
    content.split_inclusive('\n').map(str::to_string).collect()
}

/// Write `bytes` to `path` atomically (write temp, then rename).
///
/// Creates parent directories as needed. A crash between write and rename
/// loses the new content but never corrupts the previous file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    std::fs::write(tmp, bytes)?;
    std::fs::rename(tmp, path).map_err(|e| {
        // Clean up the temp file on failure; ignore any secondary error.
        let _ = std::fs::remove_file(tmp);
        e
    })
}
