use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Read a whole UTF-8 file; a missing file is `Ok(None)`.
pub async fn read_optional<P: AsRef<Path> + std::fmt::Debug>(
    path: P,
) -> std::io::Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write raw string data to a file, overwriting any existing content and
/// creating missing parent directories.
#[tracing::instrument(name = "Writing file", level = "trace", skip(data))]
pub async fn write_file<P: AsRef<Path> + std::fmt::Debug>(
    output: P,
    data: &str,
) -> std::io::Result<()> {
    if let Some(parent) = output.as_ref().parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(output)
        .await?;
    file.write_all(data.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_optional(dir.path().join("absent.md")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_creates_parents_and_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/out.md");
        write_file(&path, "long content").await.unwrap();
        write_file(&path, "short").await.unwrap();
        assert_eq!(read_optional(&path).await.unwrap().as_deref(), Some("short"));
    }
}
