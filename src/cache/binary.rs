//! Download-once cache for executables, keyed by source URL

use crate::cache::transport::{HttpResponse, Transport, UreqTransport};
use crate::error::{CupError, CupResult};
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const ZIP_CONTENT_TYPE: &str = "application/zip";

/// SHA-256 hex digest of a source URL, used as the entry file name
pub fn entry_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// Per-user cache of downloaded executables
#[derive(Clone)]
pub struct BinaryCache {
    dir: PathBuf,
    transport: Arc<dyn Transport>,
}

impl BinaryCache {
    /// Cache rooted in the platform's user cache directory
    pub fn new() -> CupResult<Self> {
        let root = dirs::cache_dir().ok_or(CupError::CacheDirUnavailable)?;
        Ok(Self::with_root(root))
    }

    /// Cache rooted at `root` (entries live in `root/concourse-up/bin`)
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            dir: root.into().join("concourse-up").join("bin"),
            transport: Arc::new(UreqTransport),
        }
    }

    /// Replace the HTTP transport
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Directory holding the cache entries
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location an entry for `url` has, whether or not it exists yet
    pub fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(entry_key(url))
    }

    /// Return the cached executable for `url`, downloading it on first use.
    ///
    /// Zip responses (by `.zip` suffix or `application/zip` content type)
    /// are unpacked and only their first entry is stored.
    pub fn acquire(&self, url: &str) -> CupResult<PathBuf> {
        self.ensure_dir()?;

        let path = self.entry_path(url);
        if path.exists() {
            debug!("Cache hit for {}: {}", url, path.display());
            return Ok(path);
        }

        let mut file = create_entry(&path)
            .map_err(|e| CupError::io(format!("creating cache entry {}", path.display()), e))?;

        match self.populate(url, &path, &mut file) {
            Ok(bytes) => {
                info!("Cached {} ({} bytes) at {}", url, bytes, path.display());
                Ok(path)
            }
            Err(err) => {
                drop(file);
                let cleanup = fs::remove_file(&path).err();
                Err(CupError::CacheFetch {
                    url: url.to_string(),
                    path,
                    source: Box::new(err),
                    cleanup,
                })
            }
        }
    }

    fn populate(&self, url: &str, path: &Path, file: &mut File) -> CupResult<u64> {
        let HttpResponse { content_type, body } = self.transport.get(url)?;

        let written = if is_zip(url, content_type.as_deref()) {
            extract_first_entry(url, body, file)?
        } else {
            let mut body = body;
            io::copy(&mut body, file)
                .map_err(|e| CupError::io(format!("writing {}", path.display()), e))?
        };

        file.sync_all()
            .map_err(|e| CupError::io(format!("syncing {}", path.display()), e))?;

        Ok(written)
    }

    fn ensure_dir(&self) -> CupResult<()> {
        if self.dir.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(&self.dir).map_err(|e| {
            CupError::io(format!("creating cache directory {}", self.dir.display()), e)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o700);
            fs::set_permissions(&self.dir, perms)
                .map_err(|e| CupError::io("setting cache directory permissions", e))?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for BinaryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryCache")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

/// Exclusively create an owner-only executable file
fn create_entry(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o700);
    }

    options.open(path)
}

fn is_zip(url: &str, content_type: Option<&str>) -> bool {
    if url.ends_with(".zip") {
        return true;
    }
    content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(ZIP_CONTENT_TYPE))
}

/// Buffer a zip body and copy its first entry into `file`.
///
/// Only entry zero is taken, whatever the archive holds after it.
fn extract_first_entry(url: &str, mut body: Box<dyn Read>, file: &mut File) -> CupResult<u64> {
    let mut buffer = Vec::new();
    body.read_to_end(&mut buffer)
        .map_err(|e| CupError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let archive_error = |reason: String| CupError::Archive {
        url: url.to_string(),
        reason,
    };

    let mut archive =
        zip::ZipArchive::new(Cursor::new(buffer)).map_err(|e| archive_error(e.to_string()))?;

    if archive.is_empty() {
        return Err(CupError::EmptyArchive {
            url: url.to_string(),
        });
    }

    let mut entry = archive
        .by_index(0)
        .map_err(|e| archive_error(e.to_string()))?;
    debug!("Extracting {} from {}", entry.name(), url);

    io::copy(&mut entry, file).map_err(|e| archive_error(e.to_string()))
}
