//! Cache command - inspect or populate the fly binary cache

use crate::cache::BinaryCache;
use crate::cli::args::{CacheAction, CacheArgs};
use crate::error::{CupError, CupResult};

/// Execute the cache command
pub async fn execute(args: CacheArgs) -> CupResult<()> {
    let cache = BinaryCache::new()?;

    match args.action {
        CacheAction::Path { url } => {
            let path = cache.entry_path(&url);
            let state = if path.exists() { "cached" } else { "missing" };
            println!("{}\t{}", path.display(), state);
        }
        CacheAction::Fetch { url } => {
            let path = tokio::task::spawn_blocking(move || cache.acquire(&url))
                .await
                .map_err(|e| CupError::Internal(format!("download task failed: {}", e)))??;
            println!("{}", path.display());
        }
    }
    Ok(())
}
