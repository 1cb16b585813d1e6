//! `rv lock-status`

use anyhow::Result;

use super::Context;
use crate::core::lock::LockError;
use crate::ui::output;

/// Report whether another process holds the repository lock.
///
/// Probes by taking the lock and releasing it straight away.
pub fn lock_status(ctx: &Context) -> Result<()> {
    let mut repo = ctx.open()?;
    let path = repo.paths().lock_path();

    match repo.lock() {
        Ok(()) => {
            repo.unlock()?;
            println!("unlocked");
        }
        Err(LockError::Held { holder, .. }) => {
            match holder {
                Some(holder) => println!("locked by {}", holder),
                None => println!("locked"),
            }
            output::print(format!("lock file: {}", path.display()), ctx.verbosity);
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
