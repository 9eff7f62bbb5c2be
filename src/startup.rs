//! Startup sequence
//!
//! Opens the log and replays it under the retry and deadline policy, cuts
//! off a torn tail, and hands back a live engine primed with the recovered
//! state. Nothing here touches the network; a failure means the listener is
//! never opened.

use std::sync::Arc;

use crate::aof::{Aof, TailState};
use crate::config::Config;
use crate::engine::Engine;
use crate::error::{KvError, Result};
use crate::network::Server;
use crate::recovery::{ReplayReport, Replayer};
use crate::util::{retry, with_timeout};

/// Recover state from the configured log and return the live engine
///
/// Opening and replaying the log both count against the recovery deadline.
/// A corrupt record with intact frames after it aborts startup and leaves
/// the file as it is.
pub fn recover_engine(config: &Config) -> Result<(Arc<Engine>, ReplayReport)> {
    config.validate()?;

    let path = config.storage_file_path.clone();
    let policy = config.retry_policy();

    let (aof, recovered, report) = with_timeout("recovery", config.recovery_timeout(), move || {
        let aof = retry("open log", &policy, || Aof::open(&path))?;
        let replayer = Replayer::new(Engine::recovering());
        let report = retry("recovery", &policy, || replayer.recover(&path))?;
        Ok((aof, replayer.into_engine(), report))
    })?;

    match report.tail {
        TailState::Clean => {}
        TailState::Torn => {
            tracing::warn!(
                path = %aof.path().display(),
                keep = report.valid_bytes,
                drop = report.truncated_bytes,
                "Truncating torn tail before accepting writes"
            );
            aof.truncate(report.valid_bytes)?;
        }
        TailState::Corrupt => {
            tracing::error!(
                path = %aof.path().display(),
                offset = report.valid_bytes,
                unread = report.truncated_bytes,
                "Corrupt record in append-only log"
            );
            return Err(KvError::Persistence(format!(
                "corrupt record in {} at byte {}; {} bytes after it were not replayed",
                aof.path().display(),
                report.valid_bytes,
                report.truncated_bytes
            )));
        }
    }

    let live = Engine::live(Arc::new(aof));
    live.prime_from(recovered);

    Ok((Arc::new(live), report))
}

/// Full startup: recovery first, then bind
pub fn start(config: Config) -> Result<Server> {
    let (engine, report) = recover_engine(&config)?;
    tracing::info!(
        path = %config.storage_file_path.display(),
        keys = report.keys,
        bytes = engine.memory_size(),
        "Recovery complete"
    );
    Server::bind(config, engine)
}
