//! `hfd fetch` – one supervised download attempt; exits on a terminal state.

use anyhow::Result;
use hfd_core::checksum;
use hfd_core::config::HfdConfig;
use hfd_core::state::DownloadState;
use hfd_core::transport::LinkDriver;
use std::path::Path;

use crate::cli::indicator::ConsoleIndicator;

use super::build_session;

pub fn run_fetch(cfg: &HfdConfig, download_dir: &Path) -> Result<()> {
    let mut session = build_session(cfg, download_dir)?;
    let mut indicator = ConsoleIndicator::default();

    session.link.connect(&cfg.wifi)?;
    let flags = session.supervisor.run_until_terminal(
        &session.events,
        &mut session.link,
        &mut session.http,
        &mut session.sink,
        &mut indicator,
    );
    eprintln!();

    if !flags.is_set(DownloadState::COMPLETED) {
        anyhow::bail!("download canceled (non-success response from server)");
    }

    let digest = checksum::sha256_file(&session.target_path)?;
    println!("{}  {}", digest, session.target_path.display());
    Ok(())
}
