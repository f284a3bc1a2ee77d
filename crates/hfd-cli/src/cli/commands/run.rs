//! `hfd run` – the supervised loop with stall recovery and periodic
//! re-download, mirroring the embedded deployment. Runs until interrupted.

use anyhow::Result;
use hfd_core::config::HfdConfig;
use hfd_core::transport::LinkDriver;
use std::path::Path;

use crate::cli::indicator::ConsoleIndicator;

use super::build_session;

pub fn run_supervised(cfg: &HfdConfig, download_dir: &Path) -> Result<()> {
    let mut session = build_session(cfg, download_dir)?;
    let mut indicator = ConsoleIndicator::default();

    tracing::info!(url = %cfg.url, dir = %download_dir.display(), "starting supervised loop");
    session.link.connect(&cfg.wifi)?;
    session.supervisor.run(
        &session.events,
        &mut session.link,
        &mut session.http,
        &mut session.sink,
        &mut indicator,
    )
}
