mod checksum;
mod fetch;
mod run;

pub use checksum::run_checksum;
pub use fetch::run_fetch;
pub use run::run_supervised;

use anyhow::Result;
use hfd_core::clock::SystemClock;
use hfd_core::config::HfdConfig;
use hfd_core::dispatcher::Dispatcher;
use hfd_core::event::{Event, HttpRequest};
use hfd_core::storage::{self, FileStore};
use hfd_core::supervisor::Supervisor;
use hfd_core::transport::{CurlHttpClient, HostLink};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

/// Everything a supervised download needs, wired to the same event channel.
pub(crate) struct Session {
    pub events: Receiver<Event>,
    pub link: HostLink,
    pub http: CurlHttpClient,
    pub sink: FileStore,
    pub supervisor: Supervisor<SystemClock>,
    pub target_path: PathBuf,
}

/// Build the collaborator set and supervisor for the configured URL.
pub(crate) fn build_session(cfg: &HfdConfig, download_dir: &Path) -> Result<Session> {
    let (tx, rx) = mpsc::channel();
    let http = CurlHttpClient::new(tx.clone(), cfg.receive_buffer_threshold);
    let link = HostLink::new(tx);

    let filename = storage::derive_filename(&cfg.url);
    let sink = FileStore::create(download_dir, &filename)?;
    let target_path = sink.final_path().to_path_buf();

    let dispatcher = Dispatcher::new(
        HttpRequest::get(&cfg.url),
        cfg.wifi.clone(),
        cfg.receive_buffer_threshold,
    );
    let supervisor = Supervisor::new(dispatcher, SystemClock::new(), cfg.timers);

    Ok(Session {
        events: rx,
        link,
        http,
        sink,
        supervisor,
        target_path,
    })
}
