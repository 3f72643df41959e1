use std::collections::HashMap;
use std::io;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use shortlist_core::{Effect, FailureKind, JobId, Msg, SyncFailure};
use shortlist_logging::shortlist_debug;
use tokio_util::sync::CancellationToken;

use crate::api::ShortlistApi;

enum SyncCommand {
    Toggle { job_id: JobId, seq: u64 },
    FetchShortlist,
}

type InFlight = Arc<Mutex<HashMap<JobId, (u64, CancellationToken)>>>;

/// Runs store effects against the server on a background runtime.
///
/// Submitting never blocks on the network; results come back as [`Msg`]s via
/// [`SyncHandle::try_recv`]. A newer toggle of an identifier cancels the one
/// still in flight for it.
pub struct SyncHandle {
    cmd_tx: mpsc::Sender<SyncCommand>,
    msg_rx: mpsc::Receiver<Msg>,
}

impl SyncHandle {
    pub fn new(api: Arc<dyn ShortlistApi>) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (msg_tx, msg_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        thread::spawn(move || {
            let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));
            while let Ok(command) = cmd_rx.recv() {
                let api = api.clone();
                let msg_tx = msg_tx.clone();
                match command {
                    SyncCommand::Toggle { job_id, seq } => {
                        let token = track(&in_flight, &job_id, seq);
                        let in_flight = in_flight.clone();
                        runtime.spawn(async move {
                            run_toggle(api.as_ref(), job_id, seq, token, &in_flight, msg_tx)
                                .await;
                        });
                    }
                    SyncCommand::FetchShortlist => {
                        runtime.spawn(async move {
                            let result = api.fetch_shortlist().await;
                            if msg_tx.send(Msg::ServerShortlistFetched(result)).is_err() {
                                shortlist_debug!("Dropping shortlist fetch result: handle closed");
                            }
                        });
                    }
                }
            }
        });

        Ok(Self { cmd_tx, msg_rx })
    }

    pub fn submit(&self, effects: Vec<Effect>) {
        for effect in effects {
            let command = match effect {
                Effect::SyncToggle { job_id, seq } => SyncCommand::Toggle { job_id, seq },
                Effect::FetchServerShortlist => SyncCommand::FetchShortlist,
            };
            if self.cmd_tx.send(command).is_err() {
                shortlist_debug!("Sync worker stopped; effect not submitted");
            }
        }
    }

    pub fn try_recv(&self) -> Option<Msg> {
        self.msg_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Msg> {
        self.msg_rx.recv_timeout(timeout).ok()
    }
}

fn track(in_flight: &InFlight, job_id: &str, seq: u64) -> CancellationToken {
    let token = CancellationToken::new();
    let Ok(mut map) = in_flight.lock() else {
        return token;
    };
    if let Some((previous_seq, previous)) = map.insert(job_id.to_string(), (seq, token.clone())) {
        shortlist_debug!(
            "Cancelling sync of {} (seq {}) in favour of seq {}",
            job_id,
            previous_seq,
            seq
        );
        previous.cancel();
    }
    token
}

async fn run_toggle(
    api: &dyn ShortlistApi,
    job_id: JobId,
    seq: u64,
    token: CancellationToken,
    in_flight: &InFlight,
    msg_tx: mpsc::Sender<Msg>,
) {
    let outcome = tokio::select! {
        _ = token.cancelled() => Err(SyncFailure::new(
            FailureKind::Cancelled,
            "superseded by a newer toggle",
        )),
        result = api.toggle(&job_id) => result,
    };

    if let Ok(mut map) = in_flight.lock() {
        if map.get(&job_id).is_some_and(|(current, _)| *current == seq) {
            map.remove(&job_id);
        }
    }
    let msg = Msg::ToggleSynced {
        job_id: job_id.clone(),
        seq,
        outcome,
    };
    if msg_tx.send(msg).is_err() {
        shortlist_debug!("Dropping sync result for {} (seq {}): handle closed", job_id, seq);
    }
}
