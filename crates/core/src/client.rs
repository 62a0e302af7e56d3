use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::listener::{FatalCondition, SessionListener};
use crate::protocol::{Method, RtspReply, RtspRequest};
use crate::session::{IgnoreReason, ReplyOutcome, Session, SessionState};
use crate::stats::ReceptionStats;
use crate::transport::tcp::{self, ControlReader, ControlWriter};
use crate::transport::udp::{self, DataReceiver};

/// The only two cross-thread signals.
#[derive(Debug, Default)]
pub struct Signals {
    pause_requested: AtomicBool,
    teardown_acknowledged: AtomicBool,
}

impl Signals {
    pub fn pause_requested(&self) -> bool {
        self.pause_requested.load(Ordering::SeqCst)
    }

    pub fn teardown_acknowledged(&self) -> bool {
        self.teardown_acknowledged.load(Ordering::SeqCst)
    }

    fn request_pause(&self) {
        self.pause_requested.store(true, Ordering::SeqCst);
    }

    fn clear_pause(&self) {
        self.pause_requested.store(false, Ordering::SeqCst);
    }

    fn acknowledge_teardown(&self) {
        self.teardown_acknowledged.store(true, Ordering::SeqCst);
    }
}

/// State shared by the caller and both worker threads.
///
/// Every lock is held for a single read or update; no socket call is made
/// while the session lock is held.
pub(crate) struct Shared {
    pub(crate) config: ClientConfig,
    pub(crate) session: Mutex<Session>,
    pub(crate) stats: Mutex<ReceptionStats>,
    pub(crate) signals: Signals,
    pub(crate) control: ControlWriter,
    pub(crate) listener: Arc<dyn SessionListener>,
    /// RTP receiver waiting for the next PLAY.
    pub(crate) parked: Mutex<Option<DataReceiver>>,
    pub(crate) data_task: Mutex<Option<JoinHandle<()>>>,
    /// CSeq of the last reply whose side effects have completed.
    answered: Mutex<u32>,
    answered_cond: Condvar,
}

impl Shared {
    fn prepare(&self, method: Method) -> Option<RtspRequest> {
        self.session.lock().prepare(method)
    }

    fn transmit(&self, request: &RtspRequest) -> bool {
        match self.control.send(request) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(method = %request.method, cseq = request.cseq, error = %e, "failed to send request");
                false
            }
        }
    }

    /// Apply one reply and run its side effects. Returns `true` when the
    /// control loop should exit.
    pub(crate) fn handle_reply(&self, reply: &RtspReply) -> bool {
        let (outcome, settled) = {
            let mut session = self.session.lock();
            let outcome = session.apply_reply(reply);
            // Visible to the data thread and to the next PLAY together with
            // the state change.
            match outcome {
                ReplyOutcome::Playing => self.stats.lock().reset(Instant::now()),
                ReplyOutcome::Paused => self.signals.request_pause(),
                _ => {}
            }
            (outcome, session.teardown_settled())
        };

        let answered = !matches!(
            outcome,
            ReplyOutcome::Ignored(
                IgnoreReason::NoOutstanding
                    | IgnoreReason::StaleSequence { .. }
                    | IgnoreReason::SessionMismatch { .. }
            )
        );

        match outcome {
            ReplyOutcome::Ignored(reason) => {
                tracing::debug!(?reason, cseq = reply.cseq, "reply ignored");
            }
            ReplyOutcome::SetupComplete { session_id } => {
                tracing::info!(session_id, "session established via SETUP");
                match DataReceiver::bind(&self.config) {
                    Ok(receiver) => *self.parked.lock() = Some(receiver),
                    Err(e) => {
                        tracing::error!(error = %e, "failed to open data channel");
                        self.listener.on_fatal(&FatalCondition::BindFailed {
                            port: self.config.rtp_port,
                            reason: e.to_string(),
                        });
                    }
                }
                self.listener.on_state_changed(SessionState::Ready);
            }
            ReplyOutcome::Playing => {
                tracing::info!("session started playing");
                self.listener.on_state_changed(SessionState::Playing);
            }
            ReplyOutcome::Paused => {
                tracing::info!("session paused");
                self.listener.on_state_changed(SessionState::Ready);
            }
            ReplyOutcome::TornDown => {
                {
                    let mut parked = self.parked.lock();
                    self.signals.acknowledge_teardown();
                    *parked = None;
                }
                tracing::info!("session terminated via TEARDOWN");
                self.listener.on_state_changed(SessionState::Init);
            }
            ReplyOutcome::Described(Some(info)) => {
                tracing::info!(protocol = %info.protocol, media_type = %info.media_type, "DESCRIBE");
                self.listener.on_describe_info(&info);
            }
            ReplyOutcome::Described(None) => {
                tracing::warn!("DESCRIBE reply without metadata lines");
            }
            ReplyOutcome::NotFound(method) => {
                tracing::warn!(%method, resource = %self.config.resource, "server reports resource not found");
                self.listener.on_fatal(&FatalCondition::FileNotFound {
                    resource: self.config.resource.clone(),
                });
                if let Some(request) = self.prepare(Method::Teardown) {
                    self.transmit(&request);
                }
            }
        }

        if answered {
            let mut last = self.answered.lock();
            *last = (*last).max(reply.cseq);
            self.answered_cond.notify_all();
        }

        settled
    }
}

/// RTSP client for one streaming session.
///
/// Owns the control connection and two worker threads: the control
/// receive loop (started by the first request sent, normally SETUP) and
/// the RTP receive loop (started by each PLAY). User intent enters through
/// the `request_*` methods, which are no-ops unless the session state
/// permits them; events leave through the [`SessionListener`].
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use rtsp_client::{Client, ClientConfig, NoopListener};
///
/// let client = Client::connect(ClientConfig::default(), Arc::new(NoopListener)).unwrap();
/// client.request_setup();
/// client.wait_for_reply(Duration::from_secs(2));
/// client.request_play();
/// ```
pub struct Client {
    shared: Arc<Shared>,
    reader: Mutex<Option<ControlReader>>,
    control_task: Mutex<Option<JoinHandle<()>>>,
}

impl Client {
    /// Connect the control channel. A failure is reported once to
    /// [`SessionListener::on_fatal`] and returned.
    pub fn connect(config: ClientConfig, listener: Arc<dyn SessionListener>) -> Result<Self> {
        let (writer, reader) = match tcp::connect(&config) {
            Ok(halves) => halves,
            Err(e) => {
                tracing::error!(addr = %config.server_addr, error = %e, "connection failed");
                listener.on_fatal(&FatalCondition::ConnectFailed {
                    addr: config.server_addr.clone(),
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        let shared = Shared {
            session: Mutex::new(Session::new(&config)),
            stats: Mutex::new(ReceptionStats::new(Instant::now())),
            signals: Signals::default(),
            control: writer,
            listener,
            parked: Mutex::new(None),
            data_task: Mutex::new(None),
            answered: Mutex::new(0),
            answered_cond: Condvar::new(),
            config,
        };

        Ok(Self {
            shared: Arc::new(shared),
            reader: Mutex::new(Some(reader)),
            control_task: Mutex::new(None),
        })
    }

    /// Send SETUP (valid from INIT). Returns whether a request was sent.
    pub fn request_setup(&self) -> bool {
        self.send(Method::Setup)
    }

    /// Send PLAY (valid from READY) and start the RTP receive thread.
    pub fn request_play(&self) -> bool {
        self.send(Method::Play)
    }

    /// Send PAUSE (valid from PLAYING).
    pub fn request_pause(&self) -> bool {
        self.send(Method::Pause)
    }

    /// Send TEARDOWN (valid from any state).
    pub fn request_teardown(&self) -> bool {
        self.send(Method::Teardown)
    }

    /// Send DESCRIBE (valid from READY or PLAYING).
    pub fn request_describe(&self) -> bool {
        self.send(Method::Describe)
    }

    fn send(&self, method: Method) -> bool {
        let Some(request) = self.shared.prepare(method) else {
            return false;
        };

        if !self.shared.transmit(&request) {
            return false;
        }
        if method == Method::Play {
            self.start_receiver();
        }
        self.spawn_control_task();
        true
    }

    fn spawn_control_task(&self) {
        let Some(reader) = self.reader.lock().take() else {
            return;
        };
        let shared = self.shared.clone();
        *self.control_task.lock() = Some(thread::spawn(move || {
            tcp::receive_loop(reader, shared);
        }));
    }

    /// Start (or keep) the RTP receive thread for a PLAY.
    fn start_receiver(&self) {
        let mut task = self.shared.data_task.lock();
        if let Some(handle) = task.take() {
            if !handle.is_finished() && !self.shared.signals.pause_requested() {
                *task = Some(handle);
                return;
            }
            // Exits within one receive timeout once pause is raised.
            if handle.join().is_err() {
                tracing::warn!("RTP receive thread panicked");
            }
        }

        let Some(receiver) = self.shared.parked.lock().take() else {
            tracing::warn!("PLAY without a bound RTP socket; no media will be received");
            return;
        };

        self.shared.signals.clear_pause();
        let shared = self.shared.clone();
        *task = Some(thread::spawn(move || {
            udp::receive_loop(receiver, shared);
        }));
    }

    /// Block until the most recent request has been answered and its side
    /// effects applied, or `timeout` passes. Returns whether it was answered.
    pub fn wait_for_reply(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let target = self.shared.session.lock().cseq();
        let mut answered = self.shared.answered.lock();
        while *answered < target {
            if self
                .shared
                .answered_cond
                .wait_until(&mut answered, deadline)
                .timed_out()
            {
                return *answered >= target;
            }
        }
        true
    }

    /// Block until teardown has been acknowledged and both channels are
    /// closed, or `timeout` passes.
    pub fn wait_for_teardown(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_closed() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    fn is_closed(&self) -> bool {
        let finished = |task: &Mutex<Option<JoinHandle<()>>>| {
            task.lock().as_ref().is_none_or(|handle| handle.is_finished())
        };
        self.shared.signals.teardown_acknowledged()
            && self.shared.control.is_closed()
            && finished(&self.control_task)
            && finished(&self.shared.data_task)
            && self.shared.parked.lock().is_none()
    }

    pub fn state(&self) -> SessionState {
        self.shared.session.lock().state()
    }

    /// Server-assigned session id, 0 until SETUP is acknowledged.
    pub fn session_id(&self) -> u64 {
        self.shared.session.lock().session_id()
    }

    /// Snapshot of the reception statistics.
    pub fn stats(&self) -> ReceptionStats {
        self.shared.stats.lock().clone()
    }

    pub fn signals(&self) -> &Signals {
        &self.shared.signals
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Stop both worker threads and close the control channel. Idempotent;
    /// also run on drop.
    pub fn shutdown(&self) {
        self.shared.signals.request_pause();
        self.shared.control.close();

        if let Some(handle) = self.control_task.lock().take()
            && handle.join().is_err()
        {
            tracing::warn!("control receive thread panicked");
        }
        if let Some(handle) = self.shared.data_task.lock().take()
            && handle.join().is_err()
        {
            tracing::warn!("RTP receive thread panicked");
        }
        self.shared.parked.lock().take();
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, TcpListener};

    use super::*;
    use crate::listener::NoopListener;

    fn ready_client(server: &TcpListener) -> Client {
        let config = ClientConfig {
            server_addr: server.local_addr().unwrap().to_string(),
            rtp_bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            rtp_port: 0,
            ..ClientConfig::default()
        };
        let client = Client::connect(config, Arc::new(NoopListener)).unwrap();

        assert!(client.request_setup());
        let ack = RtspReply::parse("RTSP/1.0 200 OK\nCSeq: 1\nSession: 77\n\n").unwrap();
        client.shared.handle_reply(&ack);
        assert_eq!(client.state(), SessionState::Ready);
        client
    }

    #[test]
    fn failed_play_leaves_receiver_parked() {
        let server = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = ready_client(&server);
        let (_peer, _) = server.accept().unwrap();
        assert!(client.shared.parked.lock().is_some());

        client.shared.control.close();
        assert!(!client.request_play());
        assert!(client.shared.parked.lock().is_some());
        assert!(client.shared.data_task.lock().is_none());
    }
}
