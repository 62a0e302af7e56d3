//! Client-side RTSP session state machine (RFC 2326 §A.1).
//!
//! The session is a single mutable record: playback state, the CSeq
//! counter, the server-assigned session id, and the one outstanding
//! request. It performs no I/O. [`Session::prepare`] decides whether a
//! request may be sent and builds it; [`Session::apply_reply`] decides
//! whether a reply matches and applies its transition.
//!
//! ## Transitions
//!
//! ```text
//! SETUP     INIT    -> READY    (assigns session id, opens data channel)
//! PLAY      READY   -> PLAYING  (restarts reception statistics)
//! PAUSE     PLAYING -> READY    (suspends the data receiver)
//! TEARDOWN  any     -> INIT     (acknowledges teardown, closes channels)
//! DESCRIBE  READY | PLAYING     (state unchanged)
//! ```
//!
//! Requests from any other state are dropped without sending anything.
//! A reply is applied only when its CSeq matches the outstanding request,
//! its session id matches (or the id is still unset and this answers
//! SETUP), and its status is 200. Anything else is ignored. A reply for
//! another session leaves the request outstanding; a non-200 reply for
//! this session settles it without a transition.

use crate::config::ClientConfig;
use crate::protocol::{DescribeInfo, Method, MethodHeader, RtspReply, RtspRequest};

/// Playback state of the client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session negotiated yet (or torn down).
    Init,
    /// SETUP acknowledged; data socket bound, not receiving.
    Ready,
    /// Media is being received.
    Playing,
}

impl SessionState {
    /// Whether `method` may be sent from this state.
    pub fn permits(self, method: Method) -> bool {
        match method {
            Method::Setup => self == Self::Init,
            Method::Play => self == Self::Ready,
            Method::Pause => self == Self::Playing,
            Method::Teardown => true,
            Method::Describe => self != Self::Init,
        }
    }
}

/// The request currently awaiting its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outstanding {
    pub method: Method,
    pub cseq: u32,
}

/// Why a reply was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No request is awaiting a reply.
    NoOutstanding,
    /// CSeq does not match the outstanding request.
    StaleSequence { expected: u32, got: u32 },
    /// Session id does not match the negotiated one.
    SessionMismatch { expected: u64, got: Option<u64> },
    /// Matched, but the server did not answer 200.
    Status(u16),
}

/// Result of [`Session::apply_reply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Ignored(IgnoreReason),
    /// SETUP acknowledged; state is READY.
    SetupComplete { session_id: u64 },
    /// PLAY acknowledged; state is PLAYING.
    Playing,
    /// PAUSE acknowledged; state is READY.
    Paused,
    /// TEARDOWN acknowledged; state is INIT.
    TornDown,
    /// DESCRIBE acknowledged. `None` when the body lacked the metadata lines.
    Described(Option<DescribeInfo>),
    /// The server reported the resource missing in reply to `method`.
    NotFound(Method),
}

/// Client-side session record.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    cseq: u32,
    session_id: u64,
    last_request: Option<Method>,
    outstanding: Option<Outstanding>,
    teardown_acknowledged: bool,
    resource: String,
    version: String,
    transport: String,
    client_port: u16,
}

impl Session {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            state: SessionState::Init,
            cseq: 0,
            session_id: 0,
            last_request: None,
            outstanding: None,
            teardown_acknowledged: false,
            resource: config.resource.clone(),
            version: config.rtsp_version.clone(),
            transport: config.transport.clone(),
            client_port: config.rtp_port,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// CSeq of the most recently sent request (0 before the first).
    pub fn cseq(&self) -> u32 {
        self.cseq
    }

    /// Server-assigned session id, 0 until SETUP is acknowledged.
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn last_request(&self) -> Option<Method> {
        self.last_request
    }

    pub fn outstanding(&self) -> Option<Outstanding> {
        self.outstanding
    }

    pub fn teardown_acknowledged(&self) -> bool {
        self.teardown_acknowledged
    }

    /// Whether the last request sent was TEARDOWN and it has been answered.
    pub fn teardown_settled(&self) -> bool {
        self.last_request == Some(Method::Teardown) && self.outstanding.is_none()
    }

    /// Build the next request for `method`, or `None` if it must be dropped.
    ///
    /// Dropped when the current state does not permit `method`, when another
    /// request is still outstanding (TEARDOWN excepted, it supersedes), or
    /// once teardown has been acknowledged. Otherwise the CSeq counter is
    /// incremented and the request becomes the outstanding one.
    pub fn prepare(&mut self, method: Method) -> Option<RtspRequest> {
        if self.teardown_acknowledged {
            tracing::debug!(%method, "request dropped: session already torn down");
            return None;
        }
        if !self.state.permits(method) {
            tracing::debug!(%method, state = ?self.state, "request dropped: not valid in state");
            return None;
        }
        if let Some(pending) = self.outstanding
            && method != Method::Teardown
        {
            tracing::debug!(%method, pending = %pending.method, cseq = pending.cseq, "request dropped: reply outstanding");
            return None;
        }

        self.cseq += 1;
        self.last_request = Some(method);
        self.outstanding = Some(Outstanding {
            method,
            cseq: self.cseq,
        });

        let header = match method {
            Method::Setup => MethodHeader::Transport {
                transport: self.transport.clone(),
                client_port: self.client_port,
            },
            _ => MethodHeader::Session(self.session_id),
        };

        Some(RtspRequest {
            method,
            resource: self.resource.clone(),
            version: self.version.clone(),
            cseq: self.cseq,
            header,
        })
    }

    /// Match a reply against the outstanding request and apply it.
    pub fn apply_reply(&mut self, reply: &RtspReply) -> ReplyOutcome {
        let Some(pending) = self.outstanding else {
            return ReplyOutcome::Ignored(IgnoreReason::NoOutstanding);
        };

        if reply.cseq != pending.cseq {
            return ReplyOutcome::Ignored(IgnoreReason::StaleSequence {
                expected: pending.cseq,
                got: reply.cseq,
            });
        }

        if !reply.is_success() && reply.is_not_found() {
            self.outstanding = None;
            return ReplyOutcome::NotFound(pending.method);
        }

        let session_matches = match reply.session {
            Some(id) if id == self.session_id => true,
            Some(_) => self.session_id == 0 && pending.method == Method::Setup,
            None => false,
        };
        if !session_matches {
            return ReplyOutcome::Ignored(IgnoreReason::SessionMismatch {
                expected: self.session_id,
                got: reply.session,
            });
        }

        // Answered by our session, whatever the status.
        self.outstanding = None;

        if !reply.is_success() {
            return ReplyOutcome::Ignored(IgnoreReason::Status(reply.status_code));
        }

        match pending.method {
            Method::Setup => {
                if let Some(id) = reply.session
                    && self.session_id == 0
                {
                    self.session_id = id;
                }
                self.transition(SessionState::Ready);
                ReplyOutcome::SetupComplete {
                    session_id: self.session_id,
                }
            }
            Method::Play => {
                self.transition(SessionState::Playing);
                ReplyOutcome::Playing
            }
            Method::Pause => {
                self.transition(SessionState::Ready);
                ReplyOutcome::Paused
            }
            Method::Teardown => {
                self.transition(SessionState::Init);
                self.teardown_acknowledged = true;
                ReplyOutcome::TornDown
            }
            Method::Describe => ReplyOutcome::Described(reply.describe_info()),
        }
    }

    fn transition(&mut self, state: SessionState) {
        tracing::debug!(session_id = self.session_id, old_state = ?self.state, new_state = ?state, "state transition");
        self.state = state;
    }
}
