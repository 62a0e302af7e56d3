use clap::Parser;
use parking_lot::Mutex;
use rtsp_client::{
    Client, ClientConfig, DescribeInfo, FatalCondition, FrameCache, SessionListener, SessionState,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(
    name = "rtsp-client",
    about = "RTSP/RTP client for Motion JPEG streams"
)]
struct Args {
    /// RTSP server address (host:port)
    #[arg(long, short, default_value = "127.0.0.1:8554")]
    server: String,

    /// Local RTP port advertised to the server
    #[arg(long, short = 'p', default_value_t = 25000)]
    rtp_port: u16,

    /// Video resource to request
    #[arg(long, short, default_value = "movie.Mjpeg")]
    resource: String,

    /// Seconds to play before tearing down
    #[arg(long, short = 't', default_value_t = 10)]
    duration: u64,

    /// Send DESCRIBE once the session is set up
    #[arg(long)]
    describe: bool,

    /// Directory for the frame cache file
    #[arg(long, default_value_os_t = std::env::temp_dir())]
    cache_dir: PathBuf,
}

/// Writes every accepted frame to the cache file and logs the rest.
struct CacheWriter {
    dir: PathBuf,
    cache: Mutex<Option<FrameCache>>,
    failed: Mutex<Option<FatalCondition>>,
}

impl CacheWriter {
    fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            cache: Mutex::new(None),
            failed: Mutex::new(None),
        }
    }

    fn open(&self, session_id: u64) {
        *self.cache.lock() = Some(FrameCache::new(&self.dir, session_id));
    }

    fn remove(&self) {
        if let Some(cache) = self.cache.lock().take()
            && let Err(e) = cache.remove()
        {
            tracing::warn!(path = %cache.path().display(), error = %e, "failed to remove frame cache");
        }
    }
}

impl SessionListener for CacheWriter {
    fn on_frame(&self, sequence: u16, payload: &[u8]) {
        let cache = self.cache.lock();
        let Some(cache) = cache.as_ref() else {
            return;
        };
        match cache.write_frame(payload) {
            Ok(path) => tracing::debug!(sequence, path = %path.display(), "frame cached"),
            Err(e) => tracing::warn!(sequence, error = %e, "failed to cache frame"),
        }
    }

    fn on_state_changed(&self, state: SessionState) {
        tracing::info!(?state, "session state changed");
    }

    fn on_describe_info(&self, info: &DescribeInfo) {
        println!("Protocol: {}", info.protocol);
        println!("Media type: {}", info.media_type);
    }

    fn on_fatal(&self, condition: &FatalCondition) {
        eprintln!("{condition}");
        self.failed.lock().get_or_insert_with(|| condition.clone());
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let config = ClientConfig {
        server_addr: args.server,
        resource: args.resource,
        rtp_port: args.rtp_port,
        ..ClientConfig::default()
    };

    let listener = Arc::new(CacheWriter::new(args.cache_dir));
    let client = match Client::connect(config, listener.clone()) {
        Ok(client) => client,
        Err(_) => return ExitCode::FAILURE,
    };

    client.request_setup();
    if !client.wait_for_reply(REPLY_TIMEOUT) || client.state() != SessionState::Ready {
        eprintln!("SETUP was not acknowledged");
        return ExitCode::FAILURE;
    }
    listener.open(client.session_id());

    if args.describe {
        client.request_describe();
        client.wait_for_reply(REPLY_TIMEOUT);
    }

    if listener.failed.lock().is_none() && client.request_play() {
        client.wait_for_reply(REPLY_TIMEOUT);
        thread::sleep(Duration::from_secs(args.duration));

        let stats = client.stats();
        println!(
            "Received {} frames, {} lost ({:.2}%), {:.0} bytes/s",
            stats.frame_number(),
            stats.lost_count(),
            stats.loss_rate() * 100.0,
            stats.data_rate()
        );
    }

    client.request_teardown();
    if !client.wait_for_teardown(REPLY_TIMEOUT) {
        tracing::warn!("TEARDOWN was not acknowledged");
    }
    client.shutdown();
    listener.remove();

    if listener.failed.lock().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
