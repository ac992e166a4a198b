//! Engine configuration types.
//!
//! [`EngineConfig`] is the single source of truth for all runtime settings.
//! It is populated from CLI arguments in `main.rs` (with environment-variable
//! fallbacks) or from defaults in tests; nothing in the library reads the
//! environment directly.

use std::path::PathBuf;

/// Which inter-process conduit carries the control/status traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelFlavor {
    /// Length-prefixed frames on stdin, status frames on a FIFO.
    Pipe,
    /// One message per datagram on a pair of local sockets.
    Socket,
}

/// All runtime configuration for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The channel flavor selected at start-up.
    pub flavor: ChannelFlavor,
    /// Directory holding the per-driver channel endpoints.
    pub runtime_dir: PathBuf,
    /// When false, status publishing is a silent no-op; inbound commands are
    /// unaffected.
    pub status_enabled: bool,
    /// Fixed multiplier converting command time units to engine frames.
    pub time_scale: f64,
    /// Whether to attach the synchronization peer.
    pub peer_enabled: bool,
    /// Process id of the driver.  Channel endpoint names derive from it so a
    /// driver can run several engines side by side.
    pub driver_pid: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flavor: ChannelFlavor::Pipe,
            runtime_dir: PathBuf::from("/tmp"),
            status_enabled: true,
            time_scale: 1.0,
            peer_enabled: false,
            driver_pid: std::os::unix::process::parent_id(),
        }
    }
}

impl EngineConfig {
    /// FIFO carrying status frames in the pipe flavor.
    pub fn status_pipe_path(&self) -> PathBuf {
        self.runtime_dir.join(format!("jog-status-{}", self.driver_pid))
    }

    /// Datagram socket the engine binds to receive commands.
    pub fn control_socket_path(&self) -> PathBuf {
        self.runtime_dir
            .join(format!("jog-ctl-{}.sock", self.driver_pid))
    }

    /// Datagram socket the engine binds to send status from.
    pub fn status_socket_path(&self) -> PathBuf {
        self.runtime_dir
            .join(format!("jog-status-{}.sock", self.driver_pid))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
