//! Passive FTP data port state.
//!
//! ```text
//! Closed ─open(p)─→ Open ─peer FIN─→ Closing ─terminate─→ Closed
//!                    │ ↺ open(q)                              ↑
//!                    └────────────── terminate ───────────────┘
//! ```
//!
//! The controller decides when the data socket has to be released; the
//! socket pool does the releasing. `terminate` reports a release exactly
//! once per open, whichever order it and `peer_closing` arrive in.

use crate::types::Port;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPortStatus {
    Closed,
    Open,
    Closing,
}

impl DataPortStatus {
    pub const fn name(self) -> &'static str {
        match self {
            DataPortStatus::Closed => "closed",
            DataPortStatus::Open => "open",
            DataPortStatus::Closing => "closing",
        }
    }
}

#[derive(Debug)]
pub struct DataPortController {
    status: DataPortStatus,
    port: Option<Port>,
}

impl DataPortController {
    pub const fn new() -> Self {
        Self {
            status: DataPortStatus::Closed,
            port: None,
        }
    }

    pub fn status(&self) -> DataPortStatus {
        self.status
    }

    pub fn port(&self) -> Option<Port> {
        self.port
    }

    /// Bind to `port`. A second call while open rebinds; the last caller
    /// wins. Returns the port that was replaced, if any.
    pub fn open(&mut self, port: Port) -> Option<Port> {
        let previous = match self.status {
            DataPortStatus::Closed => None,
            DataPortStatus::Open | DataPortStatus::Closing => self.port,
        };
        self.status = DataPortStatus::Open;
        self.port = Some(port);
        previous
    }

    /// Peer closed the data connection. Returns whether the state changed.
    pub fn peer_closing(&mut self) -> bool {
        if self.status == DataPortStatus::Open {
            self.status = DataPortStatus::Closing;
            true
        } else {
            false
        }
    }

    /// Force the port closed. Returns whether the data socket still has to
    /// be released.
    pub fn terminate(&mut self) -> bool {
        match self.status {
            DataPortStatus::Closed => false,
            DataPortStatus::Open | DataPortStatus::Closing => {
                self.status = DataPortStatus::Closed;
                self.port = None;
                true
            }
        }
    }
}

impl Default for DataPortController {
    fn default() -> Self {
        Self::new()
    }
}
