//! Linux SocketCAN frame source

use can_dash_core::{FrameSource, Received, SourceError};
use can_dash_types::{ChannelId, RawFrame};
use log::{debug, info, trace};
use socketcan::{CanFrame, CanSocket, EmbeddedFrame, Frame, Socket};
use std::io::ErrorKind;
use std::time::Duration;

/// errno for "no such device" (interface missing or unplugged)
const ENODEV: i32 = 19;
/// errno for "network is down" (`ip link set can0 down`)
const ENETDOWN: i32 = 100;

/// Reads classic CAN frames from a SocketCAN interface such as `can0`
pub struct SocketCanSource {
    interface: String,
    read_timeout: Duration,
    socket: Option<CanSocket>,
}

impl SocketCanSource {
    pub fn open(interface: &str, read_timeout: Duration) -> Result<Self, SourceError> {
        let mut source = Self {
            interface: interface.to_string(),
            read_timeout,
            socket: None,
        };
        source.connect()?;
        Ok(source)
    }

    fn connect(&mut self) -> Result<(), SourceError> {
        self.socket = None;
        let socket = CanSocket::open(&self.interface).map_err(|e| self.open_error(e))?;
        socket.set_read_timeout(self.read_timeout)?;
        info!("Opened CAN interface {}", self.interface);
        self.socket = Some(socket);
        Ok(())
    }

    fn open_error(&self, e: std::io::Error) -> SourceError {
        if e.kind() == ErrorKind::NotFound || e.raw_os_error() == Some(ENODEV) {
            SourceError::NotFound(self.interface.clone())
        } else {
            SourceError::Io(e)
        }
    }

    fn read_error(&self, e: std::io::Error) -> SourceError {
        match e.raw_os_error() {
            Some(ENODEV) | Some(ENETDOWN) => {
                SourceError::Closed(format!("{} went away: {}", self.interface, e))
            }
            _ => SourceError::Io(e),
        }
    }
}

impl FrameSource for SocketCanSource {
    fn describe(&self) -> String {
        format!("socketcan:{}", self.interface)
    }

    fn next_frame(&mut self) -> Result<Received, SourceError> {
        let Some(socket) = self.socket.as_ref() else {
            return Err(SourceError::Closed(format!("{} is not open", self.interface)));
        };

        match socket.read_frame() {
            Ok(CanFrame::Data(frame)) => {
                let raw = RawFrame::new(ChannelId(frame.raw_id()), EmbeddedFrame::data(&frame))
                    .map_err(|e| SourceError::Other(e.to_string()))?;
                Ok(Received::Frame(raw))
            }
            Ok(CanFrame::Remote(frame)) => {
                trace!("Ignoring remote request for 0x{:X}", frame.raw_id());
                Ok(Received::Idle)
            }
            Ok(CanFrame::Error(frame)) => {
                debug!("Bus error frame on {}: {:?}", self.interface, frame);
                Ok(Received::Idle)
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Ok(Received::Idle)
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(Received::Idle),
            Err(e) => {
                let err = self.read_error(e);
                self.socket = None;
                Err(err)
            }
        }
    }

    fn reopen(&mut self) -> Result<(), SourceError> {
        self.connect()
    }
}
