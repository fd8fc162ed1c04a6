//! kmbox-Net hardware session.
//!
//! A kmbox-Net box is a USB HID device that types on the host it is plugged
//! into, driven over UDP from the relay.  Every datagram starts with a 16-byte
//! little-endian header:
//!
//! ```text
//! 0      4      8         12     16
//! ┌──────┬──────┬─────────┬──────┐
//! │ mac  │ rand │ indexpts│ cmd  │
//! └──────┴──────┴─────────┴──────┘
//! ```
//!
//! `mac` is the device UUID, `indexpts` a per-session sequence number, and
//! `cmd` the command code.  Keyboard commands carry a 12-byte report after
//! the header: one modifier byte, one reserved byte, and ten key slots.
//!
//! The device echoes the header of every command it accepts.  The session
//! waits for that echo (bounded by the configured timeout) before reporting
//! success, so a returned `Ok` means the device acknowledged the report.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use relay_core::keymap::hid::{is_modifier, MODIFIER_FIRST};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::adapters::HardwareEndpoint;
use crate::application::relay_keys::BackendError;

/// Command code: open a session.
pub const CMD_CONNECT: u32 = 0xAF3C_2828;
/// Command code: replace the whole keyboard report.
pub const CMD_KEYBOARD_ALL: u32 = 0x123C_2C2F;

pub const HEADER_LEN: usize = 16;
pub const REPORT_LEN: usize = 12;
/// Simultaneous non-modifier keys in one report.
pub const KEY_SLOTS: usize = 10;

/// Error type for the kmbox session.
#[derive(Debug, Error)]
pub enum KmboxError {
    /// The UUID is not 8 hex digits.
    #[error("invalid device uuid {0:?}: expected 8 hex digits")]
    InvalidUuid(String),

    /// The device host name did not resolve.
    #[error("could not resolve {0}")]
    Resolve(String),

    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    /// No echo arrived in time.
    #[error("device did not acknowledge command {cmd:#010x} (index {index}) in time")]
    Timeout { cmd: u32, index: u32 },

    /// The echo for this index carried a different command.
    #[error("device replied with command {found:#010x}, expected {expected:#010x}")]
    BadReply { expected: u32, found: u32 },
}

impl From<KmboxError> for BackendError {
    fn from(e: KmboxError) -> Self {
        BackendError::Unavailable(e.to_string())
    }
}

/// Parses the device UUID printed on the box (`"33005C53"`).
///
/// # Errors
///
/// [`KmboxError::InvalidUuid`] if `uuid` is not exactly 8 hex digits.
pub fn parse_uuid(uuid: &str) -> Result<u32, KmboxError> {
    let trimmed = uuid.trim();
    if trimmed.len() != 8 || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(KmboxError::InvalidUuid(uuid.to_string()));
    }
    u32::from_str_radix(trimmed, 16).map_err(|_| KmboxError::InvalidUuid(uuid.to_string()))
}

// ── Wire types ────────────────────────────────────────────────────────────────

/// Datagram header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    pub mac: u32,
    pub rand: u32,
    pub index: u32,
    pub cmd: u32,
}

impl CommandHeader {
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&self.mac.to_le_bytes());
        buf[4..8].copy_from_slice(&self.rand.to_le_bytes());
        buf[8..12].copy_from_slice(&self.index.to_le_bytes());
        buf[12..16].copy_from_slice(&self.cmd.to_le_bytes());
        buf
    }

    /// Decodes the first 16 bytes of `buf`; `None` if it is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let word = |at: usize| -> Option<u32> {
            Some(u32::from_le_bytes(buf.get(at..at + 4)?.try_into().ok()?))
        };
        Some(Self {
            mac: word(0)?,
            rand: word(4)?,
            index: word(8)?,
            cmd: word(12)?,
        })
    }
}

/// The full keyboard state sent with [`CMD_KEYBOARD_ALL`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardReport {
    /// Modifier bits; bit `n` is HID usage `0xE0 + n`.
    pub ctrl: u8,
    pub keys: [u8; KEY_SLOTS],
}

impl KeyboardReport {
    /// Marks `code` as held.  Returns `false` if all key slots are taken.
    pub fn press(&mut self, code: u8) -> bool {
        if is_modifier(code) {
            self.ctrl |= 1 << (code - MODIFIER_FIRST);
            return true;
        }
        if self.keys.contains(&code) {
            return true;
        }
        match self.keys.iter_mut().find(|slot| **slot == 0) {
            Some(slot) => {
                *slot = code;
                true
            }
            None => false,
        }
    }

    pub fn release(&mut self, code: u8) {
        if is_modifier(code) {
            self.ctrl &= !(1 << (code - MODIFIER_FIRST));
            return;
        }
        for slot in self.keys.iter_mut().filter(|slot| **slot == code) {
            *slot = 0;
        }
    }

    pub fn encode(&self) -> [u8; REPORT_LEN] {
        let mut buf = [0u8; REPORT_LEN];
        buf[0] = self.ctrl;
        buf[2..].copy_from_slice(&self.keys);
        buf
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

struct SessionState {
    index: u32,
    report: KeyboardReport,
}

/// A connected kmbox-Net device.
///
/// All socket traffic goes through one lock, so concurrent relay requests
/// reach the device one report at a time, each fully acknowledged before the
/// next is sent.
pub struct KmboxSession {
    socket: UdpSocket,
    mac: u32,
    timeout: Duration,
    state: Mutex<SessionState>,
}

impl KmboxSession {
    /// Opens a session with the device at `host:port`.
    ///
    /// # Errors
    ///
    /// [`KmboxError::InvalidUuid`], [`KmboxError::Resolve`], socket errors,
    /// or [`KmboxError::Timeout`] if the device does not answer the connect
    /// command.
    pub fn connect(
        host: &str,
        port: u16,
        uuid: &str,
        timeout: Duration,
    ) -> Result<Self, KmboxError> {
        let mac = parse_uuid(uuid)?;
        let addr: SocketAddr = (host, port)
            .to_socket_addrs()
            .map_err(|e| KmboxError::Resolve(format!("{host}:{port}: {e}")))?
            .next()
            .ok_or_else(|| KmboxError::Resolve(format!("{host}:{port}")))?;

        let local: SocketAddr = if addr.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(addr)?;
        socket.set_read_timeout(Some(timeout))?;

        let session = Self {
            socket,
            mac,
            timeout,
            state: Mutex::new(SessionState {
                index: 0,
                report: KeyboardReport::default(),
            }),
        };
        {
            let mut state = session.lock();
            session.round_trip(&mut state, CMD_CONNECT, &[])?;
        }
        info!(%addr, uuid = %format_args!("{mac:08X}"), "connected to kmbox device");
        Ok(session)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sends one command and waits for its echo.
    fn round_trip(
        &self,
        state: &mut SessionState,
        cmd: u32,
        payload: &[u8],
    ) -> Result<(), KmboxError> {
        state.index = state.index.wrapping_add(1);
        let header = CommandHeader {
            mac: self.mac,
            rand: 0,
            index: state.index,
            cmd,
        };
        let mut datagram = Vec::with_capacity(HEADER_LEN + payload.len());
        datagram.extend_from_slice(&header.encode());
        datagram.extend_from_slice(payload);
        self.socket.send(&datagram)?;

        let deadline = Instant::now() + self.timeout;
        let mut buf = [0u8; 1024];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(KmboxError::Timeout {
                    cmd,
                    index: header.index,
                });
            }
            self.socket.set_read_timeout(Some(remaining))?;
            let n = match self.socket.recv(&mut buf) {
                Ok(n) => n,
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    return Err(KmboxError::Timeout {
                        cmd,
                        index: header.index,
                    })
                }
                Err(e) => return Err(e.into()),
            };
            let Some(reply) = CommandHeader::decode(&buf[..n]) else {
                warn!(len = n, "ignoring short datagram from device");
                continue;
            };
            if reply.index != header.index {
                // Late echo of an earlier command that already timed out.
                debug!(stale = reply.index, expected = header.index, "skipping stale echo");
                continue;
            }
            if reply.cmd != cmd {
                return Err(KmboxError::BadReply {
                    expected: cmd,
                    found: reply.cmd,
                });
            }
            return Ok(());
        }
    }

    fn send_report(
        &self,
        state: &mut SessionState,
        report: &KeyboardReport,
    ) -> Result<(), KmboxError> {
        self.round_trip(state, CMD_KEYBOARD_ALL, &report.encode())
    }
}

impl HardwareEndpoint for KmboxSession {
    fn key_press(&self, code: u8, modifier: u8) -> Result<(), BackendError> {
        let mut state = self.lock();
        let before = state.report;

        let mut down = before;
        if !down.press(code) {
            return Err(BackendError::Unavailable("all key slots are held".into()));
        }
        down.ctrl |= modifier;
        self.send_report(&mut state, &down)?;

        let mut up = before;
        up.release(code);
        self.send_report(&mut state, &up)?;
        state.report = up;
        Ok(())
    }

    fn key_down(&self, code: u8) -> Result<(), BackendError> {
        let mut state = self.lock();
        let mut next = state.report;
        if !next.press(code) {
            return Err(BackendError::Unavailable("all key slots are held".into()));
        }
        self.send_report(&mut state, &next)?;
        state.report = next;
        Ok(())
    }

    fn key_up(&self, code: u8) -> Result<(), BackendError> {
        let mut state = self.lock();
        let mut next = state.report;
        next.release(code);
        self.send_report(&mut state, &next)?;
        state.report = next;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    // ── Pure wire helpers ─────────────────────────────────────────────────────

    #[test]
    fn test_parse_uuid_accepts_printed_device_id() {
        assert_eq!(parse_uuid("33005C53").unwrap(), 0x3300_5C53);
        assert_eq!(parse_uuid("33005c53").unwrap(), 0x3300_5C53);
    }

    #[test]
    fn test_parse_uuid_rejects_wrong_length_or_digits() {
        assert!(matches!(parse_uuid("3300"), Err(KmboxError::InvalidUuid(_))));
        assert!(matches!(parse_uuid("3300ZZ53"), Err(KmboxError::InvalidUuid(_))));
    }

    #[test]
    fn test_header_is_little_endian() {
        let header = CommandHeader {
            mac: 0x3300_5C53,
            rand: 0,
            index: 1,
            cmd: CMD_CONNECT,
        };
        let bytes = header.encode();
        assert_eq!(&bytes[0..4], &[0x53, 0x5C, 0x00, 0x33]);
        assert_eq!(&bytes[8..12], &[1, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[0x28, 0x28, 0x3C, 0xAF]);
        assert_eq!(CommandHeader::decode(&bytes), Some(header));
    }

    #[test]
    fn test_decode_short_buffer_is_none() {
        assert_eq!(CommandHeader::decode(&[0u8; 15]), None);
    }

    #[test]
    fn test_report_modifiers_use_ctrl_bits() {
        // Arrange
        let mut report = KeyboardReport::default();

        // Act
        report.press(0xE0); // left ctrl
        report.press(0xE1); // left shift
        report.press(4); // a

        // Assert
        assert_eq!(report.ctrl, 0b0000_0011);
        assert_eq!(report.keys[0], 4);
        report.release(0xE0);
        assert_eq!(report.ctrl, 0b0000_0010);
    }

    #[test]
    fn test_report_holds_at_most_ten_keys() {
        let mut report = KeyboardReport::default();
        for code in 4..14 {
            assert!(report.press(code));
        }
        assert!(!report.press(30));
        report.release(7);
        assert!(report.press(30));
    }

    #[test]
    fn test_report_encoding_layout() {
        let mut report = KeyboardReport::default();
        report.press(0xE2);
        report.press(82);
        let bytes = report.encode();
        assert_eq!(bytes[0], 0b100);
        assert_eq!(bytes[1], 0);
        assert_eq!(bytes[2], 82);
    }

    // ── Session against a loopback fake device ────────────────────────────────

    /// Spawns a fake device that echoes every header and forwards each
    /// datagram to the returned channel.
    fn fake_device() -> (u16, mpsc::Receiver<Vec<u8>>) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = socket.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = [0u8; 1024];
            while let Ok((n, peer)) = socket.recv_from(&mut buf) {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
                socket.send_to(&buf[..HEADER_LEN], peer).unwrap();
            }
        });
        (port, rx)
    }

    fn cmd_of(datagram: &[u8]) -> u32 {
        CommandHeader::decode(datagram).unwrap().cmd
    }

    #[test]
    fn test_connect_sends_connect_command_with_mac() {
        // Arrange
        let (port, rx) = fake_device();

        // Act
        let _session =
            KmboxSession::connect("127.0.0.1", port, "33005C53", Duration::from_secs(1)).unwrap();

        // Assert
        let first = rx.recv().unwrap();
        let header = CommandHeader::decode(&first).unwrap();
        assert_eq!(header.cmd, CMD_CONNECT);
        assert_eq!(header.mac, 0x3300_5C53);
    }

    #[test]
    fn test_key_press_sends_down_then_up_report() {
        // Arrange
        let (port, rx) = fake_device();
        let session =
            KmboxSession::connect("127.0.0.1", port, "33005C53", Duration::from_secs(1)).unwrap();
        let _connect = rx.recv().unwrap();

        // Act
        session.key_press(4, 0x02).unwrap();

        // Assert
        let down = rx.recv().unwrap();
        let up = rx.recv().unwrap();
        assert_eq!(cmd_of(&down), CMD_KEYBOARD_ALL);
        assert_eq!(down[HEADER_LEN], 0x02);
        assert_eq!(down[HEADER_LEN + 2], 4);
        assert_eq!(&up[HEADER_LEN..], &[0u8; REPORT_LEN]);
    }

    #[test]
    fn test_held_key_stays_in_later_reports_until_released() {
        // Arrange
        let (port, rx) = fake_device();
        let session =
            KmboxSession::connect("127.0.0.1", port, "33005C53", Duration::from_secs(1)).unwrap();
        let _connect = rx.recv().unwrap();

        // Act
        session.key_down(82).unwrap();
        session.key_press(4, 0).unwrap();
        session.key_up(82).unwrap();

        // Assert
        let held = rx.recv().unwrap();
        let press_down = rx.recv().unwrap();
        let press_up = rx.recv().unwrap();
        let released = rx.recv().unwrap();
        assert_eq!(held[HEADER_LEN + 2], 82);
        assert_eq!(&press_down[HEADER_LEN + 2..HEADER_LEN + 4], &[82, 4]);
        assert_eq!(press_up[HEADER_LEN + 2], 82);
        assert_eq!(&released[HEADER_LEN..], &[0u8; REPORT_LEN]);
    }

    #[test]
    fn test_silent_device_times_out_as_unavailable() {
        // Arrange: a socket that never replies.
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = silent.local_addr().unwrap().port();

        // Act
        let result =
            KmboxSession::connect("127.0.0.1", port, "33005C53", Duration::from_millis(50));

        // Assert
        let err = result.err().unwrap();
        assert!(matches!(err, KmboxError::Timeout { cmd: CMD_CONNECT, .. }));
        assert!(matches!(BackendError::from(err), BackendError::Unavailable(_)));
    }
}
