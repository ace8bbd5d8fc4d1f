//! NTP control protocol (mode 6) client.
//!
//! Only two requests are needed:
//! - `READSTAT` on association 0 lists the peer association ids.
//! - `READVAR` on association 0 returns the system variables, on a peer
//!   association id the variables of that peer.
//!
//! Replies larger than one datagram arrive as fragments carrying an offset
//! and a "more" flag; they are reassembled before decoding.
//!
//! ```text
//!  0                   1                   2                   3
//! |LI | VN  |Mode |R|E|M| OpCode  |          Sequence             |
//! |            Status             |       Association ID          |
//! |            Offset             |            Count              |
//! |                     Data (Count octets) ...                   |
//! ```

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use tracing::debug;

use crate::error::{CollectError, ParseError, TransportError};

/// Variables of one `READVAR` reply, in `name -> raw value` form.
pub type Vars = HashMap<String, String>;

const HEADER_LEN: usize = 12;
const MAX_DATAGRAM: usize = 2048;
const MAX_FRAGMENTS: usize = 64;

/// Version 2, mode 6.
const VN_MODE: u8 = (2 << 3) | 6;
const MODE_MASK: u8 = 0x07;
const MODE_CONTROL: u8 = 6;

const FLAG_RESPONSE: u8 = 0x80;
const FLAG_ERROR: u8 = 0x40;
const FLAG_MORE: u8 = 0x20;
const OPCODE_MASK: u8 = 0x1f;

pub const OP_READSTAT: u8 = 1;
pub const OP_READVAR: u8 = 2;

/// Transport to an ntpd control port.
pub trait NtpConn: Send {
    /// System variables (`READVAR`, association 0).
    fn system_info(&mut self) -> Result<Vars, CollectError>;

    /// Variables of the peer with association id `id`.
    fn peer_info(&mut self, id: u16) -> Result<Vars, CollectError>;

    /// Association ids of all peers (`READSTAT`).
    fn peer_ids(&mut self) -> Result<Vec<u16>, CollectError>;

    fn close(&mut self) {}
}

/// Mode 6 over a connected UDP socket.
pub struct UdpNtpConn {
    socket: Option<UdpSocket>,
    timeout: Duration,
    sequence: u16,
}

impl UdpNtpConn {
    /// Resolves `address` and connects a UDP socket to it.
    ///
    /// `timeout` bounds every read, so a request that never completes fails
    /// after at most one timeout per expected fragment.
    pub fn connect(address: &str, timeout: Duration) -> Result<Self, TransportError> {
        let remote = address
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| TransportError::Request(format!("can not resolve '{}'", address)))?;
        let local = if remote.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };

        let socket = UdpSocket::bind(local)?;
        socket.set_read_timeout(Some(timeout))?;
        socket.connect(remote)?;
        debug!(%remote, "ntp control socket connected");

        Ok(Self {
            socket: Some(socket),
            timeout,
            sequence: 0,
        })
    }

    fn request(&mut self, opcode: u8, assoc_id: u16) -> Result<Vec<u8>, CollectError> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| TransportError::Request("connection is closed".into()))?;

        self.sequence = self.sequence.wrapping_add(1);
        let sequence = self.sequence;
        socket
            .send(&encode_request(opcode, sequence, assoc_id))
            .map_err(TransportError::Io)?;

        let mut buf = [0u8; MAX_DATAGRAM];
        let mut reassembly = Reassembly::default();
        loop {
            let n = socket.recv(&mut buf).map_err(|e| match e.kind() {
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                    TransportError::Timeout(self.timeout)
                }
                _ => TransportError::Io(e),
            })?;

            let fragment = decode_fragment(&buf[..n])?;
            if fragment.sequence != sequence || fragment.opcode != opcode {
                // Late reply to an earlier request.
                continue;
            }
            if fragment.error {
                return Err(CollectError::bad_payload(format!(
                    "server returned error code {} for opcode {}",
                    fragment.status >> 8,
                    opcode
                )));
            }
            if let Some(data) = reassembly.push(fragment)? {
                return Ok(data);
            }
        }
    }
}

impl NtpConn for UdpNtpConn {
    fn system_info(&mut self) -> Result<Vars, CollectError> {
        let data = self.request(OP_READVAR, 0)?;
        Ok(parse_vars(&data)?)
    }

    fn peer_info(&mut self, id: u16) -> Result<Vars, CollectError> {
        let data = self.request(OP_READVAR, id)?;
        Ok(parse_vars(&data)?)
    }

    fn peer_ids(&mut self) -> Result<Vec<u16>, CollectError> {
        let data = self.request(OP_READSTAT, 0)?;
        Ok(parse_assoc_ids(&data)?)
    }

    fn close(&mut self) {
        self.socket = None;
    }
}

/// Builds a request header with no payload.
pub fn encode_request(opcode: u8, sequence: u16, assoc_id: u16) -> [u8; HEADER_LEN] {
    let mut pkt = [0u8; HEADER_LEN];
    pkt[0] = VN_MODE;
    pkt[1] = opcode & OPCODE_MASK;
    pkt[2..4].copy_from_slice(&sequence.to_be_bytes());
    pkt[6..8].copy_from_slice(&assoc_id.to_be_bytes());
    pkt
}

/// One decoded reply datagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub opcode: u8,
    pub error: bool,
    pub more: bool,
    pub sequence: u16,
    pub status: u16,
    pub assoc_id: u16,
    pub offset: u16,
    pub data: Vec<u8>,
}

pub fn decode_fragment(buf: &[u8]) -> Result<Fragment, ParseError> {
    if buf.len() < HEADER_LEN {
        return Err(ParseError::new(format!(
            "short control packet: {} bytes",
            buf.len()
        )));
    }
    if buf[0] & MODE_MASK != MODE_CONTROL {
        return Err(ParseError::new(format!("not a control packet (mode {})", buf[0] & MODE_MASK)));
    }
    if buf[1] & FLAG_RESPONSE == 0 {
        return Err(ParseError::new("packet is not a response"));
    }

    let be = |i: usize| u16::from_be_bytes([buf[i], buf[i + 1]]);
    let offset = be(8);
    let count = be(10) as usize;
    let data = buf
        .get(HEADER_LEN..HEADER_LEN + count)
        .ok_or_else(|| {
            ParseError::new(format!(
                "count {} exceeds packet payload of {} bytes",
                count,
                buf.len() - HEADER_LEN
            ))
        })?
        .to_vec();

    Ok(Fragment {
        opcode: buf[1] & OPCODE_MASK,
        error: buf[1] & FLAG_ERROR != 0,
        more: buf[1] & FLAG_MORE != 0,
        sequence: be(2),
        status: be(4),
        assoc_id: be(6),
        offset,
        data,
    })
}

/// Collects fragments of one reply until it is complete.
#[derive(Debug, Default)]
struct Reassembly {
    fragments: BTreeMap<u16, Vec<u8>>,
    /// End offset of the fragment without the "more" flag.
    end: Option<usize>,
}

impl Reassembly {
    /// Returns the full payload once every byte up to the last fragment has
    /// arrived.
    fn push(&mut self, fragment: Fragment) -> Result<Option<Vec<u8>>, ParseError> {
        if self.fragments.len() >= MAX_FRAGMENTS {
            return Err(ParseError::new("too many fragments"));
        }
        if !fragment.more {
            self.end = Some(fragment.offset as usize + fragment.data.len());
        }
        self.fragments.insert(fragment.offset, fragment.data);

        let Some(end) = self.end else {
            return Ok(None);
        };
        let mut data = Vec::with_capacity(end);
        for (&offset, chunk) in &self.fragments {
            let offset = offset as usize;
            if offset > data.len() {
                return Ok(None);
            }
            if offset < data.len() {
                return Err(ParseError::new(format!("overlapping fragment at offset {}", offset)));
            }
            data.extend_from_slice(chunk);
        }
        if data.len() != end {
            return Err(ParseError::new("fragment after the last one"));
        }
        Ok(Some(data))
    }
}

/// Decodes a `READSTAT` payload: `(association id, peer status)` pairs.
pub fn parse_assoc_ids(data: &[u8]) -> Result<Vec<u16>, ParseError> {
    if data.len() % 4 != 0 {
        return Err(ParseError::new(format!(
            "association list length {} is not a multiple of 4",
            data.len()
        )));
    }
    Ok(data
        .chunks_exact(4)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect())
}

/// Decodes a `READVAR` payload: `name=value` pairs separated by commas.
/// Quoted values may contain commas.
pub fn parse_vars(data: &[u8]) -> Result<Vars, ParseError> {
    let text = std::str::from_utf8(data)
        .map_err(|e| ParseError::new(format!("variables are not valid UTF-8: {}", e)))?;
    let text = text.trim_end_matches('\0');

    let mut vars = Vars::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                insert_var(&mut vars, &text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_quotes {
        return Err(ParseError::new("unterminated quoted value"));
    }
    insert_var(&mut vars, &text[start..]);
    Ok(vars)
}

fn insert_var(vars: &mut Vars, item: &str) {
    let item = item.trim();
    if item.is_empty() {
        return;
    }
    let (name, value) = item.split_once('=').unwrap_or((item, ""));
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    vars.insert(name.trim().to_string(), value.to_string());
}
