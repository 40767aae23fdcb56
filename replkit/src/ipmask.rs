//! Address plus mask values, written as CIDR or as an address and a dotted mask.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// An address paired with its network mask. Both halves are always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpAndMask {
    pub ip: IpAddr,
    pub mask: IpAddr,
}

impl Default for IpAndMask {
    fn default() -> Self {
        Self {
            ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            mask: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

impl IpAndMask {
    #[must_use]
    pub fn new(ip: IpAddr, mask: IpAddr) -> Self {
        Self { ip, mask }
    }

    /// Number of leading one bits, or `None` when the mask is not contiguous.
    #[must_use]
    pub fn prefix_len(&self) -> Option<u32> {
        let (bits, width) = match self.mask {
            IpAddr::V4(m) => (u128::from(u32::from(m)) << 96, 32),
            IpAddr::V6(m) => (u128::from(m), 128),
        };
        let ones = bits.leading_ones();
        let contiguous = bits.checked_shl(ones).unwrap_or(0) == 0;
        (contiguous && ones <= width).then_some(ones)
    }

    /// Parses `addr/prefix`.
    #[must_use]
    pub fn from_cidr(s: &str) -> Option<Self> {
        let (addr, prefix) = s.split_once('/')?;
        let ip: IpAddr = addr.parse().ok()?;
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let prefix: u32 = prefix.parse().ok()?;
        let mask = mask_from_prefix(ip, prefix)?;
        Some(Self { ip, mask })
    }
}

fn mask_from_prefix(ip: IpAddr, prefix: u32) -> Option<IpAddr> {
    match ip {
        IpAddr::V4(_) if prefix <= 32 => {
            let bits = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
            Some(IpAddr::V4(Ipv4Addr::from(bits)))
        }
        IpAddr::V6(_) if prefix <= 128 => {
            let bits = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
            Some(IpAddr::V6(Ipv6Addr::from(bits)))
        }
        _ => None,
    }
}

/// Dotted masks are IPv4 only; an IPv4-mapped IPv6 literal is narrowed.
fn parse_dotted_mask(s: &str) -> Option<IpAddr> {
    match s.parse::<IpAddr>().ok()? {
        IpAddr::V4(m) => Some(IpAddr::V4(m)),
        IpAddr::V6(m) => m.to_ipv4_mapped().map(IpAddr::V4),
    }
}

/// Reads an address and mask for `flag` from `first` and, when needed, `second`.
///
/// Accepted shapes:
/// - `10.0.0.0/24`
/// - `10.0.0.0` `/24` (split CIDR, joined before parsing)
/// - `10.0.0.0` `255.255.255.0`
///
/// Returns the value and whether `second` was consumed.
pub fn parse_ip_and_mask(flag: &str, first: &str, second: Option<&str>) -> Result<(IpAndMask, bool)> {
    if first.contains('/') {
        let value = IpAndMask::from_cidr(first).ok_or_else(|| Error::BadCidr(flag.to_string()))?;
        return Ok((value, false));
    }

    let ip: IpAddr = first.parse().map_err(|_| Error::BadIp(flag.to_string()))?;
    let Some(second) = second else {
        return Err(Error::MissingValue {
            flag: flag.to_string(),
            kind: "mask",
        });
    };

    if second.contains('/') {
        let joined = format!("{}{}", first, second);
        let value = IpAndMask::from_cidr(&joined).ok_or_else(|| Error::BadCidr(flag.to_string()))?;
        return Ok((value, true));
    }

    let mask = parse_dotted_mask(second).ok_or_else(|| Error::BadMask(flag.to_string()))?;
    Ok((IpAndMask { ip, mask }, true))
}

impl fmt::Display for IpAndMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let same_family = self.ip.is_ipv4() == self.mask.is_ipv4();
        match self.prefix_len() {
            Some(len) if same_family => write!(f, "{}/{}", self.ip, len),
            _ => write!(f, "{} {}", self.ip, self.mask),
        }
    }
}

impl Serialize for IpAndMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
