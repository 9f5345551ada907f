//! IP address and CIDR helpers with strict parsing.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

/// Parses a dotted-quad IPv4 address.
///
/// Port, neighbor and gateway addresses are IPv4 on the overlay, so anything
/// else (including IPv6) is rejected here.
pub fn parse_ipv4(s: &str) -> Result<Ipv4Addr, ParseError> {
    s.parse::<Ipv4Addr>()
        .map_err(|_| ParseError::InvalidIpAddress(s.to_string()))
}

/// An address with a prefix length, e.g. `10.0.0.0/24` or `10.0.0.5/24`.
///
/// The address part is kept as written; a port CIDR carries the host address
/// rather than the network address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cidr {
    address: IpAddr,
    prefix_len: u8,
}

impl Cidr {
    /// Creates a CIDR, checking the prefix length against the address family.
    pub fn new(address: IpAddr, prefix_len: u8) -> Result<Self, ParseError> {
        let max_len = match address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        if prefix_len > max_len {
            return Err(ParseError::InvalidCidr(format!(
                "{}/{}: prefix length exceeds {}",
                address, prefix_len, max_len
            )));
        }

        Ok(Cidr {
            address,
            prefix_len,
        })
    }

    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns the CIDR for a host address inside this network,
    /// e.g. `10.0.0.5` in `10.0.0.0/24` gives `10.0.0.5/24`.
    pub fn host(&self, address: IpAddr) -> Result<Cidr, ParseError> {
        Cidr::new(address, self.prefix_len)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for Cidr {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, len_str) = s
            .split_once('/')
            .ok_or_else(|| ParseError::InvalidCidr(s.to_string()))?;

        let address: IpAddr = addr_str
            .parse()
            .map_err(|_| ParseError::InvalidCidr(s.to_string()))?;
        let prefix_len: u8 = len_str
            .parse()
            .map_err(|_| ParseError::InvalidCidr(s.to_string()))?;

        Cidr::new(address, prefix_len)
    }
}

impl TryFrom<String> for Cidr {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Cidr> for String {
    fn from(cidr: Cidr) -> String {
        cidr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(parse_ipv4("10.0.0.5").unwrap(), Ipv4Addr::new(10, 0, 0, 5));
        assert!(parse_ipv4("10.0.0").is_err());
        assert!(parse_ipv4("10.0.0.256").is_err());
        assert!(parse_ipv4("::1").is_err());
        assert!(parse_ipv4("").is_err());
    }

    #[test]
    fn test_cidr_parse() {
        let cidr: Cidr = "10.0.0.0/24".parse().unwrap();
        assert_eq!(cidr.prefix_len(), 24);
        assert_eq!(cidr.to_string(), "10.0.0.0/24");

        let v6: Cidr = "2001:db8::/32".parse().unwrap();
        assert_eq!(v6.prefix_len(), 32);
    }

    #[test]
    fn test_cidr_rejects_malformed() {
        assert!("10.0.0.0".parse::<Cidr>().is_err());
        assert!("10.0.0.0/33".parse::<Cidr>().is_err());
        assert!("10.0.0.0/".parse::<Cidr>().is_err());
        assert!("2001:db8::/129".parse::<Cidr>().is_err());
        assert!("subnet/24".parse::<Cidr>().is_err());
    }

    #[test]
    fn test_host_cidr() {
        let subnet: Cidr = "10.0.0.0/24".parse().unwrap();
        let host = subnet.host("10.0.0.5".parse().unwrap()).unwrap();
        assert_eq!(host.to_string(), "10.0.0.5/24");
    }
}
