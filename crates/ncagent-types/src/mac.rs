//! MAC address type with strict parsing.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 48-bit Ethernet MAC address.
///
/// Accepts colon or hyphen separated groups of one or two hex digits, the
/// two notations controllers send for port and DVR addresses.
///
/// # Examples
///
/// ```
/// use ncagent_types::MacAddress;
///
/// let mac: MacAddress = "fa:16:3E:00:00:01".parse().unwrap();
/// assert_eq!(mac.to_string(), "fa:16:3e:00:00:01");
///
/// let dashed: MacAddress = "fa-16-3e-00-00-01".parse().unwrap();
/// assert_eq!(mac, dashed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Creates a new MAC address from raw bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidMacAddress(s.to_string());

        let separator = match (s.contains(':'), s.contains('-')) {
            (true, false) => ':',
            (false, true) => '-',
            _ => return Err(invalid()),
        };

        let mut bytes = [0u8; 6];
        let mut groups = 0;
        for (i, group) in s.split(separator).enumerate() {
            if i >= bytes.len()
                || group.is_empty()
                || group.len() > 2
                || !group.chars().all(|c| c.is_ascii_hexdigit())
            {
                return Err(invalid());
            }
            bytes[i] = u8::from_str_radix(group, 16).map_err(|_| invalid())?;
            groups += 1;
        }

        if groups != bytes.len() {
            return Err(invalid());
        }

        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}
