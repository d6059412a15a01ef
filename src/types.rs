//! Types common to both the CSV and binary log formats

use derive_more::{Binary, Deref, Display, From, Into, LowerHex, Octal, UpperHex};
use enum_iterator::Sequence;
use std::convert::Infallible;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Byte order of binary records, native to the traced machine
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Display)]
pub enum Endianness {
    #[default]
    #[display(fmt = "little-endian")]
    Little,
    #[display(fmt = "big-endian")]
    Big,
}

impl From<byteordered::Endianness> for Endianness {
    fn from(e: byteordered::Endianness) -> Self {
        match e {
            byteordered::Endianness::Little => Endianness::Little,
            byteordered::Endianness::Big => Endianness::Big,
        }
    }
}

impl From<Endianness> for byteordered::Endianness {
    fn from(e: Endianness) -> byteordered::Endianness {
        match e {
            Endianness::Little => byteordered::Endianness::Little,
            Endianness::Big => byteordered::Endianness::Big,
        }
    }
}

/// Thread identifier of the traced program
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Default,
    From,
    Into,
    Deref,
    Display,
)]
#[display(fmt = "{_0}")]
pub struct ThreadId(pub u32);

/// Allocation identity reported by the hook.
/// This is an opaque key, it never refers to memory in this process.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Default,
    From,
    Into,
    Deref,
    Display,
    Binary,
    Octal,
    LowerHex,
    UpperHex,
)]
#[display(fmt = "0x{_0:016x}")]
pub struct Pointer(pub u64);

/// Return address of the allocating call, used as the call-site key
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Default,
    From,
    Into,
    Deref,
    Display,
    Binary,
    Octal,
    LowerHex,
    UpperHex,
)]
#[display(fmt = "0x{_0:016x}")]
pub struct ReturnAddress(pub u64);

/// The allocator entry points recorded by the hook.
/// Variant order matches the op codes of the binary record.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Sequence)]
pub enum OpKind {
    #[display(fmt = "malloc")]
    Malloc,
    #[display(fmt = "free")]
    Free,
    #[display(fmt = "realloc")]
    Realloc,
    #[display(fmt = "calloc")]
    Calloc,
}

impl OpKind {
    pub const fn code(self) -> u16 {
        match self {
            OpKind::Malloc => 0,
            OpKind::Free => 1,
            OpKind::Realloc => 2,
            OpKind::Calloc => 3,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        enum_iterator::all::<OpKind>().find(|k| k.code() == code)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            OpKind::Malloc => "malloc",
            OpKind::Free => "free",
            OpKind::Realloc => "realloc",
            OpKind::Calloc => "calloc",
        }
    }
}

/// Operation column of an event.
/// Unrecognized operations are carried along verbatim and never touch the
/// live set.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub enum Op {
    #[display(fmt = "{_0}")]
    Known(OpKind),
    #[display(fmt = "{_0}")]
    Other(String),
}

impl Op {
    pub const UNKNOWN: &'static str = "?";

    pub fn kind(&self) -> Option<OpKind> {
        match self {
            Op::Known(k) => Some(*k),
            Op::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Op::Known(k) => k.as_str(),
            Op::Other(s) => s.as_str(),
        }
    }
}

impl From<OpKind> for Op {
    fn from(k: OpKind) -> Self {
        Op::Known(k)
    }
}

impl FromStr for Op {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(enum_iterator::all::<OpKind>()
            .find(|k| k.as_str() == s)
            .map(Op::Known)
            .unwrap_or_else(|| Op::Other(s.to_owned())))
    }
}

/// Byte count rendered with a binary unit suffix, i.e. `1.50KB`
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, From, Into)]
pub struct HumanBytes(pub u64);

impl HumanBytes {
    const UNITS: [&'static str; 5] = ["B", "KB", "MB", "GB", "TB"];
}

impl fmt::Display for HumanBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.0 as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < Self::UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        write!(f, "{value:.2}{}", Self::UNITS[unit])
    }
}

/// Parse an integer field that may be hexadecimal (`0x`/`0X` prefix) or decimal
pub fn parse_int(s: &str) -> Result<u64, ParseIntError> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn op_round_trips_known_names() {
        for k in enum_iterator::all::<OpKind>() {
            assert_eq!(k.as_str().parse::<Op>(), Ok(Op::Known(k)));
            assert_eq!(OpKind::from_code(k.code()), Some(k));
        }
        assert_eq!(OpKind::from_code(4), None);
        assert_eq!("mmap".parse::<Op>(), Ok(Op::Other("mmap".to_owned())));
        assert_eq!("MALLOC".parse::<Op>().unwrap().kind(), None);
    }

    #[test]
    fn hex_and_decimal_fields() {
        assert_eq!(parse_int("0x10"), Ok(16));
        assert_eq!(parse_int("0XfF"), Ok(255));
        assert_eq!(parse_int(" 42 "), Ok(42));
        assert!(parse_int("").is_err());
        assert!(parse_int("0x").is_err());
        assert!(parse_int("12ab").is_err());
        assert!(parse_int("-1").is_err());
    }

    #[test]
    fn fixed_width_addresses() {
        assert_eq!(Pointer(0x20).to_string(), "0x0000000000000020");
        assert_eq!(
            ReturnAddress(0xdead_beef).to_string(),
            "0x00000000deadbeef"
        );
    }

    #[test]
    fn human_bytes() {
        assert_eq!(HumanBytes(0).to_string(), "0.00B");
        assert_eq!(HumanBytes(1023).to_string(), "1023.00B");
        assert_eq!(HumanBytes(1536).to_string(), "1.50KB");
        assert_eq!(HumanBytes(3 * 1024 * 1024).to_string(), "3.00MB");
        assert_eq!(HumanBytes(2048 * 1024 * 1024 * 1024 * 1024).to_string(), "2048.00TB");
    }
}
