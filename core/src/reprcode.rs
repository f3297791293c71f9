//! Representation codes: the on-wire byte layout selectors of RP66 v1.
//!
//! Every attribute value and every frame-data element is written under one of
//! the 27 representation codes enumerated here. The numeric discriminants are
//! the ones standardized by RP66 v1 Appendix B.

use std::fmt;
use std::str::FromStr;

/// An enum of all 27 representation codes defined by RP66 v1.
///
/// The discriminant of each variant is the standard numeric code, which is
/// what gets written into attribute components.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum RepCode {
    /// Two-byte floating point (IEEE 754 binary16).
    Fshort = 1,
    /// Four-byte IEEE 754 single precision floating point.
    Fsingl = 2,
    /// Validated single precision floating point (value + bound).
    Fsing1 = 3,
    /// Two-way validated single precision floating point.
    Fsing2 = 4,
    /// IBM System/360 single precision floating point.
    Isingl = 5,
    /// VAX F-floating point.
    Vsingl = 6,
    /// Eight-byte IEEE 754 double precision floating point.
    Fdoubl = 7,
    /// Validated double precision floating point (value + bound).
    Fdoub1 = 8,
    /// Two-way validated double precision floating point.
    Fdoub2 = 9,
    /// Single precision complex (real + imaginary).
    Csingl = 10,
    /// Double precision complex (real + imaginary).
    Cdoubl = 11,
    /// One-byte signed integer, two's complement.
    Sshort = 12,
    /// Two-byte signed integer, two's complement.
    Snorm = 13,
    /// Four-byte signed integer, two's complement.
    Slong = 14,
    /// One-byte unsigned integer.
    Ushort = 15,
    /// Two-byte unsigned integer.
    Unorm = 16,
    /// Four-byte unsigned integer.
    Ulong = 17,
    /// Variable-length unsigned integer (1, 2 or 4 bytes).
    Uvari = 18,
    /// Short identifier string, one-byte length prefix.
    Ident = 19,
    /// Free text string, UVARI length prefix.
    Ascii = 20,
    /// Calendar date and time, fixed 8-byte layout.
    Dtime = 21,
    /// Origin reference; same layout as UVARI.
    Origin = 22,
    /// Object name: origin reference, copy number and identifier.
    Obname = 23,
    /// Typed object reference: set type plus object name.
    Objref = 24,
    /// Attribute reference: set type, object name and attribute label.
    Attref = 25,
    /// Boolean status, one byte holding 0 or 1.
    Status = 26,
    /// Unit symbol string; IDENT layout with a stricter character set.
    Units = 27,
}

impl RepCode {
    /// Retrieve the standard numeric value of this representation code.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Obtain the representation code corresponding to the given standard
    /// numeric value.
    pub fn from_code(code: u8) -> Option<Self> {
        use RepCode::*;
        Some(match code {
            1 => Fshort,
            2 => Fsingl,
            3 => Fsing1,
            4 => Fsing2,
            5 => Isingl,
            6 => Vsingl,
            7 => Fdoubl,
            8 => Fdoub1,
            9 => Fdoub2,
            10 => Csingl,
            11 => Cdoubl,
            12 => Sshort,
            13 => Snorm,
            14 => Slong,
            15 => Ushort,
            16 => Unorm,
            17 => Ulong,
            18 => Uvari,
            19 => Ident,
            20 => Ascii,
            21 => Dtime,
            22 => Origin,
            23 => Obname,
            24 => Objref,
            25 => Attref,
            26 => Status,
            27 => Units,
            _ => return None,
        })
    }

    /// The fixed on-wire size of one element under this code, in bytes,
    /// or `None` if the size depends on the value.
    pub fn fixed_size(self) -> Option<usize> {
        use RepCode::*;
        match self {
            Fshort => Some(2),
            Fsingl => Some(4),
            Fsing1 => Some(8),
            Fsing2 => Some(12),
            Isingl => Some(4),
            Vsingl => Some(4),
            Fdoubl => Some(8),
            Fdoub1 => Some(16),
            Fdoub2 => Some(24),
            Csingl => Some(8),
            Cdoubl => Some(16),
            Sshort => Some(1),
            Snorm => Some(2),
            Slong => Some(4),
            Ushort => Some(1),
            Unorm => Some(2),
            Ulong => Some(4),
            Dtime => Some(8),
            Status => Some(1),
            Uvari | Ident | Ascii | Origin | Obname | Objref | Attref | Units => None,
        }
    }

    /// Whether this code carries a signed integer.
    pub fn is_signed_int(self) -> bool {
        use RepCode::*;
        matches!(self, Sshort | Snorm | Slong)
    }

    /// Whether this code carries an unsigned integer.
    pub fn is_unsigned_int(self) -> bool {
        use RepCode::*;
        matches!(self, Ushort | Unorm | Ulong | Uvari)
    }

    /// Whether this code carries an integer of either signedness.
    pub fn is_integer(self) -> bool {
        self.is_signed_int() || self.is_unsigned_int()
    }

    /// Whether this code carries a floating point number,
    /// including the legacy validated/complex forms.
    pub fn is_float(self) -> bool {
        use RepCode::*;
        matches!(
            self,
            Fshort | Fsingl | Fsing1 | Fsing2 | Isingl | Vsingl | Fdoubl | Fdoub1 | Fdoub2
                | Csingl | Cdoubl
        )
    }

    /// Whether this code carries a number.
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Whether this code carries a character string.
    pub fn is_string(self) -> bool {
        use RepCode::*;
        matches!(self, Ident | Ascii | Units)
    }

    /// Whether this code carries a reference to another object.
    pub fn is_reference(self) -> bool {
        use RepCode::*;
        matches!(self, Obname | Objref | Attref)
    }

    /// Retrieve the standard mnemonic of this representation code.
    pub fn to_str(self) -> &'static str {
        use RepCode::*;
        match self {
            Fshort => "FSHORT",
            Fsingl => "FSINGL",
            Fsing1 => "FSING1",
            Fsing2 => "FSING2",
            Isingl => "ISINGL",
            Vsingl => "VSINGL",
            Fdoubl => "FDOUBL",
            Fdoub1 => "FDOUB1",
            Fdoub2 => "FDOUB2",
            Csingl => "CSINGL",
            Cdoubl => "CDOUBL",
            Sshort => "SSHORT",
            Snorm => "SNORM",
            Slong => "SLONG",
            Ushort => "USHORT",
            Unorm => "UNORM",
            Ulong => "ULONG",
            Uvari => "UVARI",
            Ident => "IDENT",
            Ascii => "ASCII",
            Dtime => "DTIME",
            Origin => "ORIGIN",
            Obname => "OBNAME",
            Objref => "OBJREF",
            Attref => "ATTREF",
            Status => "STATUS",
            Units => "UNITS",
        }
    }
}

/// Obtain the representation code corresponding to the given mnemonic.
/// The string should hold the standard upper case mnemonic,
/// otherwise no match is made.
impl FromStr for RepCode {
    type Err = &'static str;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        use RepCode::*;
        match string {
            "FSHORT" => Ok(Fshort),
            "FSINGL" => Ok(Fsingl),
            "FSING1" => Ok(Fsing1),
            "FSING2" => Ok(Fsing2),
            "ISINGL" => Ok(Isingl),
            "VSINGL" => Ok(Vsingl),
            "FDOUBL" => Ok(Fdoubl),
            "FDOUB1" => Ok(Fdoub1),
            "FDOUB2" => Ok(Fdoub2),
            "CSINGL" => Ok(Csingl),
            "CDOUBL" => Ok(Cdoubl),
            "SSHORT" => Ok(Sshort),
            "SNORM" => Ok(Snorm),
            "SLONG" => Ok(Slong),
            "USHORT" => Ok(Ushort),
            "UNORM" => Ok(Unorm),
            "ULONG" => Ok(Ulong),
            "UVARI" => Ok(Uvari),
            "IDENT" => Ok(Ident),
            "ASCII" => Ok(Ascii),
            "DTIME" => Ok(Dtime),
            "ORIGIN" => Ok(Origin),
            "OBNAME" => Ok(Obname),
            "OBJREF" => Ok(Objref),
            "ATTREF" => Ok(Attref),
            "STATUS" => Ok(Status),
            "UNITS" => Ok(Units),
            _ => Err("no such representation code"),
        }
    }
}

impl fmt::Display for RepCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_codes_round_trip() {
        for code in 1..=27u8 {
            let rc = RepCode::from_code(code).expect("all of 1..=27 are assigned");
            assert_eq!(rc.code(), code);
            assert_eq!(rc.to_str().parse::<RepCode>(), Ok(rc));
        }
        assert_eq!(RepCode::from_code(0), None);
        assert_eq!(RepCode::from_code(28), None);
    }

    #[test]
    fn fixed_sizes() {
        assert_eq!(RepCode::Fdoubl.fixed_size(), Some(8));
        assert_eq!(RepCode::Fsingl.fixed_size(), Some(4));
        assert_eq!(RepCode::Fshort.fixed_size(), Some(2));
        assert_eq!(RepCode::Ushort.fixed_size(), Some(1));
        assert_eq!(RepCode::Unorm.fixed_size(), Some(2));
        assert_eq!(RepCode::Ulong.fixed_size(), Some(4));
        assert_eq!(RepCode::Dtime.fixed_size(), Some(8));
        assert_eq!(RepCode::Status.fixed_size(), Some(1));
        assert_eq!(RepCode::Uvari.fixed_size(), None);
        assert_eq!(RepCode::Ident.fixed_size(), None);
        assert_eq!(RepCode::Obname.fixed_size(), None);
    }

    #[test]
    fn families() {
        assert!(RepCode::Snorm.is_signed_int());
        assert!(RepCode::Uvari.is_unsigned_int());
        assert!(RepCode::Fshort.is_float());
        assert!(RepCode::Csingl.is_float());
        assert!(RepCode::Units.is_string());
        assert!(RepCode::Attref.is_reference());
        assert!(!RepCode::Dtime.is_numeric());
        assert!(!RepCode::Status.is_reference());
    }
}
