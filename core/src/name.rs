//! Object identity types: the OBNAME, OBJREF and ATTREF value forms.
//!
//! Every object in a logical file is identified by the triple of its origin
//! reference, copy number and name. References between objects carry this
//! triple on the wire, optionally qualified by the set type they live in.

use std::fmt;

/// An object name: the identity triple stamped on every object of a logical
/// file and carried by every reference to it.
#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub struct ObName {
    /// The origin reference, equal to the `file_set_number` of the origin
    /// this object belongs to.
    pub origin: u32,
    /// The copy number, disambiguating objects that share an origin and name.
    pub copy: u8,
    /// The object's identifier.
    pub name: String,
}

impl ObName {
    /// Create an object name from its parts.
    pub fn new<T: Into<String>>(origin: u32, copy: u8, name: T) -> Self {
        ObName {
            origin,
            copy,
            name: name.into(),
        }
    }
}

impl fmt::Display for ObName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.origin, self.copy, self.name)
    }
}

/// A typed object reference: the set type of the target object
/// followed by its name.
#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub struct ObjRef {
    /// The set type of the referenced object, e.g. `"CHANNEL"`.
    pub set_type: String,
    /// The referenced object's name.
    pub name: ObName,
}

impl ObjRef {
    /// Create a typed object reference from its parts.
    pub fn new<T: Into<String>>(set_type: T, name: ObName) -> Self {
        ObjRef {
            set_type: set_type.into(),
            name,
        }
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.set_type, self.name)
    }
}

/// An attribute reference: a typed object reference further qualified
/// by an attribute label of the target object.
#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub struct AttRef {
    /// The set type of the referenced object.
    pub set_type: String,
    /// The referenced object's name.
    pub name: ObName,
    /// The label of the referenced attribute.
    pub label: String,
}

impl fmt::Display for AttRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({}).{}", self.set_type, self.name, self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obname_display() {
        let name = ObName::new(1, 0, "DEPTH");
        assert_eq!(name.to_string(), "1.0.DEPTH");
    }

    #[test]
    fn objref_display() {
        let r = ObjRef::new("CHANNEL", ObName::new(2, 1, "RPM"));
        assert_eq!(r.to_string(), "CHANNEL(2.1.RPM)");
    }
}
