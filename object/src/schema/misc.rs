//! Message, comment and no-format classes.

use super::{item, set_list, set_measure, set_opt, BuildResult, EflrClass, EflrObject, Measure,
            Resolver};
use crate::attribute::{AttrKind, Attribute};
use crate::eflr::EflrItem;
use crate::OriginRef;
use chrono::{DateTime, Utc};

/// An operator or system message recorded during acquisition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    /// The object name.
    pub name: String,
    /// The kind of message, e.g. `"SYSTEM"`.
    pub message_type: Option<String>,
    /// The instant the message was recorded.
    pub time: Option<DateTime<Utc>>,
    /// The borehole drift when the message was recorded.
    pub borehole_drift: Option<Measure>,
    /// The vertical depth when the message was recorded.
    pub vertical_depth: Option<Measure>,
    /// The radial drift when the message was recorded.
    pub radial_drift: Option<Measure>,
    /// The angular drift when the message was recorded.
    pub angular_drift: Option<Measure>,
    /// The message text.
    pub text: Vec<String>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl Message {
    /// Create a message with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Message {
            name: name.into(),
            ..Message::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("TYPE", AttrKind::Ident),
            Attribute::new("TIME", AttrKind::DTime),
            Attribute::new("BOREHOLE-DRIFT", AttrKind::Numeric),
            Attribute::new("VERTICAL-DEPTH", AttrKind::Numeric),
            Attribute::new("RADIAL-DRIFT", AttrKind::Numeric),
            Attribute::new("ANGULAR-DRIFT", AttrKind::Numeric),
            Attribute::multi("TEXT", AttrKind::Text),
        ]
    }
}

impl EflrObject for Message {
    fn class(&self) -> EflrClass {
        EflrClass::Message
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, _resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, Message::attrs());
        set_opt(&mut item, "TYPE", self.message_type.as_deref())?;
        set_opt(&mut item, "TIME", self.time)?;
        set_measure(&mut item, "BOREHOLE-DRIFT", &self.borehole_drift)?;
        set_measure(&mut item, "VERTICAL-DEPTH", &self.vertical_depth)?;
        set_measure(&mut item, "RADIAL-DRIFT", &self.radial_drift)?;
        set_measure(&mut item, "ANGULAR-DRIFT", &self.angular_drift)?;
        set_list(&mut item, "TEXT", &self.text)?;
        Ok(item)
    }
}

/// A free-text comment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comment {
    /// The object name.
    pub name: String,
    /// The comment text.
    pub text: Vec<String>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl Comment {
    /// Create a comment with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Comment {
            name: name.into(),
            ..Comment::default()
        }
    }
}

impl EflrObject for Comment {
    fn class(&self) -> EflrClass {
        EflrClass::Comment
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, _resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(
            &self.name,
            vec![Attribute::multi("TEXT", AttrKind::Text)],
        );
        set_list(&mut item, "TEXT", &self.text)?;
        Ok(item)
    }
}

/// The payload of a no-format blob.
#[derive(Debug, Clone, PartialEq)]
pub enum NoFormatData {
    /// Raw bytes, written verbatim.
    Bytes(Vec<u8>),
    /// A text payload, written under the ASCII representation code.
    Text(String),
}

impl Default for NoFormatData {
    fn default() -> Self {
        NoFormatData::Bytes(Vec::new())
    }
}

/// An unformatted data stream: opaque bytes carried next to the frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoFormat {
    /// The object name.
    pub name: String,
    /// The intended consumer of the data.
    pub consumer_name: Option<String>,
    /// A free-text description of the payload.
    pub description: Option<String>,
    /// The payload emitted as no-format records after the frame data.
    pub data: NoFormatData,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl NoFormat {
    /// Create a no-format object with the given name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        NoFormat {
            name: name.into(),
            ..NoFormat::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("CONSUMER-NAME", AttrKind::Ident),
            Attribute::new("DESCRIPTION", AttrKind::Text),
        ]
    }
}

impl EflrObject for NoFormat {
    fn class(&self) -> EflrClass {
        EflrClass::NoFormat
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, _resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, NoFormat::attrs());
        set_opt(&mut item, "CONSUMER-NAME", self.consumer_name.as_deref())?;
        set_opt(&mut item, "DESCRIPTION", self.description.as_deref())?;
        Ok(item)
    }
}
