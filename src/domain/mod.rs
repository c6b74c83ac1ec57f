pub mod channel;
pub mod item;
pub mod message;

pub use channel::{Channel, ChannelCache, ChannelLookup, ChannelRef};
pub use item::{Item, LinkedPage, Media};
pub use message::{
    Annotation, AnnotationKind, Attachment, Document, DocumentAttribute, FileLocation,
    ForwardHeader, Photo, PhotoSize, RawMessage, ThumbSize, WebPage,
};
