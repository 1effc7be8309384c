//! Domain layer: tracked entities, session identity and the ports the
//! usecase layer depends on.

pub mod component;
pub mod encoder;
pub mod entity;
pub mod error;
pub mod listener;
pub mod observation;
pub mod sender;
pub mod session_table;
pub mod time;
pub mod value_object;

pub use component::{Component, ComponentState, Motion, UpdateOutcome};
pub use encoder::PacketEncoder;
pub use entity::{
    Bounds, BoundsOptions, BoundsShape, ComponentKind, Entity, Pointer, PointerOptions,
    PointerShape, Signal, SignalOptions, Symbol, SymbolOptions, Token, TokenOptions,
};
pub use error::{EncodeError, SendError, TrackError};
pub use listener::TuioListener;
pub use observation::{NaturalKey, Observation, Sample};
pub use sender::{OscSender, SenderKind};
pub use session_table::{FrameDelta, SessionTable};
pub use time::{Clock, FixedClock, ManualClock, SystemClock, TuioTime};
pub use value_object::{Point, SessionId, decode_type_user_id, encode_type_user_id};
