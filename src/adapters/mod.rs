//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `log_sink`     | EventSink          | `log` facade             |
//! | `registry`     | Registry           | In-memory name table     |
//!
//! The RPC transport and fabric controller adapters belong to the
//! embedding system; [`NullChannel`](crate::rpc::transport::NullChannel)
//! is the only one shipped here.

pub mod log_sink;
pub mod registry;
