//! Control RPC subsystem.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Control stack                          │
//! │                                                            │
//! │  ┌────────────────┐   ┌──────────┐   ┌──────────────────┐  │
//! │  │ ControlEndpoint │──▶│  Codec   │──▶│  RpcChannel      │  │
//! │  │ (typed ops)     │   │ (LE wire)│   │  (trait)         │  │
//! │  └────────────────┘   └──────────┘   └──────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod codec;
pub mod control;
pub mod transport;
