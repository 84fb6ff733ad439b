//! Helpers for testing remote-write clients and receivers.
//!
//! When writing tests, keep the following points in mind:
//!
//!  - In every test, call [`setup`]. This will set up the logger so that all console output is
//!    captured by the test runner.
//!  - Use [`MiniReceiver`] as the remote end of a client. It replays scripted responses and
//!    records every request it receives.
//!
//! # Example
//!
//! ```no_run
//! use prw_test::{MiniReceiver, ScriptedResponse};
//!
//! # async fn example() {
//! prw_test::setup();
//!
//! let receiver = MiniReceiver::start().await;
//! receiver.push_response(ScriptedResponse::new(500));
//!
//! // point a client to `receiver.url()` and write
//!
//! assert_eq!(receiver.requests().len(), 2);
//! # }
//! ```

use std::net::{Ipv4Addr, SocketAddrV4, TcpListener};

mod fixtures;
mod mini_receiver;

pub use self::fixtures::*;
pub use self::mini_receiver::*;

/// Setup the test environment.
///
///  - Initializes logs: The logger only captures logs from this crate and mutes all other logs.
pub fn setup() {
    prw_log::init_test!();
}

/// Returns a port on the loopback interface that was free at the time of the call.
///
/// Nothing listens on the port, so connections to it are refused.
pub fn random_port() -> u16 {
    let socket = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0);
    let listener = TcpListener::bind(socket).expect("failed to bind to address");
    listener
        .local_addr()
        .expect("failed to get local address")
        .port()
}
