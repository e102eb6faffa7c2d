//! Language server for the paren language, speaking JSON-RPC over stdio
//! with Content-Length framing.

pub mod protocol;
pub mod server;
pub mod transport;

pub use server::Server;
pub use transport::{FrameDecoder, FrameError};

use std::io::Read;

/// Run the language server over stdin/stdout until the client hangs up.
pub fn run_server() -> std::io::Result<()> {
    eprintln!("paren language server listening on stdio");
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut server = Server::new(stdout.lock());
    let mut input = stdin.lock();
    let mut chunk = [0u8; 4096];
    loop {
        let n = input.read(&mut chunk)?;
        if n == 0 {
            return Ok(());
        }
        server.feed(&chunk[..n])?;
    }
}
