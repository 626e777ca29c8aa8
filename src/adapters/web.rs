//! HTTP + websocket front end (espidf only).
//!
//! - `GET /ws` upgrades to a websocket.  Text frames go onto the inbound
//!   channel untouched; a new connection queues a connect notice so the
//!   control loop answers with a status snapshot.
//! - Every other `GET` is parsed into an [`ApiRequest`] and handed to the
//!   control loop, which sends back exactly one [`ApiResponse`].
//! - A broadcaster thread drains the outbound channel into every open
//!   websocket session.
//!
//! The handlers only move bytes; all validation happens in the loop.

use std::sync::{Arc, Mutex};

use esp_idf_svc::http::Method;
use esp_idf_svc::http::server::ws::EspHttpWsDetachedSender;
use esp_idf_svc::http::server::{Configuration, EspHttpServer};
use esp_idf_svc::io::Write;
use esp_idf_svc::ws::FrameType;
use log::{info, warn};

use crate::protocol::api::ApiRequest;
use crate::protocol::channels::{self, OUTBOUND};

/// Open websocket sessions, keyed by session id.
type Sessions = Arc<Mutex<Vec<(i32, EspHttpWsDetachedSender)>>>;

const BROADCASTER_STACK: usize = 4096;

/// Start the server and the broadcaster.  Keep the returned server alive
/// for as long as the endpoints should be served.
pub fn start() -> anyhow::Result<EspHttpServer<'static>> {
    let mut server = EspHttpServer::new(&Configuration {
        uri_match_wildcard: true,
        ..Default::default()
    })?;
    let sessions: Sessions = Arc::default();

    let ws_sessions = sessions.clone();
    server.ws_handler("/ws", move |ws| {
        let session = ws.session();
        if ws.is_new() {
            info!("ws: session {session} opened");
            let sender = ws.create_detached_sender()?;
            if let Ok(mut list) = ws_sessions.lock() {
                list.push((session, sender));
            }
            channels::push_client_connected();
            return Ok::<(), esp_idf_svc::sys::EspError>(());
        }
        if ws.is_closed() {
            info!("ws: session {session} closed");
            if let Ok(mut list) = ws_sessions.lock() {
                list.retain(|(id, _)| *id != session);
            }
            return Ok(());
        }

        // An empty buffer reads only the header; the payload follows.
        let (frame_type, len) = ws.recv(&mut [])?;
        let mut buf = vec![0u8; len];
        ws.recv(&mut buf)?;
        match frame_type {
            FrameType::Text(false) => {
                // Text frames arrive NUL-terminated.
                let data = buf.strip_suffix(&[0]).unwrap_or(&buf);
                // Oversized frames are logged with their size and dropped.
                channels::push_frame(data);
            }
            other => warn!("ws: ignoring {other:?} frame"),
        }
        Ok(())
    })?;

    server.fn_handler("/*", Method::Get, |req| {
        let request = ApiRequest::from_uri(req.uri());
        let response = channels::submit_api(request);
        let mut resp = req.into_response(
            response.status,
            None,
            &[
                ("Content-Type", "application/json"),
                ("Access-Control-Allow-Origin", "*"),
            ],
        )?;
        resp.write_all(response.body.as_bytes())?;
        Ok::<(), anyhow::Error>(())
    })?;

    std::thread::Builder::new()
        .name("ws-broadcast".into())
        .stack_size(BROADCASTER_STACK)
        .spawn(move || broadcast(&sessions))?;

    info!("web: listening on :80 (/ws + REST)");
    Ok(server)
}

/// Forward every outbound frame to every open session.  Sessions whose
/// send fails are dropped.
fn broadcast(sessions: &Sessions) {
    loop {
        let frame = futures_lite::future::block_on(OUTBOUND.receive());
        let Ok(mut list) = sessions.lock() else {
            warn!("ws: session list poisoned, broadcaster exiting");
            return;
        };
        list.retain_mut(|(id, sender)| {
            match sender.send(FrameType::Text(false), &frame) {
                Ok(()) => true,
                Err(e) => {
                    warn!("ws: session {id} send failed ({e}), dropping");
                    false
                }
            }
        });
    }
}
