//! Packet dispatch over the routing table.
//!
//! The router reads packets from the transports, looks up the rule for
//! each packet's route ID and either relabels the packet for the next hop
//! or hands the payload to the local application the rule names.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use crate::routing::{Addr, Packet, Port, RouteId, RoutingError, RoutingTable, Rule};
use crate::transport::{OutboundPacket, OutboundTx, PacketRx, ReceivedPacket, TransportId};

/// Errors from packet dispatch.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("routing error: {0}")]
    Routing(#[from] RoutingError),

    #[error("{0} channel closed")]
    ChannelClosed(&'static str),
}

impl RouterError {
    /// Whether the router can keep running after this error.
    ///
    /// Routing failures affect a single packet; a closed output channel
    /// means there is nowhere left to send anything.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RouterError::ChannelClosed(_))
    }
}

/// A payload delivered to a local application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppMessage {
    /// Route ID the packet arrived on.
    pub route_id: RouteId,
    /// Remote endpoint of the loop.
    pub remote: Addr,
    /// Local application port.
    pub local_port: Port,
    /// Route ID replies must be sent on.
    pub response_route_id: RouteId,
    pub payload: Vec<u8>,
}

/// Sender side of the app delivery channel.
pub type AppTx = mpsc::Sender<AppMessage>;

/// Receiver side of the app delivery channel.
pub type AppRx = mpsc::Receiver<AppMessage>;

/// Create an app delivery channel with the given buffer size.
pub fn app_channel(buffer: usize) -> (AppTx, AppRx) {
    mpsc::channel(buffer)
}

/// What the router did with a packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Relabelled and queued on the next transport.
    Forwarded {
        route_id: RouteId,
        next_route_id: RouteId,
        transport_id: TransportId,
    },
    /// Handed to a local application.
    Delivered { route_id: RouteId, local_port: Port },
}

/// Router loop counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub forwarded: u64,
    pub delivered: u64,
    pub dropped: u64,
}

/// Routes packets according to a shared table.
pub struct Router {
    table: Arc<dyn RoutingTable>,
    outbound_tx: OutboundTx,
    app_tx: AppTx,
}

impl Router {
    /// Create a router over the given table and output channels.
    pub fn new(table: Arc<dyn RoutingTable>, outbound_tx: OutboundTx, app_tx: AppTx) -> Self {
        Self {
            table,
            outbound_tx,
            app_tx,
        }
    }

    /// The table this router consults.
    pub fn table(&self) -> &Arc<dyn RoutingTable> {
        &self.table
    }

    /// Dispatch a single received packet.
    ///
    /// Forwarded packets refresh the rule's activity once they have been
    /// queued on the next transport.
    pub async fn handle_packet(&self, received: ReceivedPacket) -> Result<Dispatch, RouterError> {
        let packet = Packet::decode(&received.data)?;
        let route_id = packet.route_id();
        let rule = self.table.rule(route_id)?;

        match rule {
            Rule::Forward(fwd) => {
                let next_route_id = fwd.next_route_id();
                let transport_id = fwd.next_transport_id();
                let relabelled = Packet::new(next_route_id, packet.payload())?;

                self.outbound_tx
                    .send(OutboundPacket {
                        transport_id,
                        data: relabelled.into_bytes(),
                    })
                    .await
                    .map_err(|_| RouterError::ChannelClosed("outbound"))?;

                // The packet is already on its way; a rule removed since the
                // lookup has nothing left to refresh.
                match self.table.update_activity(route_id) {
                    Ok(()) | Err(RoutingError::RuleNotFound(_)) => {}
                    Err(e) => return Err(e.into()),
                }

                trace!(
                    route_id = %route_id,
                    next_route_id = %next_route_id,
                    from = %received.transport_id,
                    to = %transport_id,
                    "Forwarded packet"
                );
                Ok(Dispatch::Forwarded {
                    route_id,
                    next_route_id,
                    transport_id,
                })
            }
            Rule::App(app) => {
                let local_port = app.local_port();
                let (_, payload) = packet.into_parts();

                self.app_tx
                    .send(AppMessage {
                        route_id,
                        remote: Addr::new(app.remote_pk(), app.remote_port()),
                        local_port,
                        response_route_id: app.response_route_id(),
                        payload,
                    })
                    .await
                    .map_err(|_| RouterError::ChannelClosed("app"))?;

                trace!(route_id = %route_id, local_port = %local_port, "Delivered packet to app");
                Ok(Dispatch::Delivered {
                    route_id,
                    local_port,
                })
            }
        }
    }

    /// Run the dispatch loop.
    ///
    /// Runs until the packet channel closes or `shutdown` is set. Packets that
    /// fail to route are dropped and logged; a closed output channel ends the
    /// loop with an error.
    pub async fn run(
        &self,
        mut packet_rx: PacketRx,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<RouterStats, RouterError> {
        let mut stats = RouterStats::default();
        info!("Router started");

        loop {
            tokio::select! {
                packet = packet_rx.recv() => {
                    let Some(packet) = packet else {
                        debug!("Packet channel closed");
                        break;
                    };
                    let transport_id = packet.transport_id;
                    match self.handle_packet(packet).await {
                        Ok(Dispatch::Forwarded { .. }) => stats.forwarded += 1,
                        Ok(Dispatch::Delivered { .. }) => stats.delivered += 1,
                        Err(e) if e.is_fatal() => {
                            warn!(error = %e, "Router stopping");
                            return Err(e);
                        }
                        Err(e) => {
                            stats.dropped += 1;
                            debug!(transport_id = %transport_id, error = %e, "Dropped packet");
                        }
                    }
                }
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(
            forwarded = stats.forwarded,
            delivered = stats.delivered,
            dropped = stats.dropped,
            "Router stopped"
        );
        Ok(stats)
    }
}
