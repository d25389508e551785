//! The single long-lived session used for metadata and server events.
//!
//! One control connection exists per driver instance. It owns at most one
//! transport at a time, keeps the registry and schema collaborators fed, and
//! survives node failures by walking a load-balancing plan under a backoff
//! schedule. All of its state lives behind one mutex, which is never held
//! across an await; long-running loops re-check the state after every timer
//! wake and stop cooperatively.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::{Arc, Mutex, Weak};

use futures::future;
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

use crate::cluster::host::Host;
use crate::cluster::registry::ClusterRegistry;
use crate::cluster::schema::ClusterSchema;
use crate::errors::{ControlConnectionError, QueryError};
use crate::frame::events::{
    Event, EventPayload, SchemaChangeEvent, SchemaChangeType, StatusChangeEvent,
    TopologyChangeEvent,
};
use crate::frame::server_event_type::EventType;
use crate::network::{Connection, ConnectionOptions, Connector, Request, RequestRunner};
use crate::policies::load_balancing::{LoadBalancingPolicy, RoutingInfo};
use crate::policies::reconnect::{ReconnectionPolicy, ReconnectionSchedule};
use crate::reactor::IoReactor;
use crate::response::Row;
use crate::statement::Statement;

const SELECT_LOCAL: &str = "SELECT rack, data_center, host_id, release_version FROM system.local";
const SELECT_PEERS: &str =
    "SELECT peer, rack, data_center, host_id, rpc_address, release_version FROM system.peers";
const SELECT_PEER: &str =
    "SELECT peer, rack, data_center, host_id, rpc_address, release_version FROM system.peers \
     WHERE peer = ?";

const SELECT_KEYSPACES: &str = "SELECT * FROM system.schema_keyspaces";
const SELECT_TABLES: &str = "SELECT * FROM system.schema_columnfamilies";
const SELECT_COLUMNS: &str = "SELECT * FROM system.schema_columns";

const SELECT_KEYSPACE: &str = "SELECT * FROM system.schema_keyspaces WHERE keyspace_name = ?";
const SELECT_KEYSPACE_TABLES: &str =
    "SELECT * FROM system.schema_columnfamilies WHERE keyspace_name = ?";
const SELECT_KEYSPACE_COLUMNS: &str =
    "SELECT * FROM system.schema_columns WHERE keyspace_name = ?";

const SELECT_TABLE: &str = "SELECT * FROM system.schema_columnfamilies WHERE keyspace_name = ? \
     AND columnfamily_name = ?";
const SELECT_TABLE_COLUMNS: &str = "SELECT * FROM system.schema_columns WHERE keyspace_name = ? \
     AND columnfamily_name = ?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Closed,
    Connecting,
    Connected,
    Reconnecting,
    Closing,
}

struct State {
    status: Status,
    connection: Option<Arc<Connection>>,
    refreshing_statuses: HashSet<IpAddr>,
}

fn set_status(state: &mut State, status: Status) {
    if state.status != status {
        debug!(from = ?state.status, to = ?status, "Control connection status changed");
        state.status = status;
    }
}

/// The metadata session of the driver.
///
/// `connect` and `close` are idempotent; `host_up`/`host_down`/`host_found`/
/// `host_lost` are inbound registry-change notifications and may be called
/// from any task.
pub struct ControlConnection {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    reactor: Arc<dyn IoReactor>,
    connector: Arc<dyn Connector>,
    request_runner: Arc<dyn RequestRunner>,
    load_balancing: Arc<dyn LoadBalancingPolicy>,
    reconnection: Arc<dyn ReconnectionPolicy>,
    registry: Arc<dyn ClusterRegistry>,
    schema: Arc<dyn ClusterSchema>,
    options: Arc<ConnectionOptions>,
}

impl ControlConnection {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reactor: Arc<dyn IoReactor>,
        connector: Arc<dyn Connector>,
        request_runner: Arc<dyn RequestRunner>,
        load_balancing: Arc<dyn LoadBalancingPolicy>,
        reconnection: Arc<dyn ReconnectionPolicy>,
        registry: Arc<dyn ClusterRegistry>,
        schema: Arc<dyn ClusterSchema>,
        options: Arc<ConnectionOptions>,
    ) -> Self {
        ControlConnection {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    status: Status::Closed,
                    connection: None,
                    refreshing_statuses: HashSet::new(),
                }),
                reactor,
                connector,
                request_runner,
                load_balancing,
                reconnection,
                registry,
                schema,
                options,
            }),
        }
    }

    /// Establishes the control connection.
    ///
    /// Starts the reactor, walks a fresh load-balancing plan and connects to
    /// the first host that accepts, then registers for server events and
    /// performs the initial topology and schema refresh. Resolves immediately
    /// when already connecting, connected, or closing. While reconnecting the
    /// attempt runs without leaving that state, so a success lands on the
    /// `reconnecting -> connected` edge.
    pub async fn connect(&self) -> Result<(), ControlConnectionError> {
        {
            let mut state = self.inner.state.lock().unwrap();
            match state.status {
                Status::Connecting | Status::Connected | Status::Closing => return Ok(()),
                Status::Closed => set_status(&mut state, Status::Connecting),
                Status::Reconnecting => {}
            }
        }

        self.inner.reactor.start().await;
        let result = self.inner.connect_to_first_available().await;
        if let Err(ref err) = result {
            let mut state = self.inner.state.lock().unwrap();
            if state.status == Status::Connecting {
                set_status(&mut state, Status::Closed);
            }
            error!(error = %err, "Failed to establish the control connection");
        }
        result
    }

    /// Tears down the reactor and releases the connection. Idempotent.
    pub async fn close(&self) {
        let connection = {
            let mut state = self.inner.state.lock().unwrap();
            match state.status {
                Status::Closed | Status::Closing => return,
                _ => set_status(&mut state, Status::Closing),
            }
            state.connection.take()
        };

        if let Some(connection) = connection {
            self.inner
                .connector
                .close(connection.host(), connection)
                .await;
        }
        self.inner.reactor.stop().await;

        let mut state = self.inner.state.lock().unwrap();
        if state.status == Status::Closing {
            set_status(&mut state, Status::Closed);
        }
    }

    /// A node joined the registry. The control connection has nothing to do;
    /// membership bookkeeping already happened.
    pub fn host_found(&self, host: &Arc<Host>) {
        trace!(host = %host, "Host found");
    }

    /// A node left the registry. Any probe loop for it notices on its next
    /// wake.
    pub fn host_lost(&self, host: &Arc<Host>) {
        trace!(host = %host, "Host lost");
    }

    /// A node came back up. Stops any reachability probe for it and, when the
    /// control connection itself is missing, reconnects through it.
    pub async fn host_up(&self, host: &Arc<Host>) -> Result<(), ControlConnectionError> {
        let reconnect = {
            let mut state = self.inner.state.lock().unwrap();
            state.refreshing_statuses.remove(&host.ip());
            state.connection.is_none()
                && !matches!(state.status, Status::Closed | Status::Closing)
        };
        if reconnect {
            self.connect().await
        } else {
            Ok(())
        }
    }

    /// A node was reported down. While the control connection is healthy the
    /// server will announce the node's return, so this is a no-op; otherwise
    /// a reachability probe loop is started, at most one per host.
    pub fn host_down(&self, host: &Arc<Host>) {
        {
            let mut state = self.inner.state.lock().unwrap();
            let healthy = state
                .connection
                .as_ref()
                .is_some_and(|connection| connection.is_connected());
            if healthy || !state.refreshing_statuses.insert(host.ip()) {
                return;
            }
        }
        debug!(host = %host, "Host is down, probing its reachability");
        let schedule = self.inner.reconnection.new_schedule();
        tokio::spawn(refresh_host_status_with_retry(
            Arc::downgrade(&self.inner),
            host.clone(),
            schedule,
        ));
    }

    /// Address of the node currently serving the control connection.
    pub fn connected_host(&self) -> Option<IpAddr> {
        self.inner
            .state
            .lock()
            .unwrap()
            .connection
            .as_ref()
            .map(|connection| connection.host())
    }

    #[cfg(test)]
    fn status(&self) -> Status {
        self.inner.state.lock().unwrap().status
    }

    #[cfg(test)]
    fn refreshing_statuses(&self) -> HashSet<IpAddr> {
        self.inner.state.lock().unwrap().refreshing_statuses.clone()
    }
}

impl Inner {
    /// Walks a fresh plan until a host takes the connection. Authentication
    /// failures abort the walk; every other failure is recorded under the
    /// host and the walk continues.
    async fn connect_to_first_available(
        self: &Arc<Self>,
    ) -> Result<(), ControlConnectionError> {
        let plan = self.load_balancing.plan(&RoutingInfo::default());
        let mut errors: HashMap<IpAddr, ControlConnectionError> = HashMap::new();
        for host in plan {
            debug!(host = %host, "Attempting to establish the control connection");
            match self.connect_to_host(&host).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_authentication_error() => {
                    warn!(host = %host, error = %err, "Authentication failed");
                    return Err(err);
                }
                Err(err) => {
                    warn!(host = %host, error = %err, "Control connection attempt failed");
                    errors.insert(host.ip(), err);
                }
            }
        }
        Err(ControlConnectionError::NoHostsAvailable { errors })
    }

    /// Connects to one host, retrying the same host at a lower protocol
    /// version on negotiation errors, then installs the connection and runs
    /// the post-connect setup (event registration, topology and schema
    /// refresh). On setup failure the transport is released before the error
    /// propagates, so the caller can move on to the next candidate.
    async fn connect_to_host(self: &Arc<Self>, host: &Arc<Host>) -> Result<(), ControlConnectionError> {
        let connection = loop {
            match self.connector.connect(host).await {
                Ok(connection) => break connection,
                Err(err) if err.is_protocol_negotiation_error() => {
                    match self.options.downgrade_protocol_version() {
                        Some(version) => {
                            debug!(
                                host = %host,
                                protocol_version = version,
                                "Protocol negotiation failed, retrying with a lower version"
                            );
                        }
                        None => return Err(ControlConnectionError::from(err).classified()),
                    }
                }
                Err(err) => return Err(ControlConnectionError::from(err).classified()),
            }
        };

        let installed = {
            let mut state = self.state.lock().unwrap();
            if matches!(state.status, Status::Closing | Status::Closed)
                || state.connection.is_some()
            {
                None
            } else {
                let previous = state.status;
                set_status(&mut state, Status::Connected);
                state.connection = Some(connection.clone());
                Some(previous)
            }
        };
        let Some(previous_status) = installed else {
            // Lost the race against a user close or a competing attempt.
            self.connector.close(connection.host(), connection).await;
            return Err(QueryError::NotConnected.into());
        };
        debug!(host = %connection.host(), "Control connection established");

        let weak = Arc::downgrade(self);
        let watched = connection.clone();
        tokio::spawn(async move {
            watched.wait_closed().await;
            if let Some(inner) = weak.upgrade() {
                inner.handle_connection_closed(&watched);
            }
        });

        match self.setup_connection(&connection).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let release = {
                    let mut state = self.state.lock().unwrap();
                    let current = state
                        .connection
                        .as_ref()
                        .is_some_and(|current| Arc::ptr_eq(current, &connection));
                    if current {
                        state.connection = None;
                        if state.status == Status::Connected {
                            set_status(&mut state, previous_status);
                        }
                    }
                    current
                };
                if release {
                    self.connector.close(connection.host(), connection).await;
                }
                Err(err)
            }
        }
    }

    async fn setup_connection(
        self: &Arc<Self>,
        connection: &Arc<Connection>,
    ) -> Result<(), ControlConnectionError> {
        self.register_events(connection)
            .await
            .map_err(|err| ControlConnectionError::from(err).classified())?;
        self.refresh_hosts()
            .await
            .map_err(ControlConnectionError::classified)?;
        self.refresh_schema()
            .await
            .map_err(ControlConnectionError::classified)?;
        Ok(())
    }

    /// REGISTERs for the three server event streams and starts the dispatch
    /// task for this connection. One subscription per connection; a replaced
    /// connection takes its subscription down with it.
    async fn register_events(
        self: &Arc<Self>,
        connection: &Arc<Connection>,
    ) -> Result<(), QueryError> {
        self.request_runner
            .execute(
                connection,
                Request::Register(vec![
                    EventType::TopologyChange,
                    EventType::StatusChange,
                    EventType::SchemaChange,
                ]),
            )
            .await?;
        if let Some(events) = connection.take_event_receiver() {
            tokio::spawn(dispatch_events(
                Arc::downgrade(self),
                connection.clone(),
                events,
            ));
        }
        Ok(())
    }

    /// Transport death, observed by the close watch task. Under the monitor:
    /// a user-initiated close completes, a healthy connection's death starts
    /// the reconnection loop. Stale notifications (the field already points
    /// at a newer connection, or at nothing) are ignored.
    fn handle_connection_closed(self: &Arc<Self>, connection: &Arc<Connection>) {
        let reconnect = {
            let mut state = self.state.lock().unwrap();
            let current = state
                .connection
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, connection));
            if !current {
                return;
            }
            state.connection = None;
            match state.status {
                Status::Closing => {
                    set_status(&mut state, Status::Closed);
                    false
                }
                Status::Connected => {
                    set_status(&mut state, Status::Reconnecting);
                    true
                }
                _ => false,
            }
        };

        if reconnect {
            warn!(host = %connection.host(), "Control connection lost, reconnecting");
            tokio::spawn(reconnect_loop(
                Arc::downgrade(self),
                self.reconnection.new_schedule(),
            ));
        }
    }

    fn current_connection(&self) -> Result<Arc<Connection>, QueryError> {
        self.state
            .lock()
            .unwrap()
            .connection
            .clone()
            .ok_or(QueryError::NotConnected)
    }

    async fn query(
        &self,
        connection: &Arc<Connection>,
        statement: Statement,
    ) -> Result<Vec<Row>, QueryError> {
        self.request_runner
            .execute(connection, Request::Query(statement))
            .await
    }

    /// Routes one server event to its refresh action.
    async fn handle_event(self: &Arc<Self>, event: Event) -> Result<(), ControlConnectionError> {
        match event {
            Event::SchemaChange(change) => self.handle_schema_change(change).await,
            Event::StatusChange(StatusChangeEvent::Up(address)) => {
                if self.registry.has_host(address) {
                    self.refresh_host(address).await
                } else {
                    Ok(())
                }
            }
            Event::StatusChange(StatusChangeEvent::Down(address)) => {
                self.registry.host_down(address);
                Ok(())
            }
            Event::TopologyChange(TopologyChangeEvent::NewNode(address)) => {
                if !self.registry.has_host(address) {
                    self.refresh_host(address).await
                } else {
                    Ok(())
                }
            }
            Event::TopologyChange(TopologyChangeEvent::RemovedNode(address)) => {
                self.registry.host_lost(address);
                Ok(())
            }
        }
    }

    async fn handle_schema_change(
        self: &Arc<Self>,
        change: SchemaChangeEvent,
    ) -> Result<(), ControlConnectionError> {
        match change {
            SchemaChangeEvent::KeyspaceChange {
                change_type: SchemaChangeType::Created | SchemaChangeType::Dropped,
                ..
            } => self.refresh_schema().await,
            SchemaChangeEvent::KeyspaceChange {
                change_type: SchemaChangeType::Updated,
                keyspace_name,
            } => self.refresh_keyspace(&keyspace_name).await,
            SchemaChangeEvent::TableChange {
                change_type: SchemaChangeType::Created | SchemaChangeType::Dropped,
                keyspace_name,
                ..
            } => self.refresh_keyspace(&keyspace_name).await,
            SchemaChangeEvent::TableChange {
                change_type: SchemaChangeType::Updated,
                keyspace_name,
                table_name,
            } => self.refresh_table(&keyspace_name, &table_name).await,
        }
    }

    /// Reads system.local and system.peers concurrently and reconciles the
    /// registry: found hosts are reported, hosts that disappeared are lost,
    /// and hosts still marked down get a reachability probe scheduled.
    async fn refresh_hosts(self: &Arc<Self>) -> Result<(), ControlConnectionError> {
        let connection = self.current_connection()?;
        debug!("Refreshing cluster topology");

        let local = self.query(&connection, Statement::new(SELECT_LOCAL));
        let peers = self.query(&connection, Statement::new(SELECT_PEERS));
        let (local_rows, peer_rows) = future::try_join(local, peers).await?;

        if local_rows.is_empty() && peer_rows.is_empty() {
            return Err(ControlConnectionError::NoHosts);
        }

        let mut seen = HashSet::new();
        let local_ip = connection.host();
        if let Some(row) = local_rows.first() {
            seen.insert(local_ip);
            self.registry.host_found(local_ip, row);
        }
        for row in &peer_rows {
            let Some(ip) = peer_ip(row) else {
                warn!(row = ?row, "Peer row carries no usable address, skipping");
                continue;
            };
            seen.insert(ip);
            self.registry.host_found(ip, row);
        }

        let mut probe = Vec::new();
        for host in self.registry.each_host() {
            if !seen.contains(&host.ip()) {
                self.registry.host_lost(host.ip());
            } else if host.is_down() {
                let mut state = self.state.lock().unwrap();
                if state.refreshing_statuses.insert(host.ip()) {
                    probe.push(host);
                }
            }
        }
        for host in probe {
            debug!(host = %host, "Host is still down, probing its reachability");
            tokio::spawn(refresh_host_status(Arc::downgrade(self), host));
        }
        Ok(())
    }

    /// Full schema refresh: three concurrent reads, one catalogue swap.
    async fn refresh_schema(self: &Arc<Self>) -> Result<(), ControlConnectionError> {
        let connection = self.current_connection()?;
        debug!("Refreshing the cluster schema");

        let keyspaces = self.query(&connection, Statement::new(SELECT_KEYSPACES));
        let tables = self.query(&connection, Statement::new(SELECT_TABLES));
        let columns = self.query(&connection, Statement::new(SELECT_COLUMNS));
        let (keyspaces, tables, columns) = future::try_join3(keyspaces, tables, columns).await?;

        let Some(host) = self.registry.host(connection.host()) else {
            // The next topology refresh re-adds the host and re-triggers this.
            debug!(host = %connection.host(), "Host missing from the registry, skipping schema update");
            return Ok(());
        };
        self.schema.update_keyspaces(&host, keyspaces, tables, columns);
        Ok(())
    }

    async fn refresh_keyspace(self: &Arc<Self>, keyspace: &str) -> Result<(), ControlConnectionError> {
        let connection = self.current_connection()?;
        debug!(keyspace = %keyspace, "Refreshing keyspace");

        let values = vec![keyspace.to_string()];
        let keyspaces = self.query(
            &connection,
            Statement::new(SELECT_KEYSPACE).with_values(values.clone()),
        );
        let tables = self.query(
            &connection,
            Statement::new(SELECT_KEYSPACE_TABLES).with_values(values.clone()),
        );
        let columns = self.query(
            &connection,
            Statement::new(SELECT_KEYSPACE_COLUMNS).with_values(values),
        );
        let (keyspaces, tables, columns) = future::try_join3(keyspaces, tables, columns).await?;

        let Some(keyspace_row) = keyspaces.into_iter().next() else {
            debug!(keyspace = %keyspace, "Keyspace vanished before the refresh, skipping");
            return Ok(());
        };
        let Some(host) = self.registry.host(connection.host()) else {
            debug!(host = %connection.host(), "Host missing from the registry, skipping keyspace update");
            return Ok(());
        };
        self.schema.update_keyspace(&host, keyspace_row, tables, columns);
        Ok(())
    }

    async fn refresh_table(
        self: &Arc<Self>,
        keyspace: &str,
        table: &str,
    ) -> Result<(), ControlConnectionError> {
        let connection = self.current_connection()?;
        debug!(keyspace = %keyspace, table = %table, "Refreshing table");

        let values = vec![keyspace.to_string(), table.to_string()];
        let tables = self.query(
            &connection,
            Statement::new(SELECT_TABLE).with_values(values.clone()),
        );
        let columns = self.query(
            &connection,
            Statement::new(SELECT_TABLE_COLUMNS).with_values(values),
        );
        let (tables, columns) = future::try_join(tables, columns).await?;

        let Some(table_row) = tables.into_iter().next() else {
            debug!(keyspace = %keyspace, table = %table, "Table vanished before the refresh, skipping");
            return Ok(());
        };
        let Some(host) = self.registry.host(connection.host()) else {
            debug!(host = %connection.host(), "Host missing from the registry, skipping table update");
            return Ok(());
        };
        self.schema.update_table(&host, keyspace, table_row, columns);
        Ok(())
    }

    /// Refreshes one host: the local row when the address is the connection's
    /// own, the filtered peers row otherwise.
    async fn refresh_host(&self, address: IpAddr) -> Result<(), ControlConnectionError> {
        let connection = self.current_connection()?;
        debug!(host = %address, "Refreshing host");

        let statement = if address == connection.host() {
            Statement::new(SELECT_LOCAL)
        } else {
            Statement::new(SELECT_PEER).with_values(vec![address.to_string()])
        };
        let rows = self.query(&connection, statement).await?;
        if let Some(row) = rows.first() {
            self.registry.host_found(address, row);
        }
        Ok(())
    }
}

/// Derives the address a peers row is keyed under: `rpc_address`, unless the
/// node broadcasts the unspecified address, in which case `peer` is
/// authoritative.
fn peer_ip(row: &Row) -> Option<IpAddr> {
    let address = match row.get("rpc_address") {
        Some("0.0.0.0") | None => row.get("peer"),
        rpc_address => rpc_address,
    }?;
    address.parse().ok()
}

/// Consumes one connection's event stream, serially, for as long as both the
/// connection and the control connection are alive. Refresh failures are
/// logged and never propagate; the event loop must outlive them.
async fn dispatch_events(
    inner: Weak<Inner>,
    connection: Arc<Connection>,
    mut events: mpsc::UnboundedReceiver<EventPayload>,
) {
    loop {
        let payload = tokio::select! {
            _ = connection.wait_closed() => return,
            received = events.recv() => match received {
                Some(payload) => payload,
                None => return,
            },
        };
        let event = match Event::try_from(payload) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "Ignoring a malformed server event");
                continue;
            }
        };
        let Some(inner) = inner.upgrade() else { return };
        debug!(event = ?event, "Received server event");
        if let Err(err) = inner.handle_event(event).await {
            warn!(error = %err, "Failed to apply a server event");
        }
    }
}

/// Retries the control connection after it was lost. One schedule instance
/// drives the whole series, so the backoff keeps progressing across failed
/// attempts. Stops as soon as the status is no longer `Reconnecting`.
async fn reconnect_loop(inner: Weak<Inner>, mut schedule: Box<dyn ReconnectionSchedule + Send>) {
    loop {
        let timeout = schedule.next_duration();
        let Some(strong) = inner.upgrade() else { return };
        debug!(timeout = ?timeout, "Next control connection attempt scheduled");
        let reactor = Arc::clone(&strong.reactor);
        drop(strong);
        reactor.schedule_timer(timeout).await;

        let Some(strong) = inner.upgrade() else { return };
        if strong.state.lock().unwrap().status != Status::Reconnecting {
            return;
        }
        match strong.connect_to_first_available().await {
            Ok(()) => return,
            Err(err) => warn!(error = %err, "Control connection attempt failed"),
        }
    }
}

/// One immediate reachability attempt for a down host. When the host does not
/// answer, falls back to the timed retry loop with a fresh schedule.
async fn refresh_host_status(inner: Weak<Inner>, host: Arc<Host>) {
    let Some(strong) = inner.upgrade() else { return };
    match strong.connector.connect(&host).await {
        Ok(connection) => {
            strong
                .state
                .lock()
                .unwrap()
                .refreshing_statuses
                .remove(&host.ip());
            strong.connector.close(host.ip(), connection).await;
            debug!(host = %host, "Host answered the reachability probe");
        }
        Err(err) => {
            debug!(host = %host, error = %err, "Reachability probe failed, retrying on a schedule");
            let schedule = strong.reconnection.new_schedule();
            drop(strong);
            refresh_host_status_with_retry(inner, host, schedule).await;
        }
    }
}

/// Timed reachability probing of one down host. Each round waits out the
/// schedule, re-checks that the host is still being probed, then attempts a
/// throwaway connection; success closes it again and ends the loop.
async fn refresh_host_status_with_retry(
    inner: Weak<Inner>,
    host: Arc<Host>,
    mut schedule: Box<dyn ReconnectionSchedule + Send>,
) {
    loop {
        let timeout = schedule.next_duration();
        let Some(strong) = inner.upgrade() else { return };
        let reactor = Arc::clone(&strong.reactor);
        drop(strong);
        reactor.schedule_timer(timeout).await;

        let Some(strong) = inner.upgrade() else { return };
        if !strong
            .state
            .lock()
            .unwrap()
            .refreshing_statuses
            .contains(&host.ip())
        {
            return;
        }
        match strong.connector.connect(&host).await {
            Ok(connection) => {
                strong
                    .state
                    .lock()
                    .unwrap()
                    .refreshing_statuses
                    .remove(&host.ip());
                strong.connector.close(host.ip(), connection).await;
                debug!(host = %host, "Host answered the reachability probe");
                return;
            }
            Err(err) => {
                debug!(host = %host, error = %err, "Reachability probe failed");
            }
        }
    }
}
