//! The remote reporting bridge: forwarding intercepted faults from a client
//! process to a name-addressed handler in a server process.
//!
//! The transport itself is a collaborator: anything that can register a
//! named handler and invoke one by name implements [`RemoteMethods`]. The
//! bridge then wires a fault type to a report channel in one of two ways:
//!
//! - on the server, [`Registry::publish_server_reporter`] registers the
//!   handler under a collision-checked channel name;
//! - on the client, [`Registry::subscribe_server_reporter`] registers an
//!   ordinary isolated reporter that forwards every intercepted fault to
//!   that channel, fire-and-forget.
//!
//! Subscribing before the server ever published is allowed; what happens to
//! a call on an unregistered name is the transport's own business.

use std::sync::Arc;

use crate::{
    context::SecurityContext,
    fault::Fault,
    registry::{Registry, RegistryError},
};

/// Which side of the remote bridge this process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The process that intercepts faults and forwards them.
    Client,
    /// The process that receives forwarded reports.
    Server,
}

impl core::fmt::Display for Side {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Side::Client => write!(f, "client"),
            Side::Server => write!(f, "server"),
        }
    }
}

/// A server-side handler for one report channel.
///
/// Receives the diagnostic context and the rendered fault exactly as the
/// client forwarded them.
pub type RemoteHandler = Box<dyn Fn(SecurityContext, String) + Send + Sync>;

/// Error surfaced by a [`RemoteMethods`] transport.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The transport could not register a handler under the given name.
    #[error("remote handler `{name}` could not be registered: {reason}")]
    Registration {
        /// The handler name that was refused.
        name: String,
        /// The transport's explanation.
        reason: String,
    },
}

/// The host's remote-invocation mechanism.
///
/// The bridge only needs name-addressed registration and fire-and-forget
/// invocation; request/response plumbing, serialization on the wire and
/// delivery guarantees all belong to the implementor.
pub trait RemoteMethods: Send + Sync + 'static {
    /// Which side of the bridge this process runs on.
    fn side(&self) -> Side;

    /// Registers `handler` as remotely callable under `name`.
    fn register(&self, name: &str, handler: RemoteHandler) -> Result<(), RemoteError>;

    /// Invokes the handler registered under `name`, fire-and-forget.
    ///
    /// The dispatch routine never waits for completion; failure semantics
    /// for unknown names are the transport's own.
    fn call(&self, name: &str, context: &SecurityContext, fault: &str);
}

impl Registry {
    /// Registers `reporter` as the remote-callable handler for fault type
    /// `F`'s report channel.
    ///
    /// Server-side only: fails fast with [`RegistryError::WrongSide`] when
    /// the transport reports any other side. The channel name is allocated
    /// via [`create_report_name`](Registry::create_report_name) and a second
    /// unnamed publication for the same fault type fails fast with a
    /// collision.
    ///
    /// Silently does nothing once the registry is locked.
    pub fn publish_server_reporter<F: Fault>(
        &self,
        transport: &dyn RemoteMethods,
        reporter: RemoteHandler,
        name: Option<&str>,
    ) -> Result<(), RegistryError> {
        if self.is_locked() {
            return Ok(());
        }
        let side = transport.side();
        if side != Side::Server {
            return Err(RegistryError::WrongSide {
                operation: "publish_server_reporter",
                required: Side::Server,
                actual: side,
            });
        }
        let name = self.create_report_name::<F>(name)?;
        transport
            .register(&name, reporter)
            .map_err(|source| RegistryError::Transport {
                name: name.clone(),
                source,
            })?;
        tracing::debug!(channel = %name, "published server reporter");
        Ok(())
    }

    /// Registers a client-side reporter for fault type `F` that forwards
    /// every intercepted fault to the server's report channel.
    ///
    /// Client-side only: fails fast with [`RegistryError::WrongSide`] when
    /// the transport reports any other side. The channel name is resolved
    /// exactly as in
    /// [`publish_server_reporter`](Registry::publish_server_reporter), so
    /// the two sides agree without coordination. Forwarding is
    /// fire-and-forget and does not require the server to have published
    /// yet.
    ///
    /// Silently does nothing once the registry is locked.
    pub fn subscribe_server_reporter<F: Fault>(
        &self,
        transport: &Arc<dyn RemoteMethods>,
        name: Option<&str>,
    ) -> Result<(), RegistryError> {
        if self.is_locked() {
            return Ok(());
        }
        let side = transport.side();
        if side != Side::Client {
            return Err(RegistryError::WrongSide {
                operation: "subscribe_server_reporter",
                required: Side::Client,
                actual: side,
            });
        }
        let name = self.create_report_name::<F>(name)?;
        let transport = Arc::clone(transport);
        let channel = name.clone();
        self.register_isolated_reporter::<F, _>(move |context: &SecurityContext, fault: &F| {
            transport.call(&channel, context, &fault.to_string());
        });
        tracing::debug!(channel = %name, "subscribed to server reporter");
        Ok(())
    }
}
