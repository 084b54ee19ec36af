//! The reporter registry: per-fault-type reporter lists, report channel
//! names, and the one-way API lock.
//!
//! A [`Registry`] is an explicit value, constructed once at process boot and
//! shared as `Arc<Registry>` by everything that guards calls or registers
//! reporters. After application bootstrap, [`lock_api`](Registry::lock_api)
//! freezes every registration path for the life of the process; registration
//! against a locked registry is a silent no-op, so startup order never needs
//! special-casing.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tripwire::{Fault, Registry, SecurityContext};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("document failed validation")]
//! struct ValidationError;
//! impl Fault for ValidationError {}
//!
//! let registry = Arc::new(Registry::new());
//! registry.register_isolated_reporter::<ValidationError, _>(
//!     |context: &SecurityContext, _fault: &ValidationError| {
//!         eprintln!("validation failed: {context:?}");
//!     },
//! );
//! registry.lock_api();
//! ```

use core::{any::TypeId, marker::PhantomData};
use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, Ordering},
};

use hashbrown::{HashMap, HashSet};
use rustc_hash::FxBuildHasher;

use crate::{context::SecurityContext, fault::Fault, remote::Side};

/// Namespace prefix for derived report channel names.
pub const REPORT_NAME_PREFIX: &str = "/tripwire/reporters/";

type ReporterMap = HashMap<TypeId, Vec<Arc<dyn StoredReporter>>, FxBuildHasher>;
type NameSet = HashSet<String, FxBuildHasher>;

/// A callback invoked with the diagnostic context and the intercepted fault
/// when a fault of type `F` is caught by a guarded call.
///
/// Blanket-implemented for matching closures, so most reporters are written
/// inline:
///
/// ```rust
/// # use tripwire::{Fault, Registry, SecurityContext};
/// # #[derive(Debug, thiserror::Error)]
/// # #[error("timed out")]
/// # struct TimeoutError;
/// # impl Fault for TimeoutError {}
/// let registry = Registry::new();
/// registry.register_isolated_reporter::<TimeoutError, _>(
///     |_context: &SecurityContext, fault: &TimeoutError| {
///         eprintln!("intercepted: {fault}");
///     },
/// );
/// ```
pub trait Reporter<F: Fault>: Send + Sync + 'static {
    /// Consumes one intercepted fault.
    ///
    /// Reporters are trusted collaborator code: panics raised here are not
    /// caught by the dispatch routine.
    fn report(&self, context: &SecurityContext, fault: &F);
}

impl<F, T> Reporter<F> for T
where
    F: Fault,
    T: Fn(&SecurityContext, &F) + Send + Sync + 'static,
{
    fn report(&self, context: &SecurityContext, fault: &F) {
        self(context, fault)
    }
}

/// Type-erased storage for a [`Reporter`], keyed in the registry map by the
/// `TypeId` of the fault type it was registered for.
pub(crate) trait StoredReporter: Send + Sync + 'static {
    fn report_untyped(&self, context: &SecurityContext, fault: &dyn Fault);
}

struct TypedReporter<F, R> {
    reporter: R,
    _fault_type: PhantomData<fn() -> F>,
}

impl<F, R> StoredReporter for TypedReporter<F, R>
where
    F: Fault,
    R: Reporter<F>,
{
    fn report_untyped(&self, context: &SecurityContext, fault: &dyn Fault) {
        // The registry only stores this entry under `TypeId::of::<F>()`, so
        // the downcast cannot fail for faults routed through the map.
        if let Some(fault) = fault.downcast_ref::<F>() {
            self.reporter.report(context, fault);
        }
    }
}

/// Error returned by registration operations that fail fast.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The report channel name is already taken in this process.
    #[error(
        "report channel `{name}` is already registered; provide an explicit \
         name to register another reporter for the same fault type"
    )]
    ChannelCollision {
        /// The colliding channel name.
        name: String,
    },
    /// A side-specific operation was invoked on the wrong side.
    #[error("`{operation}` must be called on the {required} side, but this process is a {actual}")]
    WrongSide {
        /// The operation that was misused.
        operation: &'static str,
        /// The side the operation requires.
        required: Side,
        /// The side the transport reported.
        actual: Side,
    },
    /// The transport refused to register the remote handler.
    #[error("transport registration for report channel `{name}` failed")]
    Transport {
        /// The channel name whose registration failed.
        name: String,
        /// The transport's own error.
        #[source]
        source: crate::remote::RemoteError,
    },
}

/// Per-fault-type reporter lists, used channel names, and the API lock.
///
/// Construct one at process boot and share it; see the [module
/// docs](self).
#[derive(Default)]
pub struct Registry {
    reporters: RwLock<ReporterMap>,
    used_names: RwLock<NameSet>,
    locked: AtomicBool,
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Creates an empty, unlocked registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a reporter for faults of exactly type `F`.
    ///
    /// Reporters registered for the same fault type are invoked in
    /// registration order. Matching is exact: a reporter registered for a
    /// wrapper fault type never fires for the wrapped type, and vice versa.
    ///
    /// Silently does nothing once the registry is locked.
    pub fn register_isolated_reporter<F, R>(&self, reporter: R)
    where
        F: Fault,
        R: Reporter<F>,
    {
        if self.is_locked() {
            return;
        }
        let stored: Arc<dyn StoredReporter> = Arc::new(TypedReporter::<F, R> {
            reporter,
            _fault_type: PhantomData,
        });
        let mut map = self.reporters.write().expect("reporter map lock poisoned");
        map.entry(TypeId::of::<F>()).or_default().push(stored);
        tracing::debug!(fault_type = F::name(), "registered isolated reporter");
    }

    /// Freezes every registration path, irreversibly.
    ///
    /// After this call,
    /// [`register_isolated_reporter`](Registry::register_isolated_reporter),
    /// [`publish_server_reporter`](Registry::publish_server_reporter) and
    /// [`subscribe_server_reporter`](Registry::subscribe_server_reporter)
    /// become no-ops for the life of the process. Calling it again has no
    /// further effect.
    pub fn lock_api(&self) {
        self.locked.store(true, Ordering::Release);
    }

    /// Whether [`lock_api`](Registry::lock_api) has been called.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// Allocates a report channel name for fault type `F`.
    ///
    /// An explicit name is used verbatim; otherwise the name is derived as
    /// `"/tripwire/reporters/<declared name>"` from the fault type's
    /// [declared name](Fault::name). Either way the name is recorded as used for the life
    /// of the process and a second allocation of the same name fails fast
    /// with [`RegistryError::ChannelCollision`].
    pub fn create_report_name<F: Fault>(
        &self,
        explicit: Option<&str>,
    ) -> Result<String, RegistryError> {
        let name = match explicit {
            Some(name) => name.to_owned(),
            None => format!("{REPORT_NAME_PREFIX}{}", F::name()),
        };
        let mut used = self.used_names.write().expect("channel name lock poisoned");
        if !used.insert(name.clone()) {
            return Err(RegistryError::ChannelCollision { name });
        }
        Ok(name)
    }

    /// How many reporters are currently registered for fault type `F`.
    ///
    /// Debugging aid; dispatch itself goes through the interior lookup.
    pub fn reporter_count<F: Fault>(&self) -> usize {
        self.reporters
            .read()
            .expect("reporter map lock poisoned")
            .get(&TypeId::of::<F>())
            .map_or(0, Vec::len)
    }

    /// Snapshot of the reporter list for one concrete fault type.
    ///
    /// Cloned out so dispatch never holds the map lock while reporters run.
    pub(crate) fn reporters_for(&self, type_id: TypeId) -> Vec<Arc<dyn StoredReporter>> {
        self.reporters
            .read()
            .expect("reporter map lock poisoned")
            .get(&type_id)
            .cloned()
            .unwrap_or_default()
    }
}
