//! Device location lookup.
//!
//! Host platforms report the position through a pair of callbacks. The
//! [`LocationResolver`] turns that into a future that completes exactly once,
//! with either a [`Coordinate`] or a [`LocationError`].

use parking_lot::Mutex;
use std::{fmt::Debug, sync::Arc};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::{
    error::LocationError,
    model::{Coordinate, Position},
};

pub type SuccessCallback = Box<dyn FnOnce(Position) + Send + 'static>;
pub type ErrorCallback = Box<dyn FnOnce(PositionError) + Send + 'static>;

/// A host capability able to report where the device currently is.
///
/// Implementations call exactly one of the two callbacks, possibly from
/// another thread and possibly after `get_current_position` has returned.
pub trait Geolocation: Send + Sync + Debug {
    fn get_current_position(&self, on_success: SuccessCallback, on_error: ErrorCallback);
}

/// Failure as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionError {
    pub code: u16,
    pub message: String,
}

impl PositionError {
    pub const PERMISSION_DENIED: u16 = 1;
    pub const POSITION_UNAVAILABLE: u16 = 2;
    pub const TIMEOUT: u16 = 3;

    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<PositionError> for LocationError {
    fn from(err: PositionError) -> Self {
        match err.code {
            PositionError::PERMISSION_DENIED => LocationError::PermissionDenied,
            PositionError::POSITION_UNAVAILABLE => LocationError::PositionUnavailable,
            PositionError::TIMEOUT => LocationError::Timeout,
            _ => LocationError::Unknown,
        }
    }
}

type Outcome = Result<Coordinate, LocationError>;

/// Resolves the current device location through an optional platform.
///
/// A resolver without a platform models a host with no location capability.
#[derive(Debug, Clone, Default)]
pub struct LocationResolver {
    platform: Option<Arc<dyn Geolocation>>,
}

impl LocationResolver {
    pub fn new(platform: Arc<dyn Geolocation>) -> Self {
        Self {
            platform: Some(platform),
        }
    }

    /// Resolver for a host that has no location capability.
    pub fn unsupported() -> Self {
        Self { platform: None }
    }

    pub fn is_supported(&self) -> bool {
        self.platform.is_some()
    }

    /// Ask the platform for the current position, once.
    ///
    /// Platform error codes are mapped onto [`LocationError`] kinds. No retry
    /// is attempted.
    pub async fn current_location(&self) -> Result<Coordinate, LocationError> {
        let Some(platform) = &self.platform else {
            debug!("no geolocation capability available");
            return Err(LocationError::AbsentCapability);
        };

        let (tx, rx) = oneshot::channel::<Outcome>();
        let slot = Arc::new(Mutex::new(Some(tx)));
        let success_slot = Arc::clone(&slot);

        platform.get_current_position(
            Box::new(move |position: Position| complete(&success_slot, Ok(position.into()))),
            Box::new(move |err: PositionError| {
                debug!(code = err.code, message = %err.message, "platform refused position");
                complete(&slot, Err(err.into()))
            }),
        );

        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("geolocation platform dropped the request without answering");
                Err(LocationError::Unknown)
            }
        }
    }
}

// First caller wins; the sender is gone for anyone after it.
fn complete(slot: &Mutex<Option<oneshot::Sender<Outcome>>>, outcome: Outcome) {
    if let Some(tx) = slot.lock().take() {
        // Receiver only disappears if the caller dropped the future.
        let _ = tx.send(outcome);
    }
}

/// Platform that always reports the same position.
///
/// Used on hosts without a positioning sensor, where the location comes from
/// configuration instead.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocation {
    position: Position,
}

impl FixedGeolocation {
    pub fn new(position: Position) -> Self {
        Self { position }
    }

    pub fn at(coordinate: Coordinate) -> Self {
        Self::new(Position {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            accuracy: None,
        })
    }
}

impl Geolocation for FixedGeolocation {
    fn get_current_position(&self, on_success: SuccessCallback, _on_error: ErrorCallback) {
        on_success(self.position);
    }
}
