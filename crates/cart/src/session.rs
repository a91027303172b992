//! Wiring between the authentication session and the cart store.
//!
//! The login/logout flow owns a [`SessionSignal`]; [`bind_session`] keeps a
//! [`CartStore`] following it. Each identity change triggers exactly one
//! session transition on the store.

use horno_core::Identity;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::catalog::ProductCatalog;
use crate::repository::CartRepository;
use crate::store::CartStore;

/// The currently authenticated identity, observable.
#[derive(Debug, Clone)]
pub struct SessionSignal {
    tx: watch::Sender<Option<Identity>>,
}

impl Default for SessionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSignal {
    /// A signal starting out as guest.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }

    /// Publish a successful login.
    pub fn login(&self, identity: Identity) {
        self.set(Some(identity));
    }

    pub fn logout(&self) {
        self.set(None);
    }

    fn set(&self, identity: Option<Identity>) {
        // Re-publishing the same identity must not wake observers
        self.tx.send_if_modified(|current| {
            if *current == identity {
                false
            } else {
                *current = identity;
                true
            }
        });
    }
}

/// Keep `store` bound to the identity published on `session`.
///
/// The current value is applied first. For every later change the store
/// discards its cart synchronously, then loads the new identity's stored
/// cart on a separate task; a load overtaken by a newer change is dropped
/// by the store. The returned task ends when the signal is dropped.
pub fn bind_session<C, R>(
    store: CartStore<C, R>,
    mut session: watch::Receiver<Option<Identity>>,
) -> JoinHandle<()>
where
    C: ProductCatalog,
    R: CartRepository,
{
    tokio::spawn(async move {
        loop {
            let identity = session.borrow_and_update().clone();
            if let Some(ticket) = store.begin_session(identity) {
                let store = store.clone();
                tokio::spawn(async move {
                    store.complete_load(ticket).await;
                });
            }

            if session.changed().await.is_err() {
                debug!("Session signal dropped, unbinding cart store");
                break;
            }
        }
    })
}
