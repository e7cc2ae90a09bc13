//! Configuration service: the network-side owner of slot mutations
//!
//! Every mutation follows the same path: validate outside the lock, apply
//! the change and snapshot under it, then encode, persist and broadcast the
//! snapshot with the lock released.

use log::{debug, info, warn};

use crate::codec::{self, DecodeLimits};
use crate::config::ControllerConfig;
use crate::effect::EffectKind;
use crate::error::{CodecError, ProtocolError, UpdateError};
use crate::protocol::{self, ClientMessage, Greeting};
use crate::raw::RawParams;
use crate::slot::SlotChange;
use crate::state::{GlobalStatus, Preferences, SharedState, StateSnapshot};
use crate::store::{PersistenceStore, Storage};
use crate::validate::validate;

/// Receiver of pushed documents, usually the connected clients
pub trait StateObserver {
    fn broadcast(&mut self, document: &[u8]);
}

/// No observers
impl StateObserver for () {
    fn broadcast(&mut self, _document: &[u8]) {}
}

impl<T: StateObserver + ?Sized> StateObserver for &mut T {
    fn broadcast(&mut self, document: &[u8]) {
        (**self).broadcast(document);
    }
}

/// What a slot mutation did to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Created,
    Updated,
    Removed,
    Unchanged,
}

impl From<SlotChange> for Outcome {
    fn from(change: SlotChange) -> Self {
        match change {
            SlotChange::Created => Self::Created,
            SlotChange::Updated => Self::Updated,
        }
    }
}

fn removal(removed: bool) -> Outcome {
    if removed {
        Outcome::Removed
    } else {
        Outcome::Unchanged
    }
}

pub struct ConfigService<'a, S: Storage, O: StateObserver> {
    state: &'a SharedState,
    store: PersistenceStore<S>,
    observer: O,
    limits: DecodeLimits,
    defaults: Preferences,
}

impl<'a, S: Storage, O: StateObserver> ConfigService<'a, S, O> {
    pub fn new(state: &'a SharedState, storage: S, observer: O, config: &ControllerConfig) -> Self {
        Self {
            state,
            store: PersistenceStore::new(storage, config.decode),
            observer,
            limits: config.decode,
            defaults: config.preferences,
        }
    }

    pub fn state(&self) -> &'a SharedState {
        self.state
    }

    pub fn store(&self) -> &PersistenceStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PersistenceStore<S> {
        &mut self.store
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Restore preferences and effect slots from storage
    ///
    /// Invalid stored entries are skipped. The restored table is written
    /// back once, dropping whatever was skipped.
    pub fn begin(&mut self) {
        let preferences = self.store.load_preferences(self.defaults);
        self.state.set_global(GlobalStatus::from_preferences(preferences));

        let document = self.store.load_state();
        let mut restored = Vec::new();
        for (index, strip) in self.state.strips().iter().enumerate() {
            let Some(effects) = document.get(&strip.name) else {
                continue;
            };
            for (name, params) in effects {
                let Some(kind) = EffectKind::from_name(name) else {
                    warn!("skipping unknown stored effect `{name}` on strip `{}`", strip.name);
                    continue;
                };
                match validate(kind.schema(), params) {
                    Ok(config) => restored.push((index, kind, config)),
                    Err(err) => warn!("skipping stored `{name}` on strip `{}`: {err}", strip.name),
                }
            }
        }

        let count = restored.len();
        let ((), snapshot) = self.state.mutate(|table| {
            for (index, kind, config) in restored {
                if let Some(slots) = table.strip_mut(index) {
                    slots.upsert(kind, config);
                }
            }
        });
        info!("restored {count} effect slots");
        self.commit(&snapshot);
    }

    /// Create or update the slot of `kind` on `strip`
    ///
    /// A rejected config removes the slot.
    pub fn apply_update(
        &mut self,
        strip: usize,
        kind: EffectKind,
        raw: &RawParams,
    ) -> Result<(), UpdateError> {
        if strip >= self.state.strips().len() {
            return Err(UpdateError::UnknownStrip(strip));
        }

        let validated = validate(kind.schema(), raw);
        let (outcome, snapshot) = self.state.mutate(|table| {
            let Some(slots) = table.strip_mut(strip) else {
                return Outcome::Unchanged;
            };
            match &validated {
                Ok(config) => slots.upsert(kind, config.clone()).into(),
                Err(_) => removal(slots.remove(kind)),
            }
        });
        self.finish(strip, kind, outcome, &snapshot);

        validated.map(drop).map_err(|err| {
            warn!("rejected `{}` config for strip {strip}: {err}", kind.name());
            err.into()
        })
    }

    /// Remove the slot of `kind` on `strip`; removing an absent slot is a no-op
    pub fn remove(&mut self, strip: usize, kind: EffectKind) -> Result<(), UpdateError> {
        if strip >= self.state.strips().len() {
            return Err(UpdateError::UnknownStrip(strip));
        }

        let (outcome, snapshot) = self.state.mutate(|table| match table.strip_mut(strip) {
            Some(slots) => removal(slots.remove(kind)),
            None => Outcome::Unchanged,
        });
        self.finish(strip, kind, outcome, &snapshot);
        Ok(())
    }

    fn finish(&mut self, strip: usize, kind: EffectKind, outcome: Outcome, snapshot: &StateSnapshot) {
        match outcome {
            Outcome::Unchanged => return,
            Outcome::Created => info!("created `{}` on strip {strip}", kind.name()),
            Outcome::Updated => debug!("updated `{}` on strip {strip}", kind.name()),
            Outcome::Removed => info!("removed `{}` from strip {strip}", kind.name()),
        }
        self.commit(snapshot);
    }

    /// Encode, persist and broadcast a snapshot
    fn commit(&mut self, snapshot: &StateSnapshot) {
        let bytes = match codec::encode(snapshot) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("failed to encode effect state: {err}");
                return;
            }
        };
        // Failures are logged by the store; in-memory state stays authoritative
        let _ = self.store.save_state(&bytes);
        self.observer.broadcast(&bytes);
    }

    /// Handle one inbound transport frame
    ///
    /// Protocol errors drop the message. A rejected effect config is not a
    /// protocol error: the message was applied, the slot is gone.
    pub fn handle_message(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        ClientMessage::decode(bytes, self.limits)
            .and_then(|message| self.dispatch(message))
            .inspect_err(|err| debug!("dropping message: {err}"))
    }

    pub fn dispatch(&mut self, message: ClientMessage) -> Result<(), ProtocolError> {
        match message {
            ClientMessage::RemoveEffect { strip, effect } => {
                let (strip, kind) = self.resolve(&strip, &effect)?;
                // Resolved strips always exist
                self.remove(strip, kind).ok();
            }
            ClientMessage::UpdateEffect {
                strip,
                effect,
                config,
            } => {
                let (strip, kind) = self.resolve(&strip, &effect)?;
                // Rejections are logged by `apply_update`
                self.apply_update(strip, kind, &config).ok();
            }
            ClientMessage::UpdateGlobal {
                brightness,
                on,
                follow_sun,
            } => {
                self.update_global(brightness, on, follow_sun);
            }
        }
        Ok(())
    }

    fn resolve(&self, strip: &str, effect: &str) -> Result<(usize, EffectKind), ProtocolError> {
        let index = self
            .state
            .strip_index(strip)
            .ok_or_else(|| ProtocolError::UnknownStrip(strip.into()))?;
        let kind =
            EffectKind::from_name(effect).ok_or_else(|| ProtocolError::UnknownEffect(effect.into()))?;
        Ok((index, kind))
    }

    /// Change the global status; absent values are kept
    ///
    /// Persists the preferences and broadcasts the status document.
    pub fn update_global(
        &mut self,
        brightness: Option<u8>,
        on: Option<bool>,
        follow_sun: Option<bool>,
    ) -> GlobalStatus {
        let mut status = self.state.global();
        if let Some(brightness) = brightness {
            status.brightness = brightness;
        }
        if let Some(on) = on {
            status.on = on;
        }
        if let Some(follow_sun) = follow_sun {
            status.follow_sun = follow_sun;
        }
        self.state.set_global(status);
        debug!("global status: {status:?}");

        let _ = self.store.save_preferences(status.preferences());
        match protocol::encode_global(status) {
            Ok(bytes) => self.observer.broadcast(&bytes),
            Err(err) => warn!("failed to encode global status: {err}"),
        }
        status
    }

    /// Documents for a newly connected client
    pub fn greeting(&self) -> Result<Greeting, CodecError> {
        Ok(Greeting {
            state: codec::encode(&self.state.snapshot())?,
            global: protocol::encode_global(self.state.global())?,
            catalog: protocol::encode_catalog()?,
        })
    }
}
