//! Decode boundary to the live-editing CRDT engine.
//!
//! The merge engine never touches CRDT internals. It only needs to turn a
//! serialized state snapshot into the plain text it represents, through the
//! [`CrdtDecoder`] trait. [`YrsTextDecoder`] implements it for Yjs v1
//! updates holding a single root text.

use yrs::updates::decoder::Decode;
use yrs::{Doc, GetString, ReadTxn, StateVector, Text, Transact, Update};

use crate::error::CoreError;

/// Name of the root text used when none is configured.
pub const DEFAULT_TEXT_NAME: &str = "content";

/// Materializes the plain text of a serialized CRDT state.
pub trait CrdtDecoder: Send + Sync {
    fn decode(&self, state: &[u8]) -> Result<String, CoreError>;
}

/// Decodes Yjs v1 updates with `yrs` and reads one named root text.
#[derive(Debug, Clone)]
pub struct YrsTextDecoder {
    text_name: String,
}

impl YrsTextDecoder {
    pub fn new(text_name: impl Into<String>) -> Self {
        Self {
            text_name: text_name.into(),
        }
    }

    pub fn text_name(&self) -> &str {
        &self.text_name
    }

    /// Encode `content` as a full-state update of a fresh document.
    ///
    /// Used to seed CRDT state for versions created outside a live session.
    pub fn encode(&self, content: &str) -> Vec<u8> {
        let doc = Doc::new();
        let text = doc.get_or_insert_text(self.text_name.as_str());
        {
            let mut txn = doc.transact_mut();
            text.insert(&mut txn, 0, content);
        }
        let txn = doc.transact();
        txn.encode_state_as_update_v1(&StateVector::default())
    }
}

impl Default for YrsTextDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_NAME)
    }
}

impl CrdtDecoder for YrsTextDecoder {
    fn decode(&self, state: &[u8]) -> Result<String, CoreError> {
        let update = Update::decode_v1(state)
            .map_err(|e| CoreError::Crdt(format!("Failed to decode update: {e}")))?;

        let doc = Doc::new();
        let text = doc.get_or_insert_text(self.text_name.as_str());
        {
            let mut txn = doc.transact_mut();
            txn.apply_update(update)
                .map_err(|e| CoreError::Crdt(format!("Failed to apply update: {e}")))?;
        }

        let txn = doc.transact();
        Ok(text.get_string(&txn))
    }
}
